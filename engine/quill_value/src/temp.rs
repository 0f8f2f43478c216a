//! Shorthand constructors for temporary values.
//!
//! Temporaries live outside any [`crate::memory::MemoryArea`]: they
//! have no storage handle and never report `NotStored`. Intermediate
//! results use these until something assigns them into owned slots.

use quill_types::{TypeId, TypePool};

use crate::errors::ValueResult;
use crate::value::{
    BoolValue, ByteValue, CharValue, FloatValue, IntValue, ObjectValue, RefValue, Value,
};

pub fn temp_bool(v: bool) -> Value {
    Value::Bool(BoolValue::new(None, v))
}

pub fn temp_byte(v: u8) -> Value {
    Value::Byte(ByteValue::new(None, v))
}

pub fn temp_char(v: char) -> Value {
    Value::Char(CharValue::new(None, v))
}

pub fn temp_int(v: i64) -> Value {
    Value::Int(IntValue::new(None, v))
}

pub fn temp_float(v: f64) -> Value {
    Value::Float(FloatValue::new(None, v))
}

/// A temporary reference to a fresh string object.
pub fn temp_string(pool: &TypePool, text: &str) -> ValueResult<Value> {
    let obj = ObjectValue::new_string(pool, None, text)?;
    temp_ref(pool, Value::Object(obj))
}

/// A temporary reference to an object-like value.
pub fn temp_ref(pool: &TypePool, referent: Value) -> ValueResult<Value> {
    Ok(Value::Reference(RefValue::new(None, referent, None, pool)?))
}

pub fn temp_null_ref(declared: TypeId) -> Value {
    Value::Reference(RefValue::null_of(None, declared))
}

pub fn temp_generic_null() -> Value {
    Value::Reference(RefValue::generic_null(None))
}
