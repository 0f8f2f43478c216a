//! Construction helpers shared by containers and member population.

use quill_types::{TypeId, TypeKind, TypePool};

use crate::errors::{ValueError, ValueResult};
use crate::memory::MemoryArea;
use crate::value::{
    BoolValue, ByteValue, CharValue, FloatValue, IntValue, ObjectValue, RefValue, UntypedValue,
    Value,
};

/// The default value a freshly declared slot of the given type holds.
///
/// Scalars default to zero-ish payloads, `any` to a boxed generic null,
/// classes and arrays to a typed null. Enum classes are special: their
/// default is a sealed reference to the first constant.
pub fn default_value(
    pool: &TypePool,
    area: Option<&MemoryArea>,
    ty: TypeId,
    seal: bool,
) -> ValueResult<Value> {
    let value = match pool.kind(ty) {
        Some(TypeKind::Bool) => Value::Bool(BoolValue::new(area, false)),
        Some(TypeKind::Byte) => Value::Byte(ByteValue::new(area, 0)),
        Some(TypeKind::Char) => Value::Char(CharValue::new(area, '\0')),
        Some(TypeKind::Int) => Value::Int(IntValue::new(area, 0)),
        Some(TypeKind::Float) => Value::Float(FloatValue::new(area, 0.0)),
        Some(TypeKind::Any) => {
            let null = Value::Reference(RefValue::generic_null(None));
            Value::Untyped(UntypedValue::new(area, &null, pool)?)
        }
        Some(TypeKind::Class) => match enum_default(pool, area, ty)? {
            Some(constant) => constant,
            None => Value::Reference(RefValue::null_of(area, ty)),
        },
        Some(TypeKind::Array | TypeKind::Callable) => {
            Value::Reference(RefValue::null_of(area, ty))
        }
        Some(TypeKind::Void) | None => return Err(ValueError::argument("ty")),
    };
    if seal {
        value.seal();
    }
    Ok(value)
}

fn enum_default(
    pool: &TypePool,
    area: Option<&MemoryArea>,
    class: TypeId,
) -> ValueResult<Option<Value>> {
    let Some(data) = pool.class_data(class) else {
        return Ok(None);
    };
    let Some(literals) = data.enum_literals.as_ref() else {
        return Ok(None);
    };
    let Some(first) = literals.first() else {
        return Err(ValueError::argument("ty"));
    };
    let constant = ObjectValue::new_enum(pool, area, class, 0, first)?;
    let reference = RefValue::new(area, Value::Object(constant), Some(class), pool)?;
    reference.seal();
    Ok(Some(Value::Reference(reference)))
}

/// Copy a value into an area, kind by kind.
///
/// Scalars copy their payload; references copy the handle, except
/// strings which copy by content; untyped boxes re-box their content;
/// object-like values get a fresh temporary reference.
pub fn replicate(pool: &TypePool, area: Option<&MemoryArea>, value: &Value) -> ValueResult<Value> {
    value.ensure_live()?;
    Ok(match value {
        Value::Bool(_) | Value::Byte(_) | Value::Char(_) | Value::Int(_) | Value::Float(_) => {
            match value.as_scalar() {
                Some(scalar) => Value::from_scalar(scalar, area),
                None => return Err(ValueError::internal("scalar without payload")),
            }
        }
        Value::Reference(r) => match r.referred() {
            Some(Value::Object(obj)) if matches!(obj.builtin_kind(), crate::value::BuiltinKind::Str) => {
                let Some(text) = obj.as_str() else {
                    return Err(ValueError::internal("string object without text"));
                };
                let copy = ObjectValue::new_string(pool, area, &text)?;
                Value::Reference(RefValue::new(
                    area,
                    Value::Object(copy),
                    r.declared_type(),
                    pool,
                )?)
            }
            Some(referent) => Value::Reference(RefValue::new(
                area,
                referent,
                r.declared_type(),
                pool,
            )?),
            None => match r.declared_type() {
                Some(ty) => Value::Reference(RefValue::null_of(area, ty)),
                None => Value::Reference(RefValue::generic_null(area)),
            },
        },
        Value::Untyped(u) => Value::Untyped(UntypedValue::new(area, &u.actual(), pool)?),
        Value::Object(_) | Value::Array(_) | Value::Function(_) | Value::Type(_) => {
            Value::Reference(RefValue::new(area, value.clone(), None, pool)?)
        }
        Value::Void => return Err(ValueError::argument("value")),
    })
}
