//! The runtime value model.
//!
//! [`Value`] is a cheap-clone handle: every variant wraps shared
//! interior state, so cloning a value clones a view, not the data.
//! Which kinds exist, and what each means:
//!
//! - five scalar kinds over native payloads
//! - references (typed or generic null, or pointing at an object-like
//!   value) and untyped boxes
//! - objects (plain, string, enum, dynamic), arrays, functions, and
//!   type values
//! - `Void`, the absence of a value
//!
//! The assignment protocol, equality rules, and explicit replication
//! live here and dispatch into the kind-specific modules.

mod array;
mod func;
pub(crate) mod member_storage;
mod object;
mod reference;
mod scalar;
mod type_value;

pub use array::{ArrayValue, ArrayValueBuilder, Dim, ValueComparer};
pub use func::{BindingTable, FuncValue};
pub use member_storage::ObjectMember;
pub use object::{BuiltinKind, DynamicConfig, ObjectValue};
pub use reference::{RefValue, UntypedValue};
pub use scalar::{
    BoolValue, ByteValue, CharValue, FloatValue, IntValue, Scalar, ScalarPayload, ScalarValue,
};
pub use type_value::TypeValue;

use quill_types::{scalar_convertibility, BasicKind, Convertibility, TypeId, TypePool};

use crate::errors::{AssignResult, ValueError, ValueResult};
use crate::memory::{MemoryArea, StorageCell};

/// Discriminant of a runtime value.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ValueKind {
    Bool,
    Byte,
    Char,
    Int,
    Float,
    Reference,
    Untyped,
    Object,
    Array,
    Function,
    Type,
    Void,
}

/// A runtime value handle.
#[derive(Clone, Debug)]
pub enum Value {
    Bool(BoolValue),
    Byte(ByteValue),
    Char(CharValue),
    Int(IntValue),
    Float(FloatValue),
    Reference(RefValue),
    Untyped(UntypedValue),
    Object(ObjectValue),
    Array(ArrayValue),
    Function(FuncValue),
    Type(TypeValue),
    Void,
}

impl Value {
    pub fn kind(&self) -> ValueKind {
        match self {
            Self::Bool(_) => ValueKind::Bool,
            Self::Byte(_) => ValueKind::Byte,
            Self::Char(_) => ValueKind::Char,
            Self::Int(_) => ValueKind::Int,
            Self::Float(_) => ValueKind::Float,
            Self::Reference(_) => ValueKind::Reference,
            Self::Untyped(_) => ValueKind::Untyped,
            Self::Object(_) => ValueKind::Object,
            Self::Array(_) => ValueKind::Array,
            Self::Function(_) => ValueKind::Function,
            Self::Type(_) => ValueKind::Type,
            Self::Void => ValueKind::Void,
        }
    }

    /// Wrap a detached scalar payload in a value.
    pub fn from_scalar(scalar: Scalar, area: Option<&MemoryArea>) -> Value {
        match scalar {
            Scalar::Bool(v) => Self::Bool(BoolValue::new(area, v)),
            Scalar::Byte(v) => Self::Byte(ByteValue::new(area, v)),
            Scalar::Char(v) => Self::Char(CharValue::new(area, v)),
            Scalar::Int(v) => Self::Int(IntValue::new(area, v)),
            Scalar::Float(v) => Self::Float(FloatValue::new(area, v)),
        }
    }

    /// The scalar payload, for scalar kinds only. Does not dereference.
    pub fn as_scalar(&self) -> Option<Scalar> {
        match self {
            Self::Bool(v) => Some(v.scalar()),
            Self::Byte(v) => Some(v.scalar()),
            Self::Char(v) => Some(v.scalar()),
            Self::Int(v) => Some(v.scalar()),
            Self::Float(v) => Some(v.scalar()),
            _ => None,
        }
    }

    fn basic_kind(&self) -> Option<BasicKind> {
        self.as_scalar().map(Scalar::kind)
    }

    /// Kinds a reference can point at.
    pub fn is_object_like(&self) -> bool {
        matches!(
            self,
            Self::Object(_) | Self::Array(_) | Self::Function(_) | Self::Type(_)
        )
    }

    pub(crate) fn storage_cell(&self) -> Option<&StorageCell> {
        match self {
            Self::Bool(v) => Some(v.storage()),
            Self::Byte(v) => Some(v.storage()),
            Self::Char(v) => Some(v.storage()),
            Self::Int(v) => Some(v.storage()),
            Self::Float(v) => Some(v.storage()),
            Self::Reference(v) => Some(v.storage()),
            Self::Untyped(v) => Some(v.storage()),
            Self::Object(v) => Some(v.storage()),
            Self::Array(v) => Some(v.storage()),
            Self::Function(v) => Some(v.storage()),
            Self::Type(v) => Some(v.storage()),
            Self::Void => None,
        }
    }

    /// Whether a live area currently owns this value.
    pub fn is_stored(&self) -> bool {
        self.storage_cell().is_some_and(StorageCell::is_stored)
    }

    /// Fail with `NotStored` when the backing area has been recycled.
    pub fn ensure_live(&self) -> ValueResult<()> {
        match self.storage_cell() {
            Some(cell) => cell.ensure_live(),
            None => Ok(()),
        }
    }

    pub fn is_const(&self) -> bool {
        match self {
            Self::Bool(v) => v.is_const(),
            Self::Byte(v) => v.is_const(),
            Self::Char(v) => v.is_const(),
            Self::Int(v) => v.is_const(),
            Self::Float(v) => v.is_const(),
            Self::Reference(v) => v.is_const(),
            Self::Untyped(v) => v.is_const(),
            Self::Object(v) => v.is_const(),
            Self::Array(v) => v.is_const(),
            Self::Function(v) => v.is_const(),
            Self::Type(v) => v.is_const(),
            Self::Void => false,
        }
    }

    /// Seal against further writes. Irreversible.
    pub fn seal(&self) {
        match self {
            Self::Bool(v) => v.seal(),
            Self::Byte(v) => v.seal(),
            Self::Char(v) => v.seal(),
            Self::Int(v) => v.seal(),
            Self::Float(v) => v.seal(),
            Self::Reference(v) => v.seal(),
            Self::Untyped(v) => v.seal(),
            Self::Object(v) => v.seal(),
            Self::Array(v) => v.seal(),
            Self::Function(_) | Self::Type(_) | Self::Void => {}
        }
    }

    /// The type this value presents. `None` only for a generic null.
    pub fn type_id(&self, pool: &TypePool) -> Option<TypeId> {
        match self {
            Self::Bool(_) => Some(TypeId::BOOL),
            Self::Byte(_) => Some(TypeId::BYTE),
            Self::Char(_) => Some(TypeId::CHAR),
            Self::Int(_) => Some(TypeId::INT),
            Self::Float(_) => Some(TypeId::FLOAT),
            Self::Reference(v) => v.presented_type(pool),
            Self::Untyped(_) => Some(TypeId::ANY),
            Self::Object(v) => Some(v.class()),
            Self::Array(v) => Some(v.array_type()),
            Self::Function(v) => Some(v.callable_type()),
            Self::Type(_) => None,
            Self::Void => Some(TypeId::VOID),
        }
    }

    /// Display name of the presented type, for diagnostics.
    pub fn type_name(&self, pool: &TypePool) -> String {
        match self.type_id(pool) {
            Some(ty) => pool.type_name(ty),
            None => match self {
                Self::Type(_) => "Type".into(),
                _ => "null".into(),
            },
        }
    }

    /// Follow references and unwrap untyped boxes. A null reference
    /// dereferences to itself.
    pub fn deref(&self) -> Value {
        match self {
            Self::Reference(r) => match r.referred() {
                Some(referent) => referent.deref(),
                None => self.clone(),
            },
            Self::Untyped(u) => u.actual().deref(),
            other => other.clone(),
        }
    }

    /// Whether this is a null reference (after unboxing).
    pub fn is_null(&self) -> bool {
        match self {
            Self::Reference(r) => r.is_null(),
            Self::Untyped(u) => u.actual().is_null(),
            _ => false,
        }
    }

    /// Assign this value into a target slot.
    ///
    /// The protocol: liveness on both sides, then const and void checks
    /// on the target, then kind dispatch. An untyped target boxes
    /// anything. The result says whether the assignment preserved the
    /// value exactly or went through a narrowing conversion.
    pub fn assign_to(&self, target: &Value, pool: &TypePool) -> ValueResult<AssignResult> {
        self.ensure_live()?;
        target.ensure_live()?;
        if matches!(target, Self::Void) {
            return Err(ValueError::illegal_assignment(self.type_name(pool), "void"));
        }
        if target.is_const() {
            return Err(ValueError::ConstViolation);
        }
        if let Self::Untyped(boxed) = target {
            boxed.rebox(self, pool)?;
            return Ok(AssignResult::Exact);
        }
        match self {
            Self::Bool(_) | Self::Byte(_) | Self::Char(_) | Self::Int(_) | Self::Float(_) => {
                match self.as_scalar() {
                    Some(scalar) => assign_scalar(scalar, target, pool),
                    None => Err(ValueError::internal("scalar without payload")),
                }
            }
            Self::Untyped(boxed) => boxed.actual().assign_to(target, pool),
            Self::Reference(r) => r.assign_into(target, pool),
            Self::Object(_) | Self::Array(_) | Self::Function(_) | Self::Type(_) => {
                let wrapper = RefValue::new(None, self.clone(), None, pool)?;
                wrapper.assign_into(target, pool)
            }
            Self::Void => Err(ValueError::illegal_assignment(
                "void",
                target.type_name(pool),
            )),
        }
    }

    /// Value equality.
    ///
    /// Untyped boxes compare through their content; references through
    /// their referent (null rules apply between nulls); scalars compare
    /// numerically across the numeric kinds; objects by identity except
    /// strings (content) and enum constants (class plus ordinal).
    pub fn is_equal_to(&self, other: &Value, pool: &TypePool) -> bool {
        if let Self::Untyped(u) = self {
            return u.actual().is_equal_to(other, pool);
        }
        if let Self::Untyped(u) = other {
            return self.is_equal_to(&u.actual(), pool);
        }
        match self {
            Self::Bool(_) | Self::Byte(_) | Self::Char(_) | Self::Int(_) | Self::Float(_) => {
                match (self.as_scalar(), other.as_scalar()) {
                    (Some(a), Some(b)) => scalar_eq(a, b),
                    _ => false,
                }
            }
            Self::Reference(r) => r.ref_equals(other, pool),
            Self::Object(obj) => match other {
                Self::Reference(r) => r.ref_equals(self, pool),
                Self::Object(other_obj) => obj.object_equals(other_obj),
                _ => false,
            },
            Self::Array(arr) => match other.deref() {
                Self::Array(other_arr) => arr.same_array(&other_arr),
                _ => false,
            },
            Self::Function(func) => match other.deref() {
                Self::Function(other_func) => func.same_function(&other_func),
                _ => false,
            },
            Self::Type(ty) => match other.deref() {
                Self::Type(other_ty) => ty.type_equals(&other_ty),
                _ => false,
            },
            Self::Untyped(u) => u.actual().is_equal_to(other, pool),
            Self::Void => matches!(other, Self::Void),
        }
    }

    /// Explicitly replicate this value as another type: the cast
    /// sibling of assignment. Answers `Ok(None)` when no replication
    /// path is defined for this kind pair, and errors when a path
    /// exists but the value cannot take it.
    pub fn replicate_as(
        &self,
        pool: &TypePool,
        area: Option<&MemoryArea>,
        target: TypeId,
    ) -> ValueResult<Option<Value>> {
        self.ensure_live()?;
        match self {
            Self::Bool(_) | Self::Byte(_) | Self::Char(_) | Self::Int(_) | Self::Float(_) => {
                match self.as_scalar() {
                    Some(scalar) => replicate_scalar(scalar, pool, area, target),
                    None => Err(ValueError::internal("scalar without payload")),
                }
            }
            Self::Untyped(u) => u.actual().replicate_as(pool, area, target),
            Self::Reference(r) => match r.referred() {
                Some(referent) => referent.replicate_as(pool, area, target),
                // Null casts to any class as a typed null.
                None => Ok(match pool.kind(target) {
                    Some(quill_types::TypeKind::Class | quill_types::TypeKind::Array) => Some(
                        Value::Reference(RefValue::null_of(area, target)),
                    ),
                    _ => None,
                }),
            },
            Self::Object(obj) => replicate_object(obj, self, pool, area, target),
            _ => Ok(None),
        }
    }
}

fn assign_scalar(incoming: Scalar, target: &Value, pool: &TypePool) -> ValueResult<AssignResult> {
    let Some(target_kind) = target.basic_kind() else {
        return Err(ValueError::illegal_assignment(
            incoming.kind().name(),
            target.type_name(pool),
        ));
    };
    let conv = scalar_convertibility(incoming.kind(), target_kind);
    let Some(converted) = incoming.convert_to(target_kind) else {
        return Err(ValueError::illegal_assignment(
            incoming.kind().name(),
            target_kind.name(),
        ));
    };
    match (target, converted) {
        (Value::Bool(cell), Scalar::Bool(v)) => cell.set_raw(v),
        (Value::Byte(cell), Scalar::Byte(v)) => cell.set_raw(v),
        (Value::Char(cell), Scalar::Char(v)) => cell.set_raw(v),
        (Value::Int(cell), Scalar::Int(v)) => cell.set_raw(v),
        (Value::Float(cell), Scalar::Float(v)) => cell.set_raw(v),
        _ => return Err(ValueError::internal("converted scalar does not fit target")),
    }
    Ok(
        if matches!(
            conv,
            Convertibility::Equivalent | Convertibility::Promoted
        ) {
            AssignResult::Exact
        } else {
            AssignResult::Lossy
        },
    )
}

/// Numeric kinds compare across each other; bool and char only within
/// their own kind.
#[allow(clippy::cast_precision_loss, clippy::float_cmp)]
fn scalar_eq(a: Scalar, b: Scalar) -> bool {
    fn numeric(scalar: Scalar) -> Option<f64> {
        match scalar {
            Scalar::Byte(v) => Some(f64::from(v)),
            Scalar::Int(v) => Some(v as f64),
            Scalar::Float(v) => Some(v),
            Scalar::Bool(_) | Scalar::Char(_) => None,
        }
    }
    match (a, b) {
        (Scalar::Bool(x), Scalar::Bool(y)) => x == y,
        (Scalar::Char(x), Scalar::Char(y)) => x == y,
        (a, b) => match (numeric(a), numeric(b)) {
            (Some(x), Some(y)) => x == y,
            _ => false,
        },
    }
}

fn replicate_scalar(
    incoming: Scalar,
    pool: &TypePool,
    area: Option<&MemoryArea>,
    target: TypeId,
) -> ValueResult<Option<Value>> {
    if let Some(target_kind) = BasicKind::of(target) {
        return match incoming.convert_to(target_kind) {
            Some(converted) => Ok(Some(Value::from_scalar(converted, area))),
            None => Err(ValueError::illegal_casting(
                incoming.kind().name(),
                target_kind.name(),
            )),
        };
    }
    if target == TypeId::STRING {
        let text = incoming.format();
        let obj = ObjectValue::new_string(pool, area, &text)?;
        return Ok(Some(Value::Object(obj)));
    }
    if target == TypeId::ANY {
        let boxed = UntypedValue::new(area, &Value::from_scalar(incoming, None), pool)?;
        return Ok(Some(Value::Untyped(boxed)));
    }
    Ok(None)
}

fn replicate_object(
    obj: &ObjectValue,
    value: &Value,
    pool: &TypePool,
    area: Option<&MemoryArea>,
    target: TypeId,
) -> ValueResult<Option<Value>> {
    match obj.builtin_kind() {
        BuiltinKind::Str => {
            let Some(text) = obj.as_str() else {
                return Err(ValueError::internal("string object without text"));
            };
            if target == TypeId::STRING {
                let copy = ObjectValue::new_string(pool, area, &text)?;
                return Ok(Some(Value::Object(copy)));
            }
            if let Some(target_kind) = BasicKind::of(target) {
                return match Scalar::parse(&text, target_kind) {
                    Some(parsed) => Ok(Some(Value::from_scalar(parsed, area))),
                    None => Err(ValueError::illegal_casting("String", target_kind.name())),
                };
            }
            Ok(None)
        }
        BuiltinKind::Enum => {
            if target == TypeId::INT {
                let Some(ordinal) = obj.ordinal() else {
                    return Err(ValueError::internal("enum constant without ordinal"));
                };
                return Ok(Some(Value::from_scalar(Scalar::Int(ordinal), area)));
            }
            if target == TypeId::STRING {
                let Some(literal) = obj.literal() else {
                    return Err(ValueError::internal("enum constant without literal"));
                };
                let copy = ObjectValue::new_string(pool, area, &literal)?;
                return Ok(Some(Value::Object(copy)));
            }
            Ok(None)
        }
        _ => {
            if target == TypeId::ANY {
                let boxed = UntypedValue::new(area, value, pool)?;
                return Ok(Some(Value::Untyped(boxed)));
            }
            Ok(None)
        }
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    reason = "tests use unwrap to panic on unexpected state"
)]
mod tests;
