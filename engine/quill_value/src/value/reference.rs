//! Reference and untyped value handles.
//!
//! A [`RefValue`] is a slot pointing at an object-like value (object,
//! array, function, or type), carrying the slot's declared type. Null
//! comes in two shapes: a typed null remembers its declared type and a
//! generic null remembers nothing. Assignment between reference slots
//! follows the hierarchy; assigning between equal `String` slots copies
//! the string by value.
//!
//! An [`UntypedValue`] boxes exactly one value of any other kind.
//! Boxing replaces the previous content and never nests: boxing an
//! untyped value boxes what it wraps.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;

use quill_types::{TypeId, TypePool};

use crate::errors::{AssignResult, ValueError, ValueResult};
use crate::memory::{MemoryArea, StorageCell};
use crate::util;
use crate::value::object::ObjectValue;
use crate::value::Value;

#[derive(Debug)]
struct RefCore {
    slot: RwLock<RefSlot>,
    konst: AtomicBool,
    storage: StorageCell,
}

#[derive(Debug)]
struct RefSlot {
    referent: Option<Value>,
    declared: Option<TypeId>,
}

/// A reference slot over an object-like value.
#[derive(Clone, Debug)]
pub struct RefValue {
    core: Arc<RefCore>,
}

impl RefValue {
    /// A reference to an existing object-like value. The declared type
    /// defaults to the referent's runtime type when not given.
    pub fn new(
        area: Option<&MemoryArea>,
        referent: Value,
        declared: Option<TypeId>,
        pool: &TypePool,
    ) -> ValueResult<Self> {
        if !referent.is_object_like() {
            return Err(ValueError::argument("referent"));
        }
        let declared = match declared {
            Some(ty) => Some(ty),
            None => referent.type_id(pool),
        };
        Ok(Self::raw(area, Some(referent), declared))
    }

    /// A null reference that remembers its declared type.
    pub fn null_of(area: Option<&MemoryArea>, declared: TypeId) -> Self {
        Self::raw(area, None, Some(declared))
    }

    /// A null reference with no declared type.
    pub fn generic_null(area: Option<&MemoryArea>) -> Self {
        Self::raw(area, None, None)
    }

    fn raw(area: Option<&MemoryArea>, referent: Option<Value>, declared: Option<TypeId>) -> Self {
        Self {
            core: Arc::new(RefCore {
                slot: RwLock::new(RefSlot { referent, declared }),
                konst: AtomicBool::new(false),
                storage: StorageCell::stored_in(area),
            }),
        }
    }

    /// The referent, failing `NullReference` when there is none.
    pub fn require_referent(&self) -> ValueResult<Value> {
        self.referred().ok_or(ValueError::NullReference)
    }

    pub fn referred(&self) -> Option<Value> {
        self.core.slot.read().referent.clone()
    }

    pub fn declared_type(&self) -> Option<TypeId> {
        self.core.slot.read().declared
    }

    pub fn is_null(&self) -> bool {
        self.core.slot.read().referent.is_none()
    }

    /// Null with neither referent nor declared type.
    pub fn is_generic_null(&self) -> bool {
        let slot = self.core.slot.read();
        slot.referent.is_none() && slot.declared.is_none()
    }

    pub fn is_const(&self) -> bool {
        self.core.konst.load(Ordering::SeqCst)
    }

    pub fn seal(&self) {
        self.core.konst.store(true, Ordering::SeqCst);
    }

    pub(crate) fn storage(&self) -> &StorageCell {
        &self.core.storage
    }

    pub fn same_cell(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.core, &other.core)
    }

    /// The type this reference presents: the referent's runtime type,
    /// or the declared type for a typed null.
    pub fn presented_type(&self, pool: &TypePool) -> Option<TypeId> {
        let slot = self.core.slot.read();
        match &slot.referent {
            Some(value) => value.type_id(pool),
            None => slot.declared,
        }
    }

    /// Assignment into another value; the caller has already handled
    /// const, liveness, and untyped targets.
    pub(crate) fn assign_into(&self, target: &Value, pool: &TypePool) -> ValueResult<AssignResult> {
        let Value::Reference(target_ref) = target else {
            return Err(ValueError::illegal_assignment(
                self.describe(pool),
                target.type_name(pool),
            ));
        };

        // A generic null erases the target's referent but keeps its
        // declared type.
        if self.is_generic_null() {
            target_ref.set_referent(None);
            return Ok(AssignResult::Exact);
        }

        let Some(src_ty) = self.presented_type(pool) else {
            return Err(ValueError::internal("reference presents no type"));
        };
        let referent = self.referred();

        let Some(tgt_ty) = target_ref.declared_type() else {
            // A slot with no declared type accepts any reference as-is.
            target_ref.set_referent(referent);
            return Ok(AssignResult::Exact);
        };

        if src_ty == tgt_ty {
            let incoming = match referent {
                // Equal string slots copy by value.
                Some(value) if src_ty == TypeId::STRING => {
                    Some(copy_string(&value, target_ref, pool)?)
                }
                other => other,
            };
            target_ref.set_referent(incoming);
            return Ok(AssignResult::Exact);
        }
        if pool.is_derived_from(src_ty, tgt_ty, false) {
            // The assignment succeeds but the static view narrows.
            target_ref.set_referent(referent);
            return Ok(AssignResult::Lossy);
        }
        Err(ValueError::illegal_assignment(
            pool.type_name(src_ty),
            pool.type_name(tgt_ty),
        ))
    }

    pub(crate) fn set_referent(&self, referent: Option<Value>) {
        self.core.slot.write().referent = referent;
    }

    /// Reference equality. Null equals null when at least one side is
    /// generic, or when the two declared types are related by
    /// derivation. A non-null reference compares through its referent.
    pub(crate) fn ref_equals(&self, other: &Value, pool: &TypePool) -> bool {
        if !self.is_null() {
            // Defer to the referent's own equality rules.
            if let Some(referent) = self.referred() {
                return referent.is_equal_to(other, pool);
            }
        }
        match other {
            Value::Reference(other_ref) if other_ref.is_null() => {
                if self.is_generic_null() || other_ref.is_generic_null() {
                    return true;
                }
                match (self.declared_type(), other_ref.declared_type()) {
                    (Some(a), Some(b)) => {
                        pool.is_derived_from(a, b, true) || pool.is_derived_from(b, a, true)
                    }
                    _ => true,
                }
            }
            _ => false,
        }
    }

    fn describe(&self, pool: &TypePool) -> String {
        match self.presented_type(pool) {
            Some(ty) => pool.type_name(ty),
            None => "null".into(),
        }
    }
}

/// Replicate a string referent into the target slot's area.
fn copy_string(value: &Value, target_ref: &RefValue, pool: &TypePool) -> ValueResult<Value> {
    let Value::Object(obj) = value else {
        return Err(ValueError::internal("string reference without string object"));
    };
    let Some(text) = obj.as_str() else {
        return Err(ValueError::internal("string reference without string object"));
    };
    let area = target_ref.storage().owner_area();
    let copy = ObjectValue::new_string(pool, area.as_ref(), &text)?;
    Ok(Value::Object(copy))
}

#[derive(Debug)]
struct UntypedCore {
    actual: RwLock<Value>,
    konst: AtomicBool,
    storage: StorageCell,
}

/// A box holding exactly one value of any non-untyped kind.
#[derive(Clone, Debug)]
pub struct UntypedValue {
    core: Arc<UntypedCore>,
}

impl UntypedValue {
    /// Box an initial value. The boxed content is a replica, so later
    /// writes to the source do not show through the box.
    pub fn new(area: Option<&MemoryArea>, initial: &Value, pool: &TypePool) -> ValueResult<Self> {
        let this = Self {
            core: Arc::new(UntypedCore {
                actual: RwLock::new(Value::Void),
                konst: AtomicBool::new(false),
                storage: StorageCell::stored_in(area),
            }),
        };
        this.rebox(initial, pool)?;
        Ok(this)
    }

    /// The boxed value.
    pub fn actual(&self) -> Value {
        self.core.actual.read().clone()
    }

    /// Replace the boxed content. Boxing an untyped value boxes its
    /// content instead, so boxes never nest.
    pub(crate) fn rebox(&self, incoming: &Value, pool: &TypePool) -> ValueResult<()> {
        let incoming = match incoming {
            Value::Untyped(inner) => inner.actual(),
            Value::Void => {
                return Err(ValueError::illegal_assignment("void", "any"));
            }
            other => other.clone(),
        };
        let area = self.core.storage.owner_area();
        let boxed = util::replicate(pool, area.as_ref(), &incoming)?;
        *self.core.actual.write() = boxed;
        Ok(())
    }

    pub fn is_const(&self) -> bool {
        self.core.konst.load(Ordering::SeqCst)
    }

    pub fn seal(&self) {
        self.core.konst.store(true, Ordering::SeqCst);
    }

    pub(crate) fn storage(&self) -> &StorageCell {
        &self.core.storage
    }

    pub fn same_cell(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.core, &other.core)
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    reason = "tests use unwrap to panic on unexpected state"
)]
