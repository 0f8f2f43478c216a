//! Class instance values.
//!
//! One handle type covers plain class instances and the three builtin
//! flavors that carry native payloads: strings (immutable-by-copy
//! text), enum constants (ordinal plus literal), and dynamic objects
//! (a free-form member map with per-object policy flags).
//!
//! Instance members are populated from the class's member table at
//! construction: every field of every rank gets a default value, every
//! method a function member bound to this instance.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use quill_types::{TypeId, TypeKind, TypePool};

use crate::binder;
use crate::errors::{ValueError, ValueResult};
use crate::memory::{MemoryArea, StorageCell};
use crate::value::member_storage::{member_function, MemberStorage, ObjectMember};
use crate::value::reference::RefValue;
use crate::value::scalar::IntValue;
use crate::value::func::FuncValue;
use crate::value::Value;

/// Which native payload an object carries.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum BuiltinKind {
    Plain,
    Str,
    Enum,
    Dynamic,
}

/// Per-object policy for dynamic objects.
#[derive(Copy, Clone, Debug, Default)]
pub struct DynamicConfig {
    /// Reject writes once initialization completes.
    pub sealed_after_init: bool,
    /// Reading an absent member errors instead of answering null.
    pub throw_on_undefined: bool,
    /// Function values stored as members capture this object as their
    /// receiver.
    pub autobind: bool,
}

#[derive(Debug)]
struct DynamicBody {
    map: RwLock<FxHashMap<String, Value>>,
    sealed: AtomicBool,
    config: DynamicConfig,
}

#[derive(Debug)]
enum Payload {
    Plain,
    Str(RwLock<String>),
    Enum,
    Dynamic(DynamicBody),
}

#[derive(Debug)]
struct ObjectCore {
    class: TypeId,
    payload: Payload,
    members: MemberStorage,
    konst: AtomicBool,
    storage: StorageCell,
}

/// A class instance.
#[derive(Clone, Debug)]
pub struct ObjectValue {
    core: Arc<ObjectCore>,
}

impl ObjectValue {
    /// A plain instance of a class, members default-initialized.
    pub fn new(pool: &TypePool, area: Option<&MemoryArea>, class: TypeId) -> ValueResult<Self> {
        let this = Self::raw(area, class, Payload::Plain)?;
        this.populate(pool, area)?;
        Ok(this)
    }

    /// A string instance carrying native text.
    pub fn new_string(pool: &TypePool, area: Option<&MemoryArea>, text: &str) -> ValueResult<Self> {
        let this = Self::raw(area, TypeId::STRING, Payload::Str(RwLock::new(text.to_string())))?;
        this.populate(pool, area)?;
        this.write_length(text.chars().count() as i64);
        if let Some(Value::Int(length)) = this.core.members.first_value("length") {
            length.seal();
        }
        Ok(this)
    }

    /// An enum constant instance.
    pub fn new_enum(
        pool: &TypePool,
        area: Option<&MemoryArea>,
        class: TypeId,
        ordinal: i64,
        literal: &str,
    ) -> ValueResult<Self> {
        let is_enum = pool
            .class_data(class)
            .is_some_and(|data| data.enum_literals.is_some());
        if !is_enum {
            return Err(ValueError::argument("class"));
        }
        let this = Self::raw(area, class, Payload::Enum)?;
        this.populate(pool, area)?;

        let ordinal_member = IntValue::new(area, ordinal);
        ordinal_member.seal();
        this.core
            .members
            .add("ordinal", 0, Value::Int(ordinal_member));

        let literal_obj = ObjectValue::new_string(pool, area, literal)?;
        let literal_ref = RefValue::new(area, Value::Object(literal_obj), None, pool)?;
        literal_ref.seal();
        this.core
            .members
            .add("literal", 0, Value::Reference(literal_ref));
        Ok(this)
    }

    /// A dynamic object with the given policy.
    pub fn new_dynamic(
        pool: &TypePool,
        area: Option<&MemoryArea>,
        config: DynamicConfig,
    ) -> ValueResult<Self> {
        let this = Self::raw(
            area,
            TypeId::DYNAMIC,
            Payload::Dynamic(DynamicBody {
                map: RwLock::new(FxHashMap::default()),
                sealed: AtomicBool::new(false),
                config,
            }),
        )?;
        this.populate(pool, area)?;
        Ok(this)
    }

    fn raw(area: Option<&MemoryArea>, class: TypeId, payload: Payload) -> ValueResult<Self> {
        Ok(Self {
            core: Arc::new(ObjectCore {
                class,
                payload,
                members: MemberStorage::empty(),
                konst: AtomicBool::new(false),
                storage: StorageCell::stored_in(area),
            }),
        })
    }

    fn populate(&self, pool: &TypePool, area: Option<&MemoryArea>) -> ValueResult<()> {
        if pool.kind(self.core.class) != Some(TypeKind::Class) {
            return Err(ValueError::argument("class"));
        }
        let this = Value::Object(self.clone());
        self.core
            .members
            .populate_instance(pool, area, self.core.class, &this, true)
    }

    pub fn class(&self) -> TypeId {
        self.core.class
    }

    pub fn builtin_kind(&self) -> BuiltinKind {
        match &self.core.payload {
            Payload::Plain => BuiltinKind::Plain,
            Payload::Str(_) => BuiltinKind::Str,
            Payload::Enum => BuiltinKind::Enum,
            Payload::Dynamic(_) => BuiltinKind::Dynamic,
        }
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

    pub fn same_instance(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.core, &other.core)
    }

    // === String payload ===

    pub fn as_str(&self) -> Option<String> {
        match &self.core.payload {
            Payload::Str(text) => Some(text.read().clone()),
            _ => None,
        }
    }

    /// Replace the native text. The length member tracks the new text.
    pub fn set_string(&self, text: &str) -> ValueResult<()> {
        self.core.storage.ensure_live()?;
        if self.is_const() {
            return Err(ValueError::ConstViolation);
        }
        let Payload::Str(cell) = &self.core.payload else {
            return Err(ValueError::argument("text"));
        };
        *cell.write() = text.to_string();
        self.write_length(text.chars().count() as i64);
        Ok(())
    }

    fn write_length(&self, length: i64) {
        if let Some(Value::Int(member)) = self.core.members.first_value("length") {
            member.set_raw(length);
        }
    }

    // === Enum payload ===

    pub fn ordinal(&self) -> Option<i64> {
        match self.core.members.first_value("ordinal") {
            Some(Value::Int(member)) if self.builtin_kind() == BuiltinKind::Enum => {
                Some(member.get())
            }
            _ => None,
        }
    }

    pub fn literal(&self) -> Option<String> {
        if self.builtin_kind() != BuiltinKind::Enum {
            return None;
        }
        match self.core.members.first_value("literal")?.deref() {
            Value::Object(obj) => obj.as_str(),
            _ => None,
        }
    }

    // === Dynamic payload ===

    fn dynamic_body(&self) -> ValueResult<&DynamicBody> {
        match &self.core.payload {
            Payload::Dynamic(body) => Ok(body),
            _ => Err(ValueError::argument("dynamic object")),
        }
    }

    /// Read a dynamic member. Absent members answer `None`, or error
    /// when the object was configured to throw on undefined reads.
    pub fn dynamic_get(&self, name: &str) -> ValueResult<Option<Value>> {
        let body = self.dynamic_body()?;
        match body.map.read().get(name) {
            Some(value) => Ok(Some(value.clone())),
            None if body.config.throw_on_undefined => Err(ValueError::UnknownMember {
                name: name.to_string(),
            }),
            None => Ok(None),
        }
    }

    /// Write a dynamic member, honoring sealing and autobinding.
    pub fn dynamic_set(&self, pool: &TypePool, name: &str, value: &Value) -> ValueResult<()> {
        self.core.storage.ensure_live()?;
        let body = self.dynamic_body()?;
        if body.sealed.load(Ordering::SeqCst) {
            return Err(ValueError::ConstViolation);
        }
        let stored = if body.config.autobind {
            match self.autobind(pool, value)? {
                Some(bound) => bound,
                None => value.clone(),
            }
        } else {
            value.clone()
        };
        body.map.write().insert(name.to_string(), stored);
        Ok(())
    }

    fn autobind(&self, pool: &TypePool, value: &Value) -> ValueResult<Option<Value>> {
        let Value::Function(func) = value.deref() else {
            return Ok(None);
        };
        let this = Value::Object(self.clone());
        let area = self.core.storage.owner_area();
        let bound = binder::bind(pool, area.as_ref(), &func, Some(&this), &[])?;
        Ok(Some(Value::Function(bound)))
    }

    pub fn dynamic_len(&self) -> ValueResult<usize> {
        Ok(self.dynamic_body()?.map.read().len())
    }

    /// Snapshot of the member map; iteration never observes later writes.
    pub fn dynamic_entries(&self) -> ValueResult<Vec<(String, Value)>> {
        Ok(self
            .dynamic_body()?
            .map
            .read()
            .iter()
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect())
    }

    pub fn seal_dynamic(&self) -> ValueResult<()> {
        self.dynamic_body()?.sealed.store(true, Ordering::SeqCst);
        Ok(())
    }

    /// Mark initialization finished, sealing when the policy asks for it.
    pub fn complete_init(&self) -> ValueResult<()> {
        let body = self.dynamic_body()?;
        if body.config.sealed_after_init {
            body.sealed.store(true, Ordering::SeqCst);
        }
        Ok(())
    }

    // === Members ===

    /// Resolve one member value. Dynamic objects answer from their map
    /// (null for absent members unless configured to throw); class
    /// instances answer from member storage.
    pub fn member(&self, name: &str) -> ValueResult<Value> {
        if self.builtin_kind() == BuiltinKind::Dynamic {
            return Ok(self
                .dynamic_get(name)?
                .unwrap_or_else(|| Value::Reference(RefValue::generic_null(None))));
        }
        self.core
            .members
            .first_value(name)
            .ok_or_else(|| ValueError::UnknownMember {
                name: name.to_string(),
            })
    }

    /// All entries a name resolves to when viewed from an anchor class.
    pub fn members_by_name(
        &self,
        pool: &TypePool,
        name: &str,
        anchor: Option<TypeId>,
        include_nonvisible: bool,
    ) -> ValueResult<SmallVec<[ObjectMember; 1]>> {
        self.core
            .members
            .get_by_name(pool, name, anchor, include_nonvisible)
    }

    /// The function values behind a method member name.
    pub fn method_members(&self, pool: &TypePool, name: &str) -> ValueResult<Vec<FuncValue>> {
        let members = self.members_by_name(pool, name, None, true)?;
        Ok(members
            .iter()
            .filter_map(|member| member_function(member.value()))
            .collect())
    }

    pub(crate) fn members(&self) -> &MemberStorage {
        &self.core.members
    }

    /// Object equality: identity for plain and dynamic objects, content
    /// for strings, class plus ordinal for enum constants.
    pub fn object_equals(&self, other: &ObjectValue) -> bool {
        if self.same_instance(other) {
            return true;
        }
        match (self.builtin_kind(), other.builtin_kind()) {
            (BuiltinKind::Str, BuiltinKind::Str) => self.as_str() == other.as_str(),
            (BuiltinKind::Enum, BuiltinKind::Enum) => {
                self.core.class == other.core.class && self.ordinal() == other.ordinal()
            }
            _ => false,
        }
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    reason = "tests use unwrap to panic on unexpected state"
)]
