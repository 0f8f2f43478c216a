//! Function values.
//!
//! A function value pairs a callable type with runtime state: an
//! optional captured receiver, a binding table of pre-set locals, and
//! the instance members every function carries as an instance of the
//! builtin `Function` class. Method groups bundle same-named overloads
//! behind one value.
//!
//! Function values are always const; the handle can be copied and
//! stored but the underlying function never changes.

use std::sync::Arc;

use parking_lot::RwLock;

use quill_types::{CallableKind, TypeId, TypePool};

use crate::errors::{ValueError, ValueResult};
use crate::memory::{MemoryArea, StorageCell};
use crate::value::member_storage::MemberStorage;
use crate::value::Value;

/// Ordered name-to-value bindings folded into a callable.
#[derive(Clone, Debug, Default)]
pub struct BindingTable {
    entries: Vec<(String, Value)>,
}

impl BindingTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(entry, _)| entry == name)
            .map(|(_, value)| value)
    }

    /// Insert or replace a binding, keeping first-insertion order.
    pub fn insert(&mut self, name: impl Into<String>, value: Value) {
        let name = name.into();
        match self.entries.iter_mut().find(|(entry, _)| *entry == name) {
            Some(slot) => slot.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries
            .iter()
            .map(|(name, value)| (name.as_str(), value))
    }
}

#[derive(Debug)]
struct FuncCore {
    callable: TypeId,
    this: Option<Value>,
    bindings: RwLock<BindingTable>,
    members: MemberStorage,
    group: Vec<FuncValue>,
    display: Option<String>,
    storage: StorageCell,
}

/// A callable value.
#[derive(Clone, Debug)]
pub struct FuncValue {
    core: Arc<FuncCore>,
}

impl FuncValue {
    /// A free function declared at global scope.
    pub fn global(pool: &TypePool, area: Option<&MemoryArea>, callable: TypeId) -> ValueResult<Self> {
        Self::create(pool, area, callable, None, BindingTable::new(), None, Vec::new(), true)
    }

    /// An anonymous function carrying its display form.
    pub fn lambda(
        pool: &TypePool,
        area: Option<&MemoryArea>,
        callable: TypeId,
        display: Option<String>,
    ) -> ValueResult<Self> {
        Self::create(pool, area, callable, None, BindingTable::new(), display, Vec::new(), true)
    }

    /// An instance method bound to its receiver.
    pub fn instance_method(
        pool: &TypePool,
        area: Option<&MemoryArea>,
        callable: TypeId,
        this: Value,
        init_members: bool,
    ) -> ValueResult<Self> {
        Self::create(
            pool,
            area,
            callable,
            Some(this),
            BindingTable::new(),
            None,
            Vec::new(),
            init_members,
        )
    }

    /// A static method or constructor value with no receiver.
    pub fn detached(
        pool: &TypePool,
        area: Option<&MemoryArea>,
        callable: TypeId,
        init_members: bool,
    ) -> ValueResult<Self> {
        Self::create(
            pool,
            area,
            callable,
            None,
            BindingTable::new(),
            None,
            Vec::new(),
            init_members,
        )
    }

    /// Bundle same-named overloads behind one value. The group's
    /// callable type is derived from the member types.
    pub fn method_group(
        pool: &TypePool,
        area: Option<&MemoryArea>,
        members: Vec<FuncValue>,
    ) -> ValueResult<Self> {
        let overloads: Vec<TypeId> = members.iter().map(FuncValue::callable_type).collect();
        let group_ty = pool
            .register_method_group(overloads)
            .ok_or_else(|| ValueError::argument("members"))?;
        Self::create(
            pool,
            area,
            group_ty,
            None,
            BindingTable::new(),
            None,
            members,
            true,
        )
    }

    /// Build a function value for a member declaration, of whatever
    /// flavor its callable data calls for.
    pub(crate) fn from_callable(
        pool: &TypePool,
        area: Option<&MemoryArea>,
        callable: TypeId,
        this: Option<Value>,
        init_members: bool,
    ) -> ValueResult<Self> {
        let data = pool
            .callable_data(callable)
            .ok_or_else(|| ValueError::internal("function value over a non-callable type"))?;
        if data.kind == CallableKind::MethodGroup {
            return Err(ValueError::internal(
                "method groups are built from their member values",
            ));
        }
        Self::create(
            pool,
            area,
            callable,
            this,
            BindingTable::new(),
            None,
            Vec::new(),
            init_members,
        )
    }

    /// Rebuild with explicit state; used when binding derives a new
    /// function from an existing one.
    pub(crate) fn with_state(
        pool: &TypePool,
        area: Option<&MemoryArea>,
        callable: TypeId,
        this: Option<Value>,
        bindings: BindingTable,
        display: Option<String>,
    ) -> ValueResult<Self> {
        Self::create(pool, area, callable, this, bindings, display, Vec::new(), true)
    }

    #[allow(clippy::too_many_arguments)]
    fn create(
        pool: &TypePool,
        area: Option<&MemoryArea>,
        callable: TypeId,
        this: Option<Value>,
        bindings: BindingTable,
        display: Option<String>,
        group: Vec<FuncValue>,
        init_members: bool,
    ) -> ValueResult<Self> {
        let func = Self {
            core: Arc::new(FuncCore {
                callable,
                this,
                bindings: RwLock::new(bindings),
                members: MemberStorage::empty(),
                group,
                display,
                storage: StorageCell::stored_in(area),
            }),
        };
        let self_value = Value::Function(func.clone());
        // Non-method members of the Function class (currently none).
        func.core
            .members
            .populate_instance(pool, area, TypeId::FUNCTION, &self_value, false)?;
        if init_members {
            func.core
                .members
                .populate_function_members(pool, area, &self_value)?;
        }
        Ok(func)
    }

    pub fn callable_type(&self) -> TypeId {
        self.core.callable
    }

    pub fn kind(&self, pool: &TypePool) -> Option<CallableKind> {
        pool.callable_data(self.core.callable).map(|data| data.kind)
    }

    /// The captured receiver, if any.
    pub fn this(&self) -> Option<Value> {
        self.core.this.clone()
    }

    /// Snapshot of the binding table.
    pub fn bindings(&self) -> BindingTable {
        self.core.bindings.read().clone()
    }

    pub fn display_form(&self) -> Option<&str> {
        self.core.display.as_deref()
    }

    /// Overload members of a method group; empty for plain functions.
    pub fn overloads(&self) -> &[FuncValue] {
        &self.core.group
    }

    /// Resolve a member carried as an instance of the Function class.
    pub fn member(&self, name: &str) -> ValueResult<Value> {
        self.core
            .members
            .first_value(name)
            .ok_or_else(|| ValueError::UnknownMember {
                name: name.to_string(),
            })
    }

    pub(crate) fn members(&self) -> &MemberStorage {
        &self.core.members
    }

    /// Function values never unseal.
    pub fn is_const(&self) -> bool {
        true
    }

    pub(crate) fn storage(&self) -> &StorageCell {
        &self.core.storage
    }

    pub fn same_function(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.core, &other.core)
    }

    /// Script-facing name: a lambda's display form, else the callable's
    /// declared name.
    pub fn display_name(&self, pool: &TypePool) -> String {
        if let Some(display) = &self.core.display {
            return display.clone();
        }
        match pool.callable_data(self.core.callable) {
            Some(data) => data.name.clone(),
            None => "<function>".into(),
        }
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    reason = "tests use unwrap to panic on unexpected state"
)]
mod tests;
