//! Per-object member storage and anchored member resolution.
//!
//! An object's members live in a name-keyed map. A name can carry more
//! than one entry: overloaded methods, and members redeclared along the
//! hierarchy. Each entry remembers the rank of its defining class so
//! resolution can answer "what does this name mean when viewed from
//! class X" without re-walking the hierarchy.
//!
//! Function-typed members of the builtin `Function` class are
//! themselves function values, which would recurse forever if each one
//! populated its own methods on construction. The bootstrap path builds
//! them with method population disabled, then cross-wires every created
//! member into every other before installing them.

use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::{FxHashMap, FxHashSet};
use smallvec::SmallVec;

use quill_types::{member_signature, CallableKind, MemberKind, MemberTable, TypeId, TypePool};

use crate::errors::{ValueError, ValueResult};
use crate::memory::MemoryArea;
use crate::util;
use crate::value::func::FuncValue;
use crate::value::reference::RefValue;
use crate::value::Value;

/// A stored member value with the rank of its defining class.
#[derive(Clone, Debug)]
pub struct ObjectMember {
    value: Value,
    rank: usize,
}

impl ObjectMember {
    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn rank(&self) -> usize {
        self.rank
    }
}

/// Name-keyed member map, shared by objects, type values, and functions.
#[derive(Debug)]
pub(crate) struct MemberStorage {
    map: RwLock<FxHashMap<String, SmallVec<[ObjectMember; 1]>>>,
    table: RwLock<Option<Arc<MemberTable>>>,
}

impl MemberStorage {
    pub(crate) fn empty() -> Self {
        Self {
            map: RwLock::new(FxHashMap::default()),
            table: RwLock::new(None),
        }
    }

    /// Populate instance members for one hierarchy: every rank's fields
    /// get a default value; methods become bound function members when
    /// `add_methods` is set.
    pub(crate) fn populate_instance(
        &self,
        pool: &TypePool,
        area: Option<&MemoryArea>,
        class: TypeId,
        this: &Value,
        add_methods: bool,
    ) -> ValueResult<()> {
        let table = pool.member_table(class, false);
        for rank in 0..table.rank_count() {
            for (name, decls) in table.declared_at(rank) {
                for decl in decls {
                    let value = match decl.kind {
                        MemberKind::Field => {
                            util::default_value(pool, area, decl.ty, decl.is_const)?
                        }
                        MemberKind::Method => {
                            if !add_methods {
                                continue;
                            }
                            make_callable_member(pool, area, decl.ty, Some(this), true)?
                        }
                    };
                    self.add(name, rank, value);
                }
            }
        }
        *self.table.write() = Some(table);
        Ok(())
    }

    /// Populate static members. Const fields stay writable until the
    /// owner seals them after class initialization.
    pub(crate) fn populate_static(
        &self,
        pool: &TypePool,
        area: Option<&MemoryArea>,
        class: TypeId,
    ) -> ValueResult<()> {
        let table = pool.member_table(class, true);
        for rank in 0..table.rank_count() {
            for (name, decls) in table.declared_at(rank) {
                for decl in decls {
                    let value = match decl.kind {
                        MemberKind::Field => util::default_value(pool, area, decl.ty, false)?,
                        MemberKind::Method => {
                            make_callable_member(pool, area, decl.ty, None, true)?
                        }
                    };
                    self.add(name, rank, value);
                }
            }
        }
        *self.table.write() = Some(table);
        Ok(())
    }

    /// Bootstrap the `Function` class's own method members onto a
    /// function value. Created members carry each other, so every
    /// function member of a function member resolves without recursing.
    pub(crate) fn populate_function_members(
        &self,
        pool: &TypePool,
        area: Option<&MemoryArea>,
        this: &Value,
    ) -> ValueResult<()> {
        let table = pool.member_table(TypeId::FUNCTION, false);
        let mut created: Vec<(String, usize, Value)> = Vec::new();
        for rank in 0..table.rank_count() {
            for (name, decls) in table.declared_at(rank) {
                for decl in decls {
                    if decl.kind != MemberKind::Method {
                        continue;
                    }
                    let member = make_callable_member(pool, area, decl.ty, Some(this), false)?;
                    created.push((name.to_string(), rank, member));
                }
            }
        }
        // Cross-wire before installing.
        for (_, _, member) in &created {
            if let Some(func) = member_function(member) {
                for (name, rank, other) in &created {
                    func.members().add(name, *rank, other.clone());
                }
            }
        }
        for (name, rank, member) in created {
            self.add(&name, rank, member);
        }
        *self.table.write() = Some(table);
        Ok(())
    }

    pub(crate) fn add(&self, name: &str, rank: usize, value: Value) {
        self.map
            .write()
            .entry(name.to_string())
            .or_default()
            .push(ObjectMember { value, rank });
    }

    /// The first entry under a name, ignoring ranks.
    pub(crate) fn first_value(&self, name: &str) -> Option<Value> {
        self.map
            .read()
            .get(name)
            .and_then(|list| list.first())
            .map(|member| member.value.clone())
    }

    pub(crate) fn names(&self) -> Vec<String> {
        self.map.read().keys().cloned().collect()
    }

    /// Resolve a name as seen from an anchor class.
    ///
    /// Without an anchor the full entry list comes back. With one, the
    /// hierarchy's loaded-member view builds a key set of (signature,
    /// rank) pairs and the stored entries are matched against it until
    /// the set is exhausted.
    pub(crate) fn get_by_name(
        &self,
        pool: &TypePool,
        name: &str,
        anchor: Option<TypeId>,
        include_nonvisible: bool,
    ) -> ValueResult<SmallVec<[ObjectMember; 1]>> {
        let map = self.map.read();
        let Some(list) = map.get(name) else {
            return Ok(SmallVec::new());
        };
        let Some(anchor_class) = anchor else {
            return Ok(list.clone());
        };
        // A single entry cannot be ambiguous.
        if list.len() == 1 {
            return Ok(list.clone());
        }

        let table_guard = self.table.read();
        let Some(table) = table_guard.as_ref() else {
            return Ok(list.clone());
        };
        let Some(rank) = table.rank_of(anchor_class) else {
            return Err(ValueError::argument("anchor"));
        };
        let loaded = table.loaded_by_name(pool, name, rank, include_nonvisible);
        tracing::trace!(%name, rank, candidates = list.len(), loaded = loaded.len(), "anchored member resolution");
        let mut keys: FxHashSet<(String, usize)> = loaded
            .iter()
            .map(|member| (member_signature(pool, &member.decl), member.rank))
            .collect();

        let mut out = SmallVec::new();
        for member in list {
            if keys.is_empty() {
                break;
            }
            let key = (stored_member_signature(pool, member), member.rank);
            if keys.remove(&key) {
                out.push(member.clone());
            }
        }
        Ok(out)
    }
}

/// Build a member value for a callable declaration: the function value
/// of the right flavor, wrapped in a sealed reference.
pub(crate) fn make_callable_member(
    pool: &TypePool,
    area: Option<&MemoryArea>,
    callable: TypeId,
    this: Option<&Value>,
    init_func_members: bool,
) -> ValueResult<Value> {
    let data = pool
        .callable_data(callable)
        .ok_or_else(|| ValueError::internal("member declaration names a non-callable type"))?;
    let this = match data.kind {
        CallableKind::Method if !data.is_static => this.cloned(),
        _ => None,
    };
    let func = FuncValue::from_callable(pool, area, callable, this, init_func_members)?;
    let member_ref = RefValue::new(area, Value::Function(func), Some(callable), pool)?;
    member_ref.seal();
    Ok(Value::Reference(member_ref))
}

/// The function value a stored member wraps, if it is a method member.
pub(crate) fn member_function(member: &Value) -> Option<FuncValue> {
    match member.deref() {
        Value::Function(func) => Some(func),
        _ => None,
    }
}

/// Identity signature of a stored member: the callable signature for
/// method members, empty for fields.
fn stored_member_signature(pool: &TypePool, member: &ObjectMember) -> String {
    match member_function(member.value()) {
        Some(func) => pool.callable_signature(func.callable_type()),
        None => String::new(),
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    reason = "tests use unwrap to panic on unexpected state"
)]
