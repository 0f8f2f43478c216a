//! Per-type values: static member storage and the reflective object.
//!
//! A type value is the runtime stand-in for a type itself. For classes
//! it owns the static members; for enum classes it additionally carries
//! one const member per constant. The reflective object, used by
//! script-level introspection, is created lazily on first request and
//! cached for the type value's lifetime.

use std::sync::{Arc, OnceLock};

use quill_types::{MemberKind, TypeId, TypeKind, TypePool};

use crate::errors::{ValueError, ValueResult};
use crate::memory::{MemoryArea, StorageCell};
use crate::value::member_storage::MemberStorage;
use crate::value::object::ObjectValue;
use crate::value::reference::RefValue;
use crate::value::Value;

#[derive(Debug)]
struct TypeValueCore {
    of: TypeId,
    members: MemberStorage,
    reflective: OnceLock<Value>,
    storage: StorageCell,
}

/// The runtime value representing a type.
#[derive(Clone, Debug)]
pub struct TypeValue {
    core: Arc<TypeValueCore>,
}

impl TypeValue {
    pub fn new(pool: &TypePool, area: Option<&MemoryArea>, of: TypeId) -> ValueResult<Self> {
        let this = Self {
            core: Arc::new(TypeValueCore {
                of,
                members: MemberStorage::empty(),
                reflective: OnceLock::new(),
                storage: StorageCell::stored_in(area),
            }),
        };
        if pool.kind(of) == Some(TypeKind::Class) {
            this.core.members.populate_static(pool, area, of)?;
            if let Some(literals) = pool.class_data(of).and_then(|data| data.enum_literals.clone())
            {
                this.install_enum_constants(pool, area, &literals)?;
            }
        }
        Ok(this)
    }

    /// One sealed member per enum constant, in ordinal order.
    fn install_enum_constants(
        &self,
        pool: &TypePool,
        area: Option<&MemoryArea>,
        literals: &[String],
    ) -> ValueResult<()> {
        for (ordinal, literal) in literals.iter().enumerate() {
            let constant =
                ObjectValue::new_enum(pool, area, self.core.of, ordinal as i64, literal)?;
            let member_ref = RefValue::new(area, Value::Object(constant), Some(self.core.of), pool)?;
            member_ref.seal();
            self.core.members.add(literal, 0, Value::Reference(member_ref));
        }
        Ok(())
    }

    pub fn represented(&self) -> TypeId {
        self.core.of
    }

    /// Resolve a static member (or enum constant) by name.
    pub fn static_member(&self, name: &str) -> ValueResult<Value> {
        self.core
            .members
            .first_value(name)
            .ok_or_else(|| ValueError::UnknownMember {
                name: name.to_string(),
            })
    }

    pub fn static_member_names(&self) -> Vec<String> {
        self.core.members.names()
    }

    /// Seal every const-declared static field. Called once the class
    /// initializer has written the real values.
    pub fn seal_consts(&self, pool: &TypePool) {
        let table = pool.member_table(self.core.of, true);
        for rank in 0..table.rank_count() {
            for (name, decls) in table.declared_at(rank) {
                for decl in decls {
                    if decl.kind == MemberKind::Field && decl.is_const {
                        if let Some(member) = self.core.members.first_value(name) {
                            member.seal();
                        }
                    }
                }
            }
        }
    }

    /// The lazily created reflective object. The factory runs at most
    /// once; concurrent callers race to install and share one result.
    pub fn reflective(
        &self,
        make: impl FnOnce() -> ValueResult<Value>,
    ) -> ValueResult<Value> {
        if let Some(existing) = self.core.reflective.get() {
            return Ok(existing.clone());
        }
        let made = make()?;
        Ok(self.core.reflective.get_or_init(|| made).clone())
    }

    /// Type values are immutable.
    pub fn is_const(&self) -> bool {
        true
    }

    pub(crate) fn storage(&self) -> &StorageCell {
        &self.core.storage
    }

    /// Two type values are equal when they represent the same type.
    pub fn type_equals(&self, other: &TypeValue) -> bool {
        self.core.of == other.core.of
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    reason = "tests use unwrap to panic on unexpected state"
)]
mod tests;
