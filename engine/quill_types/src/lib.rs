//! Type layer for the Quill engine.
//!
//! This crate owns the runtime's notion of a type:
//! - [`TypeId`]: 32-bit interned handle, the only type representation
//! - [`TypePool`]: append-only storage, pre-interned builtins, explicit
//!   handle passed to every consumer (no global instance)
//! - [`Convertibility`]: the scalar conversion matrix and hierarchy-aware
//!   classification used by assignment and casting
//! - [`MemberTable`]: rank-flattened class hierarchies with
//!   override-aware member resolution
//!
//! The value layer (`quill_value`) builds on these to implement the
//! runtime value semantics.

mod convert;
mod data;
mod member;
mod pool;
mod type_id;

pub use convert::{scalar_convertibility, Convertibility};
pub use data::{
    Accessibility, BasicKind, CallableData, CallableKind, ClassData, MemberDecl, MemberKind, Param,
    TypeData, TypeKind,
};
pub use member::{member_signature, LoadedMember, MemberTable};
pub use pool::{CallableView, ClassView, TypePool};
pub use type_id::TypeId;

// Size assertions to prevent accidental regressions.
// TypeId is embedded in every runtime value handle.
#[cfg(target_pointer_width = "64")]
const _: () = assert!(std::mem::size_of::<TypeId>() == 4);
