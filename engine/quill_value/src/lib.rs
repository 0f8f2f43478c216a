//! Runtime value layer for the Quill engine.
//!
//! Everything a running script touches lives here:
//! - [`Value`]: the kind-dispatched handle over scalars, references,
//!   untyped boxes, objects, arrays, functions and type values
//! - [`MemoryArea`] / [`StackArea`]: arena ownership with recycling and
//!   liveness checks, so a popped frame invalidates its values
//! - the assignment protocol, equality rules and explicit replication
//! - inheritance-aware member storage and the function binder
//!
//! Types come from `quill_types`; a [`quill_types::TypePool`] handle is
//! threaded explicitly through every operation that needs one.

pub mod binder;
mod errors;
mod memory;
pub mod temp;
mod util;
mod value;

pub use errors::{AssignResult, ValueError, ValueResult};
pub use memory::{AreaKind, MemoryArea, StackArea, STACK_DEPTH_LIMIT};
pub use util::{default_value, replicate};
pub use value::{
    ArrayValue, ArrayValueBuilder, BindingTable, BoolValue, BuiltinKind, ByteValue, CharValue,
    Dim, DynamicConfig, FloatValue, FuncValue, IntValue, ObjectMember, ObjectValue, RefValue,
    Scalar, ScalarPayload, ScalarValue, TypeValue, UntypedValue, Value, ValueComparer, ValueKind,
};

#[cfg(test)]
mod test_helpers;
