//! Scalar value handles and payload conversion.
//!
//! The five scalar kinds share one generic handle, [`ScalarValue`],
//! holding a payload cell, a const seal, and a storage slot. Conversion
//! between payloads goes through the [`Scalar`] enum, which implements
//! the numeric rules the conversion matrix declares legal.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;

use quill_types::{BasicKind, TypeId};

use crate::errors::{ValueError, ValueResult};
use crate::memory::{MemoryArea, StorageCell};

/// Payload types backing the scalar kinds.
pub trait ScalarPayload: Copy + PartialEq + Send + Sync + 'static {
    const KIND: BasicKind;

    fn wrap(self) -> Scalar;
    fn unwrap(scalar: Scalar) -> Option<Self>;
}

macro_rules! scalar_payload {
    ($ty:ty, $kind:ident, $variant:ident) => {
        impl ScalarPayload for $ty {
            const KIND: BasicKind = BasicKind::$kind;

            fn wrap(self) -> Scalar {
                Scalar::$variant(self)
            }

            fn unwrap(scalar: Scalar) -> Option<Self> {
                match scalar {
                    Scalar::$variant(v) => Some(v),
                    _ => None,
                }
            }
        }
    };
}

scalar_payload!(bool, Bool, Bool);
scalar_payload!(u8, Byte, Byte);
scalar_payload!(char, Char, Char);
scalar_payload!(i64, Int, Int);
scalar_payload!(f64, Float, Float);

#[derive(Debug)]
struct ScalarCore<T> {
    cell: RwLock<T>,
    konst: AtomicBool,
    storage: StorageCell,
}

/// A mutable scalar cell with const sealing and storage liveness.
#[derive(Debug)]
pub struct ScalarValue<T: ScalarPayload> {
    core: Arc<ScalarCore<T>>,
}

impl<T: ScalarPayload> Clone for ScalarValue<T> {
    fn clone(&self) -> Self {
        Self {
            core: Arc::clone(&self.core),
        }
    }
}

pub type BoolValue = ScalarValue<bool>;
pub type ByteValue = ScalarValue<u8>;
pub type CharValue = ScalarValue<char>;
pub type IntValue = ScalarValue<i64>;
pub type FloatValue = ScalarValue<f64>;

impl<T: ScalarPayload> ScalarValue<T> {
    /// Create a scalar in an area, or a temp when `area` is `None`.
    pub fn new(area: Option<&MemoryArea>, v: T) -> Self {
        Self {
            core: Arc::new(ScalarCore {
                cell: RwLock::new(v),
                konst: AtomicBool::new(false),
                storage: StorageCell::stored_in(area),
            }),
        }
    }

    pub fn get(&self) -> T {
        *self.core.cell.read()
    }

    /// Checked write: fails on sealed or dead storage.
    pub fn set(&self, v: T) -> ValueResult<()> {
        self.core.storage.ensure_live()?;
        if self.is_const() {
            return Err(ValueError::ConstViolation);
        }
        *self.core.cell.write() = v;
        Ok(())
    }

    /// Raw write used by the assignment protocol after its own checks.
    pub(crate) fn set_raw(&self, v: T) {
        *self.core.cell.write() = v;
    }

    pub fn scalar(&self) -> Scalar {
        self.get().wrap()
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

    /// Two handles over the same cell.
    pub fn same_cell(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.core, &other.core)
    }
}

/// A scalar payload detached from any cell.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Scalar {
    Bool(bool),
    Byte(u8),
    Char(char),
    Int(i64),
    Float(f64),
}

impl Scalar {
    pub fn kind(self) -> BasicKind {
        match self {
            Self::Bool(_) => BasicKind::Bool,
            Self::Byte(_) => BasicKind::Byte,
            Self::Char(_) => BasicKind::Char,
            Self::Int(_) => BasicKind::Int,
            Self::Float(_) => BasicKind::Float,
        }
    }

    pub fn type_id(self) -> TypeId {
        match self.kind() {
            BasicKind::Bool => TypeId::BOOL,
            BasicKind::Byte => TypeId::BYTE,
            BasicKind::Char => TypeId::CHAR,
            BasicKind::Int => TypeId::INT,
            BasicKind::Float => TypeId::FLOAT,
        }
    }

    /// Perform the conversion the matrix declares for this pair.
    /// `None` exactly when the pair is unconvertible.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn convert_to(self, target: BasicKind) -> Option<Scalar> {
        use BasicKind::{Bool, Byte, Char, Float, Int};
        Some(match (self, target) {
            (v, t) if v.kind() == t => v,

            (Self::Bool(v), Byte) => Scalar::Byte(u8::from(v)),
            (Self::Bool(v), Int) => Scalar::Int(i64::from(v)),
            (Self::Bool(_), Char | Float) => return None,

            (Self::Byte(v), Bool) => Scalar::Bool(v != 0),
            (Self::Byte(v), Char) => Scalar::Char(char::from(v)),
            (Self::Byte(v), Int) => Scalar::Int(i64::from(v)),
            (Self::Byte(v), Float) => Scalar::Float(f64::from(v)),

            (Self::Char(v), Byte) => Scalar::Byte(v as u32 as u8),
            (Self::Char(v), Int) => Scalar::Int(i64::from(u32::from(v))),
            (Self::Char(_), Bool | Float) => return None,

            (Self::Int(v), Bool) => Scalar::Bool(v != 0),
            (Self::Int(v), Byte) => Scalar::Byte(v as u8),
            // Only the 7-bit range maps to a character; everything else
            // collapses to NUL.
            (Self::Int(v), Char) => Scalar::Char(if (0..=127).contains(&v) {
                char::from(v as u8)
            } else {
                '\0'
            }),
            (Self::Int(v), Float) => Scalar::Float(v as f64),

            (Self::Float(v), Byte) => Scalar::Byte(v.trunc() as i64 as u8),
            // Truncation toward zero.
            (Self::Float(v), Int) => Scalar::Int(v.trunc() as i64),
            (Self::Float(_), Bool | Char) => return None,

            _ => return None,
        })
    }

    /// Render the scalar the way script-facing string conversion does.
    pub fn format(self) -> String {
        match self {
            Self::Bool(v) => v.to_string(),
            Self::Byte(v) => v.to_string(),
            Self::Char(v) => v.to_string(),
            Self::Int(v) => v.to_string(),
            // Debug formatting keeps the decimal point on whole floats.
            Self::Float(v) => format!("{v:?}"),
        }
    }

    /// Parse script-facing text into a target scalar kind.
    pub fn parse(text: &str, target: BasicKind) -> Option<Scalar> {
        let text = text.trim();
        match target {
            BasicKind::Bool => text.parse::<bool>().ok().map(Scalar::Bool),
            BasicKind::Byte => text.parse::<u8>().ok().map(Scalar::Byte),
            BasicKind::Char => {
                let mut chars = text.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Some(Scalar::Char(c)),
                    _ => None,
                }
            }
            BasicKind::Int => text.parse::<i64>().ok().map(Scalar::Int),
            BasicKind::Float => text.parse::<f64>().ok().map(Scalar::Float),
        }
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    reason = "tests use unwrap to panic on unexpected state"
)]
