//! Convertibility classification between types.
//!
//! The scalar matrix below is the single source of truth for conversions
//! among the five basic scalar types. Class-to-class and composite rules
//! live on the pool, which consults hierarchy information.

use crate::data::BasicKind;

/// How a value of one type relates to a target type under conversion.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Convertibility {
    /// Same type, or an alias of it.
    Equivalent,
    /// Widening conversion that preserves the value exactly.
    Promoted,
    /// Narrowing conversion that may lose information.
    Demoted,
    /// Representable only through an explicit reinterpretation.
    Castable,
    /// Subtype assigned to a supertype slot; the static view narrows.
    Downgraded,
    /// Supertype to subtype; legal only with a checked cast.
    Unsafe,
    /// No conversion exists.
    Unconvertible,
}

impl Convertibility {
    /// Conversions an assignment may perform implicitly.
    #[inline]
    pub fn is_safe(self) -> bool {
        matches!(
            self,
            Self::Equivalent | Self::Promoted | Self::Demoted | Self::Downgraded
        )
    }

    /// Whether any conversion path exists at all.
    #[inline]
    pub fn is_convertible(self) -> bool {
        !matches!(self, Self::Unconvertible)
    }
}

/// The scalar conversion matrix. Rows are the source kind, columns the
/// target kind, both in `bool, byte, char, int, float` order.
pub fn scalar_convertibility(from: BasicKind, to: BasicKind) -> Convertibility {
    use BasicKind::{Bool, Byte, Char, Float, Int};
    use Convertibility::{Castable, Demoted, Equivalent, Promoted, Unconvertible};

    match (from, to) {
        (Bool, Bool) | (Byte, Byte) | (Char, Char) | (Int, Int) | (Float, Float) => Equivalent,

        (Bool, Byte) | (Bool, Int) => Castable,
        (Bool, Char) | (Bool, Float) => Unconvertible,

        (Byte, Bool) | (Byte, Char) => Castable,
        (Byte, Int) | (Byte, Float) => Promoted,

        (Char, Byte) | (Char, Int) => Castable,
        (Char, Bool) | (Char, Float) => Unconvertible,

        (Int, Bool) | (Int, Char) => Castable,
        (Int, Byte) => Demoted,
        (Int, Float) => Promoted,

        (Float, Byte) | (Float, Int) => Demoted,
        (Float, Bool) | (Float, Char) => Unconvertible,
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    reason = "tests use unwrap to panic on unexpected state"
)]
mod tests;
