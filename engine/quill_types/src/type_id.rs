//! Unified type index handle.
//!
//! `TypeId` is THE canonical type representation.
//! All types are stored in a unified pool and referenced by their 32-bit index.
//!
//! # Design
//!
//! - 32-bit indices allow 4+ billion unique types
//! - Builtin types have fixed indices (0-10) for O(1) lookup
//! - Type equality is O(1) index comparison
//! - Copy, lightweight passing

use std::fmt;

/// A 32-bit index into the type pool.
///
/// Types are compared by index equality (O(1)), not structural comparison.
#[derive(Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct TypeId(u32);

impl TypeId {
    // === Builtin Types (indices 0-10) ===
    // These are pre-interned at pool creation for O(1) access.

    /// The `bool` type.
    pub const BOOL: Self = Self(0);
    /// The `byte` type (8-bit unsigned integer).
    pub const BYTE: Self = Self(1);
    /// The `char` type (Unicode scalar value).
    pub const CHAR: Self = Self(2);
    /// The `int` type (64-bit signed integer).
    pub const INT: Self = Self(3);
    /// The `float` type (64-bit floating point).
    pub const FLOAT: Self = Self(4);
    /// The `void` type (no value).
    pub const VOID: Self = Self(5);
    /// The `any` type (top of the conversion lattice; untyped storage).
    pub const ANY: Self = Self(6);
    /// The builtin `Object` class, root of the class hierarchy.
    pub const OBJECT: Self = Self(7);
    /// The builtin `String` class.
    pub const STRING: Self = Self(8);
    /// The builtin `Dynamic` class.
    pub const DYNAMIC: Self = Self(9);
    /// The builtin `Function` class, runtime class of all callables.
    pub const FUNCTION: Self = Self(10);

    // === Reserved Range (11-15) ===
    // Reserved for future builtin types.

    /// First index for dynamically registered types.
    pub const FIRST_DYNAMIC: u32 = 16;

    /// Number of pre-interned builtin types.
    pub const BUILTIN_COUNT: u32 = 11;

    /// Create an index from a raw u32 value.
    ///
    /// The caller must ensure the index is valid in the pool.
    #[inline]
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    /// Get the raw u32 value.
    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Check if this is a builtin type (pre-interned).
    #[inline]
    pub const fn is_builtin(self) -> bool {
        self.0 < Self::BUILTIN_COUNT
    }

    /// Check if this is one of the five basic scalar types.
    #[inline]
    pub const fn is_basic(self) -> bool {
        self.0 <= Self::FLOAT.0
    }
}

impl fmt::Debug for TypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::BOOL => write!(f, "TypeId(bool)"),
            Self::BYTE => write!(f, "TypeId(byte)"),
            Self::CHAR => write!(f, "TypeId(char)"),
            Self::INT => write!(f, "TypeId(int)"),
            Self::FLOAT => write!(f, "TypeId(float)"),
            Self::VOID => write!(f, "TypeId(void)"),
            Self::ANY => write!(f, "TypeId(any)"),
            Self::OBJECT => write!(f, "TypeId(Object)"),
            Self::STRING => write!(f, "TypeId(String)"),
            Self::DYNAMIC => write!(f, "TypeId(Dynamic)"),
            Self::FUNCTION => write!(f, "TypeId(Function)"),
            Self(raw) => write!(f, "TypeId({raw})"),
        }
    }
}
