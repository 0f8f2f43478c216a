//! Error types for runtime value operations.
//!
//! Every fallible value operation returns [`ValueResult`]. The variants
//! carry structured data so callers can match on the condition instead
//! of parsing message strings; the `Display` impl renders the message a
//! script-facing diagnostic would show.

use std::fmt;

/// Result of a value operation.
pub type ValueResult<T> = Result<T, ValueError>;

/// How an assignment completed.
///
/// `Exact` means the rules either matched types directly or widened
/// without loss. `Lossy` means the assignment succeeded through a
/// demoting or narrowing conversion, or narrowed the static view of a
/// subtype.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum AssignResult {
    Exact,
    Lossy,
}

impl AssignResult {
    #[inline]
    pub fn is_exact(self) -> bool {
        matches!(self, Self::Exact)
    }
}

/// Typed error category for value operations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ValueError {
    // Mutation
    /// Write attempted against a value sealed as const.
    ConstViolation,
    /// No conversion path exists between the two types.
    IllegalAssignment {
        from: String,
        to: String,
    },
    /// An explicit cast was requested but no cast path exists.
    IllegalCasting {
        from: String,
        to: String,
    },

    // Arrays
    ArrayIndexOutOfRange {
        index: i64,
        max: i64,
    },

    // Functions
    IllegalBinding {
        reason: String,
    },

    // Storage
    /// The value's backing storage has been recycled.
    NotStored,
    /// The value is already owned by a live memory area.
    AlreadyStored,
    StackOverflow {
        depth: usize,
    },

    // Access
    NullReference,
    UnknownMember {
        name: String,
    },

    /// A host-supplied argument failed validation.
    ArgumentError {
        name: String,
    },

    /// Invariant breach inside the value layer itself.
    Internal {
        message: String,
    },
}

impl ValueError {
    pub fn illegal_assignment(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self::IllegalAssignment {
            from: from.into(),
            to: to.into(),
        }
    }

    pub fn illegal_casting(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self::IllegalCasting {
            from: from.into(),
            to: to.into(),
        }
    }

    pub fn illegal_binding(reason: impl Into<String>) -> Self {
        Self::IllegalBinding {
            reason: reason.into(),
        }
    }

    pub fn argument(name: impl Into<String>) -> Self {
        Self::ArgumentError { name: name.into() }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}

impl fmt::Display for ValueError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            // Mutation
            Self::ConstViolation => write!(f, "cannot modify a const value"),
            Self::IllegalAssignment { from, to } => {
                write!(f, "cannot assign a value of type {from} to type {to}")
            }
            Self::IllegalCasting { from, to } => {
                write!(f, "cannot cast a value of type {from} to type {to}")
            }

            // Arrays
            Self::ArrayIndexOutOfRange { index, max } => {
                write!(f, "array index {index} out of range (max: {max})")
            }

            // Functions
            Self::IllegalBinding { reason } => write!(f, "illegal binding: {reason}"),

            // Storage
            Self::NotStored => write!(f, "value is no longer backed by live storage"),
            Self::AlreadyStored => write!(f, "value is already stored in a memory area"),
            Self::StackOverflow { depth } => {
                write!(f, "maximum stack depth exceeded (limit: {depth})")
            }

            // Access
            Self::NullReference => write!(f, "null reference"),
            Self::UnknownMember { name } => write!(f, "unknown member: {name}"),

            Self::ArgumentError { name } => write!(f, "invalid argument: {name}"),
            Self::Internal { message } => write!(f, "internal error: {message}"),
        }
    }
}

impl std::error::Error for ValueError {}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn display_renders_structured_data() {
        assert_eq!(
            ValueError::illegal_assignment("float", "char").to_string(),
            "cannot assign a value of type float to type char"
        );
        assert_eq!(
            ValueError::ArrayIndexOutOfRange { index: 9, max: 3 }.to_string(),
            "array index 9 out of range (max: 3)"
        );
        assert_eq!(
            ValueError::StackOverflow { depth: 200 }.to_string(),
            "maximum stack depth exceeded (limit: 200)"
        );
    }

    #[test]
    fn assign_result_exactness() {
        assert!(AssignResult::Exact.is_exact());
        assert!(!AssignResult::Lossy.is_exact());
    }
}
