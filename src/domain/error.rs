//! Domain-level errors (no external dependencies)

use std::fmt;

use thiserror::Error;

/// Why a bracket expression was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MalformedReason {
    /// The text ended where a bracket was expected.
    UnexpectedEnd,
    /// An open bracket was never closed.
    Unterminated,
    /// A close bracket appeared without a matching open bracket.
    UnmatchedClose,
    /// Something other than a bracket or whitespace.
    UnexpectedCharacter(char),
    /// No bracket group at all.
    Empty,
}

impl fmt::Display for MalformedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MalformedReason::UnexpectedEnd => write!(f, "unexpected end of expression"),
            MalformedReason::Unterminated => write!(f, "open bracket is never closed"),
            MalformedReason::UnmatchedClose => write!(f, "close bracket without matching open"),
            MalformedReason::UnexpectedCharacter(c) => write!(f, "unexpected character '{c}'"),
            MalformedReason::Empty => write!(f, "expression contains no brackets"),
        }
    }
}

/// Domain errors represent structural violations.
/// These are independent of infrastructure concerns.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    #[error("malformed expression at index {index}: {reason}")]
    MalformedExpression { index: usize, reason: MalformedReason },

    #[error("child index {index} out of range (node has {len} children)")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("unknown instrument: {0}")]
    UnknownInstrument(String),

    #[error("invalid instrument {name}: {message}")]
    InvalidInstrument { name: String, message: String },
}

impl DomainError {
    pub(crate) fn malformed(index: usize, reason: MalformedReason) -> Self {
        Self::MalformedExpression { index, reason }
    }
}

/// Result type for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
