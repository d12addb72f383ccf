//! Error types for the Redline engine.

use crate::Range;
use thiserror::Error;

/// All possible errors from the Redline engine.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    /// A merge was attempted without the mergeability precondition holding.
    /// This is a caller bug, not a runtime condition.
    #[error("invalid operation: {0}")]
    InvalidOperation(String),

    // Deserialization errors
    #[error("malformed input: {0}")]
    MalformedInput(String),

    // Collection errors
    #[error("tracked change at {incoming} overlaps incompatible change at {existing}")]
    OverlappingChanges { existing: Range, incoming: Range },
}

impl Error {
    pub(crate) fn malformed(err: impl std::fmt::Display) -> Self {
        Error::MalformedInput(err.to_string())
    }
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, Error>;
