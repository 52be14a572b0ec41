//! Error types for correlation context handling.

use thiserror::Error;

/// Errors that can occur when handling correlation identifiers.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ContextError {
    /// The supplied identifier was empty after trimming.
    #[error("correlation id is empty")]
    EmptyId,

    /// The supplied identifier exceeds the maximum allowed length.
    #[error("correlation id exceeds {max} characters (got {len})")]
    IdTooLong {
        /// Maximum permitted length.
        max: usize,
        /// Actual length of the rejected value.
        len: usize,
    },

    /// The supplied identifier contains characters outside the permitted set.
    #[error("correlation id contains invalid character {0:?}")]
    InvalidCharacter(char),
}

/// Result type alias for context operations.
pub type Result<T> = std::result::Result<T, ContextError>;
