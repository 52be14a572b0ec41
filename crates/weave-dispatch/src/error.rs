//! Error types for sink dispatch.

use thiserror::Error;

/// A single delivery attempt's failure, as reported by a sink.
///
/// The distinction drives the retry loop: transient failures are retried
/// with backoff, permanent ones go straight to the dead-letter destination.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SinkError {
    /// Delivery failed but may succeed on retry (connection reset, timeout,
    /// back-off response from the consumer).
    #[error("transient sink failure: {0}")]
    Transient(String),

    /// Delivery can never succeed for this record (rejected payload,
    /// permanent configuration problem).
    #[error("permanent sink failure: {0}")]
    Permanent(String),
}

impl SinkError {
    /// Returns the failure reason text.
    #[must_use]
    pub fn reason(&self) -> &str {
        match self {
            Self::Transient(reason) | Self::Permanent(reason) => reason,
        }
    }

    /// Returns true if a retry might succeed.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Transient(_))
    }
}

/// Errors that can occur while setting up or running the dispatcher.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// No sinks were configured; records would have nowhere to go.
    #[error("no sinks configured")]
    NoSinks,

    /// An I/O error in the dead-letter or file sink path.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Record serialization failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias for dispatch operations.
pub type Result<T> = std::result::Result<T, DispatchError>;
