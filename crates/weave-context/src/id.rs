//! The correlation identifier token.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{ContextError, Result};

/// Maximum accepted length for an externally supplied identifier.
///
/// Anything longer is rejected so a proxy cannot smuggle arbitrary payloads
/// into every downstream log line.
pub const MAX_ID_LENGTH: usize = 128;

/// An opaque per-request correlation token.
///
/// The token is attached to every log line produced while serving one
/// request, so all of those lines can later be retrieved as a single set
/// from the log index. The value itself carries no structure; equality is
/// the only meaningful operation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CorrelationId(String);

impl CorrelationId {
    /// Generates a fresh identifier (UUID v4, simple form).
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    /// Validates and adopts an externally supplied identifier.
    ///
    /// The value is trimmed; it must then be non-empty, at most
    /// [`MAX_ID_LENGTH`] characters, and consist only of visible ASCII
    /// characters. Rejecting instead of sanitizing keeps the token an exact
    /// match for what the caller will search for later.
    ///
    /// # Errors
    ///
    /// Returns an error describing the first violated constraint.
    pub fn parse(value: &str) -> Result<Self> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(ContextError::EmptyId);
        }
        if trimmed.len() > MAX_ID_LENGTH {
            return Err(ContextError::IdTooLong {
                max: MAX_ID_LENGTH,
                len: trimmed.len(),
            });
        }
        if let Some(bad) = trimmed.chars().find(|c| !c.is_ascii_graphic()) {
            return Err(ContextError::InvalidCharacter(bad));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<CorrelationId> for String {
    fn from(id: CorrelationId) -> Self {
        id.0
    }
}
