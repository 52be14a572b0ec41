//! Record types flowing through the enrichment pipeline.
//!
//! This module provides:
//! - [`StreamId`] — Identity of one source stream
//! - [`RawLine`] — A single physical line as read from a source
//! - [`LogicalRecord`] — One semantically complete log entry, possibly
//!   reassembled from several physical lines
//! - [`FieldValue`] / [`FieldMap`] — Typed extracted fields
//! - [`ParsedRecord`] — A logical record plus the first matching parser's output
//! - [`EnrichedRecord`] — The final dispatch unit with static tags applied
//!
//! Each type is consumed exactly once by the next pipeline stage; nothing is
//! re-read upstream.

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identity of one source stream (for example one container's stdout).
///
/// Ordering guarantees hold within a stream; no ordering is promised across
/// distinct streams.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StreamId(String);

impl StreamId {
    /// Returns the stream id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for StreamId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for StreamId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for StreamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A single physical line as read from a source stream.
///
/// Immutable once read. `(stream, sequence)` is strictly increasing per
/// stream and is the pipeline's ordering key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawLine {
    /// The stream this line arrived on.
    pub stream: StreamId,
    /// Position within the stream, starting at 1.
    pub sequence: u64,
    /// When the reader received the line.
    pub received_at: DateTime<Utc>,
    /// Line text, already decoded (best-effort) and stripped of the
    /// trailing newline.
    pub text: String,
}

/// One semantically complete log entry.
///
/// `text` is the newline-join of one or more contiguous [`RawLine`]s from
/// the same stream; `received_at` is the first constituent line's receive
/// time. Invariant: `first_sequence <= last_sequence`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogicalRecord {
    /// The stream every constituent line arrived on.
    pub stream: StreamId,
    /// Sequence number of the first constituent line.
    pub first_sequence: u64,
    /// Sequence number of the last constituent line.
    pub last_sequence: u64,
    /// Receive time of the first constituent line.
    pub received_at: DateTime<Utc>,
    /// The reassembled record text.
    pub text: String,
}

impl LogicalRecord {
    /// Builds a single-line record from one raw line.
    #[must_use]
    pub fn from_raw(line: RawLine) -> Self {
        Self {
            stream: line.stream,
            first_sequence: line.sequence,
            last_sequence: line.sequence,
            received_at: line.received_at,
            text: line.text,
        }
    }

    /// Builds a single-line record directly from text (test and embedding
    /// convenience; `received_at` is stamped now).
    #[must_use]
    pub fn from_text(stream: StreamId, sequence: u64, text: impl Into<String>) -> Self {
        Self {
            stream,
            first_sequence: sequence,
            last_sequence: sequence,
            received_at: Utc::now(),
            text: text.into(),
        }
    }

    /// Number of physical lines folded into this record.
    #[must_use]
    pub fn line_count(&self) -> u64 {
        self.last_sequence - self.first_sequence + 1
    }
}

/// A typed extracted field value.
///
/// The structured parser types numeric and boolean fields faithfully; they
/// are never stringified on their way downstream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// A boolean field.
    Bool(bool),
    /// A whole-number field.
    Integer(i64),
    /// A floating-point field.
    Float(f64),
    /// A text field.
    String(String),
}

impl FieldValue {
    /// Returns the text of a string field, `None` for other variants.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Integer(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::String(s) => f.write_str(s),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

/// Flat mapping of field name to extracted value.
pub type FieldMap = HashMap<String, FieldValue>;

/// A logical record plus the output of the first matching parser.
///
/// If no parser matched, `parser` is `None` and `fields` is empty; the
/// record itself propagates unchanged.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedRecord {
    /// The underlying logical record.
    pub record: LogicalRecord,
    /// Name of the parser whose output was used, if any.
    pub parser: Option<String>,
    /// Fields extracted by that parser (empty when `parser` is `None`).
    pub fields: FieldMap,
}

impl ParsedRecord {
    /// Builds the pass-through form: no parser matched, empty fields.
    #[must_use]
    pub fn unparsed(record: LogicalRecord) -> Self {
        Self {
            record,
            parser: None,
            fields: FieldMap::new(),
        }
    }
}

/// The unit handed to the sink dispatcher.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedRecord {
    /// Receive time of the record's first physical line.
    pub timestamp: DateTime<Utc>,
    /// The stream the record arrived on.
    pub stream: StreamId,
    /// Name of the parser whose output was used, if any.
    pub parser: Option<String>,
    /// Parser fields unioned with static tags; on collision the static tag
    /// value is authoritative.
    pub fields: FieldMap,
    /// The correlation identifier, lifted from `fields` when present.
    /// Downstream consumers index this as an exact-match term.
    pub correlation_id: Option<String>,
    /// The original reassembled text, always carried verbatim.
    pub raw_text: String,
}
