//! Multiline record reassembly.
//!
//! Stack traces and other continuation lines arrive as independent physical
//! lines. The [`Reassembler`] folds them back into one [`LogicalRecord`]
//! using a two-state machine driven by a *start predicate*:
//!
//! - No buffer open: a line matching the predicate opens a new buffer. A
//!   line that does not match cannot continue anything, so it is emitted
//!   immediately as its own single-line record (explicit policy, not loss).
//! - Buffer open: a non-matching line is appended, newline-joined. A
//!   matching line closes the open buffer — emitting it — and opens a new
//!   one.
//!
//! A buffer is also closed by [`Reassembler::flush`], which the stream
//! worker invokes at end of input, on the inactivity timeout, and on
//! shutdown; and by reaching the buffered-line bound, which caps memory on a
//! stream that never produces a start-matching line.
//!
//! One reassembler serves exactly one stream. Interleaved streams each get
//! their own instance, so their state can never merge.

use chrono::{DateTime, Utc};
use regex::Regex;
use tracing::trace;

use crate::error::{PipelineError, Result};
use crate::types::{LogicalRecord, RawLine, StreamId};

/// Default bound on buffered lines per open record.
pub const DEFAULT_MAX_BUFFERED_LINES: usize = 256;

/// Decides whether a physical line begins a new logical record.
///
/// Typically anchored at the line start (for example a timestamp prefix).
/// The continuation predicate is implicitly its negation.
#[derive(Debug, Clone)]
pub struct StartPredicate {
    regex: Regex,
}

impl StartPredicate {
    /// Compiles a start predicate from a regex pattern.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidPattern`] if the pattern does not
    /// compile.
    pub fn new(pattern: &str) -> Result<Self> {
        let regex = Regex::new(pattern).map_err(|e| PipelineError::InvalidPattern {
            pattern: pattern.to_string(),
            source: Box::new(e),
        })?;
        Ok(Self { regex })
    }

    /// Returns true if the line begins a new logical record.
    #[must_use]
    pub fn matches(&self, line: &str) -> bool {
        self.regex.is_match(line)
    }

    /// Returns the pattern text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }
}

/// An open, not-yet-emitted record buffer.
#[derive(Debug)]
struct OpenBuffer {
    first_sequence: u64,
    last_sequence: u64,
    received_at: DateTime<Utc>,
    text: String,
    line_count: usize,
}

impl OpenBuffer {
    fn open(line: RawLine) -> Self {
        Self {
            first_sequence: line.sequence,
            last_sequence: line.sequence,
            received_at: line.received_at,
            text: line.text,
            line_count: 1,
        }
    }

    fn append(&mut self, line: &RawLine) {
        self.text.push('\n');
        self.text.push_str(&line.text);
        self.last_sequence = line.sequence;
        self.line_count += 1;
    }

    fn into_record(self, stream: StreamId) -> LogicalRecord {
        LogicalRecord {
            stream,
            first_sequence: self.first_sequence,
            last_sequence: self.last_sequence,
            received_at: self.received_at,
            text: self.text,
        }
    }
}

/// The per-stream multiline state machine.
#[derive(Debug)]
pub struct Reassembler {
    stream: StreamId,
    start: StartPredicate,
    max_buffered_lines: usize,
    open: Option<OpenBuffer>,
}

impl Reassembler {
    /// Creates a reassembler for one stream.
    ///
    /// `max_buffered_lines` bounds how many physical lines one open record
    /// may hold before it is force-flushed; values below 2 are clamped to 2
    /// (a record always holds its start line, so a smaller bound could
    /// never be honored).
    #[must_use]
    pub fn new(stream: StreamId, start: StartPredicate, max_buffered_lines: usize) -> Self {
        Self {
            stream,
            start,
            max_buffered_lines: max_buffered_lines.max(2),
            open: None,
        }
    }

    /// Returns the stream this reassembler serves.
    #[must_use]
    pub const fn stream(&self) -> &StreamId {
        &self.stream
    }

    /// Returns true if a record buffer is currently open.
    #[must_use]
    pub const fn has_open_record(&self) -> bool {
        self.open.is_some()
    }

    /// Feeds one line through the state machine.
    ///
    /// Returns a completed record when this line closed one: either the
    /// previously open buffer (a new start line arrived), a single
    /// orphaned continuation line, or a buffer force-flushed at the line
    /// bound.
    pub fn push(&mut self, line: RawLine) -> Option<LogicalRecord> {
        if self.start.matches(&line.text) {
            let finished = self.open.take().map(|b| b.into_record(self.stream.clone()));
            self.open = Some(OpenBuffer::open(line));
            return finished;
        }

        match self.open.take() {
            Some(mut buffer) => {
                buffer.append(&line);
                if buffer.line_count >= self.max_buffered_lines {
                    trace!(
                        stream = %self.stream,
                        lines = buffer.line_count,
                        "record reached buffered-line bound, force flushing"
                    );
                    return Some(buffer.into_record(self.stream.clone()));
                }
                self.open = Some(buffer);
                None
            }
            // Nothing to continue: the stream's first line (or the line
            // after a force flush) failed the start predicate. Emit it on
            // its own rather than dropping it.
            None => Some(LogicalRecord::from_raw(line)),
        }
    }

    /// Emits the open buffer, if any.
    ///
    /// Invoked at end of input, on the inactivity timeout, and on shutdown,
    /// so a record near stream termination is never held indefinitely.
    pub fn flush(&mut self) -> Option<LogicalRecord> {
        self.open.take().map(|b| b.into_record(self.stream.clone()))
    }
}
