//! Pipeline configuration.
//!
//! Serde-friendly configuration types plus the builders that turn them into
//! running components (compiling patterns along the way, so every
//! configuration mistake surfaces at startup rather than mid-stream).

use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::enricher::Enricher;
use crate::error::{PipelineError, Result};
use crate::parser::{JsonParser, LineParser, ParserChain, PatternParser};
use crate::reader::DEFAULT_MAX_LINE_LENGTH;
use crate::reassembler::{DEFAULT_MAX_BUFFERED_LINES, Reassembler, StartPredicate};
use crate::types::{FieldValue, StreamId};

/// Default start predicate: a line beginning with an ISO-8601-style
/// timestamp starts a new record.
pub const DEFAULT_START_PATTERN: &str = r"^\d{4}-\d{2}-\d{2}[T ]\d{2}:\d{2}:\d{2}";

/// Default inactivity flush timeout in milliseconds.
pub const DEFAULT_IDLE_FLUSH_MS: u64 = 2_000;

/// Multiline reassembly settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReassemblyConfig {
    /// Pattern matching the first line of a new logical record.
    #[serde(default = "default_start_pattern")]
    pub start_pattern: String,
    /// Maximum physical lines buffered in one open record before a forced
    /// flush.
    #[serde(default = "default_max_buffered_lines")]
    pub max_buffered_lines: usize,
    /// Inactivity timeout after which an open record is flushed, in
    /// milliseconds.
    #[serde(default = "default_idle_flush_ms")]
    pub idle_flush_ms: u64,
}

fn default_start_pattern() -> String {
    DEFAULT_START_PATTERN.to_string()
}

const fn default_max_buffered_lines() -> usize {
    DEFAULT_MAX_BUFFERED_LINES
}

const fn default_idle_flush_ms() -> u64 {
    DEFAULT_IDLE_FLUSH_MS
}

impl Default for ReassemblyConfig {
    fn default() -> Self {
        Self {
            start_pattern: default_start_pattern(),
            max_buffered_lines: default_max_buffered_lines(),
            idle_flush_ms: default_idle_flush_ms(),
        }
    }
}

impl ReassemblyConfig {
    /// Returns the idle flush timeout as a [`Duration`].
    #[must_use]
    pub const fn idle_flush(&self) -> Duration {
        Duration::from_millis(self.idle_flush_ms)
    }
}

/// One configured parser, in chain order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ParserSpec {
    /// Strict JSON-object parsing.
    Json {
        /// Parser name recorded on matched records.
        name: String,
    },
    /// Named-capture pattern extraction.
    Pattern {
        /// Parser name recorded on matched records.
        name: String,
        /// Regex with at least one named capture group.
        pattern: String,
    },
}

impl ParserSpec {
    /// Returns the configured parser name.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Json { name } | Self::Pattern { name, .. } => name,
        }
    }
}

/// Complete pipeline configuration for one deployment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Multiline reassembly settings.
    #[serde(default)]
    pub reassembly: ReassemblyConfig,
    /// Parsers in the order they are tried.
    #[serde(default)]
    pub parsers: Vec<ParserSpec>,
    /// Infrastructure-owned tags applied to every record; authoritative on
    /// name collisions with parser output.
    #[serde(default)]
    pub static_tags: HashMap<String, String>,
    /// Field name under which the correlation identifier travels.
    #[serde(default = "default_correlation_field")]
    pub correlation_field: String,
    /// Maximum length of one physical line, in bytes.
    #[serde(default = "default_max_line_length")]
    pub max_line_length: usize,
}

fn default_correlation_field() -> String {
    weave_context::config::DEFAULT_FIELD_NAME.to_string()
}

const fn default_max_line_length() -> usize {
    DEFAULT_MAX_LINE_LENGTH
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            reassembly: ReassemblyConfig::default(),
            parsers: Vec::new(),
            static_tags: HashMap::new(),
            correlation_field: default_correlation_field(),
            max_line_length: default_max_line_length(),
        }
    }
}

impl PipelineConfig {
    /// Validates the configuration, compiling every pattern once.
    ///
    /// # Errors
    ///
    /// Returns the first problem found: an uncompilable pattern, a pattern
    /// parser without named groups, a duplicate parser name, or an empty
    /// correlation field name.
    pub fn validate(&self) -> Result<()> {
        if self.correlation_field.trim().is_empty() {
            return Err(PipelineError::Config(
                "correlation field name cannot be empty".to_string(),
            ));
        }
        let mut seen = std::collections::HashSet::new();
        for spec in &self.parsers {
            if !seen.insert(spec.name()) {
                return Err(PipelineError::Config(format!(
                    "duplicate parser name '{}'",
                    spec.name()
                )));
            }
        }
        StartPredicate::new(&self.reassembly.start_pattern)?;
        self.build_chain()?;
        Ok(())
    }

    /// Builds the parser chain in configured order.
    ///
    /// # Errors
    ///
    /// Returns an error if any parser spec is invalid.
    pub fn build_chain(&self) -> Result<ParserChain> {
        let mut parsers = Vec::with_capacity(self.parsers.len());
        for spec in &self.parsers {
            parsers.push(match spec {
                ParserSpec::Json { name } => LineParser::Json(JsonParser::new(name)),
                ParserSpec::Pattern { name, pattern } => {
                    LineParser::Pattern(PatternParser::new(name, pattern)?)
                }
            });
        }
        Ok(ParserChain::new(parsers))
    }

    /// Builds a reassembler instance for one stream.
    ///
    /// # Errors
    ///
    /// Returns an error if the start pattern does not compile.
    pub fn build_reassembler(&self, stream: StreamId) -> Result<Reassembler> {
        let start = StartPredicate::new(&self.reassembly.start_pattern)?;
        Ok(Reassembler::new(
            stream,
            start,
            self.reassembly.max_buffered_lines,
        ))
    }

    /// Builds the enricher shared by all streams.
    #[must_use]
    pub fn build_enricher(&self) -> Enricher {
        let tags = self
            .static_tags
            .iter()
            .map(|(k, v)| (k.clone(), FieldValue::String(v.clone())))
            .collect();
        Enricher::new(tags, self.correlation_field.clone())
    }
}
