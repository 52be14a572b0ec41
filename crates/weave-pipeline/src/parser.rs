//! Ordered first-match field extraction.
//!
//! This module provides:
//! - [`JsonParser`] — Strict structured parsing of JSON-object log lines
//! - [`PatternParser`] — Named-capture extraction from unstructured text
//! - [`LineParser`] — The closed set of parser variants behind one
//!   `attempt` capability
//! - [`ParserChain`] — An explicit ordered list; the first parser to
//!   succeed wins and later parsers are never consulted
//!
//! A parser succeeds by returning a non-empty field mapping. A record no
//! parser understands passes through with empty fields — classification
//! failure is a normal outcome, not an error.
//!
//! Parsers are stateless and reentrant; one chain is shared read-only
//! across every stream worker.

use regex::Regex;
use serde_json::Value;
use tracing::trace;

use crate::error::{PipelineError, Result};
use crate::types::{FieldMap, FieldValue, LogicalRecord, ParsedRecord};

/// Strict structured-format parser for JSON-object log lines.
///
/// All-or-nothing: the whole line must be one valid JSON object, and the
/// object must yield at least one usable field. Partially valid input never
/// produces partial fields.
#[derive(Debug, Clone)]
pub struct JsonParser {
    name: String,
}

impl JsonParser {
    /// Creates a JSON parser with the given configured name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// Returns the configured parser name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Attempts to parse the record text as one JSON object.
    ///
    /// Top-level scalars keep their type: strings, booleans, and numbers
    /// (integer where the value fits `i64`, float otherwise). `null` values
    /// are omitted. Nested arrays and objects are carried as their compact
    /// JSON text so no data is lost to the flat-map contract.
    #[must_use]
    pub fn attempt(&self, text: &str) -> Option<FieldMap> {
        let trimmed = text.trim();
        if !trimmed.starts_with('{') {
            return None;
        }
        let value: Value = serde_json::from_str(trimmed).ok()?;
        let object = value.as_object()?;

        let mut fields = FieldMap::new();
        for (key, value) in object {
            match value {
                Value::Null => {}
                Value::Bool(b) => {
                    fields.insert(key.clone(), FieldValue::Bool(*b));
                }
                Value::Number(n) => {
                    let typed = n
                        .as_i64()
                        .map_or_else(|| FieldValue::Float(n.as_f64().unwrap_or(0.0)), FieldValue::Integer);
                    fields.insert(key.clone(), typed);
                }
                Value::String(s) => {
                    fields.insert(key.clone(), FieldValue::String(s.clone()));
                }
                Value::Array(_) | Value::Object(_) => {
                    fields.insert(key.clone(), FieldValue::String(value.to_string()));
                }
            }
        }

        if fields.is_empty() { None } else { Some(fields) }
    }
}

/// Pattern-extraction parser for unstructured text.
///
/// Applies a fixed regex with named capture groups; succeeds only if the
/// pattern matches, returning the participating captures as string fields.
#[derive(Debug, Clone)]
pub struct PatternParser {
    name: String,
    pattern: Regex,
}

impl PatternParser {
    /// Compiles a pattern parser.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidPattern`] if the pattern does not
    /// compile, and [`PipelineError::Config`] if it has no named capture
    /// groups (such a parser could never produce fields).
    pub fn new(name: impl Into<String>, pattern: &str) -> Result<Self> {
        let name = name.into();
        let compiled = Regex::new(pattern).map_err(|e| PipelineError::InvalidPattern {
            pattern: pattern.to_string(),
            source: Box::new(e),
        })?;
        if compiled.capture_names().flatten().next().is_none() {
            return Err(PipelineError::Config(format!(
                "pattern parser '{name}' has no named capture groups"
            )));
        }
        Ok(Self {
            name,
            pattern: compiled,
        })
    }

    /// Returns the configured parser name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Attempts to match the pattern and extract named captures.
    #[must_use]
    pub fn attempt(&self, text: &str) -> Option<FieldMap> {
        let captures = self.pattern.captures(text)?;

        let mut fields = FieldMap::new();
        for name in self.pattern.capture_names().flatten() {
            if let Some(m) = captures.name(name) {
                fields.insert(name.to_string(), FieldValue::String(m.as_str().to_string()));
            }
        }

        if fields.is_empty() { None } else { Some(fields) }
    }
}

/// The closed set of parser variants.
///
/// Modeled as a tagged enum, not trait objects: the set is fixed by
/// configuration, and a closed type keeps the first-match loop and its
/// tie-break behavior directly testable.
#[derive(Debug, Clone)]
pub enum LineParser {
    /// Strict JSON-object parsing.
    Json(JsonParser),
    /// Named-capture pattern extraction.
    Pattern(PatternParser),
}

impl LineParser {
    /// Returns the configured parser name.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Json(p) => p.name(),
            Self::Pattern(p) => p.name(),
        }
    }

    /// Attempts to extract fields; `None` means this parser does not match.
    #[must_use]
    pub fn attempt(&self, text: &str) -> Option<FieldMap> {
        match self {
            Self::Json(p) => p.attempt(text),
            Self::Pattern(p) => p.attempt(text),
        }
    }
}

/// An ordered list of parsers applied first-match-wins.
///
/// Order is configuration, not accident: when several parsers would match
/// the same record, the earliest configured one is used and the rest are
/// never tried.
#[derive(Debug, Clone, Default)]
pub struct ParserChain {
    parsers: Vec<LineParser>,
}

impl ParserChain {
    /// Creates a chain from parsers in configured order.
    #[must_use]
    pub fn new(parsers: Vec<LineParser>) -> Self {
        Self { parsers }
    }

    /// Returns the number of configured parsers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.parsers.len()
    }

    /// Returns true if no parsers are configured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.parsers.is_empty()
    }

    /// Classifies one record.
    ///
    /// Tries each parser in configured order; the first success wins. If
    /// none succeeds the record passes through unchanged with empty fields.
    #[must_use]
    pub fn parse(&self, record: LogicalRecord) -> ParsedRecord {
        for parser in &self.parsers {
            if let Some(fields) = parser.attempt(&record.text) {
                trace!(
                    stream = %record.stream,
                    parser = parser.name(),
                    fields = fields.len(),
                    "parser matched"
                );
                return ParsedRecord {
                    record,
                    parser: Some(parser.name().to_string()),
                    fields,
                };
            }
        }
        ParsedRecord::unparsed(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::StreamId;
    use test_case::test_case;

    fn record(text: &str) -> LogicalRecord {
        LogicalRecord::from_text(StreamId::from("s1"), 1, text)
    }

    fn level_pattern() -> PatternParser {
        PatternParser::new(
            "plain",
            r"^(?P<ts>\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}) (?P<level>[A-Z]+) (?P<message>.*)$",
        )
        .expect("pattern")
    }

    // ===========================================
    // JsonParser Tests
    // ===========================================

    #[test]
    fn json_parser_types_fields_faithfully() {
        let parser = JsonParser::new("json");
        let fields = parser
            .attempt(r#"{"msg":"ok","code":200,"ratio":0.5,"cached":false}"#)
            .expect("match");

        assert_eq!(fields.get("msg"), Some(&FieldValue::String("ok".into())));
        assert_eq!(fields.get("code"), Some(&FieldValue::Integer(200)));
        assert_eq!(fields.get("ratio"), Some(&FieldValue::Float(0.5)));
        assert_eq!(fields.get("cached"), Some(&FieldValue::Bool(false)));
    }

    #[test]
    fn json_parser_omits_nulls_and_flattens_nested() {
        let parser = JsonParser::new("json");
        let fields = parser
            .attempt(r#"{"a":null,"nested":{"x":1},"list":[1,2]}"#)
            .expect("match");

        assert!(!fields.contains_key("a"));
        assert_eq!(
            fields.get("nested"),
            Some(&FieldValue::String(r#"{"x":1}"#.into()))
        );
        assert_eq!(fields.get("list"), Some(&FieldValue::String("[1,2]".into())));
    }

    #[test_case(r#"{"truncated":"#  ; "malformed json")]
    #[test_case("plain text line"  ; "not json at all")]
    #[test_case("[1,2,3]"          ; "array not object")]
    #[test_case("{}"               ; "object with no fields")]
    #[test_case(r#"{"only":null}"# ; "object with only null")]
    fn json_parser_is_all_or_nothing(text: &str) {
        assert!(JsonParser::new("json").attempt(text).is_none());
    }

    #[test]
    fn json_parser_tolerates_surrounding_whitespace() {
        let parser = JsonParser::new("json");
        assert!(parser.attempt("  {\"k\":\"v\"}  ").is_some());
    }

    #[test]
    fn json_parser_large_integers_become_floats() {
        let parser = JsonParser::new("json");
        let fields = parser
            .attempt(r#"{"big":18446744073709551615}"#)
            .expect("match");
        assert!(matches!(fields.get("big"), Some(FieldValue::Float(_))));
    }

    // ===========================================
    // PatternParser Tests
    // ===========================================

    #[test]
    fn pattern_parser_extracts_named_captures() {
        let fields = level_pattern()
            .attempt("2025-01-12T09:00:00 ERROR boom")
            .expect("match");

        assert_eq!(
            fields.get("ts"),
            Some(&FieldValue::String("2025-01-12T09:00:00".into()))
        );
        assert_eq!(fields.get("level"), Some(&FieldValue::String("ERROR".into())));
        assert_eq!(fields.get("message"), Some(&FieldValue::String("boom".into())));
    }

    #[test]
    fn pattern_parser_no_match_is_none() {
        assert!(level_pattern().attempt("no timestamp here").is_none());
    }

    #[test]
    fn pattern_parser_omits_nonparticipating_groups() {
        let parser = PatternParser::new(
            "opt",
            r"^(?P<level>[A-Z]+)(?: \[(?P<module>\w+)\])?",
        )
        .expect("pattern");

        let fields = parser.attempt("WARN no module").expect("match");
        assert!(fields.contains_key("level"));
        assert!(!fields.contains_key("module"));
    }

    #[test]
    fn pattern_parser_requires_named_groups() {
        let err = PatternParser::new("anon", r"^(\d+)$").expect_err("must fail");
        assert!(matches!(err, PipelineError::Config(_)));
    }

    #[test]
    fn pattern_parser_rejects_bad_pattern() {
        let err = PatternParser::new("bad", "(unclosed").expect_err("must fail");
        assert!(matches!(err, PipelineError::InvalidPattern { .. }));
    }

    // ===========================================
    // ParserChain Tests
    // ===========================================

    fn default_chain() -> ParserChain {
        ParserChain::new(vec![
            LineParser::Json(JsonParser::new("json")),
            LineParser::Pattern(level_pattern()),
        ])
    }

    #[test]
    fn chain_first_match_wins() {
        // Valid JSON that a permissive pattern would also match: the JSON
        // parser is configured first, so its output is used.
        let chain = ParserChain::new(vec![
            LineParser::Json(JsonParser::new("json")),
            LineParser::Pattern(
                PatternParser::new("greedy", r"^(?P<all>.*)$").expect("pattern"),
            ),
        ]);

        let parsed = chain.parse(record(r#"{"level":"info"}"#));
        assert_eq!(parsed.parser.as_deref(), Some("json"));
        assert_eq!(
            parsed.fields.get("level"),
            Some(&FieldValue::String("info".into()))
        );
        assert!(!parsed.fields.contains_key("all"));
    }

    #[test]
    fn chain_order_is_authoritative() {
        // Same parsers, reversed order: now the pattern parser wins.
        let chain = ParserChain::new(vec![
            LineParser::Pattern(
                PatternParser::new("greedy", r"^(?P<all>.*)$").expect("pattern"),
            ),
            LineParser::Json(JsonParser::new("json")),
        ]);

        let parsed = chain.parse(record(r#"{"level":"info"}"#));
        assert_eq!(parsed.parser.as_deref(), Some("greedy"));
    }

    #[test]
    fn chain_falls_through_to_later_parser() {
        let parsed = default_chain().parse(record("2025-01-12T09:00:00 INFO started"));
        assert_eq!(parsed.parser.as_deref(), Some("plain"));
        assert_eq!(
            parsed.fields.get("level"),
            Some(&FieldValue::String("INFO".into()))
        );
    }

    #[test]
    fn chain_passes_through_unmatched_records() {
        let original = record("completely freeform text");
        let parsed = default_chain().parse(original.clone());

        assert!(parsed.parser.is_none());
        assert!(parsed.fields.is_empty());
        assert_eq!(parsed.record, original);
    }

    #[test]
    fn empty_chain_passes_everything_through() {
        let chain = ParserChain::default();
        assert!(chain.is_empty());

        let parsed = chain.parse(record("anything"));
        assert!(parsed.parser.is_none());
        assert!(parsed.fields.is_empty());
    }

    #[test]
    fn chain_parses_multiline_record_text() {
        // A reassembled stack trace: the pattern must anchor on the full
        // text's first line only if written that way; the default plain
        // pattern requires the whole text to match, so a multiline record
        // falls through to pass-through.
        let text = "2025-01-12T09:00:00 ERROR boom\n  at module.func (file:10)";
        let parsed = default_chain().parse(record(text));
        assert!(parsed.parser.is_none());
        assert_eq!(parsed.record.text, text);
    }
}
