//! # weave-pipeline
//!
//! The streaming log enrichment pipeline for logweave.
//!
//! This crate provides:
//!
//! - [`RawLine`], [`LogicalRecord`], [`ParsedRecord`], [`EnrichedRecord`] —
//!   The record types flowing through the pipeline
//! - [`LineReader`] — Ordered per-stream line ingestion with best-effort
//!   UTF-8 decoding
//! - [`Reassembler`] — Multiline record reassembly (stack traces and other
//!   continuation lines)
//! - [`ParserChain`] — Ordered first-match field extraction
//! - [`Enricher`] — Static tag overlay and correlation id lift
//! - [`StreamWorker`] — The per-stream task driving all of the above
//!
//! Records move one way: reader → reassembler → parser chain → enricher →
//! dispatch. Each stage consumes its input, and per-stream arrival order is
//! preserved end to end. Nothing is ever dropped: a record no parser
//! understands passes through with empty fields.
//!
//! ## Example
//!
//! ```rust
//! use weave_pipeline::{
//!     Enricher, JsonParser, LineParser, LogicalRecord, ParserChain, StreamId,
//! };
//!
//! let chain = ParserChain::new(vec![LineParser::Json(JsonParser::new("json"))]);
//! let enricher = Enricher::new(Default::default(), "correlation_id");
//!
//! let record = LogicalRecord::from_text(
//!     StreamId::from("checkout"),
//!     1,
//!     r#"{"level":"info","correlation_id":"req-1"}"#,
//! );
//! let enriched = enricher.enrich(chain.parse(record));
//! assert_eq!(enriched.correlation_id.as_deref(), Some("req-1"));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod enricher;
pub mod error;
pub mod parser;
pub mod reader;
pub mod reassembler;
pub mod types;
pub mod worker;

pub use config::{ParserSpec, PipelineConfig, ReassemblyConfig};
pub use enricher::Enricher;
pub use error::{PipelineError, Result};
pub use parser::{JsonParser, LineParser, ParserChain, PatternParser};
pub use reader::{LineReader, LossyLinesCodec};
pub use reassembler::{Reassembler, StartPredicate};
pub use types::{
    EnrichedRecord, FieldMap, FieldValue, LogicalRecord, ParsedRecord, RawLine, StreamId,
};
pub use worker::StreamWorker;
