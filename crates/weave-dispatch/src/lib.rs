//! # weave-dispatch
//!
//! At-least-once delivery of enriched records to downstream sinks.
//!
//! This crate provides:
//!
//! - [`Sink`] — The async delivery capability downstream consumers implement
//! - [`MemorySink`] / [`FileSink`] — Built-in sink implementations
//! - [`RetryPolicy`] — Bounded exponential backoff
//! - [`DeadLetterWriter`] — Durable fallback for records no retry could save
//! - [`Dispatcher`] — Per-sink bounded queues, fan-out, and backpressure
//! - [`DispatchStats`] — Delivery counters
//!
//! Delivery semantics: every record is handed to every configured sink.
//! Transient failures (including ack timeouts) are retried with bounded
//! backoff; once attempts are exhausted the record goes to the dead-letter
//! destination with its original text and the failure reason, and the
//! dispatcher moves on. Nothing is ever silently discarded, and one
//! unreachable sink can delay — but never wedge — the pipeline.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod dead_letter;
pub mod dispatcher;
pub mod error;
pub mod retry;
pub mod sink;
pub mod stats;

pub use dead_letter::{DeadLetterEntry, DeadLetterWriter};
pub use dispatcher::{Dispatcher, DispatcherConfig};
pub use error::{DispatchError, Result, SinkError};
pub use retry::RetryPolicy;
pub use sink::{FileSink, MemorySink, Sink};
pub use stats::{DispatchStats, StatsSnapshot};
