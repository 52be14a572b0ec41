//! # weave-agent
//!
//! The logweave agent: reads application log streams, reassembles and
//! enriches records, and ships them to configured sinks.
//!
//! This crate provides:
//!
//! - [`AgentConfig`] — TOML configuration covering sources, pipeline,
//!   sinks, and dispatch
//! - [`runtime::run`] — Wires one worker per source stream to a shared
//!   dispatcher and runs until the sources end or shutdown is signaled
//!
//! The binary in `main.rs` adds the CLI (`run`, `check-config`,
//! `init-config`) and tracing setup on top.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod runtime;

pub use config::{AgentConfig, DispatchSettings, SinkSpec, SourceSpec};
pub use error::{AgentError, Result};
