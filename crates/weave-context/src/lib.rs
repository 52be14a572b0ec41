//! # weave-context
//!
//! Per-request correlation identifiers for logweave.
//!
//! This crate provides:
//!
//! - [`CorrelationId`] — An opaque per-request token, accepted from an
//!   inbound header or freshly generated
//! - [`RequestContext`] — The context a request handler threads explicitly
//!   through its call graph
//! - [`CorrelationConfig`] — The header/field name contract shared with the
//!   edge proxy and the enrichment pipeline
//!
//! The context is always passed by value or reference. There is no
//! thread-local or process-global holder: a handler that needs the id
//! receives it as an argument.
//!
//! ## Example
//!
//! ```rust
//! use weave_context::{CorrelationConfig, CorrelationId, RequestContext};
//!
//! // An inbound request carried a header value; reuse it if valid.
//! let ctx = RequestContext::from_header_value(Some("req-7f3a"));
//! assert_eq!(ctx.correlation_id().as_str(), "req-7f3a");
//!
//! // No header (or garbage): a fresh id is generated.
//! let ctx = RequestContext::from_header_value(None);
//! assert!(!ctx.correlation_id().as_str().is_empty());
//!
//! let config = CorrelationConfig::default();
//! assert_eq!(config.field_name, "correlation_id");
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod context;
pub mod error;
pub mod id;

pub use config::CorrelationConfig;
pub use context::RequestContext;
pub use error::{ContextError, Result};
pub use id::CorrelationId;
