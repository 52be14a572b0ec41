//! Explicit per-request context.

use serde::{Deserialize, Serialize};

use crate::id::CorrelationId;

/// The context a request handler threads through its call graph.
///
/// Handlers receive this by value (or `&RequestContext`) and pass it to
/// everything that logs on behalf of the request. Keeping the context an
/// ordinary argument — rather than ambient thread-local state — makes the
/// data flow visible and testable, and works unchanged across async task
/// boundaries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestContext {
    correlation_id: CorrelationId,
}

impl RequestContext {
    /// Creates a context around an already-validated identifier.
    #[must_use]
    pub const fn new(correlation_id: CorrelationId) -> Self {
        Self { correlation_id }
    }

    /// Builds a context from an optional inbound header value.
    ///
    /// A present, valid value is adopted as-is so the caller's identifier
    /// survives end to end. A missing or invalid value yields a freshly
    /// generated identifier instead — the request is never left without one.
    #[must_use]
    pub fn from_header_value(value: Option<&str>) -> Self {
        let correlation_id = value
            .and_then(|v| CorrelationId::parse(v).ok())
            .unwrap_or_else(CorrelationId::generate);
        Self { correlation_id }
    }

    /// Returns the correlation identifier for this request.
    #[must_use]
    pub const fn correlation_id(&self) -> &CorrelationId {
        &self.correlation_id
    }
}
