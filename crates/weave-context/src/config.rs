//! The header/field name contract.

use serde::{Deserialize, Serialize};

/// Default HTTP header carrying the correlation identifier.
pub const DEFAULT_HEADER_NAME: &str = "X-Correlation-ID";

/// Default field name under which the identifier appears in enriched records.
pub const DEFAULT_FIELD_NAME: &str = "correlation_id";

/// Names shared between the edge proxy, the application tier, and the
/// enrichment pipeline.
///
/// The proxy forwards (or injects) the identifier under `header_name`; the
/// application tier writes it into its log lines; a configured parser
/// extracts it under `field_name`, where downstream consumers index it as an
/// exact-match term.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorrelationConfig {
    /// HTTP header name carrying the identifier on inbound requests.
    #[serde(default = "default_header_name")]
    pub header_name: String,
    /// Field name for the identifier in enriched records.
    #[serde(default = "default_field_name")]
    pub field_name: String,
}

fn default_header_name() -> String {
    DEFAULT_HEADER_NAME.to_string()
}

fn default_field_name() -> String {
    DEFAULT_FIELD_NAME.to_string()
}

impl Default for CorrelationConfig {
    fn default() -> Self {
        Self {
            header_name: default_header_name(),
            field_name: default_field_name(),
        }
    }
}
