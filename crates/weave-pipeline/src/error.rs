//! Error types for the enrichment pipeline.

use thiserror::Error;

/// Errors that can occur while building or running the pipeline.
///
/// Note what is *not* here: a line that fails every parser, a record flushed
/// by the inactivity timeout, and undecodable bytes are all normal data-path
/// outcomes, handled in place without an error value.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// A configured pattern failed to compile.
    #[error("invalid pattern '{pattern}': {source}")]
    InvalidPattern {
        /// The offending pattern text.
        pattern: String,
        /// The underlying regex error.
        #[source]
        source: Box<regex::Error>,
    },

    /// Configuration was structurally invalid.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// An I/O error on a source stream.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The downstream consumer hung up; the pipeline cannot make progress.
    #[error("pipeline output closed")]
    OutputClosed,
}

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_messages() {
        let err = PipelineError::Config("no parsers configured".to_string());
        assert_eq!(
            err.to_string(),
            "invalid configuration: no parsers configured"
        );

        assert_eq!(
            PipelineError::OutputClosed.to_string(),
            "pipeline output closed"
        );
    }

    #[test]
    fn invalid_pattern_carries_pattern_text() {
        let source = regex::Regex::new("(unclosed").expect_err("must fail");
        let err = PipelineError::InvalidPattern {
            pattern: "(unclosed".to_string(),
            source: Box::new(source),
        };
        assert!(err.to_string().contains("(unclosed"));
    }

    #[test]
    fn io_error_converts() {
        let io_err = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "gone");
        let err: PipelineError = io_err.into();
        assert!(err.to_string().contains("I/O error"));
    }

    #[test]
    fn error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<PipelineError>();
    }
}
