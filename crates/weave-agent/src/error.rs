//! Error types for the agent.

use thiserror::Error;

/// Errors that can stop the agent.
#[derive(Debug, Error)]
pub enum AgentError {
    /// Configuration could not be read, parsed, or validated.
    #[error("configuration error: {0}")]
    Config(String),

    /// A pipeline component failed to build or run.
    #[error(transparent)]
    Pipeline(#[from] weave_pipeline::PipelineError),

    /// The dispatcher failed to build or a sink path could not be opened.
    #[error(transparent)]
    Dispatch(#[from] weave_dispatch::DispatchError),

    /// An I/O error outside the pipeline itself.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for agent operations.
pub type Result<T> = std::result::Result<T, AgentError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_display() {
        let err = AgentError::Config("no sources configured".to_string());
        assert_eq!(
            err.to_string(),
            "configuration error: no sources configured"
        );
    }

    #[test]
    fn pipeline_error_is_transparent() {
        let err: AgentError = weave_pipeline::PipelineError::OutputClosed.into();
        assert_eq!(err.to_string(), "pipeline output closed");
    }

    #[test]
    fn error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<AgentError>();
    }
}
