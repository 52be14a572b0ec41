//! Agent configuration.
//!
//! One TOML file describes everything the agent runs: the source streams to
//! read, the pipeline (reassembly, parsers, static tags), the sinks to
//! deliver to, and the dispatch/retry tuning. `validate()` is called before
//! anything starts, so a bad pattern or a duplicate name fails the process
//! at startup instead of mid-stream.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use weave_dispatch::{DispatcherConfig, RetryPolicy};
use weave_pipeline::{ParserSpec, PipelineConfig};

use crate::error::{AgentError, Result};

/// One source stream to read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceSpec {
    /// Stream identity; appears on every record from this source.
    pub id: String,
    /// File to read. Absent means standard input.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

/// One downstream sink to deliver to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SinkSpec {
    /// Sink name, used in logs and dead-letter entries.
    pub name: String,
    /// JSON-lines file the sink appends to.
    pub path: PathBuf,
}

/// Dispatch and retry tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DispatchSettings {
    /// Bound on each sink's outstanding-record queue.
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
    /// Total delivery attempts per record, including the first.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Delay before the first retry, in milliseconds.
    #[serde(default = "default_retry_initial_ms")]
    pub retry_initial_ms: u64,
    /// Upper bound on any retry delay, in milliseconds.
    #[serde(default = "default_retry_max_delay_ms")]
    pub retry_max_delay_ms: u64,
    /// Backoff multiplier per retry.
    #[serde(default = "default_retry_multiplier")]
    pub retry_multiplier: f64,
    /// How long one delivery attempt may run before counting as a
    /// transient failure, in milliseconds.
    #[serde(default = "default_ack_timeout_ms")]
    pub ack_timeout_ms: u64,
    /// Where records that exhaust their retries are kept.
    #[serde(default = "default_dead_letter_path")]
    pub dead_letter_path: PathBuf,
}

const fn default_queue_capacity() -> usize {
    64
}

const fn default_max_attempts() -> u32 {
    5
}

const fn default_retry_initial_ms() -> u64 {
    200
}

const fn default_retry_max_delay_ms() -> u64 {
    30_000
}

const fn default_retry_multiplier() -> f64 {
    2.0
}

const fn default_ack_timeout_ms() -> u64 {
    10_000
}

fn default_dead_letter_path() -> PathBuf {
    PathBuf::from("dead_letter.jsonl")
}

impl Default for DispatchSettings {
    fn default() -> Self {
        Self {
            queue_capacity: default_queue_capacity(),
            max_attempts: default_max_attempts(),
            retry_initial_ms: default_retry_initial_ms(),
            retry_max_delay_ms: default_retry_max_delay_ms(),
            retry_multiplier: default_retry_multiplier(),
            ack_timeout_ms: default_ack_timeout_ms(),
            dead_letter_path: default_dead_letter_path(),
        }
    }
}

impl DispatchSettings {
    /// Converts to the dispatcher's runtime configuration.
    #[must_use]
    pub fn to_dispatcher_config(&self) -> DispatcherConfig {
        DispatcherConfig {
            queue_capacity: self.queue_capacity,
            retry: RetryPolicy {
                initial_delay: Duration::from_millis(self.retry_initial_ms),
                max_delay: Duration::from_millis(self.retry_max_delay_ms),
                multiplier: self.retry_multiplier,
                max_attempts: self.max_attempts,
            },
            ack_timeout: Duration::from_millis(self.ack_timeout_ms),
        }
    }
}

/// Complete agent configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Source streams, one worker each.
    pub sources: Vec<SourceSpec>,
    /// Pipeline settings shared by all streams.
    #[serde(default)]
    pub pipeline: PipelineConfig,
    /// Sinks every record is delivered to.
    pub sinks: Vec<SinkSpec>,
    /// Dispatch and retry tuning.
    #[serde(default)]
    pub dispatch: DispatchSettings,
}

impl AgentConfig {
    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or the
    /// configuration is invalid.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            AgentError::Config(format!(
                "failed to read config file '{}': {}",
                path.as_ref().display(),
                e
            ))
        })?;
        Self::from_toml(&content)
    }

    /// Parses configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is invalid or validation fails.
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(content).map_err(|e| AgentError::Config(format!("invalid TOML: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns the first problem found.
    pub fn validate(&self) -> Result<()> {
        if self.sources.is_empty() {
            return Err(AgentError::Config("no sources configured".to_string()));
        }
        let mut source_ids = std::collections::HashSet::new();
        let mut stdin_sources = 0usize;
        for source in &self.sources {
            if source.id.trim().is_empty() {
                return Err(AgentError::Config("source id cannot be empty".to_string()));
            }
            if !source_ids.insert(source.id.as_str()) {
                return Err(AgentError::Config(format!(
                    "duplicate source id '{}'",
                    source.id
                )));
            }
            if source.path.is_none() {
                stdin_sources += 1;
            }
        }
        if stdin_sources > 1 {
            return Err(AgentError::Config(
                "at most one source may read standard input".to_string(),
            ));
        }

        if self.sinks.is_empty() {
            return Err(AgentError::Config("no sinks configured".to_string()));
        }
        let mut sink_names = std::collections::HashSet::new();
        for sink in &self.sinks {
            if sink.name.trim().is_empty() {
                return Err(AgentError::Config("sink name cannot be empty".to_string()));
            }
            if !sink_names.insert(sink.name.as_str()) {
                return Err(AgentError::Config(format!(
                    "duplicate sink name '{}'",
                    sink.name
                )));
            }
        }

        if self.dispatch.max_attempts == 0 {
            return Err(AgentError::Config(
                "dispatch.max_attempts must be at least 1".to_string(),
            ));
        }

        self.pipeline.validate()?;
        Ok(())
    }

    /// Builds a documented sample configuration for `init-config`.
    #[must_use]
    pub fn sample() -> Self {
        let mut pipeline = PipelineConfig::default();
        pipeline.parsers = vec![
            ParserSpec::Json {
                name: "json".to_string(),
            },
            ParserSpec::Pattern {
                name: "plain".to_string(),
                pattern: r"(?s)^(?P<ts>\d{4}-\d{2}-\d{2}[T ]\d{2}:\d{2}:\d{2}\S*) (?P<level>[A-Z]+) (?P<message>.*)$".to_string(),
            },
        ];
        pipeline
            .static_tags
            .insert("host".to_string(), "node-1".to_string());
        pipeline
            .static_tags
            .insert("env".to_string(), "prod".to_string());

        Self {
            sources: vec![SourceSpec {
                id: "app-stdout".to_string(),
                path: Some(PathBuf::from("/var/log/app/stdout.log")),
            }],
            pipeline,
            sinks: vec![SinkSpec {
                name: "index".to_string(),
                path: PathBuf::from("/var/lib/logweave/index.jsonl"),
            }],
            dispatch: DispatchSettings::default(),
        }
    }

    /// Renders the configuration as TOML.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| AgentError::Config(format!("failed to render TOML: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
        [[sources]]
        id = "app"
        path = "/var/log/app.log"

        [[sinks]]
        name = "index"
        path = "/var/lib/out.jsonl"
    "#;

    #[test]
    fn minimal_config_parses_with_defaults() {
        let config = AgentConfig::from_toml(MINIMAL).expect("parse");

        assert_eq!(config.sources.len(), 1);
        assert_eq!(config.sinks.len(), 1);
        assert_eq!(config.dispatch.max_attempts, 5);
        assert_eq!(config.pipeline.correlation_field, "correlation_id");
        assert!(config.pipeline.parsers.is_empty());
    }

    #[test]
    fn full_config_parses() {
        let config = AgentConfig::from_toml(
            r#"
            [[sources]]
            id = "orders"
            path = "/var/log/orders.log"

            [[sources]]
            id = "stdin"

            [pipeline]
            correlation_field = "request_id"

            [pipeline.reassembly]
            start_pattern = '^\d{4}-'
            max_buffered_lines = 64
            idle_flush_ms = 500

            [[pipeline.parsers]]
            type = "json"
            name = "json"

            [[pipeline.parsers]]
            type = "pattern"
            name = "plain"
            pattern = '^(?P<level>[A-Z]+) (?P<message>.*)$'

            [pipeline.static_tags]
            host = "node-7"

            [[sinks]]
            name = "index"
            path = "/var/lib/index.jsonl"

            [dispatch]
            max_attempts = 3
            queue_capacity = 16
            dead_letter_path = "/var/lib/dead.jsonl"
            "#,
        )
        .expect("parse");

        assert_eq!(config.sources.len(), 2);
        assert!(config.sources[1].path.is_none());
        assert_eq!(config.pipeline.parsers.len(), 2);
        assert_eq!(config.pipeline.correlation_field, "request_id");
        assert_eq!(config.dispatch.queue_capacity, 16);
    }

    #[test]
    fn missing_sources_fails() {
        let err = AgentConfig::from_toml(
            r#"
            sources = []

            [[sinks]]
            name = "index"
            path = "/out.jsonl"
            "#,
        )
        .expect_err("must fail");
        assert!(err.to_string().contains("no sources"));
    }

    #[test]
    fn duplicate_source_ids_fail() {
        let err = AgentConfig::from_toml(
            r#"
            [[sources]]
            id = "app"
            path = "/a.log"

            [[sources]]
            id = "app"
            path = "/b.log"

            [[sinks]]
            name = "index"
            path = "/out.jsonl"
            "#,
        )
        .expect_err("must fail");
        assert!(err.to_string().contains("duplicate source id"));
    }

    #[test]
    fn two_stdin_sources_fail() {
        let err = AgentConfig::from_toml(
            r#"
            [[sources]]
            id = "one"

            [[sources]]
            id = "two"

            [[sinks]]
            name = "index"
            path = "/out.jsonl"
            "#,
        )
        .expect_err("must fail");
        assert!(err.to_string().contains("standard input"));
    }

    #[test]
    fn missing_sinks_fails() {
        let err = AgentConfig::from_toml(
            r#"
            sinks = []

            [[sources]]
            id = "app"
            path = "/a.log"
            "#,
        )
        .expect_err("must fail");
        assert!(err.to_string().contains("no sinks"));
    }

    #[test]
    fn zero_attempts_fails() {
        let toml = format!("{MINIMAL}\n[dispatch]\nmax_attempts = 0\n");
        let err = AgentConfig::from_toml(&toml).expect_err("must fail");
        assert!(err.to_string().contains("max_attempts"));
    }

    #[test]
    fn invalid_parser_pattern_fails_at_load() {
        let toml = format!(
            r#"{MINIMAL}
            [[pipeline.parsers]]
            type = "pattern"
            name = "broken"
            pattern = "(unclosed"
            "#
        );
        assert!(AgentConfig::from_toml(&toml).is_err());
    }

    #[test]
    fn dispatch_settings_convert_to_runtime_config() {
        let settings = DispatchSettings {
            retry_initial_ms: 50,
            retry_max_delay_ms: 1_000,
            retry_multiplier: 3.0,
            max_attempts: 7,
            ack_timeout_ms: 2_500,
            ..Default::default()
        };
        let config = settings.to_dispatcher_config();

        assert_eq!(config.retry.initial_delay, Duration::from_millis(50));
        assert_eq!(config.retry.max_delay, Duration::from_millis(1_000));
        assert_eq!(config.retry.max_attempts, 7);
        assert_eq!(config.ack_timeout, Duration::from_millis(2_500));
    }

    #[test]
    fn sample_config_is_valid_and_renders() {
        let sample = AgentConfig::sample();
        assert!(sample.validate().is_ok());

        let toml = sample.to_toml().expect("render");
        let back = AgentConfig::from_toml(&toml).expect("reparse");
        assert_eq!(back, sample);
    }
}
