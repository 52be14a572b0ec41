//! Downstream sinks.
//!
//! This module provides the [`Sink`] trait and the built-in
//! implementations:
//!
//! - [`MemorySink`] — In-process buffer, used by tests and embedders
//! - [`FileSink`] — Durable JSON-lines append, the stand-in for a remote
//!   log index
//!
//! A sink acknowledges each record by returning from `deliver`; a
//! [`SinkError`] classifies the failure for the dispatcher's retry loop.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::debug;

use weave_pipeline::EnrichedRecord;

use crate::error::{DispatchError, Result, SinkError};

/// The delivery capability every downstream consumer implements.
///
/// Implementations must be safe to call from the dispatcher's per-sink
/// worker task; the dispatcher serializes calls per sink, so `deliver` is
/// never invoked concurrently on one sink instance.
#[async_trait]
pub trait Sink: Send + Sync {
    /// Returns the sink's configured name, used in logs and dead-letter
    /// entries.
    fn name(&self) -> &str;

    /// Delivers one record; returning `Ok` acknowledges it.
    ///
    /// # Errors
    ///
    /// Returns a [`SinkError`] classifying the failure as transient
    /// (retried with backoff) or permanent (dead-lettered immediately).
    async fn deliver(&self, record: &EnrichedRecord) -> std::result::Result<(), SinkError>;
}

/// An in-process sink collecting records into memory.
#[derive(Debug)]
pub struct MemorySink {
    name: String,
    records: Mutex<Vec<EnrichedRecord>>,
}

impl MemorySink {
    /// Creates a memory sink with the given name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            records: Mutex::new(Vec::new()),
        }
    }

    /// Returns a copy of everything delivered so far.
    #[must_use]
    pub fn records(&self) -> Vec<EnrichedRecord> {
        self.records.lock().map(|r| r.clone()).unwrap_or_default()
    }

    /// Returns the number of delivered records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.lock().map(|r| r.len()).unwrap_or(0)
    }

    /// Returns true if nothing has been delivered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl Sink for MemorySink {
    fn name(&self) -> &str {
        &self.name
    }

    async fn deliver(&self, record: &EnrichedRecord) -> std::result::Result<(), SinkError> {
        self.records
            .lock()
            .map_err(|_| SinkError::Permanent("memory sink poisoned".to_string()))?
            .push(record.clone());
        Ok(())
    }
}

/// A durable JSON-lines sink appending one object per record.
///
/// Every record is serialized in full — fields, correlation id, and the
/// original `raw_text` — then flushed, so an acknowledged record is on
/// disk.
pub struct FileSink {
    name: String,
    path: PathBuf,
    file: tokio::sync::Mutex<File>,
}

impl FileSink {
    /// Opens (or creates) the sink file in append mode.
    ///
    /// # Errors
    ///
    /// Returns an error if the parent directory cannot be created or the
    /// file cannot be opened.
    pub async fn open(name: impl Into<String>, path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await?;
        debug!(path = %path.display(), "file sink opened");

        Ok(Self {
            name: name.into(),
            path,
            file: tokio::sync::Mutex::new(file),
        })
    }

    /// Returns the sink file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn encode(record: &EnrichedRecord) -> std::result::Result<Vec<u8>, DispatchError> {
        let mut line = serde_json::to_vec(record)?;
        line.push(b'\n');
        Ok(line)
    }
}

#[async_trait]
impl Sink for FileSink {
    fn name(&self) -> &str {
        &self.name
    }

    async fn deliver(&self, record: &EnrichedRecord) -> std::result::Result<(), SinkError> {
        // A serialization failure will not improve on retry.
        let line =
            Self::encode(record).map_err(|e| SinkError::Permanent(e.to_string()))?;

        let mut file = self.file.lock().await;
        file.write_all(&line)
            .await
            .map_err(|e| SinkError::Transient(e.to_string()))?;
        file.flush()
            .await
            .map_err(|e| SinkError::Transient(e.to_string()))?;
        Ok(())
    }
}
