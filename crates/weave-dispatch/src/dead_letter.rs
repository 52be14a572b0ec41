//! The dead-letter destination.
//!
//! Records that exhaust their retries (or hit a permanent sink error) are
//! appended here as JSON lines, retaining everything an operator needs for
//! manual recovery: the original raw text, the failing sink, a non-empty
//! failure reason, and the attempt count.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::debug;

use weave_pipeline::{EnrichedRecord, StreamId};

use crate::error::Result;

/// One dead-lettered record with full failure context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeadLetterEntry {
    /// When the record was dead-lettered.
    pub written_at: DateTime<Utc>,
    /// The sink that could not accept the record.
    pub sink: String,
    /// The final failure reason (never empty).
    pub reason: String,
    /// How many delivery attempts were made.
    pub attempts: u32,
    /// The stream the record came from.
    pub stream: StreamId,
    /// The record's correlation identifier, if it had one.
    pub correlation_id: Option<String>,
    /// The original reassembled text, verbatim.
    pub raw_text: String,
}

impl DeadLetterEntry {
    /// Builds an entry from a failed record.
    #[must_use]
    pub fn new(record: &EnrichedRecord, sink: &str, reason: &str, attempts: u32) -> Self {
        Self {
            written_at: Utc::now(),
            sink: sink.to_string(),
            reason: if reason.is_empty() {
                "unspecified sink failure".to_string()
            } else {
                reason.to_string()
            },
            attempts,
            stream: record.stream.clone(),
            correlation_id: record.correlation_id.clone(),
            raw_text: record.raw_text.clone(),
        }
    }
}

/// Append-only JSON-lines writer for dead-lettered records.
pub struct DeadLetterWriter {
    path: PathBuf,
    file: tokio::sync::Mutex<File>,
}

impl DeadLetterWriter {
    /// Opens (or creates) the dead-letter file in append mode.
    ///
    /// # Errors
    ///
    /// Returns an error if the parent directory cannot be created or the
    /// file cannot be opened.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
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
        debug!(path = %path.display(), "dead-letter destination opened");

        Ok(Self {
            path,
            file: tokio::sync::Mutex::new(file),
        })
    }

    /// Returns the dead-letter file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends one entry and flushes it to disk.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write fails.
    pub async fn write(&self, entry: &DeadLetterEntry) -> Result<()> {
        let mut line = serde_json::to_vec(entry)?;
        line.push(b'\n');

        let mut file = self.file.lock().await;
        file.write_all(&line).await?;
        file.flush().await?;
        Ok(())
    }
}
