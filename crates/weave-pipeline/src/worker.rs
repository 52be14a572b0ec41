//! The per-stream pipeline task.
//!
//! One [`StreamWorker`] owns one stream's reader and reassembler and drives
//! the full path: read → reassemble → parse → enrich → forward. Because a
//! stream's records traverse exactly one task and one order-preserving
//! channel, per-stream FIFO holds end to end; workers for different streams
//! run concurrently without sharing reassembly state.
//!
//! The worker blocks in exactly two places: waiting for source input, and
//! sending into the dispatcher's bounded intake when downstream applies
//! backpressure. An inactivity timeout flushes the open record so entries
//! near stream termination are not held indefinitely.

use std::sync::Arc;
use std::time::Duration;

use tokio::io::AsyncRead;
use tokio::sync::{mpsc, watch};
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::config::DEFAULT_IDLE_FLUSH_MS;
use crate::enricher::Enricher;
use crate::error::{PipelineError, Result};
use crate::parser::ParserChain;
use crate::reader::LineReader;
use crate::reassembler::Reassembler;
use crate::types::{EnrichedRecord, LogicalRecord};

/// Drives one source stream through the pipeline.
pub struct StreamWorker<R> {
    reader: LineReader<R>,
    reassembler: Reassembler,
    chain: Arc<ParserChain>,
    enricher: Arc<Enricher>,
    output: mpsc::Sender<EnrichedRecord>,
    idle_flush: Duration,
}

impl<R: AsyncRead + Unpin> StreamWorker<R> {
    /// Creates a worker for one stream.
    ///
    /// The chain and enricher are shared read-only across workers; the
    /// reader and reassembler belong to this stream alone.
    #[must_use]
    pub fn new(
        reader: LineReader<R>,
        reassembler: Reassembler,
        chain: Arc<ParserChain>,
        enricher: Arc<Enricher>,
        output: mpsc::Sender<EnrichedRecord>,
    ) -> Self {
        Self {
            reader,
            reassembler,
            chain,
            enricher,
            output,
            idle_flush: Duration::from_millis(DEFAULT_IDLE_FLUSH_MS),
        }
    }

    /// Sets the inactivity timeout after which an open record is flushed.
    #[must_use]
    pub const fn with_idle_flush(mut self, idle_flush: Duration) -> Self {
        self.idle_flush = idle_flush;
        self
    }

    /// Runs the stream to completion.
    ///
    /// Terminates at end of input, on the shutdown signal, or on a
    /// transport error; in every case the open record buffer is flushed
    /// and forwarded first.
    ///
    /// # Errors
    ///
    /// Returns an error if the source stream fails at the transport level
    /// or the downstream consumer hangs up.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) -> Result<()> {
        let stream = self.reader.stream().clone();
        info!(stream = %stream, "stream worker started");

        let outcome = loop {
            tokio::select! {
                // Sender dropped counts as a shutdown request too.
                stop = async { shutdown.wait_for(|stop| *stop).await.map(|_| ()) } => {
                    debug!(stream = %stream, forced = stop.is_err(), "shutdown signal received");
                    break Ok(());
                }
                next = timeout(self.idle_flush, self.reader.next_line()) => match next {
                    Ok(Ok(Some(line))) => {
                        if let Some(record) = self.reassembler.push(line) {
                            self.forward(record).await?;
                        }
                    }
                    Ok(Ok(None)) => {
                        debug!(stream = %stream, "stream reached end of input");
                        break Ok(());
                    }
                    Ok(Err(e)) => {
                        warn!(stream = %stream, error = %e, "stream read failed");
                        break Err(e);
                    }
                    Err(_elapsed) => {
                        if let Some(record) = self.reassembler.flush() {
                            debug!(
                                stream = %stream,
                                lines = record.line_count(),
                                "idle timeout flushed open record"
                            );
                            self.forward(record).await?;
                        }
                    }
                }
            }
        };

        // Whatever ended the stream, the open buffer goes downstream first.
        if let Some(record) = self.reassembler.flush() {
            self.forward(record).await?;
        }

        info!(stream = %stream, "stream worker finished");
        outcome
    }

    async fn forward(&self, record: LogicalRecord) -> Result<()> {
        let parsed = self.chain.parse(record);
        let enriched = self.enricher.enrich(parsed);
        self.output
            .send(enriched)
            .await
            .map_err(|_| PipelineError::OutputClosed)
    }
}
