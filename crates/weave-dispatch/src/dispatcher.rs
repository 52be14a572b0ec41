//! The sink dispatcher.
//!
//! One bounded queue and one worker task per sink. The dispatcher's intake
//! is itself a bounded channel: when a sink's queue fills, the fan-out loop
//! suspends, the intake fills, and upstream producers block on `send` —
//! the pipeline's one sanctioned backpressure point.
//!
//! Delivery is at-least-once per sink: transient failures (including ack
//! timeouts) are retried with bounded exponential backoff; exhaustion or a
//! permanent failure produces exactly one dead-letter write, after which
//! the worker moves on to the next record. A dead sink never wedges the
//! other sinks or the pipeline.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{sleep, timeout};
use tracing::{debug, error, info, warn};

use weave_pipeline::EnrichedRecord;

use crate::dead_letter::{DeadLetterEntry, DeadLetterWriter};
use crate::error::{DispatchError, Result, SinkError};
use crate::retry::RetryPolicy;
use crate::sink::Sink;
use crate::stats::DispatchStats;

/// Default bound on each sink's outstanding-record queue.
pub const DEFAULT_QUEUE_CAPACITY: usize = 64;

/// Default time to wait for a sink to acknowledge one attempt.
pub const DEFAULT_ACK_TIMEOUT: Duration = Duration::from_secs(10);

/// Dispatcher tuning.
#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    /// Bound on each sink's outstanding-record queue (also the intake
    /// bound).
    pub queue_capacity: usize,
    /// Retry schedule for transient failures.
    pub retry: RetryPolicy,
    /// How long one delivery attempt may run before it counts as a
    /// transient failure.
    pub ack_timeout: Duration,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            retry: RetryPolicy::default(),
            ack_timeout: DEFAULT_ACK_TIMEOUT,
        }
    }
}

/// Fans enriched records out to every configured sink.
pub struct Dispatcher {
    intake: mpsc::Receiver<EnrichedRecord>,
    sinks: Vec<Arc<dyn Sink>>,
    config: DispatcherConfig,
    dead_letter: Arc<DeadLetterWriter>,
    stats: Arc<DispatchStats>,
}

impl Dispatcher {
    /// Creates a dispatcher and returns the intake handle producers send
    /// into.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::NoSinks`] if no sinks are configured.
    pub fn new(
        sinks: Vec<Arc<dyn Sink>>,
        config: DispatcherConfig,
        dead_letter: Arc<DeadLetterWriter>,
        stats: Arc<DispatchStats>,
    ) -> Result<(Self, mpsc::Sender<EnrichedRecord>)> {
        if sinks.is_empty() {
            return Err(DispatchError::NoSinks);
        }
        let (intake_tx, intake_rx) = mpsc::channel(config.queue_capacity.max(1));
        Ok((
            Self {
                intake: intake_rx,
                sinks,
                config,
                dead_letter,
                stats,
            },
            intake_tx,
        ))
    }

    /// Runs until every intake handle is dropped, then drains.
    ///
    /// Shutdown order matters: once the intake closes, each sink worker
    /// finishes its queued records — letting in-flight retries complete or
    /// exhaust — before this method returns.
    pub async fn run(mut self) {
        let sink_count = self.sinks.len();
        info!(sinks = sink_count, "dispatcher started");

        let mut senders = Vec::with_capacity(sink_count);
        let mut handles = Vec::with_capacity(sink_count);
        for sink in self.sinks {
            let (tx, rx) = mpsc::channel(self.config.queue_capacity.max(1));
            let worker = SinkWorker {
                sink,
                queue: rx,
                retry: self.config.retry.clone(),
                ack_timeout: self.config.ack_timeout,
                dead_letter: Arc::clone(&self.dead_letter),
                stats: Arc::clone(&self.stats),
            };
            handles.push(tokio::spawn(worker.run()));
            senders.push(tx);
        }

        while let Some(record) = self.intake.recv().await {
            for sender in &senders {
                // Bounded send: a full queue suspends intake here.
                if sender.send(record.clone()).await.is_err() {
                    warn!("sink worker exited early; record not enqueued");
                }
            }
        }

        drop(senders);
        for handle in handles {
            if let Err(e) = handle.await {
                error!(error = %e, "sink worker panicked");
            }
        }
        info!("dispatcher drained and stopped");
    }
}

/// Serializes delivery to one sink.
struct SinkWorker {
    sink: Arc<dyn Sink>,
    queue: mpsc::Receiver<EnrichedRecord>,
    retry: RetryPolicy,
    ack_timeout: Duration,
    dead_letter: Arc<DeadLetterWriter>,
    stats: Arc<DispatchStats>,
}

impl SinkWorker {
    async fn run(mut self) {
        while let Some(record) = self.queue.recv().await {
            self.deliver_with_retry(&record).await;
        }
        debug!(sink = self.sink.name(), "sink worker drained");
    }

    /// Drives one record to acknowledgement or the dead-letter file.
    async fn deliver_with_retry(&self, record: &EnrichedRecord) {
        let mut attempt = 0u32;
        let final_reason = loop {
            attempt += 1;
            let outcome = timeout(self.ack_timeout, self.sink.deliver(record)).await;

            let reason = match outcome {
                Ok(Ok(())) => {
                    self.stats.record_delivered();
                    debug!(sink = self.sink.name(), attempt, "record delivered");
                    return;
                }
                Ok(Err(SinkError::Permanent(reason))) => break reason,
                Ok(Err(SinkError::Transient(reason))) => reason,
                Err(_) => format!("ack timeout after {:?}", self.ack_timeout),
            };

            if !self.retry.should_retry(attempt) {
                break reason;
            }

            let delay = self.retry.delay_for_attempt(attempt + 1);
            debug!(
                sink = self.sink.name(),
                attempt,
                delay_ms = delay.as_millis() as u64,
                reason = %reason,
                "delivery failed, backing off"
            );
            self.stats.record_retry();
            sleep(delay).await;
        };

        self.stats.record_dead_lettered();
        warn!(
            sink = self.sink.name(),
            attempts = attempt,
            reason = %final_reason,
            "delivery exhausted, dead-lettering record"
        );

        let entry = DeadLetterEntry::new(record, self.sink.name(), &final_reason, attempt);
        if let Err(e) = self.dead_letter.write(&entry).await {
            // Last resort: the failure context still reaches the operator
            // through the log stream.
            error!(
                sink = self.sink.name(),
                error = %e,
                raw_text = %record.raw_text,
                "dead-letter write failed"
            );
        }
    }
}
