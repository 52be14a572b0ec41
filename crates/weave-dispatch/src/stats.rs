//! Delivery counters.

use std::sync::atomic::{AtomicU64, Ordering};

/// Shared counters tracking what the dispatcher did with records.
///
/// Updated lock-free by the per-sink workers; read by the agent for
/// periodic reporting and by tests for assertions.
#[derive(Debug, Default)]
pub struct DispatchStats {
    delivered: AtomicU64,
    retries: AtomicU64,
    dead_lettered: AtomicU64,
}

/// A point-in-time copy of the counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatsSnapshot {
    /// Records acknowledged by a sink.
    pub delivered: u64,
    /// Individual retry attempts made.
    pub retries: u64,
    /// Records written to the dead-letter destination.
    pub dead_lettered: u64,
}

impl DispatchStats {
    /// Creates zeroed counters.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one acknowledged delivery.
    pub fn record_delivered(&self) {
        self.delivered.fetch_add(1, Ordering::Relaxed);
    }

    /// Records one retry attempt.
    pub fn record_retry(&self) {
        self.retries.fetch_add(1, Ordering::Relaxed);
    }

    /// Records one dead-letter write.
    pub fn record_dead_lettered(&self) {
        self.dead_lettered.fetch_add(1, Ordering::Relaxed);
    }

    /// Returns a point-in-time copy of all counters.
    #[must_use]
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            delivered: self.delivered.load(Ordering::Relaxed),
            retries: self.retries.load(Ordering::Relaxed),
            dead_lettered: self.dead_lettered.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_start_at_zero() {
        let stats = DispatchStats::new();
        let snapshot = stats.snapshot();
        assert_eq!(snapshot.delivered, 0);
        assert_eq!(snapshot.retries, 0);
        assert_eq!(snapshot.dead_lettered, 0);
    }

    #[test]
    fn counters_accumulate() {
        let stats = DispatchStats::new();
        stats.record_delivered();
        stats.record_delivered();
        stats.record_retry();
        stats.record_dead_lettered();

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.delivered, 2);
        assert_eq!(snapshot.retries, 1);
        assert_eq!(snapshot.dead_lettered, 1);
    }
}
