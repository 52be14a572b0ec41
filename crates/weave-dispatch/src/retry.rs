//! Bounded exponential backoff.

use std::time::Duration;

/// Retry schedule for transient sink failures.
///
/// Attempt 1 is the initial delivery; retries are attempts 2 and up, each
/// preceded by a delay growing by `multiplier` and capped at `max_delay`.
/// `max_attempts` bounds the total, after which the record is dead-lettered.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Delay before the first retry.
    pub initial_delay: Duration,
    /// Upper bound on any single delay.
    pub max_delay: Duration,
    /// Multiplier applied per retry.
    pub multiplier: f64,
    /// Total delivery attempts, including the first.
    pub max_attempts: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_millis(200),
            max_delay: Duration::from_secs(30),
            multiplier: 2.0,
            max_attempts: 5,
        }
    }
}

impl RetryPolicy {
    /// Calculates the delay preceding the given attempt number.
    ///
    /// Attempt 2 (the first retry) waits `initial_delay`; each later
    /// attempt doubles (or whatever `multiplier` says), capped at
    /// `max_delay`.
    #[must_use]
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let factor = self.multiplier.powi(attempt.saturating_sub(2) as i32);
        let delay_millis = (self.initial_delay.as_millis() as f64 * factor) as u64;
        Duration::from_millis(delay_millis).min(self.max_delay)
    }

    /// Returns true if another attempt is allowed after `attempt` failed.
    #[must_use]
    pub const fn should_retry(&self, attempt: u32) -> bool {
        attempt < self.max_attempts
    }
}
