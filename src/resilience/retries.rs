//! Retry policy for transient failures.

use std::time::Duration;

use crate::config::RetryConfig;
use crate::resilience::backoff::calculate_backoff;

/// Timing and limits of the attempt loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Pause between a missed block and the next attempt.
    pub block_interval: Duration,
    pub transient_base_delay: Duration,
    pub transient_max_delay: Duration,
    /// Consecutive transient failures tolerated before giving up.
    pub max_consecutive_transient_failures: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&RetryConfig::default())
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self {
            block_interval: Duration::from_millis(config.block_interval_ms),
            transient_base_delay: Duration::from_millis(config.transient_base_delay_ms),
            transient_max_delay: Duration::from_millis(config.transient_max_delay_ms),
            max_consecutive_transient_failures: config.max_consecutive_transient_failures,
        }
    }
}

/// Counts consecutive transient failures against a [`RetryPolicy`].
#[derive(Debug, Clone)]
pub struct TransientTracker {
    policy: RetryPolicy,
    consecutive: u32,
}

impl TransientTracker {
    pub fn new(policy: RetryPolicy) -> Self {
        Self { policy, consecutive: 0 }
    }

    /// Record a failure. Returns the delay before retrying, or `None` once the
    /// consecutive limit is exceeded.
    pub fn record_failure(&mut self) -> Option<Duration> {
        self.consecutive += 1;
        if self.consecutive > self.policy.max_consecutive_transient_failures {
            return None;
        }
        Some(calculate_backoff(
            self.consecutive,
            self.policy.transient_base_delay,
            self.policy.transient_max_delay,
        ))
    }

    pub fn reset(&mut self) {
        self.consecutive = 0;
    }

    pub fn consecutive(&self) -> u32 {
        self.consecutive
    }
}
