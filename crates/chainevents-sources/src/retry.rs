//! Backoff between attempts of one backend request.
//!
//! Only transport-level failures (connection errors, timeouts, 429 and 5xx)
//! are retried; see `TransportError::is_retryable`.

use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub struct RetryConfig {
    /// Retries after the first attempt
    pub max_retries: u32,
    /// Delay before the first retry
    pub initial_backoff: Duration,
    /// Upper bound on any single delay
    pub max_backoff: Duration,
    /// Growth factor between consecutive delays
    pub multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_backoff: Duration::from_millis(100),
            max_backoff: Duration::from_secs(10),
            multiplier: 2.0,
        }
    }
}

impl RetryConfig {
    /// Fail on the first error. Used by tests and by callers that poll anyway.
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }
}

/// Computes the delay before each retry; holds no per-request state.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub config: RetryConfig,
}

impl RetryPolicy {
    pub fn new(config: RetryConfig) -> Self {
        Self { config }
    }

    /// Delay to wait after failed attempt number `attempt` (1-based), or
    /// `None` once the retry budget is spent.
    pub fn next_delay(&self, attempt: u32) -> Option<Duration> {
        if !(1..=self.config.max_retries).contains(&attempt) {
            return None;
        }
        let factor = self.config.multiplier.powi(attempt as i32 - 1);
        let ms = (self.config.initial_backoff.as_millis() as f64 * factor)
            .min(self.config.max_backoff.as_millis() as f64);
        Some(Duration::from_millis(ms as u64))
    }
}
