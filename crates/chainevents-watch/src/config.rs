//! Watch configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatchConfig {
    /// Delay between polls (milliseconds)
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

fn default_poll_interval_ms() -> u64 { 3_000 }

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

impl WatchConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// Where a new watch starts delivering from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WatchStart {
    /// Contract watches: only records at or after the wall clock.
    /// Transaction watches: every record of the transaction.
    #[default]
    Now,
    /// Every record at or after this block timestamp (ms).
    FromTimestamp(i64),
}

/// Per-watch overrides.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WatchOptions {
    pub start: WatchStart,
    /// Overrides `WatchConfig::poll_interval_ms`
    pub poll_interval: Option<Duration>,
}

impl WatchOptions {
    pub fn from_timestamp(block_timestamp: i64) -> Self {
        Self {
            start: WatchStart::FromTimestamp(block_timestamp),
            poll_interval: None,
        }
    }

    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = Some(interval);
        self
    }
}
