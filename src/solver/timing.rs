//! Retry timing for the solve pipeline.
//!
//! Attempts back off exponentially: the wait after the zero-based attempt
//! `n` is `base * 2^n`, capped at `max`.

use std::time::Duration;

const DEFAULT_BASE_DELAY_MS: u64 = 1_000;
const DEFAULT_MAX_DELAY_MS: u64 = 10_000;

/// Exponential backoff with an upper bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffPolicy {
    base_delay_ms: u64,
    max_delay_ms: u64,
}

impl BackoffPolicy {
    pub fn new(base_delay_ms: u64) -> Self {
        Self {
            base_delay_ms,
            max_delay_ms: DEFAULT_MAX_DELAY_MS,
        }
    }

    pub fn with_max_delay(mut self, max_delay_ms: u64) -> Self {
        self.max_delay_ms = max_delay_ms;
        self
    }

    /// Wait inserted after the failed attempt with the given zero-based index.
    pub fn delay_for(&self, attempt_index: u32) -> Duration {
        let factor = 1u64.checked_shl(attempt_index).unwrap_or(u64::MAX);
        let delay = self.base_delay_ms.saturating_mul(factor);
        Duration::from_millis(delay.min(self.max_delay_ms))
    }
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_DELAY_MS)
    }
}

/// `min(1000 * 2^attempt_index, 10000)` milliseconds.
pub fn backoff_delay(attempt_index: u32) -> Duration {
    BackoffPolicy::default().delay_for(attempt_index)
}
