//! Sliding-window rate limiting for outgoing actions.
//!
//! Keeps the timestamps of recent acquisitions and admits a new one only
//! while fewer than `max_requests` fall inside the trailing window.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use tokio::time::{Instant, sleep};

use super::AutomationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitConfig {
    pub max_requests: usize,
    pub window: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 5,
            window: Duration::from_secs(5),
        }
    }
}

impl RateLimitConfig {
    pub fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            max_requests,
            window,
        }
    }

    pub fn validate(&self) -> Result<(), AutomationError> {
        if self.max_requests == 0 {
            return Err(AutomationError::InvalidConfig(
                "rate limit must allow at least one request".into(),
            ));
        }
        if self.window.is_zero() {
            return Err(AutomationError::InvalidConfig(
                "rate limit window must be non-zero".into(),
            ));
        }
        Ok(())
    }
}

/// Thread-safe sliding-window limiter.
#[derive(Debug)]
pub struct RateLimiter {
    config: RateLimitConfig,
    hits: Mutex<VecDeque<Instant>>,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Result<Self, AutomationError> {
        config.validate()?;
        Ok(Self {
            config,
            hits: Mutex::new(VecDeque::with_capacity(config.max_requests)),
        })
    }

    pub fn config(&self) -> RateLimitConfig {
        self.config
    }

    /// Record an action if the window has room for it.
    pub fn try_acquire(&self) -> bool {
        let now = Instant::now();
        let mut hits = self.hits.lock().expect("rate limiter lock poisoned");
        self.prune(&mut hits, now);
        if hits.len() < self.config.max_requests {
            hits.push_back(now);
            true
        } else {
            false
        }
    }

    /// Wait until an action is admitted, then record it.
    pub async fn acquire(&self) {
        loop {
            if self.try_acquire() {
                return;
            }
            let wait = self.time_until_available();
            log::debug!("rate limited, waiting {}ms", wait.as_millis());
            sleep(wait.max(Duration::from_millis(1))).await;
        }
    }

    /// Zero when a slot is free, otherwise the time until the oldest
    /// recorded action leaves the window.
    pub fn time_until_available(&self) -> Duration {
        let now = Instant::now();
        let mut hits = self.hits.lock().expect("rate limiter lock poisoned");
        self.prune(&mut hits, now);
        if hits.len() < self.config.max_requests {
            return Duration::ZERO;
        }
        hits.front()
            .map(|oldest| (*oldest + self.config.window).saturating_duration_since(now))
            .unwrap_or(Duration::ZERO)
    }

    pub fn remaining(&self) -> usize {
        let now = Instant::now();
        let mut hits = self.hits.lock().expect("rate limiter lock poisoned");
        self.prune(&mut hits, now);
        self.config.max_requests.saturating_sub(hits.len())
    }

    pub fn reset(&self) {
        self.hits.lock().expect("rate limiter lock poisoned").clear();
    }

    fn prune(&self, hits: &mut VecDeque<Instant>, now: Instant) {
        while let Some(oldest) = hits.front() {
            if now.duration_since(*oldest) >= self.config.window {
                hits.pop_front();
            } else {
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limiter(max: usize, window_ms: u64) -> RateLimiter {
        RateLimiter::new(RateLimitConfig::new(max, Duration::from_millis(window_ms))).unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn admits_up_to_limit_within_window() {
        let limiter = limiter(2, 1000);
        assert!(limiter.try_acquire());
        assert!(limiter.try_acquire());
        assert!(!limiter.try_acquire());
        assert_eq!(limiter.remaining(), 0);
        assert_eq!(limiter.time_until_available(), Duration::from_millis(1000));
    }

    #[tokio::test(start_paused = true)]
    async fn window_slides_forward() {
        let limiter = limiter(2, 1000);
        assert!(limiter.try_acquire());
        tokio::time::advance(Duration::from_millis(600)).await;
        assert!(limiter.try_acquire());
        tokio::time::advance(Duration::from_millis(400)).await;
        assert_eq!(limiter.remaining(), 1);
        assert!(limiter.try_acquire());
        assert!(!limiter.try_acquire());
    }

    #[tokio::test(start_paused = true)]
    async fn acquire_waits_for_oldest_slot() {
        let limiter = limiter(1, 500);
        let start = Instant::now();
        limiter.acquire().await;
        limiter.acquire().await;
        assert_eq!(start.elapsed(), Duration::from_millis(500));
    }

    #[test]
    fn rejects_empty_limit() {
        let err = RateLimiter::new(RateLimitConfig::new(0, Duration::from_secs(1)))
            .expect_err("should fail");
        assert!(matches!(err, AutomationError::InvalidConfig(_)));
    }

    #[tokio::test]
    async fn reset_frees_all_slots() {
        let limiter = limiter(1, 60_000);
        assert!(limiter.try_acquire());
        limiter.reset();
        assert!(limiter.try_acquire());
    }
}
