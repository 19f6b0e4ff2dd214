//! Human-like typing simulation.
//!
//! Estimates how long a message would take to type and keeps a typing
//! indicator alive for that long before the caller sends it.

use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use tokio::time::{Instant, sleep};

use super::AutomationError;

/// Average characters per word used by words-per-minute estimates.
const CHARS_PER_WORD: f64 = 5.0;

#[derive(Debug, Clone, PartialEq)]
pub struct TypingConfig {
    pub words_per_minute: u32,
    pub min_duration: Duration,
    pub max_duration: Duration,
    /// Total relative spread applied to the estimate (0.2 = ±10%).
    pub jitter: f64,
    /// Typing indicators expire server-side after about ten seconds.
    pub refresh_interval: Duration,
}

impl Default for TypingConfig {
    fn default() -> Self {
        Self {
            words_per_minute: 60,
            min_duration: Duration::from_secs(1),
            max_duration: Duration::from_secs(10),
            jitter: 0.2,
            refresh_interval: Duration::from_secs(8),
        }
    }
}

/// Shows a "user is typing" signal in the target channel.
#[async_trait]
pub trait TypingIndicator: Send + Sync {
    async fn trigger(&self) -> Result<(), AutomationError>;
}

#[derive(Debug, Clone)]
pub struct TypingSimulator {
    config: TypingConfig,
}

impl TypingSimulator {
    pub fn new(config: TypingConfig) -> Result<Self, AutomationError> {
        if config.words_per_minute == 0 {
            return Err(AutomationError::InvalidConfig(
                "words per minute must be positive".into(),
            ));
        }
        if config.refresh_interval.is_zero() {
            return Err(AutomationError::InvalidConfig(
                "typing refresh interval must be non-zero".into(),
            ));
        }
        Ok(Self { config })
    }

    pub fn config(&self) -> &TypingConfig {
        &self.config
    }

    /// Estimate without jitter, clamped to the configured bounds.
    pub fn base_duration(&self, text: &str) -> Duration {
        let chars_per_second = self.config.words_per_minute as f64 * CHARS_PER_WORD / 60.0;
        let seconds = text.chars().count() as f64 / chars_per_second;
        self.clamp(Duration::from_secs_f64(seconds))
    }

    /// Jittered estimate, clamped to the configured bounds.
    pub fn typing_duration(&self, text: &str) -> Duration {
        let spread = self.config.jitter.clamp(0.0, 1.0) / 2.0;
        let factor = if spread > 0.0 {
            1.0 + rand::thread_rng().gen_range(-spread..=spread)
        } else {
            1.0
        };
        let chars_per_second = self.config.words_per_minute as f64 * CHARS_PER_WORD / 60.0;
        let seconds = text.chars().count() as f64 / chars_per_second * factor;
        self.clamp(Duration::from_secs_f64(seconds.max(0.0)))
    }

    /// Keep `indicator` active for the typing duration of `text`. Returns
    /// the time waited.
    pub async fn simulate(
        &self,
        indicator: &dyn TypingIndicator,
        text: &str,
    ) -> Result<Duration, AutomationError> {
        let duration = self.typing_duration(text);
        let deadline = Instant::now() + duration;

        loop {
            indicator.trigger().await?;
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                break;
            }
            if remaining <= self.config.refresh_interval {
                sleep(remaining).await;
                break;
            }
            sleep(self.config.refresh_interval).await;
        }

        Ok(duration)
    }

    fn clamp(&self, duration: Duration) -> Duration {
        let min = self.config.min_duration;
        let max = self.config.max_duration.max(min);
        duration.clamp(min, max)
    }
}

impl Default for TypingSimulator {
    fn default() -> Self {
        Self {
            config: TypingConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingIndicator(AtomicUsize);

    #[async_trait]
    impl TypingIndicator for CountingIndicator {
        async fn trigger(&self) -> Result<(), AutomationError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    struct BrokenIndicator;

    #[async_trait]
    impl TypingIndicator for BrokenIndicator {
        async fn trigger(&self) -> Result<(), AutomationError> {
            Err(AutomationError::Typing("missing permissions".into()))
        }
    }

    fn exact(config: TypingConfig) -> TypingSimulator {
        TypingSimulator::new(TypingConfig { jitter: 0.0, ..config }).unwrap()
    }

    #[test]
    fn base_duration_follows_words_per_minute() {
        let simulator = exact(TypingConfig::default());
        // 60 wpm = 5 chars per second
        assert_eq!(simulator.base_duration(&"x".repeat(20)), Duration::from_secs(4));
    }

    #[test]
    fn durations_are_clamped() {
        let simulator = exact(TypingConfig::default());
        assert_eq!(simulator.typing_duration("hi"), Duration::from_secs(1));
        assert_eq!(
            simulator.typing_duration(&"x".repeat(500)),
            Duration::from_secs(10)
        );
    }

    #[test]
    fn jitter_stays_within_spread() {
        let simulator = TypingSimulator::default();
        for _ in 0..50 {
            let duration = simulator.typing_duration(&"x".repeat(25));
            assert!(duration >= Duration::from_secs_f64(4.5));
            assert!(duration <= Duration::from_secs_f64(5.5));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn long_messages_refresh_the_indicator() {
        let simulator = exact(TypingConfig {
            max_duration: Duration::from_secs(20),
            ..TypingConfig::default()
        });
        let indicator = CountingIndicator::default();

        let start = Instant::now();
        let waited = simulator
            .simulate(&indicator, &"x".repeat(90))
            .await
            .unwrap();

        assert_eq!(waited, Duration::from_secs(18));
        assert_eq!(start.elapsed(), Duration::from_secs(18));
        assert_eq!(indicator.0.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn indicator_errors_propagate() {
        let simulator = TypingSimulator::default();
        let err = simulator
            .simulate(&BrokenIndicator, "hello")
            .await
            .expect_err("should fail");
        assert!(matches!(err, AutomationError::Typing(_)));
    }

    #[test]
    fn rejects_zero_speed() {
        let err = TypingSimulator::new(TypingConfig {
            words_per_minute: 0,
            ..TypingConfig::default()
        })
        .expect_err("should fail");
        assert!(matches!(err, AutomationError::InvalidConfig(_)));
    }
}
