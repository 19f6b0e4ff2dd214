//! Captcha solve orchestration.
//!
//! A solve goes through a fixed sequence: cache lookup, lazy recognition
//! engine start-up, strategy dispatch by service, bounded retries with a
//! per-attempt timeout and exponential backoff, then cache write and
//! statistics bookkeeping. Every failure path ends in `None`; nothing is
//! raised to the caller.
//!
//! Concurrent solves for the same cache key are not de-duplicated: both miss
//! the cache and both run the strategy.

use std::collections::HashMap;
use std::any::Any;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use futures::FutureExt;
use tokio::sync::Mutex as AsyncMutex;
use tokio::time::{sleep, timeout};

use crate::config::SolverConfig;
use crate::external_deps::captcha::{
    CaptchaError, CaptchaService, SolveRequest, SolveStrategy, StrategyTable,
};
use crate::external_deps::recognition::{EngineFactory, RecognitionEngine, RecognizeOptions};

use super::stats::{SolverStats, StatsReport};
use super::timing::BackoffPolicy;

/// Owns the solution cache, statistics, and recognition engine for one
/// solver instance.
pub struct SolvePipeline {
    config: SolverConfig,
    strategies: StrategyTable,
    backoff: BackoffPolicy,
    engine_factory: Option<Arc<dyn EngineFactory>>,
    engine: AsyncMutex<Option<Box<dyn RecognitionEngine>>>,
    initialized: AtomicBool,
    cache: Mutex<HashMap<String, String>>,
    stats: Mutex<SolverStats>,
}

impl SolvePipeline {
    /// Create a pipeline with the placeholder strategies and no engine.
    pub fn new(config: SolverConfig) -> Self {
        Self {
            config,
            strategies: StrategyTable::placeholders(),
            backoff: BackoffPolicy::default(),
            engine_factory: None,
            engine: AsyncMutex::new(None),
            initialized: AtomicBool::new(false),
            cache: Mutex::new(HashMap::new()),
            stats: Mutex::new(SolverStats::default()),
        }
    }

    /// Replace the whole strategy table.
    pub fn with_strategies(mut self, strategies: StrategyTable) -> Self {
        self.strategies = strategies;
        self
    }

    /// Register the strategy used for `service`.
    pub fn with_strategy(mut self, service: CaptchaService, strategy: Arc<dyn SolveStrategy>) -> Self {
        self.strategies.set(service, strategy);
        self
    }

    /// Attach the factory used to start the recognition engine.
    pub fn with_engine_factory(mut self, factory: Arc<dyn EngineFactory>) -> Self {
        self.engine_factory = Some(factory);
        self
    }

    /// Override the delay schedule between attempts.
    pub fn with_backoff(mut self, backoff: BackoffPolicy) -> Self {
        self.backoff = backoff;
        self
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    /// `"<service>:<site key>"`. The request token is deliberately left out,
    /// so a cached solution is reused across challenges for the same site.
    pub fn cache_key(request: &SolveRequest) -> String {
        format!("{}:{}", request.service.as_str(), request.site_key)
    }

    /// Solve a captcha, returning the solution token or `None`.
    pub async fn solve(&self, request: &SolveRequest) -> Option<String> {
        self.counters().record_attempt();
        let key = Self::cache_key(request);

        let cached = if self.config.enable_caching {
            self.cache().get(&key).cloned()
        } else {
            None
        };
        if let Some(solution) = cached {
            self.counters().record_cache_hit();
            self.debug(format_args!("cache hit for {key}"));
            return Some(solution);
        }

        self.ensure_initialized().await;

        let Some(strategy) = self.strategies.get(&request.service).cloned() else {
            log::info!("no strategy for captcha service {}", request.service);
            self.counters().record_failure();
            return None;
        };

        self.debug(format_args!(
            "dispatching {key} to strategy '{}'",
            strategy.name()
        ));

        match self.solve_with_retry(strategy.as_ref(), request).await {
            Some(solution) => {
                if self.config.enable_caching {
                    self.cache().insert(key, solution.clone());
                }
                self.counters().record_success();
                Some(solution)
            }
            None => {
                self.counters().record_failure();
                None
            }
        }
    }

    /// Run `strategy` up to `max_retries` times. Each attempt is bounded by
    /// the configured timeout; failed attempts, including ones that panic,
    /// are followed by a backoff delay unless they were the last one.
    pub async fn solve_with_retry(
        &self,
        strategy: &dyn SolveStrategy,
        request: &SolveRequest,
    ) -> Option<String> {
        let attempts = self.config.max_retries;
        let limit = self.config.timeout();
        let mut last_error: Option<CaptchaError> = None;

        for attempt in 0..attempts {
            let outcome = AssertUnwindSafe(strategy.attempt(request)).catch_unwind();
            match timeout(limit, outcome).await {
                Ok(Ok(Ok(Some(solution)))) => {
                    self.debug(format_args!(
                        "strategy '{}' solved on attempt {}",
                        strategy.name(),
                        attempt + 1
                    ));
                    return Some(solution);
                }
                Ok(Ok(Ok(None))) => {
                    self.debug(format_args!(
                        "strategy '{}' returned no solution on attempt {}",
                        strategy.name(),
                        attempt + 1
                    ));
                }
                Ok(Ok(Err(err))) => {
                    self.debug(format_args!(
                        "strategy '{}' failed on attempt {}: {err}",
                        strategy.name(),
                        attempt + 1
                    ));
                    last_error = Some(err);
                }
                Ok(Err(payload)) => {
                    let message = panic_message(&*payload);
                    log::warn!(
                        "strategy '{}' panicked on attempt {}: {message}",
                        strategy.name(),
                        attempt + 1
                    );
                    last_error = Some(CaptchaError::Panicked(message));
                }
                Err(_) => {
                    self.debug(format_args!(
                        "strategy '{}' timed out on attempt {}",
                        strategy.name(),
                        attempt + 1
                    ));
                    last_error = Some(CaptchaError::Timeout(limit));
                }
            }

            if attempt + 1 < attempts {
                let delay = self.backoff.delay_for(attempt);
                self.debug(format_args!("retrying in {}ms", delay.as_millis()));
                sleep(delay).await;
            }
        }

        match last_error {
            Some(err) => log::warn!(
                "strategy '{}' gave up after {attempts} attempts: {err}",
                strategy.name()
            ),
            None => log::warn!(
                "strategy '{}' produced no solution after {attempts} attempts",
                strategy.name()
            ),
        }
        None
    }

    /// Recognise text in `image` with the pipeline's engine. Returns an empty
    /// string when no engine is available or recognition fails.
    pub async fn extract_text(&self, image: &[u8], options: &RecognizeOptions) -> String {
        if !self.ensure_initialized().await {
            return String::new();
        }

        let guard = self.engine.lock().await;
        let Some(engine) = guard.as_ref() else {
            return String::new();
        };

        match engine.recognize(image, options).await {
            Ok(recognition) => {
                self.debug(format_args!(
                    "recognised {} chars (confidence {:.1})",
                    recognition.text.len(),
                    recognition.confidence
                ));
                recognition.text.trim().to_string()
            }
            Err(err) => {
                log::warn!("text extraction failed: {err}");
                String::new()
            }
        }
    }

    /// Counters plus derived rates.
    pub fn stats(&self) -> StatsReport {
        self.counters().report()
    }

    /// Drop every cached solution. Statistics are kept.
    pub fn clear_cache(&self) {
        self.cache().clear();
    }

    /// Zero all counters. Cached solutions are kept.
    pub fn reset_stats(&self) {
        self.counters().reset();
    }

    /// Terminate the engine, clear the cache, and allow re-initialisation.
    /// Statistics are kept.
    pub async fn cleanup(&self) {
        let engine = self.engine.lock().await.take();
        if let Some(engine) = engine
            && let Err(err) = engine.terminate().await
        {
            log::warn!("recognition engine termination failed: {err}");
        }
        self.clear_cache();
        self.initialized.store(false, Ordering::Release);
        self.debug(format_args!("solver cleaned up"));
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::Acquire)
    }

    pub fn cached_solution(&self, request: &SolveRequest) -> Option<String> {
        self.cache().get(&Self::cache_key(request)).cloned()
    }

    pub fn cache_len(&self) -> usize {
        self.cache().len()
    }

    /// Start the engine if needed. Failures are logged and leave the
    /// pipeline without an engine; the next call tries again.
    async fn ensure_initialized(&self) -> bool {
        if self.is_initialized() {
            return true;
        }

        let mut slot = self.engine.lock().await;
        if slot.is_some() {
            self.initialized.store(true, Ordering::Release);
            return true;
        }

        let Some(factory) = self.engine_factory.as_ref() else {
            self.debug(format_args!("no recognition engine configured"));
            return false;
        };

        match factory.initialize().await {
            Ok(engine) => {
                *slot = Some(engine);
                self.initialized.store(true, Ordering::Release);
                self.debug(format_args!("recognition engine initialised"));
                true
            }
            Err(err) => {
                log::warn!("recognition engine initialisation failed: {err}");
                false
            }
        }
    }

    fn counters(&self) -> MutexGuard<'_, SolverStats> {
        self.stats.lock().expect("solver stats lock poisoned")
    }

    fn cache(&self) -> MutexGuard<'_, HashMap<String, String>> {
        self.cache.lock().expect("solution cache lock poisoned")
    }

    fn debug(&self, message: fmt::Arguments<'_>) {
        if self.config.debug {
            log::debug!("{message}");
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

impl Default for SolvePipeline {
    fn default() -> Self {
        Self::new(SolverConfig::default())
    }
}

impl fmt::Debug for SolvePipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SolvePipeline")
            .field("config", &self.config)
            .field("strategies", &self.strategies)
            .field("initialized", &self.is_initialized())
            .finish_non_exhaustive()
    }
}
