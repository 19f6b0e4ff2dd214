//! Settings for the captcha solve pipeline.
//!
//! Provides unified configuration with:
//! - Builder-style setters
//! - JSON loading with camelCase option names
//! - Validation of retry and timeout bounds

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

const DEFAULT_MAX_RETRIES: u32 = 3;
const DEFAULT_TIMEOUT_MS: u64 = 30_000;
const DEFAULT_STRATEGY: &str = "auto";

/// Options recognised by [`crate::SolvePipeline`].
///
/// Every field is optional when deserialising; missing keys fall back to the
/// values from [`SolverConfig::default`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SolverConfig {
    /// Gates cache reads and writes inside `solve`.
    pub enable_caching: bool,
    /// Attempt ceiling for a single solve.
    pub max_retries: u32,
    /// Selection hint. Dispatch is driven by the request's service; this
    /// value is reserved and currently has no effect.
    pub strategy: String,
    /// Per-attempt timeout in milliseconds.
    #[serde(rename = "timeout")]
    pub timeout_ms: u64,
    /// Emits diagnostic `debug` log lines when set.
    pub debug: bool,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            enable_caching: true,
            max_retries: DEFAULT_MAX_RETRIES,
            strategy: DEFAULT_STRATEGY.to_string(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
            debug: false,
        }
    }
}

impl SolverConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a JSON document such as `{"maxRetries": 5, "debug": true}`.
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_caching(mut self, enabled: bool) -> Self {
        self.enable_caching = enabled;
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_strategy(mut self, strategy: impl Into<String>) -> Self {
        self.strategy = strategy.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = timeout.as_millis().min(u64::MAX as u128) as u64;
        self
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Per-attempt timeout as a [`Duration`].
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_retries == 0 {
            return Err(ConfigError::Invalid("maxRetries must be at least 1".into()));
        }
        if self.timeout_ms == 0 {
            return Err(ConfigError::Invalid("timeout must be greater than zero".into()));
        }
        Ok(())
    }
}

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = SolverConfig::default();
        assert!(config.enable_caching);
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.strategy, "auto");
        assert_eq!(config.timeout(), Duration::from_secs(30));
        assert!(!config.debug);
    }

    #[test]
    fn parses_camel_case_options_and_fills_defaults() {
        let config =
            SolverConfig::from_json_str(r#"{"enableCaching": false, "maxRetries": 5, "timeout": 1500}"#)
                .expect("valid config");
        assert!(!config.enable_caching);
        assert_eq!(config.max_retries, 5);
        assert_eq!(config.timeout(), Duration::from_millis(1500));
        assert_eq!(config.strategy, "auto");
        assert!(!config.debug);
    }

    #[test]
    fn rejects_zero_retries() {
        let err = SolverConfig::from_json_str(r#"{"maxRetries": 0}"#).expect_err("should fail");
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn rejects_malformed_json() {
        let err = SolverConfig::from_json_str("{not json").expect_err("should fail");
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn builder_overrides_timeout() {
        let config = SolverConfig::new()
            .with_timeout(Duration::from_millis(250))
            .with_debug(true);
        assert_eq!(config.timeout_ms, 250);
        assert!(config.debug);
    }
}
