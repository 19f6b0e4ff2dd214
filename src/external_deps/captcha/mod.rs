//! Captcha strategy integrations.
//!
//! A strategy knows how to produce a solution token for one captcha service.
//! The solve pipeline stays agnostic of how that happens: it only dispatches
//! a [`SolveRequest`] to the strategy registered for the request's service
//! and treats the outcome as opaque.

mod hcaptcha;
mod recaptcha;

pub use hcaptcha::HCaptchaStrategy;
pub use recaptcha::ReCaptchaStrategy;

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Captcha services the pipeline knows how to dispatch.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum CaptchaService {
    HCaptcha,
    ReCaptcha,
    /// Anything else. Keeps the raw name for diagnostics.
    Unknown(String),
}

impl CaptchaService {
    /// Case-insensitive lookup; unrecognised names map to [`CaptchaService::Unknown`].
    pub fn parse(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "hcaptcha" => CaptchaService::HCaptcha,
            "recaptcha" => CaptchaService::ReCaptcha,
            _ => CaptchaService::Unknown(name.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            CaptchaService::HCaptcha => "hcaptcha",
            CaptchaService::ReCaptcha => "recaptcha",
            CaptchaService::Unknown(_) => "unknown",
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, CaptchaService::Unknown(_))
    }
}

impl fmt::Display for CaptchaService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaptchaService::Unknown(raw) => write!(f, "unknown({raw})"),
            known => f.write_str(known.as_str()),
        }
    }
}

impl From<&str> for CaptchaService {
    fn from(name: &str) -> Self {
        Self::parse(name)
    }
}

impl From<String> for CaptchaService {
    fn from(name: String) -> Self {
        Self::parse(&name)
    }
}

impl From<CaptchaService> for String {
    fn from(service: CaptchaService) -> Self {
        match service {
            CaptchaService::Unknown(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

/// Details describing a captcha challenge issued by the upstream client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolveRequest {
    pub service: CaptchaService,
    pub site_key: String,
    /// Per-challenge token (`rqtoken`). Forwarded to strategies, never cached.
    pub request_token: String,
    pub user_agent: String,
}

impl SolveRequest {
    pub fn new(service: impl Into<CaptchaService>, site_key: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            site_key: site_key.into(),
            request_token: String::new(),
            user_agent: String::new(),
        }
    }

    pub fn with_request_token(mut self, token: impl Into<String>) -> Self {
        self.request_token = token.into();
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}

/// Outcome of a single strategy attempt. `Ok(None)` means "could not solve".
pub type StrategyResult = Result<Option<String>, CaptchaError>;

/// Shared interface implemented by captcha strategies.
#[async_trait]
pub trait SolveStrategy: Send + Sync {
    fn name(&self) -> &'static str;
    async fn attempt(&self, request: &SolveRequest) -> StrategyResult;
}

/// Adapts an async closure into a [`SolveStrategy`].
pub struct FnStrategy<F> {
    name: &'static str,
    func: F,
}

impl<F, Fut> FnStrategy<F>
where
    F: Fn(SolveRequest) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = StrategyResult> + Send + 'static,
{
    pub fn new(name: &'static str, func: F) -> Self {
        Self { name, func }
    }
}

#[async_trait]
impl<F, Fut> SolveStrategy for FnStrategy<F>
where
    F: Fn(SolveRequest) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = StrategyResult> + Send + 'static,
{
    fn name(&self) -> &'static str {
        self.name
    }

    async fn attempt(&self, request: &SolveRequest) -> StrategyResult {
        (self.func)(request.clone()).await
    }
}

/// Maps each known service to the strategy that handles it.
#[derive(Clone, Default)]
pub struct StrategyTable {
    hcaptcha: Option<Arc<dyn SolveStrategy>>,
    recaptcha: Option<Arc<dyn SolveStrategy>>,
}

impl StrategyTable {
    /// A table with no strategies registered.
    pub fn empty() -> Self {
        Self::default()
    }

    /// The built-in placeholder strategies, which never produce a solution.
    pub fn placeholders() -> Self {
        Self {
            hcaptcha: Some(Arc::new(HCaptchaStrategy::new())),
            recaptcha: Some(Arc::new(ReCaptchaStrategy::new())),
        }
    }

    /// Register `strategy` for `service`. Registering for an unknown service
    /// is ignored.
    pub fn with(mut self, service: CaptchaService, strategy: Arc<dyn SolveStrategy>) -> Self {
        self.set(service, strategy);
        self
    }

    pub fn set(&mut self, service: CaptchaService, strategy: Arc<dyn SolveStrategy>) {
        match service {
            CaptchaService::HCaptcha => self.hcaptcha = Some(strategy),
            CaptchaService::ReCaptcha => self.recaptcha = Some(strategy),
            CaptchaService::Unknown(raw) => {
                log::warn!("ignoring strategy '{}' for unknown service '{raw}'", strategy.name());
            }
        }
    }

    pub fn get(&self, service: &CaptchaService) -> Option<&Arc<dyn SolveStrategy>> {
        match service {
            CaptchaService::HCaptcha => self.hcaptcha.as_ref(),
            CaptchaService::ReCaptcha => self.recaptcha.as_ref(),
            CaptchaService::Unknown(_) => None,
        }
    }
}

impl fmt::Debug for StrategyTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StrategyTable")
            .field("hcaptcha", &self.hcaptcha.as_ref().map(|s| s.name()))
            .field("recaptcha", &self.recaptcha.as_ref().map(|s| s.name()))
            .finish()
    }
}

/// Errors surfaced by captcha strategies.
#[derive(Debug, Error)]
pub enum CaptchaError {
    #[error("captcha strategy failed: {0}")]
    Strategy(String),
    #[error("captcha attempt timed out after {0:?}")]
    Timeout(Duration),
    #[error("captcha strategy panicked: {0}")]
    Panicked(String),
}
