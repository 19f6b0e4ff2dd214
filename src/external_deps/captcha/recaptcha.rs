use super::{SolveRequest, SolveStrategy, StrategyResult};
use async_trait::async_trait;

/// Placeholder strategy for reCAPTCHA challenges.
#[derive(Debug, Clone, Default)]
pub struct ReCaptchaStrategy;

impl ReCaptchaStrategy {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl SolveStrategy for ReCaptchaStrategy {
    fn name(&self) -> &'static str {
        "recaptcha"
    }

    async fn attempt(&self, request: &SolveRequest) -> StrategyResult {
        log::debug!("no recaptcha solver available for site key {}", request.site_key);
        Ok(None)
    }
}
