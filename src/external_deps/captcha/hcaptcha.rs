use super::{SolveRequest, SolveStrategy, StrategyResult};
use async_trait::async_trait;

/// Placeholder strategy for hCaptcha challenges.
///
/// Always reports "could not solve". Register a real strategy through
/// [`super::StrategyTable::with`] to replace it.
#[derive(Debug, Clone, Default)]
pub struct HCaptchaStrategy;

impl HCaptchaStrategy {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl SolveStrategy for HCaptchaStrategy {
    fn name(&self) -> &'static str {
        "hcaptcha"
    }

    async fn attempt(&self, request: &SolveRequest) -> StrategyResult {
        log::debug!("no hcaptcha solver available for site key {}", request.site_key);
        Ok(None)
    }
}
