//! # selfbot-extras
//!
//! Add-ons for Discord selfbot clients: a captcha solve pipeline, message
//! and presence automation helpers, and accessors for profile cosmetics.
//!
//! The pipeline does not ship real captcha solvers. Integrators register a
//! [`SolveStrategy`] per service and, optionally, an OCR [`EngineFactory`];
//! the pipeline contributes caching, retries with backoff, per-attempt
//! timeouts, and statistics.
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use selfbot_extras::{CaptchaService, FnStrategy, SolvePipeline, SolveRequest, SolverConfig};
//!
//! #[tokio::main]
//! async fn main() {
//!     let solver = FnStrategy::new("my-hcaptcha", |request: SolveRequest| async move {
//!         let _ = request.site_key;
//!         Ok::<_, selfbot_extras::CaptchaError>(None)
//!     });
//!     let pipeline = SolvePipeline::new(SolverConfig::default())
//!         .with_strategy(CaptchaService::HCaptcha, Arc::new(solver));
//!
//!     let request = SolveRequest::new("hcaptcha", "site-key").with_request_token("rqtoken");
//!     match pipeline.solve(&request).await {
//!         Some(token) => println!("solved: {token}"),
//!         None => println!("unsolved, stats: {:?}", pipeline.stats()),
//!     }
//! }
//! ```

pub mod config;
pub mod external_deps;
pub mod modules;
pub mod profile;
pub mod solver;

pub use crate::config::{ConfigError, SolverConfig};

pub use crate::external_deps::captcha::{
    CaptchaError,
    CaptchaService,
    FnStrategy,
    HCaptchaStrategy,
    ReCaptchaStrategy,
    SolveRequest,
    SolveStrategy,
    StrategyResult,
    StrategyTable,
};

pub use crate::external_deps::recognition::{
    EngineError,
    EngineFactory,
    EngineResult,
    Recognition,
    RecognitionEngine,
    RecognizeOptions,
};

pub use crate::solver::{
    BackoffPolicy,
    RATE_UNAVAILABLE,
    SolvePipeline,
    SolverStats,
    StatsReport,
    backoff_delay,
};

pub use crate::modules::{
    AutoResponder,
    AutomationError,
    MessageQueue,
    MessageSender,
    Presence,
    PresenceCycler,
    PresenceStatus,
    QueuedMessage,
    RateLimitConfig,
    RateLimiter,
    ResponseRule,
    Trigger,
    TypingConfig,
    TypingIndicator,
    TypingSimulator,
};

pub use crate::profile::{
    AvatarDecoration,
    Nameplate,
    PrimaryGuild,
    ProfileCosmetics,
    ProfileEffect,
    ProfileError,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
