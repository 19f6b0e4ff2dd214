//! Integrations that rely on third-party services.
//!
//! This module groups the captcha strategy adapters and the recognition
//! engine seam that bridge the solve pipeline with the outside world.

pub mod captcha;
pub mod recognition;

pub use captcha::{HCaptchaStrategy, ReCaptchaStrategy};
