//! Message and presence automation helpers.
//!
//! Each helper is independent of the captcha pipeline and of the others:
//! pace outgoing actions, order queued messages, fake typing, reply to
//! triggers, and rotate presences.

pub mod auto_responder;
pub mod message_queue;
pub mod presence;
pub mod rate_limiter;
pub mod typing;

use thiserror::Error;

// Re-export commonly used types
pub use auto_responder::{AutoResponder, ResponseRule, Trigger};
pub use message_queue::{MessageQueue, MessageSender, QueuedMessage};
pub use presence::{Presence, PresenceCycler, PresenceStatus};
pub use rate_limiter::{RateLimitConfig, RateLimiter};
pub use typing::{TypingConfig, TypingIndicator, TypingSimulator};

/// Errors raised by the automation helpers.
#[derive(Debug, Error)]
pub enum AutomationError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("invalid trigger pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
    #[error("invalid rule definition: {0}")]
    Rules(#[from] serde_json::Error),
    #[error("presence rotation is empty")]
    EmptyRotation,
    #[error("message send failed: {0}")]
    Send(String),
    #[error("typing indicator failed: {0}")]
    Typing(String),
}
