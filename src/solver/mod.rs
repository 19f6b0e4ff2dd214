//! The captcha solve pipeline and its bookkeeping.

pub mod pipeline;
pub mod stats;
pub mod timing;

pub use pipeline::SolvePipeline;
pub use stats::{RATE_UNAVAILABLE, SolverStats, StatsReport};
pub use timing::{BackoffPolicy, backoff_delay};
