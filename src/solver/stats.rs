//! Solve statistics.
//!
//! Counters only ever grow until an explicit reset. Rates are derived when a
//! report is taken.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Placeholder reported for rates while no solve has been attempted.
pub const RATE_UNAVAILABLE: &str = "N/A";

/// Raw counters maintained by the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolverStats {
    pub total: u64,
    pub successful: u64,
    pub failed: u64,
    pub cached: u64,
    pub since: DateTime<Utc>,
}

impl Default for SolverStats {
    fn default() -> Self {
        Self {
            total: 0,
            successful: 0,
            failed: 0,
            cached: 0,
            since: Utc::now(),
        }
    }
}

impl SolverStats {
    pub fn record_attempt(&mut self) {
        self.total += 1;
    }

    pub fn record_success(&mut self) {
        self.successful += 1;
    }

    /// A cache hit also counts as a success.
    pub fn record_cache_hit(&mut self) {
        self.cached += 1;
        self.successful += 1;
    }

    pub fn record_failure(&mut self) {
        self.failed += 1;
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn report(&self) -> StatsReport {
        StatsReport {
            total: self.total,
            successful: self.successful,
            failed: self.failed,
            cached: self.cached,
            success_rate: format_rate(self.successful, self.total),
            cache_hit_rate: format_rate(self.cached, self.total),
            since: self.since,
        }
    }
}

/// Snapshot returned by [`crate::SolvePipeline::stats`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsReport {
    pub total: u64,
    pub successful: u64,
    pub failed: u64,
    pub cached: u64,
    /// `"N/A"` while `total == 0`, otherwise a percentage such as `"66.67%"`.
    pub success_rate: String,
    pub cache_hit_rate: String,
    /// When counting started: pipeline creation or the last reset.
    pub since: DateTime<Utc>,
}

fn format_rate(count: u64, total: u64) -> String {
    if total == 0 {
        return RATE_UNAVAILABLE.to_string();
    }
    format!("{:.2}%", count as f64 / total as f64 * 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_stats_report_sentinel_rates() {
        let report = SolverStats::default().report();
        assert_eq!(report.total, 0);
        assert_eq!(report.success_rate, "N/A");
        assert_eq!(report.cache_hit_rate, "N/A");
    }

    #[test]
    fn rates_use_two_decimals() {
        let mut stats = SolverStats::default();
        for _ in 0..3 {
            stats.record_attempt();
        }
        stats.record_success();
        stats.record_cache_hit();
        stats.record_failure();

        let report = stats.report();
        assert_eq!(report.successful, 2);
        assert_eq!(report.success_rate, "66.67%");
        assert_eq!(report.cache_hit_rate, "33.33%");
    }

    #[test]
    fn report_serializes_camel_case() {
        let value = serde_json::to_value(SolverStats::default().report()).unwrap();
        assert_eq!(value["successRate"], "N/A");
        assert_eq!(value["cacheHitRate"], "N/A");
        assert!(value["since"].is_string());
    }

    #[test]
    fn reset_zeroes_counters() {
        let mut stats = SolverStats::default();
        let started = stats.since;
        stats.record_attempt();
        stats.record_failure();
        stats.reset();
        assert_eq!(stats.total, 0);
        assert_eq!(stats.failed, 0);
        assert!(stats.report().since >= started);
    }
}
