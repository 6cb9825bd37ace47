//! # System Constants
//!
//! Core constants that define the operational boundaries of the indicator
//! scheduling and alerting system: boundary-aligned frequencies, tracker
//! timing defaults, cache tuning knobs, and alert severity breakpoints.

use crate::models::AlertSeverity;

/// Audit event type names emitted by the execution tracker
pub mod events {
    pub const INDICATOR_EXECUTION_COMPLETED: &str = "IndicatorExecutionCompleted";
    pub const INDICATOR_EXECUTION_FAILED: &str = "IndicatorExecutionFailed";
    pub const INDICATOR_EXECUTION_TIMED_OUT: &str = "IndicatorExecutionTimedOut";
    pub const ALERT_RAISED: &str = "AlertRaised";
}

/// Minutes in one UTC calendar day
pub const MINUTES_PER_DAY: i64 = 1440;

/// Execution frequencies (in minutes) whose boundaries align with the
/// calendar: every multiple divides the day evenly, so boundaries land on
/// :00/:05/:10..., the top of the hour, midnight, and so on.
pub const ALIGNED_FREQUENCIES: [u32; 12] = [1, 5, 10, 15, 30, 60, 120, 180, 240, 360, 720, 1440];

/// Execution tracker defaults
pub mod tracker {
    /// Maximum simultaneously running indicator executions
    pub const DEFAULT_MAX_CONCURRENT: usize = 5;
    /// Running longer than this marks an execution as stuck
    pub const DEFAULT_STUCK_AFTER_SECS: u64 = 30 * 60;
    /// Terminal records survive this long before cleanup evicts them
    pub const DEFAULT_CLEANUP_GRACE_SECS: u64 = 5 * 60;
    /// Interval between stuck-execution scans
    pub const DEFAULT_HEALTH_CHECK_INTERVAL_SECS: u64 = 30;
    /// Interval between scheduling cycles
    pub const DEFAULT_CYCLE_INTERVAL_SECS: u64 = 60;
    /// Backoff after a cycle-level failure before the next attempt
    pub const DEFAULT_CYCLE_BACKOFF_SECS: u64 = 30;
}

/// Adaptive cache defaults
pub mod cache {
    /// Base time-to-live applied before adaptive scaling
    pub const DEFAULT_BASE_TTL_SECS: u64 = 15 * 60;
    /// Accesses per hour above which an entry is considered hot
    pub const HOT_ACCESSES_PER_HOUR: f64 = 10.0;
    /// Accesses per hour below which an entry is considered cold
    pub const COLD_ACCESSES_PER_HOUR: f64 = 2.0;
    /// TTL multiplier for hot entries
    pub const HOT_TTL_FACTOR: f64 = 1.5;
    /// TTL multiplier for cold entries
    pub const COLD_TTL_FACTOR: f64 = 0.5;
    /// Interval between optimizer passes
    pub const DEFAULT_OPTIMIZER_INTERVAL_SECS: u64 = 5 * 60;
    /// Hit/miss samples older than this are pruned by the optimizer
    pub const METRICS_RETENTION_SECS: u64 = 24 * 60 * 60;
    /// Per-key access records idle longer than this are pruned
    pub const ACCESS_RETENTION_SECS: u64 = 7 * 24 * 60 * 60;
    /// Number of keys reported by analytics as "top keys"
    pub const TOP_KEYS_REPORTED: usize = 10;
}

/// Audit trail defaults
pub mod audit {
    /// Broadcast channel capacity for event subscribers
    pub const DEFAULT_PUBLISH_CAPACITY: usize = 1024;
    /// Page size applied when a query supplies no `take`
    pub const DEFAULT_PAGE_SIZE: usize = 50;
}

/// Deviation-percent breakpoints for high-priority indicators (those also
/// notifying via a low-latency channel). Sorted descending; the first
/// breakpoint at or below the deviation wins, else `Low`.
pub const HIGH_PRIORITY_BREAKPOINTS: [(f64, AlertSeverity); 4] = [
    (75.0, AlertSeverity::Emergency),
    (50.0, AlertSeverity::Critical),
    (25.0, AlertSeverity::High),
    (10.0, AlertSeverity::Medium),
];

/// Deviation-percent breakpoints for standard-priority indicators
pub const STANDARD_PRIORITY_BREAKPOINTS: [(f64, AlertSeverity); 4] = [
    (100.0, AlertSeverity::Emergency),
    (75.0, AlertSeverity::Critical),
    (50.0, AlertSeverity::High),
    (25.0, AlertSeverity::Medium),
];

/// Fallback alert templates used when an indicator configures none
pub mod templates {
    pub const DEFAULT_SUBJECT: &str = "[{Indicator}] deviation of {Deviation}% detected";
    pub const DEFAULT_MESSAGE: &str = "Indicator {Indicator} (owner: {Owner}) measured \
{CurrentValue} against a historical value of {HistoricalValue} at {DateTime}, \
a deviation of {Deviation}%.";
    pub const DEFAULT_THRESHOLD_SUBJECT: &str = "[{Indicator}] threshold breach detected";
    pub const DEFAULT_THRESHOLD_MESSAGE: &str = "Indicator {Indicator} (owner: {Owner}) \
measured {CurrentValue} against a fixed threshold of {HistoricalValue} at {DateTime} \
(gap: {Deviation}).";
}
