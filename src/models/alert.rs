//! # Alert Model
//!
//! Severity-classified alert records produced by the alert factory. Alerts
//! are immutable once created except for the resolution fields, which are
//! owned by an external resolution workflow.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Alerting priority of an indicator.
///
/// High-priority indicators (those also notifying through a low-latency
/// channel) use lower deviation cut points so they escalate sooner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertPriority {
    Standard,
    High,
}

/// Alert severity, totally ordered from `Low` to `Emergency`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertSeverity {
    Low,
    Medium,
    High,
    Critical,
    Emergency,
}

impl AlertSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertSeverity::Low => "low",
            AlertSeverity::Medium => "medium",
            AlertSeverity::High => "high",
            AlertSeverity::Critical => "critical",
            AlertSeverity::Emergency => "emergency",
        }
    }
}

/// A raised alert for one indicator execution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alert {
    pub indicator_id: Uuid,
    pub severity: AlertSeverity,
    pub subject: String,
    pub message: String,
    pub current_value: f64,
    pub historical_value: f64,
    pub deviation_percent: f64,
    pub triggered_at: DateTime<Utc>,
    pub resolved: bool,
    pub resolved_at: Option<DateTime<Utc>>,
    pub resolved_by: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_ordering_is_total() {
        assert!(AlertSeverity::Low < AlertSeverity::Medium);
        assert!(AlertSeverity::Medium < AlertSeverity::High);
        assert!(AlertSeverity::High < AlertSeverity::Critical);
        assert!(AlertSeverity::Critical < AlertSeverity::Emergency);
    }
}
