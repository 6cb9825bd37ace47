//! # Indicator Model
//!
//! A monitored business metric (KPI) with its execution schedule and alerting
//! configuration. Indicators are created and updated by external configuration
//! management; the execution tracker only ever mutates `last_run` and
//! `currently_running`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Result, VigilError};
use crate::models::alert::AlertPriority;

/// A monitored KPI with scheduling and alerting configuration.
///
/// Invariants enforced by [`Indicator::validate`]: `frequency_minutes > 0`
/// and `lookback_minutes > 0`. An indicator failing validation never reaches
/// the scheduler.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Indicator {
    pub id: Uuid,
    /// Display name used in alert templates and dashboards
    pub name: String,
    /// Owning contact, substituted into alert templates as `{Owner}`
    pub owner: String,
    /// Execution frequency in minutes; boundaries are derived from this
    pub frequency_minutes: u32,
    /// How far back the underlying query looks, in minutes
    pub lookback_minutes: u32,
    /// Completion time of the most recent execution
    pub last_run: Option<DateTime<Utc>>,
    /// Set while an execution is in flight, cleared on completion
    pub currently_running: bool,
    /// Inactive indicators are skipped by every scheduling cycle
    pub is_active: bool,
    /// Alerting priority; high-priority indicators alert at lower deviations
    pub priority: AlertPriority,
    /// Minimum deviation percent before an alert is raised
    pub deviation_threshold_percent: f64,
    /// Optional fixed threshold for absolute-gap alerting
    pub fixed_threshold: Option<f64>,
    /// Alert subject template; falls back to the system default when empty
    pub subject_template: String,
    /// Alert message template; falls back to the system default when empty
    pub message_template: String,
    /// Delivery channels handed to the notification dispatcher
    pub channels: Vec<String>,
}

impl Indicator {
    /// Validate configuration invariants before the indicator is accepted.
    pub fn validate(&self) -> Result<()> {
        if self.frequency_minutes == 0 {
            return Err(VigilError::Configuration(format!(
                "indicator '{}': frequency_minutes must be greater than zero",
                self.name
            )));
        }
        if self.lookback_minutes == 0 {
            return Err(VigilError::Configuration(format!(
                "indicator '{}': lookback_minutes must be greater than zero",
                self.name
            )));
        }
        if self.deviation_threshold_percent < 0.0 {
            return Err(VigilError::Configuration(format!(
                "indicator '{}': deviation_threshold_percent must not be negative",
                self.name
            )));
        }
        Ok(())
    }

    /// Stream identifier for this indicator's audit events (`Indicator-{id}`)
    pub fn stream_id(&self) -> String {
        format!("Indicator-{}", self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Indicator {
        Indicator {
            id: Uuid::new_v4(),
            name: "daily-signups".to_string(),
            owner: "growth@example.com".to_string(),
            frequency_minutes: 60,
            lookback_minutes: 1440,
            last_run: None,
            currently_running: false,
            is_active: true,
            priority: AlertPriority::Standard,
            deviation_threshold_percent: 10.0,
            fixed_threshold: None,
            subject_template: String::new(),
            message_template: String::new(),
            channels: vec!["email".to_string()],
        }
    }

    #[test]
    fn valid_indicator_passes() {
        assert!(sample().validate().is_ok());
    }

    #[test]
    fn zero_frequency_rejected() {
        let mut indicator = sample();
        indicator.frequency_minutes = 0;
        assert!(matches!(
            indicator.validate(),
            Err(VigilError::Configuration(_))
        ));
    }

    #[test]
    fn zero_lookback_rejected() {
        let mut indicator = sample();
        indicator.lookback_minutes = 0;
        assert!(indicator.validate().is_err());
    }

    #[test]
    fn stream_id_uses_entity_type_prefix() {
        let indicator = sample();
        assert_eq!(indicator.stream_id(), format!("Indicator-{}", indicator.id));
    }
}
