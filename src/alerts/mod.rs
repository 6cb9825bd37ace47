//! # Alert Factory
//!
//! Pure computation turning an execution result into a severity-classified
//! [`Alert`]. Deviation-based alerts compare a current value against a
//! historical baseline; threshold alerts report the absolute gap against a
//! fixed threshold. Persistence and dispatch are external concerns.
//!
//! Severity is looked up in a sorted breakpoint table keyed by indicator
//! priority rather than a chain of guards, so the cut points are data and the
//! lookup is trivially testable.

use chrono::Utc;

use crate::constants::{templates, HIGH_PRIORITY_BREAKPOINTS, STANDARD_PRIORITY_BREAKPOINTS};
use crate::models::{Alert, AlertPriority, AlertSeverity, Indicator};

/// Compute the relative deviation percent between a current and historical
/// value. Zero when the historical value is zero.
pub fn deviation_percent(current: f64, historical: f64) -> f64 {
    if historical == 0.0 {
        0.0
    } else {
        ((current - historical).abs() / historical.abs()) * 100.0
    }
}

/// Classify a deviation magnitude into a severity for the given priority.
pub fn severity_for(deviation: f64, priority: AlertPriority) -> AlertSeverity {
    let breakpoints = match priority {
        AlertPriority::High => &HIGH_PRIORITY_BREAKPOINTS,
        AlertPriority::Standard => &STANDARD_PRIORITY_BREAKPOINTS,
    };
    breakpoints
        .iter()
        .find(|(cut, _)| deviation >= *cut)
        .map(|(_, severity)| *severity)
        .unwrap_or(AlertSeverity::Low)
}

/// Substitute the named placeholders an indicator template may carry.
fn render_template(
    template: &str,
    indicator: &Indicator,
    current: f64,
    historical: f64,
    deviation: f64,
) -> String {
    template
        .replace("{Indicator}", &indicator.name)
        .replace("{Owner}", &indicator.owner)
        .replace("{CurrentValue}", &format!("{current:.2}"))
        .replace("{HistoricalValue}", &format!("{historical:.2}"))
        .replace("{Deviation}", &format!("{deviation:.2}"))
        .replace("{DateTime}", &Utc::now().to_rfc3339())
}

/// Stateless factory producing [`Alert`] values
#[derive(Debug, Clone, Copy, Default)]
pub struct AlertFactory;

impl AlertFactory {
    pub fn new() -> Self {
        Self
    }

    /// Build a deviation alert for an indicator execution.
    ///
    /// When `deviation` is not supplied it is computed as
    /// `abs(current - historical) / historical * 100` (zero when the
    /// historical value is zero), so a caller with its own rolling baseline
    /// can pass a precomputed number instead.
    pub fn create_alert(
        &self,
        indicator: &Indicator,
        current_value: f64,
        historical_value: f64,
        deviation: Option<f64>,
    ) -> Alert {
        let deviation =
            deviation.unwrap_or_else(|| deviation_percent(current_value, historical_value));
        let severity = severity_for(deviation, indicator.priority);

        let subject_template = if indicator.subject_template.is_empty() {
            templates::DEFAULT_SUBJECT
        } else {
            &indicator.subject_template
        };
        let message_template = if indicator.message_template.is_empty() {
            templates::DEFAULT_MESSAGE
        } else {
            &indicator.message_template
        };

        Alert {
            indicator_id: indicator.id,
            severity,
            subject: render_template(
                subject_template,
                indicator,
                current_value,
                historical_value,
                deviation,
            ),
            message: render_template(
                message_template,
                indicator,
                current_value,
                historical_value,
                deviation,
            ),
            current_value,
            historical_value,
            deviation_percent: deviation,
            triggered_at: Utc::now(),
            resolved: false,
            resolved_at: None,
            resolved_by: None,
        }
    }

    /// Build a threshold-breach alert, bypassing deviation math.
    ///
    /// The alert reports the absolute gap between the current value and the
    /// fixed threshold. Severity is derived by expressing the gap as a
    /// percentage of the threshold and reusing the priority breakpoints; a
    /// zero threshold uses the raw gap so severity stays monotonic.
    pub fn create_threshold_alert(
        &self,
        indicator: &Indicator,
        current_value: f64,
        threshold: f64,
    ) -> Alert {
        let gap = (current_value - threshold).abs();
        let gap_magnitude = if threshold == 0.0 {
            gap
        } else {
            (gap / threshold.abs()) * 100.0
        };
        let severity = severity_for(gap_magnitude, indicator.priority);

        let subject_template = if indicator.subject_template.is_empty() {
            templates::DEFAULT_THRESHOLD_SUBJECT
        } else {
            &indicator.subject_template
        };
        let message_template = if indicator.message_template.is_empty() {
            templates::DEFAULT_THRESHOLD_MESSAGE
        } else {
            &indicator.message_template
        };

        Alert {
            indicator_id: indicator.id,
            severity,
            subject: render_template(subject_template, indicator, current_value, threshold, gap),
            message: render_template(message_template, indicator, current_value, threshold, gap),
            current_value,
            historical_value: threshold,
            deviation_percent: gap,
            triggered_at: Utc::now(),
            resolved: false,
            resolved_at: None,
            resolved_by: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn indicator(priority: AlertPriority) -> Indicator {
        Indicator {
            id: Uuid::new_v4(),
            name: "checkout-conversion".to_string(),
            owner: "payments@example.com".to_string(),
            frequency_minutes: 60,
            lookback_minutes: 1440,
            last_run: None,
            currently_running: false,
            is_active: true,
            priority,
            deviation_threshold_percent: 10.0,
            fixed_threshold: None,
            subject_template: String::new(),
            message_template: String::new(),
            channels: vec!["email".to_string()],
        }
    }

    #[test]
    fn deviation_is_relative_percent() {
        assert_eq!(deviation_percent(60.0, 100.0), 40.0);
        assert_eq!(deviation_percent(150.0, 100.0), 50.0);
        assert_eq!(deviation_percent(5.0, 0.0), 0.0);
    }

    #[test]
    fn standard_priority_forty_percent_is_medium() {
        let ind = indicator(AlertPriority::Standard);
        let alert = AlertFactory::new().create_alert(&ind, 60.0, 100.0, None);
        assert_eq!(alert.deviation_percent, 40.0);
        assert_eq!(alert.severity, AlertSeverity::Medium);
    }

    #[test]
    fn high_priority_uses_lower_cut_points() {
        assert_eq!(
            severity_for(40.0, AlertPriority::High),
            AlertSeverity::High
        );
        assert_eq!(
            severity_for(40.0, AlertPriority::Standard),
            AlertSeverity::Medium
        );
        assert_eq!(
            severity_for(80.0, AlertPriority::High),
            AlertSeverity::Emergency
        );
        assert_eq!(
            severity_for(80.0, AlertPriority::Standard),
            AlertSeverity::Critical
        );
    }

    #[test]
    fn severity_is_monotonic_in_deviation() {
        for priority in [AlertPriority::Standard, AlertPriority::High] {
            let mut last = AlertSeverity::Low;
            for step in 0..300 {
                let severity = severity_for(f64::from(step), priority);
                assert!(severity >= last, "severity regressed at {step}%");
                last = severity;
            }
        }
    }

    #[test]
    fn boundary_values_use_at_least_semantics() {
        assert_eq!(
            severity_for(25.0, AlertPriority::Standard),
            AlertSeverity::Medium
        );
        assert_eq!(
            severity_for(100.0, AlertPriority::Standard),
            AlertSeverity::Emergency
        );
        assert_eq!(
            severity_for(10.0, AlertPriority::High),
            AlertSeverity::Medium
        );
        assert_eq!(severity_for(9.99, AlertPriority::High), AlertSeverity::Low);
    }

    #[test]
    fn templates_substitute_named_placeholders() {
        let mut ind = indicator(AlertPriority::Standard);
        ind.subject_template = "{Indicator} owned by {Owner}: {Deviation}%".to_string();
        let alert = AlertFactory::new().create_alert(&ind, 60.0, 100.0, None);
        assert_eq!(
            alert.subject,
            "checkout-conversion owned by payments@example.com: 40.00%"
        );
    }

    #[test]
    fn explicit_deviation_overrides_computation() {
        let ind = indicator(AlertPriority::Standard);
        let alert = AlertFactory::new().create_alert(&ind, 60.0, 100.0, Some(120.0));
        assert_eq!(alert.deviation_percent, 120.0);
        assert_eq!(alert.severity, AlertSeverity::Emergency);
    }

    #[test]
    fn threshold_alert_reports_absolute_gap() {
        let ind = indicator(AlertPriority::Standard);
        let alert = AlertFactory::new().create_threshold_alert(&ind, 130.0, 100.0);
        assert_eq!(alert.deviation_percent, 30.0);
        assert_eq!(alert.historical_value, 100.0);
        // 30% of threshold -> Medium for standard priority
        assert_eq!(alert.severity, AlertSeverity::Medium);
    }

    #[test]
    fn new_alerts_are_unresolved() {
        let ind = indicator(AlertPriority::Standard);
        let alert = AlertFactory::new().create_alert(&ind, 60.0, 100.0, None);
        assert!(!alert.resolved);
        assert!(alert.resolved_at.is_none());
    }
}
