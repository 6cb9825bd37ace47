//! # Execution Records
//!
//! In-memory bookkeeping for in-flight indicator executions, plus the result
//! shape returned by the external execution collaborator.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle status of a tracked execution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStatus {
    Running,
    Completed,
    Failed,
}

impl ExecutionStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ExecutionStatus::Completed | ExecutionStatus::Failed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ExecutionStatus::Running => "running",
            ExecutionStatus::Completed => "completed",
            ExecutionStatus::Failed => "failed",
        }
    }
}

/// Result returned by the execution collaborator for one indicator run
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExecutionOutcome {
    pub success: bool,
    pub current_value: f64,
    pub historical_value: f64,
    pub error: Option<String>,
}

/// Point-in-time record of one in-flight (or recently finished) execution.
///
/// Created when a job starts; terminal records are evicted by the tracker's
/// cleanup pass once the grace period has elapsed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionRecord {
    pub indicator_id: Uuid,
    pub indicator_name: String,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub status: ExecutionStatus,
    pub duration_ms: Option<u64>,
    pub error_message: Option<String>,
    pub outcome: Option<ExecutionOutcome>,
}

impl ExecutionRecord {
    /// Start tracking a freshly launched execution.
    pub fn started(indicator_id: Uuid, indicator_name: impl Into<String>) -> Self {
        Self {
            indicator_id,
            indicator_name: indicator_name.into(),
            started_at: Utc::now(),
            completed_at: None,
            status: ExecutionStatus::Running,
            duration_ms: None,
            error_message: None,
            outcome: None,
        }
    }

    /// Transition to a terminal status, stamping completion time and duration.
    pub fn finish(
        &mut self,
        status: ExecutionStatus,
        outcome: Option<ExecutionOutcome>,
        error_message: Option<String>,
    ) {
        debug_assert!(status.is_terminal());
        let now = Utc::now();
        self.completed_at = Some(now);
        self.duration_ms = Some((now - self.started_at).num_milliseconds().max(0) as u64);
        self.status = status;
        self.outcome = outcome;
        self.error_message = error_message;
    }

    /// How long this execution has been (or was) running, measured at `now`.
    pub fn running_for(&self, now: DateTime<Utc>) -> chrono::Duration {
        self.completed_at.unwrap_or(now) - self.started_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn started_record_is_running() {
        let record = ExecutionRecord::started(Uuid::new_v4(), "signups");
        assert_eq!(record.status, ExecutionStatus::Running);
        assert!(record.completed_at.is_none());
        assert!(!record.status.is_terminal());
    }

    #[test]
    fn finish_stamps_duration_and_status() {
        let mut record = ExecutionRecord::started(Uuid::new_v4(), "signups");
        record.finish(
            ExecutionStatus::Failed,
            None,
            Some("query timed out".to_string()),
        );
        assert_eq!(record.status, ExecutionStatus::Failed);
        assert!(record.completed_at.is_some());
        assert!(record.duration_ms.is_some());
        assert_eq!(record.error_message.as_deref(), Some("query timed out"));
    }
}
