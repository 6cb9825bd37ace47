//! # Data Model Layer
//!
//! Serde-serializable domain types shared by the scheduler, tracker, alert
//! factory, and audit trail:
//!
//! - [`indicator`] - monitored KPI definitions and scheduling state
//! - [`execution`] - in-flight execution records and collaborator outcomes
//! - [`alert`] - severity-classified alert records
//! - [`event`] - append-only stored events and audit trail queries

pub mod alert;
pub mod event;
pub mod execution;
pub mod indicator;

pub use alert::{Alert, AlertPriority, AlertSeverity};
pub use event::{AuditEvent, AuditQuery, AuditTrailEntry, EventMetadata, NewEvent, StoredEvent};
pub use execution::{ExecutionOutcome, ExecutionRecord, ExecutionStatus};
pub use indicator::Indicator;
