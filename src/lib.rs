#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Vigil Core
//!
//! Single-process core for periodic KPI indicator evaluation: boundary-aligned
//! scheduling, concurrency-bounded execution with stuck-job detection,
//! deviation-based alerting, an event-sourced audit trail, and a two-tier
//! adaptive cache.
//!
//! ## Architecture
//!
//! The boundary scheduler decides which indicators are due; the execution
//! tracker runs them through an external execution collaborator under a
//! concurrency cap; results flow into the alert factory (severity-classified
//! alerts) and the audit trail service (append-only stored events); the
//! adaptive cache fronts expensive read paths for any component.
//!
//! HTTP surfaces, dashboards, authentication, and persistence technology are
//! external: the core consumes collaborator traits
//! ([`monitor::IndicatorRepository`], [`monitor::IndicatorExecutor`],
//! [`monitor::NotificationDispatcher`], [`monitor::TelemetrySink`]) and
//! exposes the [`monitor::MonitorCore`] facade.
//!
//! ## Module Organization
//!
//! - [`scheduler`] - pure boundary-alignment scheduling math
//! - [`models`] - indicators, execution records, alerts, stored events
//! - [`alerts`] - deviation/threshold alert factory
//! - [`events`] - event store and audit trail service
//! - [`cache`] - two-tier adaptive cache
//! - [`monitor`] - execution tracker, collaborator seams, core facade
//! - [`config`] - validated configuration loading
//! - [`error`] - structured error handling
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use vigil_core::config::VigilConfig;
//! use vigil_core::monitor::{Collaborators, MonitorCore};
//!
//! # fn collaborators() -> Collaborators { unimplemented!() }
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = VigilConfig::load(None)?;
//! let core = MonitorCore::new(config, collaborators())?;
//! core.start().await?;
//! // ... later
//! core.shutdown(std::time::Duration::from_secs(30)).await?;
//! # Ok(())
//! # }
//! ```

pub mod alerts;
pub mod cache;
pub mod config;
pub mod constants;
pub mod error;
pub mod events;
pub mod logging;
pub mod models;
pub mod monitor;
pub mod scheduler;

pub use config::VigilConfig;
pub use error::{Result, VigilError};
pub use models::{
    Alert, AlertPriority, AlertSeverity, AuditEvent, AuditQuery, AuditTrailEntry,
    ExecutionOutcome, ExecutionRecord, ExecutionStatus, Indicator, StoredEvent,
};
pub use monitor::{Collaborators, MonitorCore};
