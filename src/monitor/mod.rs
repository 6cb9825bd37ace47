//! # Monitoring Orchestration
//!
//! The execution tracker, the collaborator trait seams, and the
//! [`MonitorCore`] facade external callers hold on to.

pub mod core;
pub mod tracker;
pub mod traits;

pub use self::core::{Collaborators, MonitorCore};
pub use tracker::{CycleStats, ExecutionTracker, EXECUTION_TIMEOUT_MESSAGE};
pub use traits::{
    IndicatorExecutor, IndicatorRepository, NoOpTelemetrySink, NotificationDispatcher,
    TelemetrySink,
};
