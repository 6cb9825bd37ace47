//! # Structured Error Handling
//!
//! Error taxonomy for the indicator core. Transient collaborator failures
//! (`Repository`, `Execution`) are logged and isolated by the tracker;
//! `ConcurrencyConflict` is surfaced to event-store callers who must re-read
//! and retry; `Configuration` errors are rejected before an indicator ever
//! reaches the scheduler.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum VigilError {
    /// Indicator repository call failed (treated as transient by the cycle loop)
    #[error("Repository error: {0}")]
    Repository(String),

    /// The external execution collaborator failed for one indicator
    #[error("Execution error: {0}")]
    Execution(String),

    /// Event store failure other than a version conflict
    #[error("Event error: {0}")]
    Event(String),

    /// Optimistic concurrency check failed on append
    #[error("Concurrency conflict on stream '{stream_id}': expected version {expected}, stream is at {actual}")]
    ConcurrencyConflict {
        stream_id: String,
        expected: u64,
        actual: u64,
    },

    /// Invalid indicator or core configuration, rejected before scheduling
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Lifecycle misuse (e.g. starting an already-running tracker)
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// A bounded wait (shutdown, stop) exceeded its deadline
    #[error("Timeout: {0}")]
    Timeout(String),
}

pub type Result<T> = std::result::Result<T, VigilError>;
