//! # Event System
//!
//! Append-only, per-stream event storage with optimistic concurrency, plus
//! the audit trail service that publishes stored events to subscribers and
//! answers filtered historical queries.
//!
//! ## Architecture
//!
//! ```text
//! AuditTrailService
//!   ├── Arc<dyn EventStore>        <- durable record (in-memory stand-in here)
//!   └── broadcast::Sender          <- best-effort fan-out to subscribers
//! ```
//!
//! The in-memory store is a stand-in for a durable backend; a production
//! replacement only needs to honor the same append/version/query contract
//! behind [`EventStore`], which keeps the swap invisible to the audit
//! service.

pub mod audit;
pub mod store;

pub use audit::AuditTrailService;
pub use store::{EventStore, InMemoryEventStore};
