//! # Stored Events & Audit Queries
//!
//! Event types for the append-only event store and the audit trail surface
//! built on top of it. Streams are identified as `{EntityType}-{entity_id}`
//! and carry contiguous versions starting at 0.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Metadata recorded alongside every stored event
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct EventMetadata {
    pub correlation_id: Option<Uuid>,
    pub causation_id: Option<Uuid>,
    /// User or system actor responsible for the event
    pub actor: Option<String>,
}

/// An event not yet appended to a stream
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewEvent {
    pub event_type: String,
    pub payload: Value,
    pub metadata: EventMetadata,
}

/// An event as persisted in the store, with its assigned stream version
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredEvent {
    pub event_id: Uuid,
    pub stream_id: String,
    pub event_type: String,
    pub payload: Value,
    pub metadata: EventMetadata,
    /// Contiguous per-stream version, assigned at append time
    pub version: u64,
    pub recorded_at: DateTime<Utc>,
}

impl StoredEvent {
    /// Split the stream id into `(entity_type, entity_id)`.
    ///
    /// Entity ids may themselves contain hyphens (UUIDs do), so only the
    /// first hyphen separates the two halves.
    pub fn entity_parts(&self) -> (&str, &str) {
        self.stream_id
            .split_once('-')
            .unwrap_or((self.stream_id.as_str(), ""))
    }
}

/// A domain event submitted to the audit trail service.
///
/// The target stream is derived from `entity_type` and `entity_id`; the
/// description and details become the searchable payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEvent {
    pub entity_type: String,
    pub entity_id: String,
    pub event_type: String,
    pub description: String,
    pub details: Value,
    pub actor: Option<String>,
}

impl AuditEvent {
    pub fn stream_id(&self) -> String {
        format!("{}-{}", self.entity_type, self.entity_id)
    }
}

/// A flattened, dashboard-friendly view of one stored event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditTrailEntry {
    pub event_id: Uuid,
    pub entity_type: String,
    pub entity_id: String,
    pub event_type: String,
    pub description: String,
    pub details: Value,
    pub actor: Option<String>,
    pub version: u64,
    pub occurred_at: DateTime<Utc>,
}

/// Filter and pagination parameters for audit trail queries.
///
/// All filters are conjunctive; results are always ordered newest-first.
#[derive(Debug, Clone, Default)]
pub struct AuditQuery {
    pub entity_type: Option<String>,
    pub entity_id: Option<String>,
    pub actor: Option<String>,
    /// Case-insensitive free-text match over description and details
    pub search: Option<String>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub skip: usize,
    pub take: Option<usize>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn entity_parts_split_on_first_hyphen_only() {
        let id = Uuid::new_v4();
        let event = StoredEvent {
            event_id: Uuid::new_v4(),
            stream_id: format!("Indicator-{id}"),
            event_type: "IndicatorExecutionCompleted".to_string(),
            payload: json!({}),
            metadata: EventMetadata::default(),
            version: 0,
            recorded_at: Utc::now(),
        };
        let (entity_type, entity_id) = event.entity_parts();
        assert_eq!(entity_type, "Indicator");
        assert_eq!(entity_id, id.to_string());
    }

    #[test]
    fn audit_event_builds_stream_id() {
        let event = AuditEvent {
            entity_type: "Indicator".to_string(),
            entity_id: "7".to_string(),
            event_type: "IndicatorExecutionFailed".to_string(),
            description: "execution failed".to_string(),
            details: json!({"error": "timeout"}),
            actor: None,
        };
        assert_eq!(event.stream_id(), "Indicator-7");
    }
}
