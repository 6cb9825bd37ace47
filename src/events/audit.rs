//! # Audit Trail Service
//!
//! Wraps the event store: records batches of domain events grouped by their
//! target stream, fans stored events out to subscribers over a broadcast
//! channel, and answers filtered, paginated historical queries.
//!
//! Publishing is at-least-once and best-effort: the durable record already
//! exists in the event store by the time the broadcast happens, so publish
//! failures are logged and never retried.

use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, warn};

use crate::constants::audit::{DEFAULT_PAGE_SIZE, DEFAULT_PUBLISH_CAPACITY};
use crate::error::Result;
use crate::models::{AuditEvent, AuditQuery, AuditTrailEntry, EventMetadata, NewEvent, StoredEvent};

use super::store::EventStore;

/// Audit trail service over an [`EventStore`]
pub struct AuditTrailService {
    store: Arc<dyn EventStore>,
    sender: broadcast::Sender<StoredEvent>,
}

impl AuditTrailService {
    pub fn new(store: Arc<dyn EventStore>) -> Self {
        Self::with_capacity(store, DEFAULT_PUBLISH_CAPACITY)
    }

    pub fn with_capacity(store: Arc<dyn EventStore>, capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { store, sender }
    }

    /// Subscribe to all events recorded from this point on.
    pub fn subscribe(&self) -> broadcast::Receiver<StoredEvent> {
        self.sender.subscribe()
    }

    /// Number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Record a batch of domain events.
    ///
    /// Events are grouped by target stream (derived from entity type + id),
    /// each group is appended in submission order, and every stored event is
    /// then broadcast to subscribers.
    pub async fn record(&self, events: Vec<AuditEvent>) -> Result<Vec<StoredEvent>> {
        // Group by stream, preserving submission order within each group
        let mut groups: HashMap<String, Vec<NewEvent>> = HashMap::new();
        for event in events {
            let stream_id = event.stream_id();
            groups.entry(stream_id).or_default().push(NewEvent {
                event_type: event.event_type,
                payload: json!({
                    "description": event.description,
                    "details": event.details,
                }),
                metadata: EventMetadata {
                    actor: event.actor,
                    ..EventMetadata::default()
                },
            });
        }

        let mut stored = Vec::new();
        for (stream_id, group) in groups {
            let appended = self.store.append(&stream_id, group, None).await?;
            stored.extend(appended);
        }

        for event in &stored {
            // Best-effort fan-out; no subscribers is not an error
            if let Err(broadcast::error::SendError(event)) = self.sender.send(event.clone()) {
                debug!(
                    stream_id = %event.stream_id,
                    event_type = %event.event_type,
                    "No audit subscribers registered, event not published"
                );
            }
        }

        Ok(stored)
    }

    /// Query the audit trail, newest-first, paginated via skip/take.
    pub async fn query(&self, query: &AuditQuery) -> Result<Vec<AuditTrailEntry>> {
        let events = self.store.all_events().await?;

        let mut entries: Vec<AuditTrailEntry> = events
            .into_iter()
            .filter(|event| {
                let (entity_type, entity_id) = event.entity_parts();
                if let Some(filter) = &query.entity_type {
                    if entity_type != filter {
                        return false;
                    }
                }
                if let Some(filter) = &query.entity_id {
                    if entity_id != filter {
                        return false;
                    }
                }
                if let Some(filter) = &query.actor {
                    if event.metadata.actor.as_deref() != Some(filter.as_str()) {
                        return false;
                    }
                }
                if let Some(from) = query.from {
                    if event.recorded_at < from {
                        return false;
                    }
                }
                if let Some(to) = query.to {
                    if event.recorded_at > to {
                        return false;
                    }
                }
                if let Some(search) = &query.search {
                    let needle = search.to_lowercase();
                    let description = event
                        .payload
                        .get("description")
                        .and_then(|v| v.as_str())
                        .unwrap_or("")
                        .to_lowercase();
                    let details = event
                        .payload
                        .get("details")
                        .map(|v| v.to_string().to_lowercase())
                        .unwrap_or_default();
                    if !description.contains(&needle) && !details.contains(&needle) {
                        return false;
                    }
                }
                true
            })
            .map(|event| {
                let (entity_type, entity_id) = event.entity_parts();
                AuditTrailEntry {
                    event_id: event.event_id,
                    entity_type: entity_type.to_string(),
                    entity_id: entity_id.to_string(),
                    event_type: event.event_type.clone(),
                    description: event
                        .payload
                        .get("description")
                        .and_then(|v| v.as_str())
                        .unwrap_or("")
                        .to_string(),
                    details: event
                        .payload
                        .get("details")
                        .cloned()
                        .unwrap_or(serde_json::Value::Null),
                    actor: event.metadata.actor.clone(),
                    version: event.version,
                    occurred_at: event.recorded_at,
                }
            })
            .collect();

        // Newest first; versions break ties within identical timestamps
        entries.sort_by(|a, b| {
            b.occurred_at
                .cmp(&a.occurred_at)
                .then(b.version.cmp(&a.version))
        });

        let take = query.take.unwrap_or(DEFAULT_PAGE_SIZE);
        if query.skip > 0 || take < entries.len() {
            debug!(
                skip = query.skip,
                take, "Paginating audit trail query result"
            );
        }
        Ok(entries.into_iter().skip(query.skip).take(take).collect())
    }

    /// Record events, swallowing (but logging) failures.
    ///
    /// Used by the tracker on paths where an audit write must not fail the
    /// execution it documents.
    pub async fn record_best_effort(&self, events: Vec<AuditEvent>) {
        if let Err(e) = self.record(events).await {
            warn!(error = %e, "Failed to record audit events");
        }
    }
}
