//! # Event Store
//!
//! Append-only event log keyed by stream, with version-based optimistic
//! concurrency. Versions within a stream are contiguous, start at 0, and are
//! assigned at append time from the stream's current event count.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::HashMap;
use uuid::Uuid;

use crate::error::{Result, VigilError};
use crate::models::{NewEvent, StoredEvent};

/// Contract for append-only, versioned event storage.
///
/// `expected_version` of `None` appends unconditionally; `Some(v)` fails
/// with [`VigilError::ConcurrencyConflict`] unless the stream currently
/// holds exactly `v` events, leaving the stream unchanged. Concurrent
/// writers to one stream must use `expected_version` to detect conflicts.
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Append a batch of events to one stream, returning them with their
    /// assigned versions.
    async fn append(
        &self,
        stream_id: &str,
        events: Vec<NewEvent>,
        expected_version: Option<u64>,
    ) -> Result<Vec<StoredEvent>>;

    /// All events of a stream from `from_version` onward, ordered by version.
    async fn events_for_stream(&self, stream_id: &str, from_version: u64)
        -> Result<Vec<StoredEvent>>;

    /// All events of a given type across streams, ordered by timestamp.
    async fn events_by_type(&self, event_type: &str) -> Result<Vec<StoredEvent>>;

    /// All events recorded within `[from, to]`, ordered by timestamp.
    async fn events_in_range(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<StoredEvent>>;

    /// Every stored event, ordered by timestamp. Backs audit trail queries.
    async fn all_events(&self) -> Result<Vec<StoredEvent>>;
}

/// In-memory [`EventStore`] backed by a per-stream `Vec` under a lock.
///
/// The version counter is read and incremented under the same write lock
/// that performs the append, so concurrent appends to one stream serialize
/// correctly.
#[derive(Debug, Default)]
pub struct InMemoryEventStore {
    streams: RwLock<HashMap<String, Vec<StoredEvent>>>,
}

impl InMemoryEventStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current version (event count) of a stream; 0 for unknown streams.
    pub fn stream_version(&self, stream_id: &str) -> u64 {
        self.streams
            .read()
            .get(stream_id)
            .map(|events| events.len() as u64)
            .unwrap_or(0)
    }
}

#[async_trait]
impl EventStore for InMemoryEventStore {
    async fn append(
        &self,
        stream_id: &str,
        events: Vec<NewEvent>,
        expected_version: Option<u64>,
    ) -> Result<Vec<StoredEvent>> {
        let mut streams = self.streams.write();
        let stream = streams.entry(stream_id.to_string()).or_default();
        let current = stream.len() as u64;

        if let Some(expected) = expected_version {
            if expected != current {
                return Err(VigilError::ConcurrencyConflict {
                    stream_id: stream_id.to_string(),
                    expected,
                    actual: current,
                });
            }
        }

        let now = Utc::now();
        let mut stored = Vec::with_capacity(events.len());
        for (offset, event) in events.into_iter().enumerate() {
            let record = StoredEvent {
                event_id: Uuid::new_v4(),
                stream_id: stream_id.to_string(),
                event_type: event.event_type,
                payload: event.payload,
                metadata: event.metadata,
                version: current + offset as u64,
                recorded_at: now,
            };
            stream.push(record.clone());
            stored.push(record);
        }
        Ok(stored)
    }

    async fn events_for_stream(
        &self,
        stream_id: &str,
        from_version: u64,
    ) -> Result<Vec<StoredEvent>> {
        let streams = self.streams.read();
        Ok(streams
            .get(stream_id)
            .map(|events| {
                events
                    .iter()
                    .filter(|e| e.version >= from_version)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn events_by_type(&self, event_type: &str) -> Result<Vec<StoredEvent>> {
        let streams = self.streams.read();
        let mut events: Vec<StoredEvent> = streams
            .values()
            .flatten()
            .filter(|e| e.event_type == event_type)
            .cloned()
            .collect();
        events.sort_by_key(|e| e.recorded_at);
        Ok(events)
    }

    async fn events_in_range(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<StoredEvent>> {
        let streams = self.streams.read();
        let mut events: Vec<StoredEvent> = streams
            .values()
            .flatten()
            .filter(|e| e.recorded_at >= from && e.recorded_at <= to)
            .cloned()
            .collect();
        events.sort_by_key(|e| e.recorded_at);
        Ok(events)
    }

    async fn all_events(&self) -> Result<Vec<StoredEvent>> {
        let streams = self.streams.read();
        let mut events: Vec<StoredEvent> = streams.values().flatten().cloned().collect();
        events.sort_by_key(|e| e.recorded_at);
        Ok(events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::EventMetadata;
    use serde_json::json;

    fn event(event_type: &str) -> NewEvent {
        NewEvent {
            event_type: event_type.to_string(),
            payload: json!({"value": 1}),
            metadata: EventMetadata::default(),
        }
    }

    #[tokio::test]
    async fn fresh_stream_gets_contiguous_versions_from_zero() {
        let store = InMemoryEventStore::new();
        let stored = store
            .append(
                "Indicator-7",
                vec![event("a"), event("b"), event("c")],
                None,
            )
            .await
            .unwrap();
        let versions: Vec<u64> = stored.iter().map(|e| e.version).collect();
        assert_eq!(versions, vec![0, 1, 2]);
        assert_eq!(store.stream_version("Indicator-7"), 3);
    }

    #[tokio::test]
    async fn sequential_unchecked_appends_continue_numbering() {
        let store = InMemoryEventStore::new();
        for _ in 0..3 {
            store
                .append("Indicator-7", vec![event("executed")], None)
                .await
                .unwrap();
        }
        let events = store.events_for_stream("Indicator-7", 0).await.unwrap();
        let versions: Vec<u64> = events.iter().map(|e| e.version).collect();
        assert_eq!(versions, vec![0, 1, 2]);
    }

    #[tokio::test]
    async fn stale_expected_version_fails_and_leaves_stream_unchanged() {
        let store = InMemoryEventStore::new();
        store
            .append("Indicator-7", vec![event("a"), event("b"), event("c")], None)
            .await
            .unwrap();

        let result = store
            .append("Indicator-7", vec![event("d")], Some(1))
            .await;
        assert!(matches!(
            result,
            Err(VigilError::ConcurrencyConflict {
                expected: 1,
                actual: 3,
                ..
            })
        ));
        assert_eq!(store.stream_version("Indicator-7"), 3);
    }

    #[tokio::test]
    async fn matching_expected_version_succeeds() {
        let store = InMemoryEventStore::new();
        store.append("s", vec![event("a")], Some(0)).await.unwrap();
        let stored = store.append("s", vec![event("b")], Some(1)).await.unwrap();
        assert_eq!(stored[0].version, 1);
    }

    #[tokio::test]
    async fn events_for_stream_respects_from_version() {
        let store = InMemoryEventStore::new();
        store
            .append("s", vec![event("a"), event("b"), event("c")], None)
            .await
            .unwrap();
        let tail = store.events_for_stream("s", 1).await.unwrap();
        assert_eq!(tail.len(), 2);
        assert_eq!(tail[0].version, 1);
    }

    #[tokio::test]
    async fn events_by_type_spans_streams() {
        let store = InMemoryEventStore::new();
        store.append("a", vec![event("x")], None).await.unwrap();
        store.append("b", vec![event("x")], None).await.unwrap();
        store.append("b", vec![event("y")], None).await.unwrap();
        assert_eq!(store.events_by_type("x").await.unwrap().len(), 2);
        assert_eq!(store.events_by_type("y").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn time_range_query_is_inclusive() {
        let store = InMemoryEventStore::new();
        let before = Utc::now();
        store.append("s", vec![event("a")], None).await.unwrap();
        let after = Utc::now();
        assert_eq!(store.events_in_range(before, after).await.unwrap().len(), 1);
        let far_future = after + chrono::Duration::hours(1);
        let further = far_future + chrono::Duration::hours(1);
        assert!(store
            .events_in_range(far_future, further)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn concurrent_appends_to_one_stream_stay_contiguous() {
        let store = std::sync::Arc::new(InMemoryEventStore::new());
        let mut handles = Vec::new();
        for _ in 0..8 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store.append("s", vec![event("e")], None).await.unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }
        let events = store.events_for_stream("s", 0).await.unwrap();
        let mut versions: Vec<u64> = events.iter().map(|e| e.version).collect();
        versions.sort_unstable();
        assert_eq!(versions, (0..8).collect::<Vec<u64>>());
    }
}
