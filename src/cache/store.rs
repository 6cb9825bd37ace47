//! # Shared Cache Tier
//!
//! Trait for the shared (second) cache tier plus an in-memory implementation.
//! A production deployment swaps in a distributed backend behind the same
//! trait; the adaptive cache never notices.

use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::Value;
use std::time::{Duration, Instant};
use thiserror::Error;

/// Errors raised by a shared cache backend
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Cache connection error: {0}")]
    Connection(String),

    #[error("Cache serialization error: {0}")]
    Serialization(String),

    #[error("Cache backend error: {0}")]
    Backend(String),
}

pub type CacheResult<T> = Result<T, CacheError>;

/// Contract for the shared cache tier
#[async_trait]
pub trait SharedCacheStore: Send + Sync {
    /// `Ok(Some(value))` on hit, `Ok(None)` on miss or expired entry.
    async fn get(&self, key: &str) -> CacheResult<Option<Value>>;

    async fn set(&self, key: &str, value: Value, ttl: Duration) -> CacheResult<()>;

    async fn remove(&self, key: &str) -> CacheResult<()>;

    /// Remove every key starting with `prefix`, returning the removed count.
    async fn remove_prefix(&self, prefix: &str) -> CacheResult<u64>;

    fn provider_name(&self) -> &'static str;
}

/// In-memory shared tier backed by a concurrent map with per-entry expiry
#[derive(Debug, Default)]
pub struct InMemorySharedStore {
    entries: DashMap<String, (Value, Instant)>,
}

impl InMemorySharedStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl SharedCacheStore for InMemorySharedStore {
    async fn get(&self, key: &str) -> CacheResult<Option<Value>> {
        if let Some(entry) = self.entries.get(key) {
            let (value, expires_at) = entry.value();
            if *expires_at > Instant::now() {
                return Ok(Some(value.clone()));
            }
        }
        // Expired entries are dropped lazily on read
        self.entries
            .remove_if(key, |_, (_, expires_at)| *expires_at <= Instant::now());
        Ok(None)
    }

    async fn set(&self, key: &str, value: Value, ttl: Duration) -> CacheResult<()> {
        self.entries
            .insert(key.to_string(), (value, Instant::now() + ttl));
        Ok(())
    }

    async fn remove(&self, key: &str) -> CacheResult<()> {
        self.entries.remove(key);
        Ok(())
    }

    async fn remove_prefix(&self, prefix: &str) -> CacheResult<u64> {
        let before = self.entries.len();
        self.entries.retain(|key, _| !key.starts_with(prefix));
        Ok((before - self.entries.len()) as u64)
    }

    fn provider_name(&self) -> &'static str {
        "in-memory"
    }
}

/// Shared store that fails every operation. Test-only, for exercising the
/// adaptive cache's degradation path.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct FailingSharedStore;

#[cfg(test)]
#[async_trait]
impl SharedCacheStore for FailingSharedStore {
    async fn get(&self, _key: &str) -> CacheResult<Option<Value>> {
        Err(CacheError::Connection("shared tier unavailable".to_string()))
    }

    async fn set(&self, _key: &str, _value: Value, _ttl: Duration) -> CacheResult<()> {
        Err(CacheError::Connection("shared tier unavailable".to_string()))
    }

    async fn remove(&self, _key: &str) -> CacheResult<()> {
        Err(CacheError::Connection("shared tier unavailable".to_string()))
    }

    async fn remove_prefix(&self, _prefix: &str) -> CacheResult<u64> {
        Err(CacheError::Connection("shared tier unavailable".to_string()))
    }

    fn provider_name(&self) -> &'static str {
        "failing"
    }
}
