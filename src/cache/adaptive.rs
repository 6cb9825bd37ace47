//! # Adaptive Two-Tier Cache
//!
//! Fast tier in front of a [`SharedCacheStore`], with access-frequency-driven
//! expiration, hit/miss analytics, and a periodic optimizer that prunes stale
//! bookkeeping.

use dashmap::DashMap;
use parking_lot::Mutex;
use serde::Serialize;
use serde_json::Value;
use std::collections::VecDeque;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::constants::cache as defaults;
use crate::error::Result;

use super::store::SharedCacheStore;

/// Per-call cache options
#[derive(Debug, Clone)]
pub struct CacheOptions {
    /// Base time-to-live before adaptive scaling
    pub base_ttl: Duration,
}

impl Default for CacheOptions {
    fn default() -> Self {
        Self {
            base_ttl: Duration::from_secs(defaults::DEFAULT_BASE_TTL_SECS),
        }
    }
}

/// Point-in-time cache analytics for dashboards
#[derive(Debug, Clone, Serialize)]
pub struct CacheAnalytics {
    pub hits: u64,
    pub misses: u64,
    pub hit_rate: f64,
    pub miss_rate: f64,
    pub fast_tier_entries: usize,
    pub tracked_keys: usize,
    /// Most-accessed keys with their access counts, descending
    pub top_keys: Vec<(String, u64)>,
    pub recommendations: Vec<String>,
}

#[derive(Debug, Clone)]
struct FastEntry {
    value: Value,
    expires_at: Instant,
}

/// Access bookkeeping for one key, over a trailing one-hour window
#[derive(Debug, Clone)]
struct KeyStats {
    total_accesses: u64,
    window_start: Instant,
    window_count: u64,
    last_access: Instant,
}

impl KeyStats {
    fn record_access(&mut self, now: Instant) {
        if now.duration_since(self.window_start) >= Duration::from_secs(3600) {
            self.window_start = now;
            self.window_count = 0;
        }
        self.total_accesses += 1;
        self.window_count += 1;
        self.last_access = now;
    }
}

/// Scale the base TTL by the key's access frequency in the trailing hour.
fn adaptive_ttl(base: Duration, accesses_last_hour: f64) -> Duration {
    if accesses_last_hour > defaults::HOT_ACCESSES_PER_HOUR {
        base.mul_f64(defaults::HOT_TTL_FACTOR)
    } else if accesses_last_hour < defaults::COLD_ACCESSES_PER_HOUR {
        base.mul_f64(defaults::COLD_TTL_FACTOR)
    } else {
        base
    }
}

/// Two-tier adaptive cache.
///
/// Sits in front of expensive read paths; on any cache-layer failure the
/// factory is invoked directly so callers never observe cache errors.
pub struct AdaptiveCache {
    fast: DashMap<String, FastEntry>,
    shared: Arc<dyn SharedCacheStore>,
    stats: DashMap<String, KeyStats>,
    /// (observed_at, was_hit) samples, pruned by the optimizer
    samples: Mutex<VecDeque<(Instant, bool)>>,
}

impl AdaptiveCache {
    pub fn new(shared: Arc<dyn SharedCacheStore>) -> Self {
        Self {
            fast: DashMap::new(),
            shared,
            stats: DashMap::new(),
            samples: Mutex::new(VecDeque::new()),
        }
    }

    /// Effective TTL for a key given its recent access frequency.
    fn ttl_for(&self, key: &str, base: Duration) -> Duration {
        let accesses = self
            .stats
            .get(key)
            .map(|s| s.window_count as f64)
            .unwrap_or(0.0);
        adaptive_ttl(base, accesses)
    }

    fn record_access(&self, key: &str) {
        let now = Instant::now();
        self.stats
            .entry(key.to_string())
            .and_modify(|stats| stats.record_access(now))
            .or_insert_with(|| KeyStats {
                total_accesses: 1,
                window_start: now,
                window_count: 1,
                last_access: now,
            });
    }

    fn record_outcome(&self, hit: bool) {
        self.samples.lock().push_back((Instant::now(), hit));
    }

    /// Look up `key`, consulting the fast tier, then the shared tier
    /// (promoting a shared hit), and finally invoking `factory` and storing
    /// the result in both tiers.
    ///
    /// Factory errors propagate; cache-layer errors never do.
    pub async fn get_or_compute<F, Fut>(
        &self,
        key: &str,
        options: &CacheOptions,
        factory: F,
    ) -> Result<Value>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Value>>,
    {
        self.record_access(key);

        if let Some(entry) = self.fast.get(key) {
            if entry.expires_at > Instant::now() {
                self.record_outcome(true);
                return Ok(entry.value.clone());
            }
        }
        self.fast
            .remove_if(key, |_, entry| entry.expires_at <= Instant::now());

        match self.shared.get(key).await {
            Ok(Some(value)) => {
                self.record_outcome(true);
                let ttl = self.ttl_for(key, options.base_ttl);
                self.fast.insert(
                    key.to_string(),
                    FastEntry {
                        value: value.clone(),
                        expires_at: Instant::now() + ttl,
                    },
                );
                Ok(value)
            }
            Ok(None) => {
                self.record_outcome(false);
                let value = factory().await?;
                self.store_both(key, value.clone(), options.base_ttl).await;
                Ok(value)
            }
            Err(e) => {
                // Degrade to a direct factory call; cache failures stay invisible
                warn!(key, error = %e, "Shared cache tier failed, falling back to factory");
                self.record_outcome(false);
                factory().await
            }
        }
    }

    /// Store a value in both tiers with the adaptive TTL.
    pub async fn set(&self, key: &str, value: Value, options: &CacheOptions) {
        self.store_both(key, value, options.base_ttl).await;
    }

    async fn store_both(&self, key: &str, value: Value, base_ttl: Duration) {
        let ttl = self.ttl_for(key, base_ttl);
        self.fast.insert(
            key.to_string(),
            FastEntry {
                value: value.clone(),
                expires_at: Instant::now() + ttl,
            },
        );
        if let Err(e) = self.shared.set(key, value, ttl).await {
            warn!(key, error = %e, "Failed to write shared cache tier");
        }
    }

    /// Invalidate by exact key, or by prefix when `pattern` ends with `*`.
    pub async fn invalidate(&self, pattern: &str) -> u64 {
        let removed = if let Some(prefix) = pattern.strip_suffix('*') {
            let before = self.fast.len();
            self.fast.retain(|key, _| !key.starts_with(prefix));
            let fast_removed = (before - self.fast.len()) as u64;
            match self.shared.remove_prefix(prefix).await {
                Ok(shared_removed) => fast_removed.max(shared_removed),
                Err(e) => {
                    warn!(pattern, error = %e, "Failed to invalidate shared cache tier");
                    fast_removed
                }
            }
        } else {
            let fast_removed = u64::from(self.fast.remove(pattern).is_some());
            if let Err(e) = self.shared.remove(pattern).await {
                warn!(pattern, error = %e, "Failed to invalidate shared cache tier");
            }
            fast_removed
        };
        debug!(pattern, removed, "Cache invalidation");
        removed
    }

    /// Hit/miss rates, top keys, sizes, and tuning recommendations.
    pub fn analytics(&self) -> CacheAnalytics {
        let samples = self.samples.lock();
        let hits = samples.iter().filter(|(_, hit)| *hit).count() as u64;
        let misses = samples.len() as u64 - hits;
        drop(samples);

        let total = hits + misses;
        let hit_rate = if total == 0 {
            0.0
        } else {
            hits as f64 / total as f64
        };

        let mut top_keys: Vec<(String, u64)> = self
            .stats
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().total_accesses))
            .collect();
        top_keys.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        top_keys.truncate(defaults::TOP_KEYS_REPORTED);

        let mut recommendations = Vec::new();
        if total >= 20 && hit_rate < 0.5 {
            recommendations.push(format!(
                "Hit rate is {:.0}%; consider longer base TTLs or warming frequently-missed keys",
                hit_rate * 100.0
            ));
        }
        let hot_keys: Vec<&(String, u64)> = top_keys
            .iter()
            .filter(|(key, _)| {
                self.stats
                    .get(key)
                    .map(|s| s.window_count as f64 > defaults::HOT_ACCESSES_PER_HOUR)
                    .unwrap_or(false)
            })
            .collect();
        if !hot_keys.is_empty() {
            recommendations.push(format!(
                "{} hot key(s) receiving extended TTLs: {}",
                hot_keys.len(),
                hot_keys
                    .iter()
                    .map(|(key, _)| key.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            ));
        }

        CacheAnalytics {
            hits,
            misses,
            hit_rate,
            miss_rate: 1.0 - hit_rate,
            fast_tier_entries: self.fast.len(),
            tracked_keys: self.stats.len(),
            top_keys,
            recommendations,
        }
    }

    /// One optimizer pass: drop expired fast entries, prune hit/miss samples
    /// older than 24 hours and access records idle for more than 7 days.
    pub fn run_optimizer_once(&self) {
        let now = Instant::now();
        self.fast.retain(|_, entry| entry.expires_at > now);

        let metrics_cutoff = Duration::from_secs(defaults::METRICS_RETENTION_SECS);
        let mut samples = self.samples.lock();
        while let Some((observed_at, _)) = samples.front() {
            if now.duration_since(*observed_at) > metrics_cutoff {
                samples.pop_front();
            } else {
                break;
            }
        }
        drop(samples);

        let access_cutoff = Duration::from_secs(defaults::ACCESS_RETENTION_SECS);
        self.stats
            .retain(|_, stats| now.duration_since(stats.last_access) <= access_cutoff);

        debug!(
            fast_entries = self.fast.len(),
            tracked_keys = self.stats.len(),
            "Cache optimizer pass complete"
        );
    }

    /// Spawn the periodic optimizer, running until the token is cancelled.
    pub fn spawn_optimizer(
        self: &Arc<Self>,
        interval: Duration,
        shutdown: CancellationToken,
    ) -> JoinHandle<()> {
        let cache = Arc::clone(self);
        tokio::spawn(async move {
            info!(interval_secs = interval.as_secs(), "Cache optimizer started");
            loop {
                tokio::select! {
                    _ = tokio::time::sleep(interval) => cache.run_optimizer_once(),
                    _ = shutdown.cancelled() => {
                        info!("Cache optimizer stopped");
                        break;
                    }
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::store::{FailingSharedStore, InMemorySharedStore};
    use crate::error::VigilError;
    use serde_json::json;

    fn cache() -> AdaptiveCache {
        AdaptiveCache::new(Arc::new(InMemorySharedStore::new()))
    }

    #[tokio::test]
    async fn miss_invokes_factory_and_populates_both_tiers() {
        let shared = Arc::new(InMemorySharedStore::new());
        let cache = AdaptiveCache::new(shared.clone());
        let options = CacheOptions::default();

        let value = cache
            .get_or_compute("k", &options, || async { Ok(json!(7)) })
            .await
            .unwrap();
        assert_eq!(value, json!(7));
        assert_eq!(cache.fast.len(), 1);
        assert_eq!(shared.len(), 1);
    }

    #[tokio::test]
    async fn fast_hit_skips_factory() {
        let cache = cache();
        let options = CacheOptions::default();
        cache.set("k", json!(1), &options).await;

        let value = cache
            .get_or_compute("k", &options, || async {
                panic!("factory must not run on a fast hit")
            })
            .await
            .unwrap();
        assert_eq!(value, json!(1));
    }

    #[tokio::test]
    async fn shared_hit_is_promoted_to_fast_tier() {
        let shared = Arc::new(InMemorySharedStore::new());
        shared
            .set("k", json!(9), Duration::from_secs(60))
            .await
            .unwrap();
        let cache = AdaptiveCache::new(shared);
        let options = CacheOptions::default();

        let value = cache
            .get_or_compute("k", &options, || async {
                panic!("factory must not run on a shared hit")
            })
            .await
            .unwrap();
        assert_eq!(value, json!(9));
        assert_eq!(cache.fast.len(), 1);
    }

    #[tokio::test]
    async fn shared_tier_failure_degrades_to_factory() {
        let cache = AdaptiveCache::new(Arc::new(FailingSharedStore));
        let options = CacheOptions::default();

        let value = cache
            .get_or_compute("k", &options, || async { Ok(json!("direct")) })
            .await
            .unwrap();
        assert_eq!(value, json!("direct"));
    }

    #[tokio::test]
    async fn factory_errors_propagate() {
        let cache = cache();
        let options = CacheOptions::default();
        let result = cache
            .get_or_compute("k", &options, || async {
                Err(VigilError::Execution("backing query failed".to_string()))
            })
            .await;
        assert!(matches!(result, Err(VigilError::Execution(_))));
    }

    #[tokio::test]
    async fn invalidate_supports_exact_and_prefix() {
        let cache = cache();
        let options = CacheOptions::default();
        cache.set("indicator:1", json!(1), &options).await;
        cache.set("indicator:2", json!(2), &options).await;
        cache.set("alert:1", json!(3), &options).await;

        assert_eq!(cache.invalidate("alert:1").await, 1);
        assert_eq!(cache.invalidate("indicator:*").await, 2);
        assert_eq!(cache.fast.len(), 0);
    }

    #[tokio::test]
    async fn analytics_reports_rates_and_top_keys() {
        let cache = cache();
        let options = CacheOptions::default();

        // One miss, then two hits on the same key
        for _ in 0..3 {
            cache
                .get_or_compute("popular", &options, || async { Ok(json!(1)) })
                .await
                .unwrap();
        }
        let analytics = cache.analytics();
        assert_eq!(analytics.hits, 2);
        assert_eq!(analytics.misses, 1);
        assert!((analytics.hit_rate - 2.0 / 3.0).abs() < f64::EPSILON);
        assert_eq!(analytics.top_keys[0].0, "popular");
        assert_eq!(analytics.top_keys[0].1, 3);
    }

    #[tokio::test]
    async fn optimizer_drops_expired_fast_entries() {
        let cache = cache();
        let options = CacheOptions {
            base_ttl: Duration::ZERO,
        };
        cache.set("ephemeral", json!(1), &options).await;
        cache.run_optimizer_once();
        assert_eq!(cache.fast.len(), 0);
    }

    #[test]
    fn adaptive_ttl_scales_with_access_frequency() {
        let base = Duration::from_secs(600);
        assert_eq!(adaptive_ttl(base, 11.0), Duration::from_secs(900));
        assert_eq!(adaptive_ttl(base, 1.0), Duration::from_secs(300));
        assert_eq!(adaptive_ttl(base, 5.0), base);
        // Cut points themselves use the base TTL
        assert_eq!(adaptive_ttl(base, 10.0), base);
        assert_eq!(adaptive_ttl(base, 2.0), base);
    }
}
