//! # Adaptive Cache
//!
//! Two-tier cache in front of expensive read paths: a fast in-process tier
//! (DashMap) backed by a shared tier behind the [`SharedCacheStore`] trait.
//! A shared-tier hit is promoted into the fast tier; the fast tier is a
//! promotion cache, never authoritative.
//!
//! ## Design
//!
//! - **Graceful degradation**: any cache-layer failure degrades to a direct
//!   factory call; callers never see cache errors.
//! - **Adaptive expiration**: entries accessed more than 10 times in the
//!   trailing hour get 1.5x the base TTL, entries accessed fewer than 2
//!   times get 0.5x.
//! - **Periodic optimizer**: prunes hit/miss samples older than 24 hours and
//!   idle per-key access records older than 7 days.

pub mod adaptive;
pub mod store;

pub use adaptive::{AdaptiveCache, CacheAnalytics, CacheOptions};
pub use store::{CacheError, CacheResult, InMemorySharedStore, SharedCacheStore};
