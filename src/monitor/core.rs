//! # Monitor Core
//!
//! Facade tying the subsystems together: owns the execution tracker, audit
//! trail service, and adaptive cache, and exposes the operations external
//! callers (HTTP layers, dashboards, workers) consume. Lifecycle follows the
//! start/stop shape used throughout the crate: spawn the loops, cancel the
//! shared token on shutdown, then wait for the handles within a timeout.

use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::cache::{AdaptiveCache, CacheAnalytics, InMemorySharedStore, SharedCacheStore};
use crate::config::VigilConfig;
use crate::error::{Result, VigilError};
use crate::events::{AuditTrailService, EventStore, InMemoryEventStore};
use crate::models::{AuditQuery, AuditTrailEntry, ExecutionRecord};
use crate::monitor::tracker::{CycleStats, ExecutionTracker};
use crate::monitor::traits::{
    IndicatorExecutor, IndicatorRepository, NotificationDispatcher, TelemetrySink,
};

/// Collaborators injected into [`MonitorCore::new`]
pub struct Collaborators {
    pub repository: Arc<dyn IndicatorRepository>,
    pub executor: Arc<dyn IndicatorExecutor>,
    pub dispatcher: Arc<dyn NotificationDispatcher>,
    pub telemetry: Arc<dyn TelemetrySink>,
}

/// Single-process coordinator owning the scheduling, audit, and cache
/// subsystems.
pub struct MonitorCore {
    config: VigilConfig,
    tracker: Arc<ExecutionTracker>,
    audit: Arc<AuditTrailService>,
    cache: Arc<AdaptiveCache>,
    shutdown: CancellationToken,
    handles: Mutex<Vec<JoinHandle<()>>>,
}

impl MonitorCore {
    /// Build a core with the in-memory event store and shared cache tier.
    pub fn new(config: VigilConfig, collaborators: Collaborators) -> Result<Self> {
        Self::with_backends(
            config,
            collaborators,
            Arc::new(InMemoryEventStore::new()),
            Arc::new(InMemorySharedStore::new()),
        )
    }

    /// Build a core over custom event-store and shared-cache backends.
    pub fn with_backends(
        config: VigilConfig,
        collaborators: Collaborators,
        event_store: Arc<dyn EventStore>,
        shared_cache: Arc<dyn SharedCacheStore>,
    ) -> Result<Self> {
        config.validate()?;

        let audit = Arc::new(AuditTrailService::with_capacity(
            event_store,
            config.audit.publish_capacity,
        ));
        let cache = Arc::new(AdaptiveCache::new(shared_cache));
        let shutdown = CancellationToken::new();
        let tracker = Arc::new(ExecutionTracker::new(
            collaborators.repository,
            collaborators.executor,
            collaborators.dispatcher,
            collaborators.telemetry,
            audit.clone(),
            config.tracker.clone(),
            shutdown.clone(),
        ));

        Ok(Self {
            config,
            tracker,
            audit,
            cache,
            shutdown,
            handles: Mutex::new(Vec::new()),
        })
    }

    /// Spawn the scheduling loop, health loop, and cache optimizer.
    pub async fn start(&self) -> Result<()> {
        let mut handles = self.handles.lock().await;
        if !handles.is_empty() {
            return Err(VigilError::InvalidState(
                "monitor core is already running".to_string(),
            ));
        }

        let (scheduling, health) = self.tracker.spawn();
        let optimizer = self.cache.spawn_optimizer(
            self.config.cache.optimizer_interval(),
            self.shutdown.clone(),
        );
        handles.push(scheduling);
        handles.push(health);
        handles.push(optimizer);

        info!("Monitor core started");
        Ok(())
    }

    /// Cancel the loops and wait for them to finish.
    ///
    /// In-progress indicator executions run to completion; shutdown only
    /// stops launching new work.
    pub async fn shutdown(&self, timeout: Duration) -> Result<()> {
        self.shutdown.cancel();
        let mut handles = self.handles.lock().await;
        for handle in handles.drain(..) {
            match tokio::time::timeout(timeout, handle).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => warn!(error = %e, "Background task ended with error"),
                Err(_) => {
                    return Err(VigilError::Timeout(
                        "background tasks did not stop within the shutdown timeout".to_string(),
                    ))
                }
            }
        }
        info!("Monitor core stopped");
        Ok(())
    }

    /// One pass of due-indicator discovery and execution.
    pub async fn run_scheduling_cycle(&self) -> Result<CycleStats> {
        self.tracker.run_cycle().await
    }

    /// Point-in-time snapshot of tracked executions for dashboards.
    pub fn current_executions(&self) -> Vec<ExecutionRecord> {
        self.tracker.current_executions()
    }

    /// Paginated, filtered audit history, newest-first.
    pub async fn audit_trail(&self, query: &AuditQuery) -> Result<Vec<AuditTrailEntry>> {
        self.audit.query(query).await
    }

    /// Hit/miss rates, top keys, and tuning recommendations.
    pub fn cache_analytics(&self) -> CacheAnalytics {
        self.cache.analytics()
    }

    /// The audit trail service, for subscribing to recorded events.
    pub fn audit_service(&self) -> &Arc<AuditTrailService> {
        &self.audit
    }

    /// The adaptive cache, for components with expensive read paths.
    pub fn cache(&self) -> &Arc<AdaptiveCache> {
        &self.cache
    }
}
