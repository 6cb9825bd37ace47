//! # Execution Tracker
//!
//! Bounded-concurrency coordinator for indicator executions. Each scheduling
//! cycle selects active, due indicators, skips anything already in flight,
//! and executes up to the configured cap concurrently; a periodic health pass
//! force-fails executions that have been running past the stuck threshold and
//! evicts terminal records once a grace period has elapsed.
//!
//! The in-flight set is a concurrent map shared between the cycle loop and
//! the health loop. Stuck executions are only marked Failed locally; the
//! underlying external work is never forcibly cancelled here — that is the
//! execution collaborator's responsibility.

use chrono::Utc;
use dashmap::DashMap;
use futures::stream::{self, StreamExt};
use serde_json::json;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use crate::alerts::{deviation_percent, AlertFactory};
use crate::config::TrackerSettings;
use crate::constants::events;
use crate::error::Result;
use crate::events::AuditTrailService;
use crate::models::{
    Alert, AuditEvent, ExecutionOutcome, ExecutionRecord, ExecutionStatus, Indicator,
};
use crate::scheduler;

use super::traits::{IndicatorExecutor, IndicatorRepository, NotificationDispatcher, TelemetrySink};

/// Error message recorded when the health pass force-fails an execution
pub const EXECUTION_TIMEOUT_MESSAGE: &str = "execution timeout";

/// Outcome counts for one scheduling cycle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleStats {
    /// Active indicators that were due this cycle
    pub due: usize,
    /// Executions actually launched
    pub launched: usize,
    /// Due indicators skipped because they were already in flight
    pub skipped_in_flight: usize,
    /// Due indicators deferred because no slot was free
    pub deferred: usize,
}

/// Bounded-concurrency execution coordinator over the collaborator seams
pub struct ExecutionTracker {
    repository: Arc<dyn IndicatorRepository>,
    executor: Arc<dyn IndicatorExecutor>,
    dispatcher: Arc<dyn NotificationDispatcher>,
    telemetry: Arc<dyn TelemetrySink>,
    audit: Arc<AuditTrailService>,
    alert_factory: AlertFactory,
    in_flight: DashMap<Uuid, ExecutionRecord>,
    /// Serializes cycles: the free-slot computation and the in-flight check
    /// are only sound while no other cycle is between snapshot and launch
    cycle_gate: tokio::sync::Mutex<()>,
    settings: TrackerSettings,
    shutdown: CancellationToken,
}

impl ExecutionTracker {
    pub fn new(
        repository: Arc<dyn IndicatorRepository>,
        executor: Arc<dyn IndicatorExecutor>,
        dispatcher: Arc<dyn NotificationDispatcher>,
        telemetry: Arc<dyn TelemetrySink>,
        audit: Arc<AuditTrailService>,
        settings: TrackerSettings,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            repository,
            executor,
            dispatcher,
            telemetry,
            audit,
            alert_factory: AlertFactory::new(),
            in_flight: DashMap::new(),
            cycle_gate: tokio::sync::Mutex::new(()),
            settings,
            shutdown,
        }
    }

    /// Point-in-time snapshot of tracked executions, for dashboards.
    pub fn current_executions(&self) -> Vec<ExecutionRecord> {
        self.in_flight.iter().map(|e| e.value().clone()).collect()
    }

    /// Number of executions currently in the Running state.
    pub fn running_count(&self) -> usize {
        self.in_flight
            .iter()
            .filter(|e| e.value().status == ExecutionStatus::Running)
            .count()
    }

    /// One pass of due-indicator discovery and bounded concurrent execution.
    ///
    /// Cycles are serialized: an invocation overlapping the internal loop
    /// (or another external caller) waits its turn, so the concurrency cap
    /// and the in-flight skip hold across callers. Individual execution
    /// failures are recorded per indicator and never abort the cycle; a
    /// repository failure surfaces so the loop can back off and retry.
    #[instrument(skip(self))]
    pub async fn run_cycle(&self) -> Result<CycleStats> {
        let _cycle = self.cycle_gate.lock().await;
        let indicators = self.repository.get_all_active().await?;
        let now = Utc::now();

        let mut stats = CycleStats::default();
        let mut to_launch = Vec::new();
        for indicator in indicators {
            if !indicator.is_active
                || !scheduler::is_due(indicator.last_run, indicator.frequency_minutes, now)
            {
                continue;
            }
            stats.due += 1;

            // Skip anything already running; a terminal leftover awaiting
            // cleanup does not block a re-run
            let already_running = self
                .in_flight
                .get(&indicator.id)
                .map(|record| record.status == ExecutionStatus::Running)
                .unwrap_or(false);
            if already_running {
                stats.skipped_in_flight += 1;
                continue;
            }
            to_launch.push(indicator);
        }

        let slots = self
            .settings
            .max_concurrent
            .saturating_sub(self.running_count());
        if slots == 0 {
            stats.deferred = to_launch.len();
            debug!(due = stats.due, "No free execution slots, deferring cycle");
            return Ok(stats);
        }

        stats.launched = to_launch.len();
        debug!(
            due = stats.due,
            launched = stats.launched,
            slots, "Launching due indicator executions"
        );

        stream::iter(to_launch)
            .for_each_concurrent(slots, |indicator| async move {
                self.execute_one(indicator).await;
            })
            .await;

        Ok(stats)
    }

    /// Execute a single indicator: track start, invoke the collaborator,
    /// record the terminal status, persist scheduling state, and forward the
    /// result to alerting, audit, and telemetry.
    async fn execute_one(&self, mut indicator: Indicator) {
        let id = indicator.id;
        self.in_flight
            .insert(id, ExecutionRecord::started(id, indicator.name.clone()));

        if !scheduler::is_calendar_aligned(indicator.frequency_minutes) {
            debug!(
                indicator = %indicator.name,
                frequency_minutes = indicator.frequency_minutes,
                "Frequency does not divide the day, boundaries roll over at midnight"
            );
        }

        // Mirror the in-flight state into the repository so external
        // dashboards see the indicator as running
        indicator.currently_running = true;
        if let Err(e) = self.repository.update(&indicator).await {
            warn!(indicator_id = %id, error = %e, "Failed to mark indicator as running");
        }

        let started = std::time::Instant::now();
        let result = self
            .executor
            .execute(&indicator, self.shutdown.child_token())
            .await;
        let duration = started.elapsed();

        let (status, outcome, error_message) = match result {
            Ok(outcome) if outcome.success => (ExecutionStatus::Completed, Some(outcome), None),
            Ok(outcome) => {
                let message = outcome
                    .error
                    .clone()
                    .unwrap_or_else(|| "execution reported failure".to_string());
                (ExecutionStatus::Failed, Some(outcome), Some(message))
            }
            Err(e) => (ExecutionStatus::Failed, None, Some(e.to_string())),
        };

        // The health pass may have force-failed this execution while we were
        // waiting; its timeout verdict wins
        let mut timed_out = false;
        if let Some(mut record) = self.in_flight.get_mut(&id) {
            if record.status == ExecutionStatus::Running {
                record.finish(status, outcome.clone(), error_message.clone());
            } else {
                timed_out = true;
            }
        }

        indicator.last_run = Some(Utc::now());
        indicator.currently_running = false;
        if let Err(e) = self.repository.update(&indicator).await {
            // Transient: the indicator will simply show up due again
            warn!(indicator_id = %id, error = %e, "Failed to persist indicator scheduling state");
        }

        let success = status == ExecutionStatus::Completed && !timed_out;
        self.telemetry.record_execution(id, duration, success);

        if timed_out {
            // The health pass already audited the timeout; alerting or
            // recording a completion now would contradict the tracked record
            debug!(indicator_id = %id, "Execution finished after being marked stuck, keeping timeout verdict");
            return;
        }

        match (&status, &outcome) {
            (ExecutionStatus::Completed, Some(outcome)) => {
                self.evaluate_alerts(&indicator, outcome).await;
                self.audit
                    .record_best_effort(vec![execution_event(
                        &indicator,
                        events::INDICATOR_EXECUTION_COMPLETED,
                        format!("Indicator '{}' executed successfully", indicator.name),
                        json!({
                            "current_value": outcome.current_value,
                            "historical_value": outcome.historical_value,
                            "duration_ms": duration.as_millis() as u64,
                        }),
                    )])
                    .await;
            }
            _ => {
                let message = error_message.unwrap_or_default();
                warn!(indicator_id = %id, indicator = %indicator.name, error = %message, "Indicator execution failed");
                self.audit
                    .record_best_effort(vec![execution_event(
                        &indicator,
                        events::INDICATOR_EXECUTION_FAILED,
                        format!("Indicator '{}' execution failed", indicator.name),
                        json!({
                            "error": message,
                            "duration_ms": duration.as_millis() as u64,
                        }),
                    )])
                    .await;
            }
        }
    }

    /// Compare the outcome against the indicator's alerting configuration and
    /// dispatch whatever alerts it calls for.
    async fn evaluate_alerts(&self, indicator: &Indicator, outcome: &ExecutionOutcome) {
        let deviation = deviation_percent(outcome.current_value, outcome.historical_value);
        if deviation >= indicator.deviation_threshold_percent && deviation > 0.0 {
            let alert = self.alert_factory.create_alert(
                indicator,
                outcome.current_value,
                outcome.historical_value,
                Some(deviation),
            );
            self.dispatch_alert(indicator, alert).await;
        }

        if let Some(threshold) = indicator.fixed_threshold {
            if outcome.current_value > threshold {
                let alert = self.alert_factory.create_threshold_alert(
                    indicator,
                    outcome.current_value,
                    threshold,
                );
                self.dispatch_alert(indicator, alert).await;
            }
        }
    }

    async fn dispatch_alert(&self, indicator: &Indicator, alert: Alert) {
        info!(
            indicator = %indicator.name,
            severity = alert.severity.as_str(),
            deviation = alert.deviation_percent,
            "Raising alert"
        );
        if let Err(e) = self.dispatcher.dispatch(&alert, &indicator.channels).await {
            warn!(indicator = %indicator.name, error = %e, "Alert dispatch failed");
        }
        self.audit
            .record_best_effort(vec![execution_event(
                indicator,
                events::ALERT_RAISED,
                alert.subject.clone(),
                json!({
                    "severity": alert.severity.as_str(),
                    "deviation_percent": alert.deviation_percent,
                    "current_value": alert.current_value,
                    "historical_value": alert.historical_value,
                }),
            )])
            .await;
    }

    /// Health pass: force-fail executions running past the stuck threshold.
    ///
    /// The underlying external execution is not cancelled; it is only marked
    /// Failed locally so dashboards and cleanup see a terminal record.
    pub async fn mark_stuck_executions(&self) -> usize {
        let now = Utc::now();
        let stuck_after = self.settings.stuck_after();

        let mut stuck = Vec::new();
        for mut entry in self.in_flight.iter_mut() {
            let record = entry.value_mut();
            if record.status == ExecutionStatus::Running && record.running_for(now) > stuck_after {
                record.finish(
                    ExecutionStatus::Failed,
                    None,
                    Some(EXECUTION_TIMEOUT_MESSAGE.to_string()),
                );
                stuck.push((record.indicator_id, record.indicator_name.clone()));
            }
        }

        for (indicator_id, name) in &stuck {
            warn!(indicator_id = %indicator_id, indicator = %name, "Marked stuck execution as failed");
            self.audit
                .record_best_effort(vec![AuditEvent {
                    entity_type: "Indicator".to_string(),
                    entity_id: indicator_id.to_string(),
                    event_type: events::INDICATOR_EXECUTION_TIMED_OUT.to_string(),
                    description: format!(
                        "Indicator '{name}' exceeded the stuck-execution threshold"
                    ),
                    details: json!({ "error": EXECUTION_TIMEOUT_MESSAGE }),
                    actor: Some("health-check".to_string()),
                }])
                .await;
        }
        stuck.len()
    }

    /// Cleanup pass: evict terminal records older than the grace period.
    pub fn cleanup_finished(&self) -> usize {
        let now = Utc::now();
        let grace = self.settings.cleanup_grace();
        let before = self.in_flight.len();
        self.in_flight.retain(|_, record| {
            !(record.status.is_terminal()
                && record
                    .completed_at
                    .map(|completed| now - completed > grace)
                    .unwrap_or(false))
        });
        let removed = before - self.in_flight.len();
        if removed > 0 {
            debug!(removed, "Evicted terminal execution records");
        }
        removed
    }

    /// Scheduling loop: run cycles until shutdown, backing off after a
    /// cycle-level failure instead of crashing.
    pub async fn run_scheduling_loop(&self) {
        info!(
            interval_secs = self.settings.cycle_interval_secs,
            max_concurrent = self.settings.max_concurrent,
            "Scheduling loop started"
        );
        loop {
            if self.shutdown.is_cancelled() {
                break;
            }
            let wait = match self.run_cycle().await {
                Ok(stats) => {
                    if stats.due > 0 {
                        debug!(
                            due = stats.due,
                            launched = stats.launched,
                            skipped = stats.skipped_in_flight,
                            deferred = stats.deferred,
                            "Scheduling cycle complete"
                        );
                    }
                    self.settings.cycle_interval()
                }
                Err(e) => {
                    error!(error = %e, "Scheduling cycle failed, backing off");
                    self.settings.cycle_backoff()
                }
            };
            tokio::select! {
                _ = tokio::time::sleep(wait) => {}
                _ = self.shutdown.cancelled() => break,
            }
        }
        info!("Scheduling loop stopped");
    }

    /// Health loop: periodic stuck detection and terminal-record cleanup.
    pub async fn run_health_loop(&self) {
        info!(
            interval_secs = self.settings.health_check_interval_secs,
            "Health loop started"
        );
        loop {
            tokio::select! {
                _ = tokio::time::sleep(self.settings.health_check_interval()) => {
                    self.mark_stuck_executions().await;
                    self.cleanup_finished();
                }
                _ = self.shutdown.cancelled() => break,
            }
        }
        info!("Health loop stopped");
    }

    /// Spawn both loops, returning their join handles.
    pub fn spawn(self: &Arc<Self>) -> (JoinHandle<()>, JoinHandle<()>) {
        let scheduler = Arc::clone(self);
        let scheduling = tokio::spawn(async move { scheduler.run_scheduling_loop().await });
        let health_tracker = Arc::clone(self);
        let health = tokio::spawn(async move { health_tracker.run_health_loop().await });
        (scheduling, health)
    }

    #[cfg(test)]
    pub(crate) fn insert_record(&self, record: ExecutionRecord) {
        self.in_flight.insert(record.indicator_id, record);
    }
}

fn execution_event(
    indicator: &Indicator,
    event_type: &str,
    description: String,
    details: serde_json::Value,
) -> AuditEvent {
    AuditEvent {
        entity_type: "Indicator".to_string(),
        entity_id: indicator.id.to_string(),
        event_type: event_type.to_string(),
        description,
        details,
        actor: Some("scheduler".to_string()),
    }
}
