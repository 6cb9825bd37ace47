//! # Vigil Worker
//!
//! Demo worker wiring the monitor core with simulated collaborators: a small
//! in-memory indicator repository, an executor that fabricates metric values,
//! and a dispatcher that logs alerts. Runs the scheduling loops until ctrl-c.
//!
//! Optionally pass a TOML config path as the first argument.

use anyhow::Context;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::info;
use uuid::Uuid;

use vigil_core::config::VigilConfig;
use vigil_core::logging::init_structured_logging;
use vigil_core::monitor::{
    Collaborators, IndicatorExecutor, IndicatorRepository, MonitorCore, NoOpTelemetrySink,
    NotificationDispatcher,
};
use vigil_core::{Alert, AlertPriority, ExecutionOutcome, Indicator, Result as VigilResult};

struct InMemoryRepository {
    indicators: Mutex<HashMap<Uuid, Indicator>>,
}

impl InMemoryRepository {
    fn with_samples() -> Self {
        let mut indicators = HashMap::new();
        for (name, frequency) in [("order-volume", 1), ("signup-rate", 5), ("checkout-errors", 1)]
        {
            let indicator = Indicator {
                id: Uuid::new_v4(),
                name: name.to_string(),
                owner: "demo@example.com".to_string(),
                frequency_minutes: frequency,
                lookback_minutes: 60,
                last_run: None,
                currently_running: false,
                is_active: true,
                priority: AlertPriority::Standard,
                deviation_threshold_percent: 20.0,
                fixed_threshold: None,
                subject_template: String::new(),
                message_template: String::new(),
                channels: vec!["log".to_string()],
            };
            indicators.insert(indicator.id, indicator);
        }
        Self {
            indicators: Mutex::new(indicators),
        }
    }
}

#[async_trait]
impl IndicatorRepository for InMemoryRepository {
    async fn get_all_active(&self) -> VigilResult<Vec<Indicator>> {
        Ok(self
            .indicators
            .lock()
            .values()
            .filter(|i| i.is_active)
            .cloned()
            .collect())
    }

    async fn get_by_id(&self, id: Uuid) -> VigilResult<Option<Indicator>> {
        Ok(self.indicators.lock().get(&id).cloned())
    }

    async fn update(&self, indicator: &Indicator) -> VigilResult<()> {
        self.indicators
            .lock()
            .insert(indicator.id, indicator.clone());
        Ok(())
    }
}

/// Fabricates current/historical values with enough jitter to occasionally
/// cross the deviation threshold.
struct SimulatedExecutor;

#[async_trait]
impl IndicatorExecutor for SimulatedExecutor {
    async fn execute(
        &self,
        indicator: &Indicator,
        _cancellation: CancellationToken,
    ) -> VigilResult<ExecutionOutcome> {
        tokio::time::sleep(Duration::from_millis(150)).await;
        let jitter = (Uuid::new_v4().as_u128() % 60) as f64;
        info!(indicator = %indicator.name, jitter, "Simulated execution");
        Ok(ExecutionOutcome {
            success: true,
            current_value: 100.0 + jitter,
            historical_value: 100.0,
            error: None,
        })
    }
}

struct LoggingDispatcher;

#[async_trait]
impl NotificationDispatcher for LoggingDispatcher {
    async fn dispatch(&self, alert: &Alert, channels: &[String]) -> VigilResult<()> {
        info!(
            severity = alert.severity.as_str(),
            channels = ?channels,
            subject = %alert.subject,
            "ALERT"
        );
        Ok(())
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_structured_logging();

    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let config = VigilConfig::load(config_path.as_deref())
        .context("failed to load worker configuration")?;

    let core = MonitorCore::new(
        config,
        Collaborators {
            repository: Arc::new(InMemoryRepository::with_samples()),
            executor: Arc::new(SimulatedExecutor),
            dispatcher: Arc::new(LoggingDispatcher),
            telemetry: Arc::new(NoOpTelemetrySink),
        },
    )?;

    core.start().await?;
    info!("Worker running; press ctrl-c to stop");

    signal::ctrl_c().await.context("failed to listen for ctrl-c")?;
    info!("Shutdown requested");
    core.shutdown(Duration::from_secs(30)).await?;

    let analytics = core.cache_analytics();
    info!(
        hits = analytics.hits,
        misses = analytics.misses,
        "Final cache analytics"
    );
    Ok(())
}
