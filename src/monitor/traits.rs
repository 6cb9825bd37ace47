//! # Collaborator Interfaces
//!
//! Trait seams between the core and its external collaborators: indicator
//! persistence, query execution, alert delivery, and telemetry. The core
//! only ever talks to these interfaces; HTTP/RPC framing, database drivers,
//! and delivery channels live on the other side.

use async_trait::async_trait;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::error::Result;
use crate::models::{Alert, ExecutionOutcome, Indicator};

/// Persistence of [`Indicator`] entities.
///
/// The tracker only writes `last_run` and `currently_running`; everything
/// else is owned by external configuration management.
#[async_trait]
pub trait IndicatorRepository: Send + Sync {
    async fn get_all_active(&self) -> Result<Vec<Indicator>>;

    async fn get_by_id(&self, id: Uuid) -> Result<Option<Indicator>>;

    async fn update(&self, indicator: &Indicator) -> Result<()>;
}

/// Runs an indicator's underlying query/procedure.
///
/// The cancellation token is advisory: the collaborator owns cancellation of
/// its own work, and the tracker never forcibly kills it.
#[async_trait]
pub trait IndicatorExecutor: Send + Sync {
    async fn execute(
        &self,
        indicator: &Indicator,
        cancellation: CancellationToken,
    ) -> Result<ExecutionOutcome>;
}

/// Delivers an alert over the given channels. Delivery success/failure
/// handling is the dispatcher's concern.
#[async_trait]
pub trait NotificationDispatcher: Send + Sync {
    async fn dispatch(&self, alert: &Alert, channels: &[String]) -> Result<()>;
}

/// Receives execution duration and success/failure counts per indicator.
pub trait TelemetrySink: Send + Sync {
    fn record_execution(&self, indicator_id: Uuid, duration: Duration, success: bool);
}

/// Telemetry sink that discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpTelemetrySink;

impl TelemetrySink for NoOpTelemetrySink {
    fn record_execution(&self, _indicator_id: Uuid, _duration: Duration, _success: bool) {}
}
