//! # Structured Logging
//!
//! Environment-aware tracing initialization. The log level defaults follow
//! the `VIGIL_ENV` environment name and can always be overridden with
//! `RUST_LOG`.

use std::sync::OnceLock;
use tracing_subscriber::{
    fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer,
};

static LOGGER_INITIALIZED: OnceLock<()> = OnceLock::new();

/// Initialize structured logging once per process.
///
/// Safe to call from multiple entry points; if a global subscriber is
/// already set (e.g. by an embedding application) this is a no-op.
pub fn init_structured_logging() {
    LOGGER_INITIALIZED.get_or_init(|| {
        let environment = get_environment();
        let default_level = default_log_level(&environment);
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(default_level));

        let subscriber = tracing_subscriber::registry().with(
            fmt::layer()
                .with_target(true)
                .with_level(true)
                .with_filter(filter),
        );

        if subscriber.try_init().is_err() {
            tracing::debug!("Global tracing subscriber already initialized");
        } else {
            tracing::info!(environment = %environment, "Structured logging initialized");
        }
    });
}

fn get_environment() -> String {
    std::env::var("VIGIL_ENV")
        .or_else(|_| std::env::var("APP_ENV"))
        .unwrap_or_else(|_| "development".to_string())
}

fn default_log_level(environment: &str) -> &'static str {
    match environment {
        "production" => "info",
        _ => "debug",
    }
}
