//! # Configuration System
//!
//! Explicit, validated configuration for the indicator core. Values come
//! from an optional TOML file plus `VIGIL_`-prefixed environment overrides
//! (e.g. `VIGIL_TRACKER__MAX_CONCURRENT=10`); defaults live in
//! [`crate::constants`] so there is a single source of truth for every
//! operational knob.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::constants::{audit, cache, tracker};
use crate::error::{Result, VigilError};

/// Execution tracker settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerSettings {
    /// Maximum simultaneously running indicator executions
    pub max_concurrent: usize,
    /// Seconds between scheduling cycles
    pub cycle_interval_secs: u64,
    /// Backoff after a failed cycle before the next attempt
    pub cycle_backoff_secs: u64,
    /// Seconds between stuck-execution health scans
    pub health_check_interval_secs: u64,
    /// Running longer than this many seconds marks an execution stuck
    pub stuck_after_secs: u64,
    /// Terminal records are evicted after this grace period
    pub cleanup_grace_secs: u64,
}

impl Default for TrackerSettings {
    fn default() -> Self {
        Self {
            max_concurrent: tracker::DEFAULT_MAX_CONCURRENT,
            cycle_interval_secs: tracker::DEFAULT_CYCLE_INTERVAL_SECS,
            cycle_backoff_secs: tracker::DEFAULT_CYCLE_BACKOFF_SECS,
            health_check_interval_secs: tracker::DEFAULT_HEALTH_CHECK_INTERVAL_SECS,
            stuck_after_secs: tracker::DEFAULT_STUCK_AFTER_SECS,
            cleanup_grace_secs: tracker::DEFAULT_CLEANUP_GRACE_SECS,
        }
    }
}

impl TrackerSettings {
    pub fn cycle_interval(&self) -> Duration {
        Duration::from_secs(self.cycle_interval_secs)
    }

    pub fn cycle_backoff(&self) -> Duration {
        Duration::from_secs(self.cycle_backoff_secs)
    }

    pub fn health_check_interval(&self) -> Duration {
        Duration::from_secs(self.health_check_interval_secs)
    }

    pub fn stuck_after(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.stuck_after_secs as i64)
    }

    pub fn cleanup_grace(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.cleanup_grace_secs as i64)
    }
}

/// Adaptive cache settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    /// Base TTL in seconds before adaptive scaling
    pub base_ttl_secs: u64,
    /// Seconds between optimizer passes
    pub optimizer_interval_secs: u64,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            base_ttl_secs: cache::DEFAULT_BASE_TTL_SECS,
            optimizer_interval_secs: cache::DEFAULT_OPTIMIZER_INTERVAL_SECS,
        }
    }
}

impl CacheSettings {
    pub fn base_ttl(&self) -> Duration {
        Duration::from_secs(self.base_ttl_secs)
    }

    pub fn optimizer_interval(&self) -> Duration {
        Duration::from_secs(self.optimizer_interval_secs)
    }
}

/// Audit trail settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditSettings {
    /// Broadcast channel capacity for event subscribers
    pub publish_capacity: usize,
}

impl Default for AuditSettings {
    fn default() -> Self {
        Self {
            publish_capacity: audit::DEFAULT_PUBLISH_CAPACITY,
        }
    }
}

/// Top-level configuration for the indicator core
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct VigilConfig {
    pub tracker: TrackerSettings,
    pub cache: CacheSettings,
    pub audit: AuditSettings,
}

impl VigilConfig {
    /// Load configuration from an optional TOML file and `VIGIL_` environment
    /// overrides, validating before returning.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(true));
        }
        builder = builder.add_source(
            config::Environment::with_prefix("VIGIL")
                .separator("__")
                .try_parsing(true),
        );

        let loaded: VigilConfig = builder
            .build()
            .and_then(|c| c.try_deserialize())
            .map_err(|e| VigilError::Configuration(format!("failed to load configuration: {e}")))?;
        loaded.validate()?;
        Ok(loaded)
    }

    /// Reject configurations that would wedge the tracker.
    pub fn validate(&self) -> Result<()> {
        if self.tracker.max_concurrent == 0 {
            return Err(VigilError::Configuration(
                "tracker.max_concurrent must be greater than zero".to_string(),
            ));
        }
        if self.tracker.cycle_interval_secs == 0 {
            return Err(VigilError::Configuration(
                "tracker.cycle_interval_secs must be greater than zero".to_string(),
            ));
        }
        if self.tracker.stuck_after_secs == 0 {
            return Err(VigilError::Configuration(
                "tracker.stuck_after_secs must be greater than zero".to_string(),
            ));
        }
        if self.audit.publish_capacity == 0 {
            return Err(VigilError::Configuration(
                "audit.publish_capacity must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = VigilConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.tracker.max_concurrent, 5);
        assert_eq!(config.tracker.stuck_after_secs, 30 * 60);
        assert_eq!(config.tracker.cleanup_grace_secs, 5 * 60);
        assert_eq!(config.tracker.health_check_interval_secs, 30);
    }

    #[test]
    fn zero_concurrency_is_rejected() {
        let mut config = VigilConfig::default();
        config.tracker.max_concurrent = 0;
        assert!(matches!(
            config.validate(),
            Err(VigilError::Configuration(_))
        ));
    }

    #[test]
    fn load_without_file_uses_defaults() {
        let config = VigilConfig::load(None).unwrap();
        assert_eq!(config.tracker.max_concurrent, 5);
        assert_eq!(config.cache.base_ttl_secs, 15 * 60);
    }
}
