//! # Controller Configuration
//!
//! Reconcile loop and worker settings loaded from environment variables.

use super::env_var_or_default;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// Requeue delay while a bridge waits on its secret or broker
    pub bridge_poll_interval_ms: u64,
    /// Interval between dependency worker ticks
    pub worker_schedule_interval_secs: u64,
    /// Namespace to watch; all namespaces when unset
    pub watch_namespace: Option<String>,
    /// Label selector for managed bridges and their secrets
    pub label_selector: String,
    /// Field manager used for server-side apply
    pub field_manager: String,
    pub error_backoff_min_secs: u64,
    pub error_backoff_max_secs: u64,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        use crate::constants::*;
        Self {
            bridge_poll_interval_ms: DEFAULT_BRIDGE_POLL_INTERVAL_MS,
            worker_schedule_interval_secs: DEFAULT_WORKER_SCHEDULE_INTERVAL_SECS,
            watch_namespace: None,
            label_selector: DEFAULT_LABEL_SELECTOR.to_string(),
            field_manager: DEFAULT_FIELD_MANAGER.to_string(),
            error_backoff_min_secs: DEFAULT_ERROR_BACKOFF_MIN_SECS,
            error_backoff_max_secs: DEFAULT_ERROR_BACKOFF_MAX_SECS,
        }
    }
}

impl ControllerConfig {
    /// Load configuration from environment variables with defaults
    pub fn from_env() -> Self {
        use crate::constants::*;
        Self {
            bridge_poll_interval_ms: env_var_or_default(
                "BRIDGE_POLL_INTERVAL_MS",
                DEFAULT_BRIDGE_POLL_INTERVAL_MS,
            ),
            worker_schedule_interval_secs: env_var_or_default(
                "WORKER_SCHEDULE_INTERVAL_SECS",
                DEFAULT_WORKER_SCHEDULE_INTERVAL_SECS,
            ),
            watch_namespace: std::env::var("WATCH_NAMESPACE")
                .ok()
                .filter(|ns| !ns.is_empty()),
            label_selector: env_var_or_default("LABEL_SELECTOR", DEFAULT_LABEL_SELECTOR.to_string()),
            field_manager: env_var_or_default("FIELD_MANAGER", DEFAULT_FIELD_MANAGER.to_string()),
            error_backoff_min_secs: env_var_or_default(
                "ERROR_BACKOFF_MIN_SECS",
                DEFAULT_ERROR_BACKOFF_MIN_SECS,
            ),
            error_backoff_max_secs: env_var_or_default(
                "ERROR_BACKOFF_MAX_SECS",
                DEFAULT_ERROR_BACKOFF_MAX_SECS,
            ),
        }
    }

    pub fn bridge_poll_interval(&self) -> Duration {
        Duration::from_millis(self.bridge_poll_interval_ms)
    }

    pub fn worker_schedule_interval(&self) -> Duration {
        Duration::from_secs(self.worker_schedule_interval_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ControllerConfig::default();
        assert_eq!(config.bridge_poll_interval(), Duration::from_secs(5));
        assert_eq!(config.worker_schedule_interval(), Duration::from_secs(5));
        assert!(config.watch_namespace.is_none());
    }
}
