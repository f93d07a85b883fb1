//! # Health Server Configuration
//!
//! Where the `/metrics`, `/healthz` and `/readyz` endpoints listen and how
//! long start-up waits for them.

use super::env_var_or_default;
use crate::constants::{DEFAULT_HEALTH_READY_CHECK_MS, DEFAULT_HEALTH_READY_TIMEOUT_SECS, DEFAULT_METRICS_PORT};
use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealthServerConfig {
    pub listen_addr: SocketAddr,
    /// Start-up fails when the listener is not bound within this window
    pub ready_timeout: Duration,
    pub ready_check_interval: Duration,
}

impl Default for HealthServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: listen_on(DEFAULT_METRICS_PORT),
            ready_timeout: Duration::from_secs(DEFAULT_HEALTH_READY_TIMEOUT_SECS),
            ready_check_interval: Duration::from_millis(DEFAULT_HEALTH_READY_CHECK_MS),
        }
    }
}

impl HealthServerConfig {
    /// Reads `METRICS_PORT`, `HEALTH_READY_TIMEOUT_SECS` and
    /// `HEALTH_READY_CHECK_MS`.
    pub fn from_env() -> Self {
        let port = env_var_or_default("METRICS_PORT", DEFAULT_METRICS_PORT);
        Self {
            listen_addr: listen_on(port),
            ready_timeout: Duration::from_secs(env_var_or_default(
                "HEALTH_READY_TIMEOUT_SECS",
                DEFAULT_HEALTH_READY_TIMEOUT_SECS,
            )),
            ready_check_interval: Duration::from_millis(env_var_or_default(
                "HEALTH_READY_CHECK_MS",
                DEFAULT_HEALTH_READY_CHECK_MS,
            )),
        }
        .validated()
    }

    /// Same settings, listening on `port` instead.
    #[must_use]
    pub fn with_port(self, port: u16) -> Self {
        Self {
            listen_addr: listen_on(port),
            ..self
        }
        .validated()
    }

    /// Port 0 and a zero check interval fall back to their defaults.
    fn validated(mut self) -> Self {
        if self.listen_addr.port() == 0 {
            warn!("Port 0 is not allowed for the health server, using {}", DEFAULT_METRICS_PORT);
            self.listen_addr.set_port(DEFAULT_METRICS_PORT);
        }
        if self.ready_check_interval.is_zero() {
            self.ready_check_interval = Duration::from_millis(DEFAULT_HEALTH_READY_CHECK_MS);
        }
        self
    }
}

fn listen_on(port: u16) -> SocketAddr {
    SocketAddr::from((Ipv4Addr::UNSPECIFIED, port))
}
