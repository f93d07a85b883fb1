//! # Configuration
//!
//! Settings loaded from environment variables, each with a default from
//! [`crate::constants`]. Command-line flags on the operator binary take
//! precedence.

mod controller;
mod health;

pub use controller::ControllerConfig;
pub use health::HealthServerConfig;

/// Load configuration from environment variables with defaults
pub fn load_config() -> (ControllerConfig, HealthServerConfig) {
    (ControllerConfig::from_env(), HealthServerConfig::from_env())
}

/// Read environment variable or return default value
pub(crate) fn env_var_or_default<T: std::str::FromStr>(key: &str, default: T) -> T
where
    <T as std::str::FromStr>::Err: std::fmt::Debug,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
