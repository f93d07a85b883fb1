//! # Metrics Module
//!
//! Prometheus metrics, organized by responsibility.
//!
//! ## Sub-modules
//!
//! - `registry` - Metrics registry setup and registration
//! - `controller_metrics` - Reconcile controller metrics (reconciliations, requeues, completed operations)
//! - `worker_metrics` - Dependency worker and scheduler metrics

pub mod controller_metrics;
pub mod registry;
pub mod worker_metrics;

pub use controller_metrics::*;
pub use registry::*;
pub use worker_metrics::*;
