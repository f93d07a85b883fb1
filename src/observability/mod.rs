//! # Observability
//!
//! Prometheus metrics for the reconcile controller and the dependency workers.

pub mod metrics;
