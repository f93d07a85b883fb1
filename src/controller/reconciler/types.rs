//! # Reconciler Types
//!
//! Reconcile context, error type and the result of one reconcile pass.

use super::bridge::OperationMetrics;
use super::cluster::ClusterState;
use crate::config::ControllerConfig;
use crate::controller::backoff::FibonacciBackoff;
use crate::crd::ManagedBridgeStatus;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReconcilerError {
    #[error("Kubernetes API error: {0}")]
    Kube(#[from] kube::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("{kind} '{name}' has no namespace")]
    MissingNamespace { kind: &'static str, name: String },

    #[error("Finalizer error: {0}")]
    Finalizer(String),
}

/// Per-resource error backoff, tracked by the error policy.
#[derive(Debug, Clone)]
pub struct BackoffState {
    pub backoff: FibonacciBackoff,
    pub error_count: u32,
}

impl BackoffState {
    pub fn new(min_secs: u64, max_secs: u64) -> Self {
        Self {
            backoff: FibonacciBackoff::new(min_secs, max_secs),
            error_count: 0,
        }
    }

    pub fn increment_error(&mut self) {
        self.error_count = self.error_count.saturating_add(1);
    }
}

/// Reconcile context shared by every pass of the controller.
#[allow(missing_debug_implementations, reason = "Holds trait objects without Debug")]
pub struct Reconciler {
    pub cluster: Arc<dyn ClusterState>,
    pub metrics: Arc<dyn OperationMetrics>,
    pub config: ControllerConfig,
    /// Keyed by `namespace/name`
    pub backoff_states: Arc<Mutex<HashMap<String, BackoffState>>>,
}

impl Reconciler {
    pub fn new(
        cluster: Arc<dyn ClusterState>,
        metrics: Arc<dyn OperationMetrics>,
        config: ControllerConfig,
    ) -> Self {
        Self {
            cluster,
            metrics,
            config,
            backoff_states: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Forgets the error history of a resource after a successful pass.
    pub fn clear_backoff(&self, key: &str) {
        if let Ok(mut states) = self.backoff_states.lock() {
            states.remove(key);
        }
    }
}

/// Outcome of one reconcile pass.
///
/// `status` is `Some` only when a condition changed and must be written back.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UpdateControl {
    pub status: Option<ManagedBridgeStatus>,
    pub requeue_after: Option<Duration>,
    /// Metrics label for the requeue
    pub requeue_reason: Option<&'static str>,
}

impl UpdateControl {
    /// Nothing to write, nothing to wait for.
    pub fn no_update() -> Self {
        Self::default()
    }

    pub fn update_status(status: ManagedBridgeStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn reschedule_after(mut self, delay: Duration, reason: &'static str) -> Self {
        self.requeue_after = Some(delay);
        self.requeue_reason = Some(reason);
        self
    }
}
