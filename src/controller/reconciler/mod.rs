//! # Reconciler
//!
//! Reconcile logic for `ManagedBridge` resources.
//!
//! ## Sub-modules
//!
//! - `types` - reconcile context, errors and `UpdateControl`
//! - `cluster` - `ClusterState` trait and its Kubernetes implementation
//! - `service` - desired config map and broker, fetch-or-create
//! - `bridge` - the reconcile steps and the operation metrics hook
//! - `status` - status write-back

pub mod bridge;
pub mod cluster;
pub mod service;
pub mod status;
pub mod types;

pub use bridge::{
    extract_broker_path, reconcile_bridge, MetricsOperation, OperationMetrics,
    PrometheusOperationMetrics,
};
pub use cluster::{ClusterState, KubeClusterState};
pub use service::ManagedBridgeService;
pub use status::apply_update_control;
pub use types::{BackoffState, Reconciler, ReconcilerError, UpdateControl};

use crate::crd::ManagedBridge;
use crate::observability::metrics;
use kube::ResourceExt;
use kube_runtime::controller::Action;
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

/// Converges a live bridge and writes back any condition change.
pub async fn apply(bridge: Arc<ManagedBridge>, ctx: Arc<Reconciler>) -> Result<Action, ReconcilerError> {
    let start = Instant::now();
    metrics::increment_reconciliations();

    let result = match reconcile_bridge(&bridge, &ctx).await {
        Ok(control) => apply_update_control(&ctx, &bridge, control).await,
        Err(e) => Err(e),
    };
    metrics::observe_reconciliation_duration(start.elapsed().as_secs_f64());

    if result.is_ok() {
        let key = format!(
            "{}/{}",
            bridge.namespace().unwrap_or_default(),
            bridge.name_any()
        );
        ctx.clear_backoff(&key);
    }
    result
}

/// Tears down what [`apply`] created, broker first.
pub async fn cleanup(bridge: Arc<ManagedBridge>, ctx: Arc<Reconciler>) -> Result<Action, ReconcilerError> {
    info!("🗑️ Cleaning up ManagedBridge '{}'", bridge.name_any());
    ManagedBridgeService::new(ctx.cluster.as_ref())
        .delete_bridge_resources(&bridge)
        .await?;
    ctx.metrics
        .on_operation_complete(&bridge, MetricsOperation::ControllerResourceDelete);
    Ok(Action::await_change())
}
