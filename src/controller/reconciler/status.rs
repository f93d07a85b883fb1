//! # Status Management
//!
//! Writes the outcome of a reconcile pass back to the bridge and turns it
//! into a controller [`Action`].

use super::service::namespace_of;
use super::types::{Reconciler, ReconcilerError, UpdateControl};
use crate::crd::ManagedBridge;
use kube::ResourceExt;
use kube_runtime::controller::Action;
use tracing::debug;

/// Patches the status only when the pass changed a condition, then requeues
/// or waits for the next watch event.
pub async fn apply_update_control(
    ctx: &Reconciler,
    bridge: &ManagedBridge,
    control: UpdateControl,
) -> Result<Action, ReconcilerError> {
    match control.status {
        Some(status) => {
            let namespace = namespace_of(bridge)?;
            ctx.cluster
                .patch_bridge_status(&namespace, &bridge.name_any(), &status)
                .await?;
        }
        None => debug!(
            "Skipping status update - conditions unchanged for ManagedBridge '{}'",
            bridge.name_any()
        ),
    }

    Ok(match control.requeue_after {
        Some(delay) => {
            ctx.metrics
                .on_requeue(bridge, control.requeue_reason.unwrap_or("poll"));
            Action::requeue(delay)
        }
        None => Action::await_change(),
    })
}
