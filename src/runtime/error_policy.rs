//! # Error Policy
//!
//! Requeue decisions for failed reconciliations, with a Fibonacci backoff
//! tracked per resource so one failing bridge does not slow the others.

use super::watch_loop::ControllerContext;
use crate::constants;
use crate::controller::reconciler::{BackoffState, ReconcilerError};
use crate::crd::ManagedBridge;
use crate::observability;
use kube::ResourceExt;
use kube_runtime::controller::Action;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

pub fn handle_reconciliation_error(
    obj: Arc<ManagedBridge>,
    error: &ReconcilerError,
    ctx: Arc<ControllerContext>,
) -> Action {
    let name = obj.name_any();
    let namespace = obj.namespace().unwrap_or_else(|| "default".to_string());

    let error_span = tracing::span!(
        tracing::Level::ERROR,
        "controller.watch.reconciliation_error",
        resource.name = %name,
        resource.namespace = %namespace,
        error = %error
    );
    let _error_guard = error_span.enter();

    error!("Reconciliation error for {}: {:?}", name, error);
    observability::metrics::increment_reconciliation_errors();

    let config = &ctx.reconciler.config;
    let resource_key = format!("{namespace}/{name}");
    let (backoff_seconds, error_count) = match ctx.reconciler.backoff_states.lock() {
        Ok(mut states) => {
            let state = states.entry(resource_key).or_insert_with(|| {
                BackoffState::new(config.error_backoff_min_secs, config.error_backoff_max_secs)
            });
            state.increment_error();
            (state.backoff.next_backoff_seconds(), state.error_count)
        }
        Err(e) => {
            warn!("Failed to lock backoff_states: {}, using default backoff", e);
            (constants::DEFAULT_RECONCILIATION_ERROR_REQUEUE_SECS, 0)
        }
    };

    info!(
        "🔄 Retrying with Fibonacci backoff: {}s (error count: {}, trigger source: error-backoff)",
        backoff_seconds, error_count
    );

    observability::metrics::increment_requeues_total("error-backoff");
    Action::requeue(Duration::from_secs(backoff_seconds))
}
