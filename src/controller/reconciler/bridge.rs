//! # ManagedBridge Reconcile
//!
//! One idempotent pass over a bridge, in strict order:
//!
//! 1. the bridge secret must exist, otherwise requeue
//! 2. `SecretAvailable` goes TRUE
//! 3. the broker config map is fetched or created, `ConfigMapAvailable` goes TRUE
//! 4. the Knative broker is fetched or created; until it publishes an address
//!    the pass requeues, then `KnativeBrokerAvailable` goes TRUE
//! 5. `Ready` goes TRUE and the completed operation is counted once
//!
//! Conditions are edge-triggered: each is written only when it changes, and a
//! pass over a READY bridge writes nothing and does not requeue.

use super::service::ManagedBridgeService;
use super::types::{Reconciler, ReconcilerError, UpdateControl};
use crate::crd::status::{CONFIG_MAP_AVAILABLE, KNATIVE_BROKER_AVAILABLE, READY, SECRET_AVAILABLE};
use crate::crd::{KnativeBroker, ManagedBridge, ManagedBridgeStatus};
use crate::observability::metrics;
use chrono::Utc;
use kube::ResourceExt;
use tracing::{info, instrument};

/// Operations the operator reports as complete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricsOperation {
    ControllerResourceProvision,
    ControllerResourceDelete,
}

impl MetricsOperation {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ControllerResourceProvision => "controller_resource_provision",
            Self::ControllerResourceDelete => "controller_resource_delete",
        }
    }
}

pub trait OperationMetrics: Send + Sync {
    fn on_operation_complete(&self, bridge: &ManagedBridge, operation: MetricsOperation);

    /// Called once for every requeued pass.
    fn on_requeue(&self, bridge: &ManagedBridge, reason: &str);
}

/// Counts completed operations in the Prometheus registry.
#[derive(Debug, Default, Clone, Copy)]
pub struct PrometheusOperationMetrics;

impl OperationMetrics for PrometheusOperationMetrics {
    fn on_operation_complete(&self, bridge: &ManagedBridge, operation: MetricsOperation) {
        info!(
            bridge = %bridge.name_any(),
            bridge_id = %bridge.spec.id,
            "Operation {} complete", operation.as_str()
        );
        metrics::increment_operations_completed(operation.as_str());
    }

    fn on_requeue(&self, _bridge: &ManagedBridge, reason: &str) {
        metrics::increment_requeues_total(reason);
    }
}

/// Path component of the broker's published address.
///
/// `None` while Knative has not published one, or when it does not parse.
pub fn extract_broker_path(broker: &KnativeBroker) -> Option<String> {
    let address = broker.address_url()?;
    match url::Url::parse(address) {
        Ok(url) => Some(url.path().to_string()),
        Err(e) => {
            info!(
                "Could not extract URL of the broker of ManagedBridge '{}': {}",
                broker.name_any(),
                e
            );
            None
        }
    }
}

#[instrument(skip(bridge, ctx), fields(name = %bridge.name_any(), namespace = bridge.namespace()))]
pub async fn reconcile_bridge(
    bridge: &ManagedBridge,
    ctx: &Reconciler,
) -> Result<UpdateControl, ReconcilerError> {
    info!(
        "Reconciling ManagedBridge: '{}' in namespace '{}'",
        bridge.name_any(),
        bridge.namespace().unwrap_or_default()
    );

    let poll_interval = ctx.config.bridge_poll_interval();
    let service = ManagedBridgeService::new(ctx.cluster.as_ref());
    let mut status = bridge.status.clone().unwrap_or_else(ManagedBridgeStatus::new);
    let mut changed = false;
    let now = Utc::now();

    let Some(secret) = service.fetch_bridge_secret(bridge).await? else {
        info!(
            "The Secret for the ManagedBridge with id '{}' has not been created yet.",
            bridge.spec.id
        );
        changed |= mark_false(&mut status, READY, now);
        changed |= mark_false(&mut status, SECRET_AVAILABLE, now);
        return Ok(control(status, changed).reschedule_after(poll_interval, "secret-missing"));
    };
    if !status.is_condition_type_true(SECRET_AVAILABLE) {
        info!("Secret for ManagedBridge with id '{}' has been created.", bridge.spec.id);
        changed |= mark_true(&mut status, SECRET_AVAILABLE, now);
    }

    let config_map = service.fetch_or_create_bridge_config_map(bridge, &secret).await?;
    changed |= mark_true(&mut status, CONFIG_MAP_AVAILABLE, now);

    let broker = service.fetch_or_create_knative_broker(bridge, &config_map).await?;
    if extract_broker_path(&broker).is_none() {
        info!(
            "The Knative Broker Resource for ManagedBridge '{}' in namespace '{}' is not ready",
            bridge.name_any(),
            bridge.namespace().unwrap_or_default()
        );
        changed |= mark_false(&mut status, READY, now);
        changed |= mark_false(&mut status, KNATIVE_BROKER_AVAILABLE, now);
        return Ok(control(status, changed).reschedule_after(poll_interval, "broker-not-ready"));
    }
    if mark_true(&mut status, KNATIVE_BROKER_AVAILABLE, now) {
        changed = true;
        info!(
            "The Knative Broker Resource for ManagedBridge '{}' in namespace '{}' is ready",
            bridge.name_any(),
            bridge.namespace().unwrap_or_default()
        );
    }

    if !status.is_ready() {
        ctx.metrics
            .on_operation_complete(bridge, MetricsOperation::ControllerResourceProvision);
        status.mark_condition_true(READY, now);
        info!("✅ ManagedBridge '{}' is ready", bridge.name_any());
        return Ok(UpdateControl::update_status(status));
    }

    Ok(control(status, changed))
}

fn control(status: ManagedBridgeStatus, changed: bool) -> UpdateControl {
    if changed {
        UpdateControl::update_status(status)
    } else {
        UpdateControl::no_update()
    }
}

/// Marks `condition_type` TRUE unless it already is. Returns whether it changed.
fn mark_true(status: &mut ManagedBridgeStatus, condition_type: &str, now: chrono::DateTime<Utc>) -> bool {
    if status.is_condition_type_true(condition_type) {
        return false;
    }
    status.mark_condition_true(condition_type, now);
    true
}

/// Marks `condition_type` FALSE unless it already is. Returns whether it changed.
fn mark_false(status: &mut ManagedBridgeStatus, condition_type: &str, now: chrono::DateTime<Utc>) -> bool {
    if status.is_condition_type_false(condition_type) {
        return false;
    }
    status.mark_condition_false(condition_type, now);
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crd::{Addressable, KnativeBrokerSpec, KnativeBrokerStatus};

    fn broker_with_url(url: Option<&str>) -> KnativeBroker {
        let mut broker = KnativeBroker::new("ob-1", KnativeBrokerSpec::default());
        broker.status = Some(KnativeBrokerStatus {
            address: Some(Addressable {
                url: url.map(str::to_string),
            }),
            conditions: vec![],
        });
        broker
    }

    #[test]
    fn test_extract_broker_path() {
        let broker = broker_with_url(Some("http://kafka-broker-ingress.knative-eventing.svc/ns/ob-1"));
        assert_eq!(extract_broker_path(&broker).as_deref(), Some("/ns/ob-1"));
    }

    #[test]
    fn test_extract_broker_path_missing_or_malformed() {
        assert!(extract_broker_path(&broker_with_url(None)).is_none());
        assert!(extract_broker_path(&broker_with_url(Some("not a url"))).is_none());
        assert!(extract_broker_path(&KnativeBroker::new("ob-1", KnativeBrokerSpec::default())).is_none());
    }

    #[test]
    fn test_mark_is_edge_triggered() {
        let mut status = ManagedBridgeStatus::new();
        assert!(mark_false(&mut status, READY, Utc::now()));
        assert!(!mark_false(&mut status, READY, Utc::now()));
        assert!(mark_true(&mut status, READY, Utc::now()));
        assert!(!mark_true(&mut status, READY, Utc::now()));
    }
}
