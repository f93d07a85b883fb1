//! # Custom Resource Definitions
//!
//! - [`ManagedBridge`] - the bridge custom resource reconciled by the operator
//! - [`KnativeBroker`] - the Knative eventing broker the operator creates for it
//!
//! Status types live in `status`.

pub mod broker;
pub mod status;

pub use broker::{Addressable, KReference, KnativeBroker, KnativeBrokerSpec, KnativeBrokerStatus};
pub use status::{Condition, ManagedBridgeStatus};

use kube::CustomResource;
use serde::{Deserialize, Serialize};

/// ManagedBridge Custom Resource Definition
///
/// Created by the fleet shard for every bridge placed on this cluster. The
/// operator provisions a Kafka-backed Knative broker for it, configured from
/// the bridge secret of the same name.
///
/// # Example
///
/// ```yaml
/// apiVersion: com.redhat.service.bridge/v2alpha1
/// kind: ManagedBridge
/// metadata:
///   name: ob-3f2a
///   namespace: ob-customer-1
///   labels:
///     app.kubernetes.io/managed-by: bridge-fleet-shard-operator
/// spec:
///   id: 3f2a
///   bridgeName: my-bridge
///   customerId: customer-1
///   owner: user@example.com
/// ```
#[derive(CustomResource, Debug, Clone, Deserialize, Serialize, schemars::JsonSchema)]
#[kube(
    kind = "ManagedBridge",
    group = "com.redhat.service.bridge",
    version = "v2alpha1",
    namespaced,
    status = "ManagedBridgeStatus",
    shortname = "mb",
    printcolumn = r#"{"name":"Bridge", "type":"string", "jsonPath":".spec.bridgeName"}, {"name":"Ready", "type":"string", "jsonPath":".status.conditions[?(@.type==\"Ready\")].status"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct ManagedBridgeSpec {
    /// Bridge id assigned by the manager
    pub id: String,
    /// User-facing bridge name
    pub bridge_name: String,
    pub customer_id: String,
    #[serde(default)]
    pub owner: Option<String>,
}

impl ManagedBridge {
    /// Label and component name used on everything the operator creates
    pub const COMPONENT_NAME: &'static str = "managed-bridge";
}
