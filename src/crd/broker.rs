//! # Knative Broker
//!
//! Typed view of `eventing.knative.dev/v1` `Broker`, owned by Knative. Only
//! the fields the operator writes or reads are modelled.

use super::status::Condition;
use kube::CustomResource;
use serde::{Deserialize, Serialize};

#[derive(CustomResource, Debug, Clone, Default, PartialEq, Deserialize, Serialize, schemars::JsonSchema)]
#[kube(
    kind = "KnativeBroker",
    plural = "brokers",
    group = "eventing.knative.dev",
    version = "v1",
    namespaced,
    status = "KnativeBrokerStatus"
)]
#[serde(rename_all = "camelCase")]
pub struct KnativeBrokerSpec {
    /// Broker class configuration, a config map for the Kafka class
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<KReference>,
}

/// Reference to another Kubernetes object
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct KReference {
    pub api_version: String,
    pub kind: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct KnativeBrokerStatus {
    #[serde(default)]
    pub address: Option<Addressable>,
    #[serde(default)]
    pub conditions: Vec<Condition>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Addressable {
    #[serde(default)]
    pub url: Option<String>,
}

impl KnativeBroker {
    /// The broker's ingress URL, once Knative has published one.
    pub fn address_url(&self) -> Option<&str> {
        self.status
            .as_ref()?
            .address
            .as_ref()?
            .url
            .as_deref()
    }
}
