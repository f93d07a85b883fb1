//! # ManagedBridge Service
//!
//! Builds the desired broker config map and Knative broker for a bridge and
//! applies them only when the cluster copy has drifted.

use super::cluster::ClusterState;
use super::types::ReconcilerError;
use crate::constants::*;
use crate::crd::{KReference, KnativeBroker, KnativeBrokerSpec, ManagedBridge};
use k8s_openapi::api::core::v1::{ConfigMap, Secret};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kube::{Resource, ResourceExt};
use std::collections::BTreeMap;
use tracing::{info, warn};

#[allow(missing_debug_implementations, reason = "Borrows a trait object without Debug")]
pub struct ManagedBridgeService<'a> {
    cluster: &'a dyn ClusterState,
}

impl<'a> ManagedBridgeService<'a> {
    pub fn new(cluster: &'a dyn ClusterState) -> Self {
        Self { cluster }
    }

    /// The bridge secret shares the bridge's name and namespace.
    pub async fn fetch_bridge_secret(&self, bridge: &ManagedBridge) -> Result<Option<Secret>, ReconcilerError> {
        let namespace = namespace_of(bridge)?;
        self.cluster.get_secret(&namespace, &bridge.name_any()).await
    }

    pub async fn fetch_or_create_bridge_config_map(
        &self,
        bridge: &ManagedBridge,
        secret: &Secret,
    ) -> Result<ConfigMap, ReconcilerError> {
        let namespace = namespace_of(bridge)?;
        let desired = desired_config_map(bridge, secret, &namespace);

        if let Some(existing) = self.cluster.get_config_map(&namespace, &bridge.name_any()).await? {
            if existing.data == desired.data {
                return Ok(existing);
            }
            info!("Broker config map for ManagedBridge '{}' drifted, updating", bridge.name_any());
        }
        self.cluster.apply_config_map(&desired).await
    }

    pub async fn fetch_or_create_knative_broker(
        &self,
        bridge: &ManagedBridge,
        config_map: &ConfigMap,
    ) -> Result<KnativeBroker, ReconcilerError> {
        let namespace = namespace_of(bridge)?;
        let desired = desired_broker(bridge, config_map, &namespace);

        if let Some(existing) = self.cluster.get_broker(&namespace, &bridge.name_any()).await? {
            let class = existing.annotations().get(BROKER_CLASS_ANNOTATION);
            if existing.spec == desired.spec && class.map(String::as_str) == Some(KAFKA_BROKER_CLASS) {
                return Ok(existing);
            }
            info!("Knative broker for ManagedBridge '{}' drifted, updating", bridge.name_any());
        }
        self.cluster.apply_broker(&desired).await
    }

    /// Removes the broker, then its config map.
    pub async fn delete_bridge_resources(&self, bridge: &ManagedBridge) -> Result<(), ReconcilerError> {
        let namespace = namespace_of(bridge)?;
        let name = bridge.name_any();
        self.cluster.delete_broker(&namespace, &name).await?;
        self.cluster.delete_config_map(&namespace, &name).await
    }
}

pub(crate) fn namespace_of(bridge: &ManagedBridge) -> Result<String, ReconcilerError> {
    bridge.namespace().ok_or_else(|| ReconcilerError::MissingNamespace {
        kind: "ManagedBridge",
        name: bridge.name_any(),
    })
}

/// Labels put on everything created for `bridge`.
pub fn bridge_labels(bridge: &ManagedBridge) -> BTreeMap<String, String> {
    BTreeMap::from([
        (MANAGED_BY_LABEL.to_string(), MANAGED_BY_VALUE.to_string()),
        (COMPONENT_LABEL.to_string(), ManagedBridge::COMPONENT_NAME.to_string()),
        (BRIDGE_ID_LABEL.to_string(), bridge.spec.id.clone()),
        (CUSTOMER_ID_LABEL.to_string(), bridge.spec.customer_id.clone()),
    ])
}

fn owned_metadata(bridge: &ManagedBridge, namespace: &str) -> ObjectMeta {
    ObjectMeta {
        name: Some(bridge.name_any()),
        namespace: Some(namespace.to_string()),
        labels: Some(bridge_labels(bridge)),
        owner_references: bridge.controller_owner_ref(&()).map(|owner| vec![owner]),
        ..ObjectMeta::default()
    }
}

fn secret_value(secret: &Secret, key: &str) -> Option<String> {
    if let Some(value) = secret.string_data.as_ref().and_then(|d| d.get(key)) {
        return Some(value.clone());
    }
    secret
        .data
        .as_ref()
        .and_then(|d| d.get(key))
        .and_then(|bytes| String::from_utf8(bytes.0.clone()).ok())
}

/// Kafka broker class configuration derived from the bridge secret.
pub fn desired_config_map(bridge: &ManagedBridge, secret: &Secret, namespace: &str) -> ConfigMap {
    let mut data = BTreeMap::from([
        (CONFIG_MAP_PARTITIONS.to_string(), DEFAULT_TOPIC_PARTITIONS.to_string()),
        (
            CONFIG_MAP_REPLICATION_FACTOR.to_string(),
            DEFAULT_TOPIC_REPLICATION_FACTOR.to_string(),
        ),
        (CONFIG_MAP_AUTH_SECRET_NAME.to_string(), secret.name_any()),
    ]);

    for (secret_key, config_key) in [
        (SECRET_BOOTSTRAP_SERVERS, CONFIG_MAP_BOOTSTRAP_SERVERS),
        (SECRET_TOPIC_NAME, CONFIG_MAP_TOPIC_NAME),
    ] {
        match secret_value(secret, secret_key) {
            Some(value) => {
                data.insert(config_key.to_string(), value);
            }
            None => warn!(
                "Secret for ManagedBridge '{}' has no '{}' entry",
                bridge.name_any(),
                secret_key
            ),
        }
    }

    ConfigMap {
        metadata: owned_metadata(bridge, namespace),
        data: Some(data),
        ..ConfigMap::default()
    }
}

/// Kafka-class Knative broker configured by `config_map`.
pub fn desired_broker(bridge: &ManagedBridge, config_map: &ConfigMap, namespace: &str) -> KnativeBroker {
    let mut broker = KnativeBroker::new(
        &bridge.name_any(),
        KnativeBrokerSpec {
            config: Some(KReference {
                api_version: "v1".to_string(),
                kind: "ConfigMap".to_string(),
                name: config_map.name_any(),
                namespace: Some(namespace.to_string()),
            }),
        },
    );
    broker.metadata = ObjectMeta {
        annotations: Some(BTreeMap::from([(
            BROKER_CLASS_ANNOTATION.to_string(),
            KAFKA_BROKER_CLASS.to_string(),
        )])),
        ..owned_metadata(bridge, namespace)
    };
    broker
}
