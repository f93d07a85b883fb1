//! # Test Support
//!
//! In-memory stand-ins shared by the integration tests: a manual clock, a
//! fake cluster for the bridge reconciler and a counting metrics hook.

#![allow(dead_code, reason = "Each test binary uses a different subset")]

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use k8s_openapi::api::core::v1::{ConfigMap, Secret};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use k8s_openapi::ByteString;
use kube::ResourceExt;
use lifecycle_controller::clock::Clock;
use lifecycle_controller::config::ControllerConfig;
use lifecycle_controller::controller::reconciler::{
    ClusterState, MetricsOperation, OperationMetrics, Reconciler, ReconcilerError,
};
use lifecycle_controller::crd::{
    Addressable, KnativeBroker, KnativeBrokerStatus, ManagedBridge, ManagedBridgeSpec,
    ManagedBridgeStatus,
};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub const NAMESPACE: &str = "ob-customer-1";

/// Clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            now: Mutex::new(Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap()),
        }
    }

    pub fn advance(&self, delta: TimeDelta) {
        *self.now.lock().unwrap() += delta;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}

type Key = (String, String);

fn key(namespace: &str, name: &str) -> Key {
    (namespace.to_string(), name.to_string())
}

/// In-memory cluster that counts every write.
#[derive(Debug, Default)]
pub struct FakeCluster {
    secrets: Mutex<HashMap<Key, Secret>>,
    config_maps: Mutex<HashMap<Key, ConfigMap>>,
    brokers: Mutex<HashMap<Key, KnativeBroker>>,
    bridge_statuses: Mutex<HashMap<Key, ManagedBridgeStatus>>,
    /// Deletions in the order they happened, as `kind/name`
    deletions: Mutex<Vec<String>>,
    pub config_map_applies: AtomicUsize,
    pub broker_applies: AtomicUsize,
    pub status_patches: AtomicUsize,
}

impl FakeCluster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_secret(&self, namespace: &str, name: &str) {
        let secret = Secret {
            metadata: ObjectMeta {
                name: Some(name.to_string()),
                namespace: Some(namespace.to_string()),
                ..ObjectMeta::default()
            },
            data: Some(BTreeMap::from([
                (
                    "bootstrap.servers".to_string(),
                    ByteString(b"kafka:9092".to_vec()),
                ),
                ("topic.name".to_string(), ByteString(b"ob-topic".to_vec())),
            ])),
            ..Secret::default()
        };
        self.secrets.lock().unwrap().insert(key(namespace, name), secret);
    }

    /// Plays the part of Knative publishing (or withdrawing) the broker address.
    pub fn publish_broker_url(&self, namespace: &str, name: &str, url: Option<&str>) {
        if let Some(broker) = self.brokers.lock().unwrap().get_mut(&key(namespace, name)) {
            broker.status = Some(KnativeBrokerStatus {
                address: Some(Addressable {
                    url: url.map(str::to_string),
                }),
                conditions: vec![],
            });
        }
    }

    pub fn config_map(&self, namespace: &str, name: &str) -> Option<ConfigMap> {
        self.config_maps.lock().unwrap().get(&key(namespace, name)).cloned()
    }

    pub fn broker(&self, namespace: &str, name: &str) -> Option<KnativeBroker> {
        self.brokers.lock().unwrap().get(&key(namespace, name)).cloned()
    }

    pub fn bridge_status(&self, namespace: &str, name: &str) -> Option<ManagedBridgeStatus> {
        self.bridge_statuses.lock().unwrap().get(&key(namespace, name)).cloned()
    }

    pub fn deletions(&self) -> Vec<String> {
        self.deletions.lock().unwrap().clone()
    }

    /// Total writes of any kind.
    pub fn writes(&self) -> usize {
        self.config_map_applies.load(Ordering::SeqCst)
            + self.broker_applies.load(Ordering::SeqCst)
            + self.status_patches.load(Ordering::SeqCst)
            + self.deletions.lock().unwrap().len()
    }
}

#[async_trait]
impl ClusterState for FakeCluster {
    async fn get_secret(&self, namespace: &str, name: &str) -> Result<Option<Secret>, ReconcilerError> {
        Ok(self.secrets.lock().unwrap().get(&key(namespace, name)).cloned())
    }

    async fn get_config_map(&self, namespace: &str, name: &str) -> Result<Option<ConfigMap>, ReconcilerError> {
        Ok(self.config_map(namespace, name))
    }

    async fn apply_config_map(&self, config_map: &ConfigMap) -> Result<ConfigMap, ReconcilerError> {
        self.config_map_applies.fetch_add(1, Ordering::SeqCst);
        let namespace = config_map.namespace().unwrap_or_default();
        self.config_maps
            .lock()
            .unwrap()
            .insert(key(&namespace, &config_map.name_any()), config_map.clone());
        Ok(config_map.clone())
    }

    async fn delete_config_map(&self, namespace: &str, name: &str) -> Result<(), ReconcilerError> {
        self.config_maps.lock().unwrap().remove(&key(namespace, name));
        self.deletions.lock().unwrap().push(format!("configmap/{name}"));
        Ok(())
    }

    async fn get_broker(&self, namespace: &str, name: &str) -> Result<Option<KnativeBroker>, ReconcilerError> {
        Ok(self.broker(namespace, name))
    }

    async fn apply_broker(&self, broker: &KnativeBroker) -> Result<KnativeBroker, ReconcilerError> {
        self.broker_applies.fetch_add(1, Ordering::SeqCst);
        let namespace = broker.namespace().unwrap_or_default();
        let mut brokers = self.brokers.lock().unwrap();
        let key = key(&namespace, &broker.name_any());
        // Status belongs to Knative and survives an apply.
        let mut stored = broker.clone();
        stored.status = brokers.get(&key).and_then(|existing| existing.status.clone());
        brokers.insert(key, stored.clone());
        Ok(stored)
    }

    async fn delete_broker(&self, namespace: &str, name: &str) -> Result<(), ReconcilerError> {
        self.brokers.lock().unwrap().remove(&key(namespace, name));
        self.deletions.lock().unwrap().push(format!("broker/{name}"));
        Ok(())
    }

    async fn patch_bridge_status(
        &self,
        namespace: &str,
        name: &str,
        status: &ManagedBridgeStatus,
    ) -> Result<(), ReconcilerError> {
        self.status_patches.fetch_add(1, Ordering::SeqCst);
        self.bridge_statuses
            .lock()
            .unwrap()
            .insert(key(namespace, name), status.clone());
        Ok(())
    }
}

/// Counts completed operations per kind and records requeue reasons.
#[derive(Debug, Default)]
pub struct CountingMetrics {
    pub provisioned: AtomicUsize,
    pub deleted: AtomicUsize,
    pub requeues: Mutex<Vec<String>>,
}

impl CountingMetrics {
    pub fn provisioned(&self) -> usize {
        self.provisioned.load(Ordering::SeqCst)
    }

    pub fn deleted(&self) -> usize {
        self.deleted.load(Ordering::SeqCst)
    }

    pub fn requeues(&self) -> Vec<String> {
        self.requeues.lock().unwrap().clone()
    }
}

impl OperationMetrics for CountingMetrics {
    fn on_operation_complete(&self, _bridge: &ManagedBridge, operation: MetricsOperation) {
        match operation {
            MetricsOperation::ControllerResourceProvision => self.provisioned.fetch_add(1, Ordering::SeqCst),
            MetricsOperation::ControllerResourceDelete => self.deleted.fetch_add(1, Ordering::SeqCst),
        };
    }

    fn on_requeue(&self, _bridge: &ManagedBridge, reason: &str) {
        self.requeues.lock().unwrap().push(reason.to_string());
    }
}

pub fn bridge(name: &str) -> ManagedBridge {
    let mut bridge = ManagedBridge::new(
        name,
        ManagedBridgeSpec {
            id: format!("{name}-id"),
            bridge_name: "my-bridge".to_string(),
            customer_id: "customer-1".to_string(),
            owner: Some("user@example.com".to_string()),
        },
    );
    bridge.metadata.namespace = Some(NAMESPACE.to_string());
    bridge.metadata.uid = Some(format!("{name}-uid"));
    bridge
}

pub fn reconciler(cluster: Arc<FakeCluster>, metrics: Arc<CountingMetrics>) -> Reconciler {
    Reconciler::new(cluster, metrics, ControllerConfig::default())
}
