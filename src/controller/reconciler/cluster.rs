//! # Cluster State
//!
//! The Kubernetes objects the bridge reconciler reads and writes, behind a
//! trait so the reconcile steps can run against an in-memory cluster.
//!
//! Writes use server-side apply with a forced field manager, so re-applying
//! an unchanged object is a no-op on the API server.

use super::types::ReconcilerError;
use crate::crd::{KnativeBroker, ManagedBridge, ManagedBridgeStatus};
use async_trait::async_trait;
use k8s_openapi::api::core::v1::{ConfigMap, Secret};
use kube::api::{Api, DeleteParams, Patch, PatchParams};
use kube::{Client, Resource, ResourceExt};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt::Debug;
use tracing::debug;

#[async_trait]
pub trait ClusterState: Send + Sync {
    async fn get_secret(&self, namespace: &str, name: &str) -> Result<Option<Secret>, ReconcilerError>;

    async fn get_config_map(&self, namespace: &str, name: &str) -> Result<Option<ConfigMap>, ReconcilerError>;

    async fn apply_config_map(&self, config_map: &ConfigMap) -> Result<ConfigMap, ReconcilerError>;

    async fn delete_config_map(&self, namespace: &str, name: &str) -> Result<(), ReconcilerError>;

    async fn get_broker(&self, namespace: &str, name: &str) -> Result<Option<KnativeBroker>, ReconcilerError>;

    async fn apply_broker(&self, broker: &KnativeBroker) -> Result<KnativeBroker, ReconcilerError>;

    async fn delete_broker(&self, namespace: &str, name: &str) -> Result<(), ReconcilerError>;

    /// Writes the status subresource. A bridge deleted mid-reconcile is not an error.
    async fn patch_bridge_status(
        &self,
        namespace: &str,
        name: &str,
        status: &ManagedBridgeStatus,
    ) -> Result<(), ReconcilerError>;
}

/// [`ClusterState`] backed by the Kubernetes API.
#[derive(Clone)]
pub struct KubeClusterState {
    client: Client,
    field_manager: String,
}

impl std::fmt::Debug for KubeClusterState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KubeClusterState")
            .field("field_manager", &self.field_manager)
            .finish_non_exhaustive()
    }
}

impl KubeClusterState {
    pub fn new(client: Client, field_manager: impl Into<String>) -> Self {
        Self {
            client,
            field_manager: field_manager.into(),
        }
    }

    fn api<K>(&self, namespace: &str) -> Api<K>
    where
        K: Resource<Scope = k8s_openapi::NamespaceResourceScope>,
        <K as Resource>::DynamicType: Default,
    {
        Api::namespaced(self.client.clone(), namespace)
    }

    async fn apply<K>(&self, object: &K) -> Result<K, ReconcilerError>
    where
        K: Resource<Scope = k8s_openapi::NamespaceResourceScope>
            + Clone
            + Debug
            + Serialize
            + DeserializeOwned,
        <K as Resource>::DynamicType: Default,
    {
        let namespace = object.namespace().ok_or_else(|| ReconcilerError::MissingNamespace {
            kind: std::any::type_name::<K>(),
            name: object.name_any(),
        })?;
        let name = object.name_any();
        debug!("Applying {}/{}", namespace, name);
        Ok(self
            .api::<K>(&namespace)
            .patch(&name, &PatchParams::apply(&self.field_manager).force(), &Patch::Apply(object))
            .await?)
    }

    async fn delete<K>(&self, namespace: &str, name: &str) -> Result<(), ReconcilerError>
    where
        K: Resource<Scope = k8s_openapi::NamespaceResourceScope> + Clone + Debug + DeserializeOwned,
        <K as Resource>::DynamicType: Default,
    {
        match self.api::<K>(namespace).delete(name, &DeleteParams::default()).await {
            Ok(_) => Ok(()),
            Err(kube::Error::Api(api_err)) if api_err.code == 404 => {
                debug!("{}/{} already gone", namespace, name);
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl ClusterState for KubeClusterState {
    async fn get_secret(&self, namespace: &str, name: &str) -> Result<Option<Secret>, ReconcilerError> {
        Ok(self.api::<Secret>(namespace).get_opt(name).await?)
    }

    async fn get_config_map(&self, namespace: &str, name: &str) -> Result<Option<ConfigMap>, ReconcilerError> {
        Ok(self.api::<ConfigMap>(namespace).get_opt(name).await?)
    }

    async fn apply_config_map(&self, config_map: &ConfigMap) -> Result<ConfigMap, ReconcilerError> {
        self.apply(config_map).await
    }

    async fn delete_config_map(&self, namespace: &str, name: &str) -> Result<(), ReconcilerError> {
        self.delete::<ConfigMap>(namespace, name).await
    }

    async fn get_broker(&self, namespace: &str, name: &str) -> Result<Option<KnativeBroker>, ReconcilerError> {
        Ok(self.api::<KnativeBroker>(namespace).get_opt(name).await?)
    }

    async fn apply_broker(&self, broker: &KnativeBroker) -> Result<KnativeBroker, ReconcilerError> {
        self.apply(broker).await
    }

    async fn delete_broker(&self, namespace: &str, name: &str) -> Result<(), ReconcilerError> {
        self.delete::<KnativeBroker>(namespace, name).await
    }

    async fn patch_bridge_status(
        &self,
        namespace: &str,
        name: &str,
        status: &ManagedBridgeStatus,
    ) -> Result<(), ReconcilerError> {
        let patch = serde_json::json!({
            "status": status
        });

        match self
            .api::<ManagedBridge>(namespace)
            .patch_status(name, &PatchParams::apply(&self.field_manager), &Patch::Merge(patch))
            .await
        {
            Ok(_) => Ok(()),
            Err(kube::Error::Api(api_err)) if api_err.code == 404 => {
                debug!(
                    "ManagedBridge {}/{} was deleted during reconciliation, skipping status update",
                    namespace, name
                );
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }
}
