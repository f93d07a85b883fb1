//! # In-Memory Store
//!
//! Process-local [`ResourceStore`] with compare-and-set on `version`.

use super::{PersistenceError, ResourceStore};
use crate::model::{ManagedResource, ResourceKind};
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::debug;

#[derive(Debug, Default)]
pub struct InMemoryResourceStore {
    resources: RwLock<HashMap<(ResourceKind, String), ManagedResource>>,
}

impl InMemoryResourceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored resources of `kind`.
    pub async fn count(&self, kind: ResourceKind) -> usize {
        self.resources
            .read()
            .await
            .keys()
            .filter(|(k, _)| *k == kind)
            .count()
    }
}

#[async_trait]
impl ResourceStore for InMemoryResourceStore {
    async fn find(&self, kind: ResourceKind, id: &str) -> Result<Option<ManagedResource>, PersistenceError> {
        Ok(self.resources.read().await.get(&(kind, id.to_string())).cloned())
    }

    async fn persist(&self, mut resource: ManagedResource) -> Result<ManagedResource, PersistenceError> {
        let mut resources = self.resources.write().await;
        let key = (resource.kind, resource.id.clone());

        let stored_version = resources.get(&key).map_or(0, |stored| stored.version);
        if stored_version != resource.version {
            return Err(PersistenceError::Conflict {
                kind: resource.kind,
                id: resource.id,
                expected: resource.version,
                found: stored_version,
            });
        }

        resource.version = stored_version + 1;
        debug!(
            kind = %resource.kind,
            id = %resource.id,
            version = resource.version,
            status = %resource.status,
            "Persisted managed resource"
        );
        resources.insert(key, resource.clone());
        Ok(resource)
    }

    async fn find_dependency_by_owner_id(
        &self,
        kind: ResourceKind,
        owner_id: &str,
    ) -> Result<Option<ManagedResource>, PersistenceError> {
        Ok(self
            .resources
            .read()
            .await
            .values()
            .find(|r| r.kind == kind && r.owner_id.as_deref() == Some(owner_id))
            .cloned())
    }
}
