//! # Bridge Worker
//!
//! Bridges have no manager-side dependencies; the shard does all the work.
//! A tick records the start condition and immediately completes the
//! dependency phase.

use super::{complete_without_dependencies, start_tick, Worker, WorkerError};
use crate::clock::Clock;
use crate::model::{ManagedResource, ResourceKind, Work};
use crate::persistence::ResourceStore;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Clone)]
pub struct BridgeWorker {
    store: Arc<dyn ResourceStore>,
    clock: Arc<dyn Clock>,
}

impl BridgeWorker {
    pub fn new(store: Arc<dyn ResourceStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }
}

#[async_trait]
impl Worker for BridgeWorker {
    fn kind(&self) -> ResourceKind {
        ResourceKind::Bridge
    }

    fn store(&self) -> &Arc<dyn ResourceStore> {
        &self.store
    }

    async fn resolve_target_id(&self, work: &Work) -> Result<String, WorkerError> {
        Ok(work.managed_resource_id.clone())
    }

    async fn begin_provisioning(
        &self,
        _work: &Work,
        resource: ManagedResource,
    ) -> Result<ManagedResource, WorkerError> {
        info!("Creating dependencies for '{}' [{}]", resource.name, resource.id);
        let resource = start_tick(self.store.as_ref(), self.clock.as_ref(), resource, false).await?;
        complete_without_dependencies(self.store.as_ref(), self.clock.as_ref(), resource, false).await
    }

    async fn begin_deprovisioning(
        &self,
        _work: &Work,
        resource: ManagedResource,
    ) -> Result<ManagedResource, WorkerError> {
        info!("Destroying dependencies for '{}' [{}]", resource.name, resource.id);
        let resource = start_tick(self.store.as_ref(), self.clock.as_ref(), resource, true).await?;
        complete_without_dependencies(self.store.as_ref(), self.clock.as_ref(), resource, true).await
    }
}
