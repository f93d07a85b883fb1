//! # Processor Worker
//!
//! A processor may own one connector. Provisioning and deprovisioning are
//! delegated to the connector worker with the processor's own work item; the
//! processor adopts the connector's status as its dependency status.

use super::{
    adopt_dependency, complete_without_dependencies, finish_tick, start_tick, Worker, WorkerError,
};
use crate::clock::Clock;
use crate::model::{ManagedResource, OperationType, ResourceKind, Work};
use crate::persistence::ResourceStore;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Debug, Clone)]
pub struct ProcessorWorker {
    store: Arc<dyn ResourceStore>,
    clock: Arc<dyn Clock>,
    connector_worker: Arc<dyn Worker>,
}

impl ProcessorWorker {
    pub fn new(
        store: Arc<dyn ResourceStore>,
        clock: Arc<dyn Clock>,
        connector_worker: Arc<dyn Worker>,
    ) -> Self {
        Self {
            store,
            clock,
            connector_worker,
        }
    }

    async fn connector_of(&self, processor: &ManagedResource) -> Result<Option<ManagedResource>, WorkerError> {
        Ok(self
            .store
            .find_dependency_by_owner_id(ResourceKind::Connector, &processor.id)
            .await?)
    }

    /// Moves the connector onto a DELETE operation unless it already has one.
    async fn cascade_delete(&self, connector: ManagedResource) -> Result<(), WorkerError> {
        if connector.operation_type() == Some(OperationType::Delete) {
            return Ok(());
        }
        let mut connector = connector;
        connector.request_operation(OperationType::Delete, self.clock.now())?;
        debug!(
            connector = %connector.id,
            owner = ?connector.owner_id,
            "Cascading delete to connector"
        );
        self.store.persist(connector).await?;
        Ok(())
    }
}

#[async_trait]
impl Worker for ProcessorWorker {
    fn kind(&self) -> ResourceKind {
        ResourceKind::Processor
    }

    fn store(&self) -> &Arc<dyn ResourceStore> {
        &self.store
    }

    async fn resolve_target_id(&self, work: &Work) -> Result<String, WorkerError> {
        Ok(work.managed_resource_id.clone())
    }

    async fn begin_provisioning(
        &self,
        work: &Work,
        resource: ManagedResource,
    ) -> Result<ManagedResource, WorkerError> {
        info!("Creating dependencies for '{}' [{}]", resource.name, resource.id);
        let mut processor = start_tick(self.store.as_ref(), self.clock.as_ref(), resource, false).await?;

        if self.connector_of(&processor).await?.is_none() {
            return complete_without_dependencies(self.store.as_ref(), self.clock.as_ref(), processor, false)
                .await;
        }

        // The shard provisions the processor once its connector is READY.
        let connector = self.connector_worker.handle_work(work).await?;
        adopt_dependency(&mut processor, &connector, self.clock.as_ref(), false);
        finish_tick(self.store.as_ref(), processor).await
    }

    async fn begin_deprovisioning(
        &self,
        work: &Work,
        resource: ManagedResource,
    ) -> Result<ManagedResource, WorkerError> {
        info!("Destroying dependencies for '{}' [{}]", resource.name, resource.id);
        let mut processor = start_tick(self.store.as_ref(), self.clock.as_ref(), resource, true).await?;

        let Some(connector) = self.connector_of(&processor).await? else {
            return complete_without_dependencies(self.store.as_ref(), self.clock.as_ref(), processor, true)
                .await;
        };

        self.cascade_delete(connector).await?;
        let connector = self.connector_worker.handle_work(work).await?;
        adopt_dependency(&mut processor, &connector, self.clock.as_ref(), true);
        finish_tick(self.store.as_ref(), processor).await
    }
}
