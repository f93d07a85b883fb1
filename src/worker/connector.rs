//! # Connector Worker
//!
//! A connector's dependency is the external managed connector that runs it.
//! The worker asks the [`ConnectorProvider`] for it on every tick and only
//! creates (or deletes) it when the provider has no record of the request,
//! so re-delivered work never duplicates the side effect.
//!
//! The provider's view is mirrored into the connector's SHARD condition,
//! which stands in for the operator report other kinds receive. A request the
//! provider rejects fails the connector with the provider's error pointer.

use super::{complete_without_dependencies, dependency_condition_type, finish_tick, start_tick, Worker, WorkerError};
use crate::clock::Clock;
use crate::model::condition::{self, types};
use crate::model::{
    ComponentType, Condition, ConditionStatus, ErrorPointer, ManagedResource,
    ManagedResourceStatus, ResourceKind, Work,
};
use crate::persistence::ResourceStore;
use crate::provider::{ConnectorProvider, ExternalConnectorState, ProviderError};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info, warn};

#[derive(Debug, Clone)]
pub struct ConnectorWorker {
    store: Arc<dyn ResourceStore>,
    clock: Arc<dyn Clock>,
    provider: Arc<dyn ConnectorProvider>,
}

impl ConnectorWorker {
    pub fn new(
        store: Arc<dyn ResourceStore>,
        clock: Arc<dyn Clock>,
        provider: Arc<dyn ConnectorProvider>,
    ) -> Self {
        Self {
            store,
            clock,
            provider,
        }
    }

    fn record_shard(&self, connector: &mut ManagedResource, condition_type: &str, status: ConditionStatus) {
        condition::record(
            &mut connector.conditions,
            Condition::new(ComponentType::Shard, condition_type, status, self.clock.now()),
        );
    }

    fn mark_requested(&self, connector: &mut ManagedResource, deprovisioning: bool) {
        connector.record_manager_condition(Condition::new(
            ComponentType::Manager,
            dependency_condition_type(deprovisioning),
            ConditionStatus::True,
            self.clock.now(),
        ));
    }

    /// Fails the connector, recording the provider error on its SHARD
    /// condition of `condition_type`.
    fn mark_failed(
        &self,
        connector: &mut ManagedResource,
        condition_type: &str,
        error: &ErrorPointer,
        message: &str,
    ) {
        connector.dependency_status = Some(ManagedResourceStatus::Failed);
        connector.error = Some(error.clone());
        condition::record(
            &mut connector.conditions,
            Condition::new(
                ComponentType::Shard,
                condition_type,
                ConditionStatus::Failed,
                self.clock.now(),
            )
            .with_error(error.error_id.to_string(), message),
        );
    }

    fn mirror_provisioning(&self, connector: &mut ManagedResource, state: &ExternalConnectorState) {
        self.mark_requested(connector, false);
        match state {
            ExternalConnectorState::Provisioning => {
                connector.dependency_status = Some(ManagedResourceStatus::Provisioning);
            }
            ExternalConnectorState::Ready => {
                connector.dependency_status = Some(ManagedResourceStatus::Ready);
                self.record_shard(connector, types::READY, ConditionStatus::True);
            }
            ExternalConnectorState::Failed { error, message } => {
                warn!(
                    connector = %connector.id,
                    error_id = error.error_id,
                    "External connector failed: {}", message
                );
                self.mark_failed(connector, types::READY, error, message);
            }
            // Removed behind our back; a later tick recreates it.
            ExternalConnectorState::Deleting => {
                connector.dependency_status = Some(ManagedResourceStatus::Deleting);
                self.record_shard(connector, types::READY, ConditionStatus::Unknown);
            }
        }
    }
}

#[async_trait]
impl Worker for ConnectorWorker {
    fn kind(&self) -> ResourceKind {
        ResourceKind::Connector
    }

    fn store(&self) -> &Arc<dyn ResourceStore> {
        &self.store
    }

    /// Connector ticks run inside their owning processor's tick, so both are
    /// guarded under the processor.
    async fn chain_root(&self, work: &Work) -> Result<(ResourceKind, String), WorkerError> {
        if work.kind != ResourceKind::Connector {
            return Ok((work.kind, work.managed_resource_id.clone()));
        }
        let owner = self
            .store
            .find(ResourceKind::Connector, &work.managed_resource_id)
            .await?
            .and_then(|connector| connector.owner_id);
        Ok(match owner {
            Some(processor_id) => (ResourceKind::Processor, processor_id),
            None => (ResourceKind::Connector, work.managed_resource_id.clone()),
        })
    }

    /// Connector work is normally delivered on behalf of the owning
    /// processor, so the connector is found by owner id.
    async fn resolve_target_id(&self, work: &Work) -> Result<String, WorkerError> {
        if work.kind == ResourceKind::Connector {
            return Ok(work.managed_resource_id.clone());
        }
        self.store
            .find_dependency_by_owner_id(ResourceKind::Connector, &work.managed_resource_id)
            .await?
            .map(|connector| connector.id)
            .ok_or_else(|| WorkerError::TargetNotFound {
                kind: ResourceKind::Connector,
                id: work.managed_resource_id.clone(),
            })
    }

    async fn begin_provisioning(
        &self,
        _work: &Work,
        resource: ManagedResource,
    ) -> Result<ManagedResource, WorkerError> {
        info!("Creating dependencies for '{}' [{}]", resource.name, resource.id);
        let mut connector = start_tick(self.store.as_ref(), self.clock.as_ref(), resource, false).await?;

        let external = match self.provider.fetch_connector(&connector.id).await? {
            Some(external) => external,
            None => {
                info!("🔌 Requesting external connector for '{}' [{}]", connector.name, connector.id);
                match self.provider.create_connector(&connector).await {
                    Ok(external) => external,
                    Err(ProviderError::Rejected { error, message }) => {
                        warn!(
                            connector = %connector.id,
                            error_id = error.error_id,
                            "External connector request rejected: {}", message
                        );
                        self.mark_failed(&mut connector, types::READY, &error, &message);
                        return finish_tick(self.store.as_ref(), connector).await;
                    }
                    Err(e) => return Err(e.into()),
                }
            }
        };
        debug!(connector = %connector.id, external_id = %external.external_id, state = ?external.state, "External connector observed");

        self.mirror_provisioning(&mut connector, &external.state);
        finish_tick(self.store.as_ref(), connector).await
    }

    async fn begin_deprovisioning(
        &self,
        _work: &Work,
        resource: ManagedResource,
    ) -> Result<ManagedResource, WorkerError> {
        info!("Destroying dependencies for '{}' [{}]", resource.name, resource.id);
        let mut connector = start_tick(self.store.as_ref(), self.clock.as_ref(), resource, true).await?;

        let Some(external) = self.provider.fetch_connector(&connector.id).await? else {
            self.record_shard(&mut connector, types::DELETED, ConditionStatus::True);
            return complete_without_dependencies(self.store.as_ref(), self.clock.as_ref(), connector, true)
                .await;
        };

        if external.state != ExternalConnectorState::Deleting {
            info!("🗑️ Deleting external connector for '{}' [{}]", connector.name, connector.id);
            match self.provider.delete_connector(&connector.id).await {
                Ok(()) => {}
                Err(ProviderError::Rejected { error, message }) => {
                    warn!(
                        connector = %connector.id,
                        error_id = error.error_id,
                        "External connector deletion rejected: {}", message
                    );
                    self.mark_failed(&mut connector, types::DELETED, &error, &message);
                    return finish_tick(self.store.as_ref(), connector).await;
                }
                Err(e) => return Err(e.into()),
            }
        }
        connector.dependency_status = Some(ManagedResourceStatus::Deleting);
        self.mark_requested(&mut connector, true);
        finish_tick(self.store.as_ref(), connector).await
    }
}
