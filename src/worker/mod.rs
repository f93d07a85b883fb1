//! # Dependency Workers
//!
//! Poll-driven state machines that provision and deprovision the
//! dependencies of a managed resource, one tick at a time.
//!
//! A tick always follows the same shape:
//!
//! 1. record the MANAGER start condition, refresh the cached status and persist
//! 2. with no dependencies, mark them READY (or DELETED) and persist
//! 3. otherwise delegate to the child worker and adopt the child's status
//! 4. refresh the cached status and persist
//!
//! ## Sub-modules
//!
//! - `bridge` - leaf worker for bridges
//! - `processor` - processor worker, delegates to the connector worker
//! - `connector` - connector worker backed by a [`crate::provider::ConnectorProvider`]
//! - `registry` - kind to worker mapping built at startup
//! - `scheduler` - periodic dispatch of [`crate::model::Work`]

pub mod bridge;
pub mod connector;
pub mod processor;
pub mod registry;
pub mod scheduler;

pub use bridge::BridgeWorker;
pub use connector::ConnectorWorker;
pub use processor::ProcessorWorker;
pub use registry::WorkerRegistry;
pub use scheduler::{TickReport, WorkScheduler};

use crate::clock::Clock;
use crate::model::condition::types;
use crate::model::{
    ComponentType, Condition, ConditionStatus, LifecycleError, ManagedResource,
    ManagedResourceStatus, OperationType, ResourceKind, Work,
};
use crate::persistence::{PersistenceError, ResourceStore};
use crate::provider::ProviderError;
use crate::status::{self, StatusError};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

/// Dependency statuses that end provisioning work.
pub const PROVISIONING_COMPLETED: [ManagedResourceStatus; 2] =
    [ManagedResourceStatus::Ready, ManagedResourceStatus::Failed];

/// Dependency statuses that end deprovisioning work.
pub const DEPROVISIONING_COMPLETED: [ManagedResourceStatus; 2] =
    [ManagedResourceStatus::Deleted, ManagedResourceStatus::Failed];

#[derive(Error, Debug)]
pub enum WorkerError {
    #[error(transparent)]
    Persistence(#[from] PersistenceError),

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    Status(#[from] StatusError),

    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),

    #[error("{kind} target for work on '{id}' not found")]
    TargetNotFound { kind: ResourceKind, id: String },

    #[error("{kind} '{id}' has no operation to work on")]
    MissingOperation { kind: ResourceKind, id: String },

    #[error("No worker registered for {0}")]
    NoWorker(ResourceKind),
}

impl WorkerError {
    /// Whether the scheduler should deliver the work again.
    ///
    /// A dependency that is not yet actionable settles on its own, so
    /// lifecycle errors are retried.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Persistence(e) => e.is_retryable(),
            Self::Provider(e) => e.is_retryable(),
            Self::Lifecycle(_) => true,
            Self::Status(_)
            | Self::TargetNotFound { .. }
            | Self::MissingOperation { .. }
            | Self::NoWorker(_) => false,
        }
    }
}

#[async_trait]
pub trait Worker: Send + Sync + std::fmt::Debug {
    fn kind(&self) -> ResourceKind;

    fn store(&self) -> &Arc<dyn ResourceStore>;

    /// Resource whose tick covers `work`. The scheduler never runs two work
    /// items with the same root at once.
    async fn chain_root(&self, work: &Work) -> Result<(ResourceKind, String), WorkerError> {
        Ok((work.kind, work.managed_resource_id.clone()))
    }

    /// Id of the resource this worker acts on for `work`.
    ///
    /// A child worker receives its parent's work item and resolves its own
    /// target from it.
    async fn resolve_target_id(&self, work: &Work) -> Result<String, WorkerError>;

    async fn begin_provisioning(
        &self,
        work: &Work,
        resource: ManagedResource,
    ) -> Result<ManagedResource, WorkerError>;

    async fn begin_deprovisioning(
        &self,
        work: &Work,
        resource: ManagedResource,
    ) -> Result<ManagedResource, WorkerError>;

    fn provisioning_complete(&self, resource: &ManagedResource) -> bool {
        resource
            .dependency_status
            .is_some_and(|s| PROVISIONING_COMPLETED.contains(&s))
    }

    fn deprovisioning_complete(&self, resource: &ManagedResource) -> bool {
        resource
            .dependency_status
            .is_some_and(|s| DEPROVISIONING_COMPLETED.contains(&s))
    }

    /// Runs one tick for `work` and returns the stored resource.
    async fn handle_work(&self, work: &Work) -> Result<ManagedResource, WorkerError> {
        let id = self.resolve_target_id(work).await?;
        let resource = self
            .store()
            .find(self.kind(), &id)
            .await?
            .ok_or_else(|| WorkerError::TargetNotFound {
                kind: self.kind(),
                id: id.clone(),
            })?;

        debug!(
            kind = %self.kind(),
            id = %resource.id,
            status = %resource.status,
            "Handling work"
        );

        match resource.operation_type() {
            Some(OperationType::Delete) => self.begin_deprovisioning(work, resource).await,
            Some(OperationType::Create | OperationType::Update) => {
                self.begin_provisioning(work, resource).await
            }
            None => Err(WorkerError::MissingOperation {
                kind: self.kind(),
                id: resource.id,
            }),
        }
    }

    fn is_complete(&self, resource: &ManagedResource) -> bool {
        match resource.operation_type() {
            Some(OperationType::Delete) => self.deprovisioning_complete(resource),
            _ => self.provisioning_complete(resource),
        }
    }
}

/// Step 1 of a tick: record the start condition for the current operation,
/// refresh the cached status and persist.
pub(crate) async fn start_tick(
    store: &dyn ResourceStore,
    clock: &dyn Clock,
    mut resource: ManagedResource,
    deprovisioning: bool,
) -> Result<ManagedResource, WorkerError> {
    let started = if deprovisioning {
        types::DEPROVISIONING_STARTED
    } else {
        types::PROVISIONING_STARTED
    };
    resource.record_manager_condition(Condition::new(
        ComponentType::Manager,
        started,
        ConditionStatus::True,
        clock.now(),
    ));
    status::refresh_status(&mut resource)?;
    Ok(store.persist(resource).await?)
}

/// Type of the MANAGER condition that tracks dependencies for the operation.
pub(crate) fn dependency_condition_type(deprovisioning: bool) -> &'static str {
    if deprovisioning {
        types::DEPENDENCIES_DELETED
    } else {
        types::DEPENDENCIES_READY
    }
}

/// Step 2 of a tick: nothing to wait for.
pub(crate) async fn complete_without_dependencies(
    store: &dyn ResourceStore,
    clock: &dyn Clock,
    mut resource: ManagedResource,
    deprovisioning: bool,
) -> Result<ManagedResource, WorkerError> {
    debug!(kind = %resource.kind, id = %resource.id, "No dependencies required");
    resource.dependency_status = Some(if deprovisioning {
        ManagedResourceStatus::Deleted
    } else {
        ManagedResourceStatus::Ready
    });
    resource.record_manager_condition(Condition::new(
        ComponentType::Manager,
        dependency_condition_type(deprovisioning),
        ConditionStatus::True,
        clock.now(),
    ));
    finish_tick(store, resource).await
}

/// Step 3 of a tick: fold the child's outcome into the parent.
///
/// A FAILED child fails the parent and hands over its error pointer
/// unchanged. A child that reached the target status completes the MANAGER
/// dependency condition; anything else leaves it as is.
pub(crate) fn adopt_dependency(
    resource: &mut ManagedResource,
    dependency: &ManagedResource,
    clock: &dyn Clock,
    deprovisioning: bool,
) {
    resource.dependency_status = Some(dependency.status);
    let condition_type = dependency_condition_type(deprovisioning);
    let target = if deprovisioning {
        ManagedResourceStatus::Deleted
    } else {
        ManagedResourceStatus::Ready
    };

    if dependency.status == ManagedResourceStatus::Failed {
        resource.status = ManagedResourceStatus::Failed;
        resource.error = dependency.error.clone();
        let mut condition = Condition::new(
            ComponentType::Manager,
            condition_type,
            ConditionStatus::Failed,
            clock.now(),
        );
        if let Some(error) = &dependency.error {
            condition = condition.with_error(
                error.error_id.to_string(),
                format!("{} '{}' failed", dependency.kind, dependency.id),
            );
        }
        resource.record_manager_condition(condition);
    } else if dependency.status == target {
        resource.record_manager_condition(Condition::new(
            ComponentType::Manager,
            condition_type,
            ConditionStatus::True,
            clock.now(),
        ));
    }
}

/// Step 4 of a tick: refresh the cached status and persist.
pub(crate) async fn finish_tick(
    store: &dyn ResourceStore,
    mut resource: ManagedResource,
) -> Result<ManagedResource, WorkerError> {
    status::refresh_status(&mut resource)?;
    Ok(store.persist(resource).await?)
}
