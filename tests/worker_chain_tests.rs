//! # Worker Chain Tests
//!
//! Bridge, processor and connector workers driven tick by tick against the
//! in-memory store and connector provider, including the hand-off of SHARD
//! conditions reported by the operator.

mod common;

use common::ManualClock;
use lifecycle_controller::clock::Clock;
use lifecycle_controller::crd::status::{CONFIG_MAP_AVAILABLE, KNATIVE_BROKER_AVAILABLE, READY, SECRET_AVAILABLE};
use lifecycle_controller::crd::ManagedBridgeStatus;
use lifecycle_controller::model::condition::types;
use lifecycle_controller::model::{
    ComponentType, Condition, ConditionStatus, ErrorPointer, ManagedResource,
    ManagedResourceStatus, OperationType, ResourceKind, Work,
};
use lifecycle_controller::persistence::{InMemoryResourceStore, ResourceStore};
use lifecycle_controller::provider::{ExternalConnectorState, InMemoryConnectorProvider};
use lifecycle_controller::status::{refresh_status, status_message};
use lifecycle_controller::worker::{WorkerError, WorkerRegistry};
use std::sync::Arc;

struct Harness {
    store: Arc<InMemoryResourceStore>,
    provider: Arc<InMemoryConnectorProvider>,
    clock: Arc<ManualClock>,
    registry: WorkerRegistry,
}

impl Harness {
    fn new() -> Self {
        let store = Arc::new(InMemoryResourceStore::new());
        let provider = Arc::new(InMemoryConnectorProvider::new());
        let clock = Arc::new(ManualClock::new());
        let registry = WorkerRegistry::new(store.clone(), provider.clone(), clock.clone());
        Self {
            store,
            provider,
            clock,
            registry,
        }
    }

    async fn create(&self, kind: ResourceKind, id: &str, owner: Option<&str>) -> ManagedResource {
        let resource = ManagedResource::accepted(
            kind,
            id,
            format!("{}-name", id),
            owner.map(str::to_string),
            self.clock.now(),
        );
        self.store.persist(resource).await.unwrap()
    }

    async fn find(&self, kind: ResourceKind, id: &str) -> ManagedResource {
        self.store.find(kind, id).await.unwrap().unwrap()
    }

    async fn tick(&self, kind: ResourceKind, id: &str) -> Result<ManagedResource, WorkerError> {
        let work = Work::new(kind, id, self.clock.now());
        self.registry.get(kind).unwrap().handle_work(&work).await
    }

    fn is_complete(&self, resource: &ManagedResource) -> bool {
        self.registry.get(resource.kind).unwrap().is_complete(resource)
    }

    /// Stands in for the operator reporting its SHARD conditions.
    async fn shard_reports(&self, kind: ResourceKind, id: &str, shard_conditions: Vec<Condition>) -> ManagedResource {
        let mut resource = self.find(kind, id).await;
        resource.replace_shard_conditions(shard_conditions);
        refresh_status(&mut resource).unwrap();
        self.store.persist(resource).await.unwrap()
    }

    async fn request(&self, kind: ResourceKind, id: &str, operation: OperationType) {
        let mut resource = self.find(kind, id).await;
        resource.request_operation(operation, self.clock.now()).unwrap();
        self.store.persist(resource).await.unwrap();
    }

    fn shard(&self, condition_type: &str) -> Condition {
        Condition::new(ComponentType::Shard, condition_type, ConditionStatus::True, self.clock.now())
    }
}

#[tokio::test]
async fn test_bridge_without_dependencies_completes_in_one_tick() {
    let h = Harness::new();
    h.create(ResourceKind::Bridge, "b1", None).await;

    let bridge = h.tick(ResourceKind::Bridge, "b1").await.unwrap();

    assert_eq!(bridge.status, ManagedResourceStatus::Provisioning);
    assert_eq!(bridge.dependency_status, Some(ManagedResourceStatus::Ready));
    assert!(h.is_complete(&bridge));
    assert_eq!(h.find(ResourceKind::Bridge, "b1").await, bridge);
}

#[tokio::test]
async fn test_operator_hand_off_drives_bridge_to_ready() {
    let h = Harness::new();
    h.create(ResourceKind::Bridge, "b1", None).await;
    h.tick(ResourceKind::Bridge, "b1").await.unwrap();

    // Secret still missing: the operator's FALSE reads as not done yet.
    let mut operator_status = ManagedBridgeStatus::new();
    operator_status.mark_condition_false(SECRET_AVAILABLE, h.clock.now());
    operator_status.mark_condition_false(READY, h.clock.now());
    let bridge = h
        .shard_reports(
            ResourceKind::Bridge,
            "b1",
            operator_status.to_shard_conditions(h.clock.now()),
        )
        .await;
    assert_eq!(bridge.status, ManagedResourceStatus::Provisioning);
    assert!(bridge
        .conditions
        .iter()
        .filter(|c| c.component == ComponentType::Shard)
        .all(|c| c.status == ConditionStatus::Unknown));

    for condition_type in [SECRET_AVAILABLE, CONFIG_MAP_AVAILABLE, KNATIVE_BROKER_AVAILABLE, READY] {
        operator_status.mark_condition_true(condition_type, h.clock.now());
    }
    let bridge = h
        .shard_reports(
            ResourceKind::Bridge,
            "b1",
            operator_status.to_shard_conditions(h.clock.now()),
        )
        .await;
    assert_eq!(bridge.status, ManagedResourceStatus::Ready);
    assert_eq!(
        bridge
            .conditions
            .iter()
            .filter(|c| c.component == ComponentType::Manager)
            .count(),
        2
    );
}

#[tokio::test]
async fn test_processor_without_connector_completes_in_one_tick() {
    let h = Harness::new();
    h.create(ResourceKind::Processor, "p1", Some("b1")).await;

    let processor = h.tick(ResourceKind::Processor, "p1").await.unwrap();

    assert_eq!(processor.status, ManagedResourceStatus::Provisioning);
    assert!(h.is_complete(&processor));
    assert_eq!(h.provider.create_calls(), 0);
}

#[tokio::test]
async fn test_processor_waits_for_connector() {
    let h = Harness::new();
    h.create(ResourceKind::Processor, "p1", Some("b1")).await;
    h.create(ResourceKind::Connector, "c1", Some("p1")).await;

    let processor = h.tick(ResourceKind::Processor, "p1").await.unwrap();

    assert_eq!(processor.status, ManagedResourceStatus::Preparing);
    assert_eq!(processor.dependency_status, Some(ManagedResourceStatus::Provisioning));
    assert!(!h.is_complete(&processor));

    let connector = h.find(ResourceKind::Connector, "c1").await;
    assert_eq!(connector.status, ManagedResourceStatus::Provisioning);
    assert_eq!(h.provider.create_calls(), 1);
}

#[tokio::test]
async fn test_rerun_does_not_create_second_dependency() {
    let h = Harness::new();
    h.create(ResourceKind::Processor, "p1", Some("b1")).await;
    h.create(ResourceKind::Connector, "c1", Some("p1")).await;

    h.tick(ResourceKind::Processor, "p1").await.unwrap();
    let processor = h.tick(ResourceKind::Processor, "p1").await.unwrap();
    h.tick(ResourceKind::Processor, "p1").await.unwrap();

    assert_eq!(processor.status, ManagedResourceStatus::Preparing);
    assert_eq!(h.provider.create_calls(), 1);
    assert_eq!(h.store.count(ResourceKind::Connector).await, 1);
}

#[tokio::test]
async fn test_connector_ready_completes_processor_dependencies() {
    let h = Harness::new();
    h.create(ResourceKind::Processor, "p1", Some("b1")).await;
    h.create(ResourceKind::Connector, "c1", Some("p1")).await;
    h.tick(ResourceKind::Processor, "p1").await.unwrap();

    h.provider.set_state("c1", ExternalConnectorState::Ready).await;
    let processor = h.tick(ResourceKind::Processor, "p1").await.unwrap();

    assert_eq!(processor.status, ManagedResourceStatus::Provisioning);
    assert_eq!(processor.dependency_status, Some(ManagedResourceStatus::Ready));
    assert!(h.is_complete(&processor));
    assert_eq!(
        h.find(ResourceKind::Connector, "c1").await.status,
        ManagedResourceStatus::Ready
    );

    let processor = h
        .shard_reports(ResourceKind::Processor, "p1", vec![h.shard(types::READY)])
        .await;
    assert_eq!(processor.status, ManagedResourceStatus::Ready);
}

#[tokio::test]
async fn test_failed_connector_fails_processor_with_same_error() {
    let h = Harness::new();
    h.create(ResourceKind::Processor, "p1", Some("b1")).await;
    h.create(ResourceKind::Connector, "c1", Some("p1")).await;
    h.tick(ResourceKind::Processor, "p1").await.unwrap();

    let pointer = ErrorPointer {
        error_id: 27,
        error_uuid: "6f0c1c2e-err".to_string(),
    };
    h.provider
        .set_state(
            "c1",
            ExternalConnectorState::Failed {
                error: pointer.clone(),
                message: "Kafka topic unreachable".to_string(),
            },
        )
        .await;
    let processor = h.tick(ResourceKind::Processor, "p1").await.unwrap();

    assert_eq!(processor.status, ManagedResourceStatus::Failed);
    assert_eq!(processor.error, Some(pointer.clone()));
    assert!(h.is_complete(&processor));
    assert_eq!(
        status_message(&processor.conditions).as_deref(),
        Some("[27] CONNECTOR 'c1' failed")
    );

    let connector = h.find(ResourceKind::Connector, "c1").await;
    assert_eq!(connector.status, ManagedResourceStatus::Failed);
    assert_eq!(connector.error, Some(pointer));
    assert_eq!(
        status_message(&connector.conditions).as_deref(),
        Some("[27] Kafka topic unreachable")
    );
}

#[tokio::test]
async fn test_rejected_create_fails_connector_and_processor() {
    let h = Harness::new();
    h.create(ResourceKind::Processor, "p1", Some("b1")).await;
    h.create(ResourceKind::Connector, "c1", Some("p1")).await;
    let pointer = ErrorPointer {
        error_id: 31,
        error_uuid: "quota-err".to_string(),
    };
    h.provider
        .reject_requests(pointer.clone(), "Connector quota exceeded")
        .await;

    let processor = h.tick(ResourceKind::Processor, "p1").await.unwrap();

    assert_eq!(h.provider.create_calls(), 1);
    assert_eq!(processor.status, ManagedResourceStatus::Failed);
    assert_eq!(processor.error, Some(pointer.clone()));
    assert!(h.is_complete(&processor));
    assert_eq!(
        status_message(&processor.conditions).as_deref(),
        Some("[31] CONNECTOR 'c1' failed")
    );

    let connector = h.find(ResourceKind::Connector, "c1").await;
    assert_eq!(connector.status, ManagedResourceStatus::Failed);
    assert_eq!(connector.dependency_status, Some(ManagedResourceStatus::Failed));
    assert_eq!(connector.error, Some(pointer));
    assert_eq!(
        status_message(&connector.conditions).as_deref(),
        Some("[31] Connector quota exceeded")
    );
}

#[tokio::test]
async fn test_rejected_delete_fails_connector_and_processor() {
    let h = Harness::new();
    h.create(ResourceKind::Processor, "p1", Some("b1")).await;
    h.create(ResourceKind::Connector, "c1", Some("p1")).await;
    h.tick(ResourceKind::Processor, "p1").await.unwrap();
    h.provider.set_state("c1", ExternalConnectorState::Ready).await;
    h.tick(ResourceKind::Processor, "p1").await.unwrap();
    h.shard_reports(ResourceKind::Processor, "p1", vec![h.shard(types::READY)])
        .await;

    let pointer = ErrorPointer {
        error_id: 44,
        error_uuid: "locked-err".to_string(),
    };
    h.provider
        .reject_requests(pointer.clone(), "Connector is locked")
        .await;
    h.request(ResourceKind::Processor, "p1", OperationType::Delete).await;

    let processor = h.tick(ResourceKind::Processor, "p1").await.unwrap();

    assert_eq!(h.provider.delete_calls(), 1);
    assert_eq!(processor.status, ManagedResourceStatus::Failed);
    assert_eq!(processor.error, Some(pointer.clone()));
    assert!(h.is_complete(&processor));

    let connector = h.find(ResourceKind::Connector, "c1").await;
    assert_eq!(connector.operation_type(), Some(OperationType::Delete));
    assert_eq!(connector.status, ManagedResourceStatus::Failed);
    assert_eq!(connector.error, Some(pointer));
    assert_eq!(
        status_message(&connector.conditions).as_deref(),
        Some("[44] Connector is locked")
    );
}

#[tokio::test]
async fn test_delete_cascades_to_connector() {
    let h = Harness::new();
    h.create(ResourceKind::Processor, "p1", Some("b1")).await;
    h.create(ResourceKind::Connector, "c1", Some("p1")).await;
    h.tick(ResourceKind::Processor, "p1").await.unwrap();
    h.provider.set_state("c1", ExternalConnectorState::Ready).await;
    h.tick(ResourceKind::Processor, "p1").await.unwrap();
    h.shard_reports(ResourceKind::Processor, "p1", vec![h.shard(types::READY)])
        .await;

    h.request(ResourceKind::Processor, "p1", OperationType::Delete).await;
    assert_eq!(
        h.find(ResourceKind::Processor, "p1").await.status,
        ManagedResourceStatus::Deprovision
    );

    let processor = h.tick(ResourceKind::Processor, "p1").await.unwrap();
    assert_eq!(processor.status, ManagedResourceStatus::Deprovision);
    assert_eq!(processor.dependency_status, Some(ManagedResourceStatus::Deleting));
    assert!(!h.is_complete(&processor));

    let connector = h.find(ResourceKind::Connector, "c1").await;
    assert_eq!(connector.operation_type(), Some(OperationType::Delete));
    assert_eq!(connector.status, ManagedResourceStatus::Deleting);
    assert_eq!(h.provider.delete_calls(), 1);

    // Still deleting externally: no second delete request.
    h.tick(ResourceKind::Processor, "p1").await.unwrap();
    assert_eq!(h.provider.delete_calls(), 1);

    h.provider.complete_deletions().await;
    let processor = h.tick(ResourceKind::Processor, "p1").await.unwrap();
    assert_eq!(processor.status, ManagedResourceStatus::Deleting);
    assert_eq!(processor.dependency_status, Some(ManagedResourceStatus::Deleted));
    assert!(h.is_complete(&processor));
    assert_eq!(
        h.find(ResourceKind::Connector, "c1").await.status,
        ManagedResourceStatus::Deleted
    );

    let processor = h
        .shard_reports(ResourceKind::Processor, "p1", vec![h.shard(types::DELETED)])
        .await;
    assert_eq!(processor.status, ManagedResourceStatus::Deleted);
}

#[tokio::test]
async fn test_work_for_missing_resource_is_target_not_found() {
    let h = Harness::new();

    let err = h.tick(ResourceKind::Processor, "missing").await.unwrap_err();

    assert!(matches!(err, WorkerError::TargetNotFound { .. }));
    assert!(!err.is_retryable());
}
