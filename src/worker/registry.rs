//! # Worker Registry
//!
//! Maps each resource kind to its worker. Built once at startup; the
//! delegation tree (processor to connector) is wired here and cannot cycle.

use super::{BridgeWorker, ConnectorWorker, ProcessorWorker, Worker};
use crate::clock::Clock;
use crate::model::ResourceKind;
use crate::persistence::ResourceStore;
use crate::provider::ConnectorProvider;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug, Default, Clone)]
pub struct WorkerRegistry {
    workers: HashMap<ResourceKind, Arc<dyn Worker>>,
}

impl WorkerRegistry {
    /// Registry with the bridge, processor and connector workers.
    pub fn new(
        store: Arc<dyn ResourceStore>,
        connector_provider: Arc<dyn ConnectorProvider>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let connector: Arc<dyn Worker> = Arc::new(ConnectorWorker::new(
            store.clone(),
            clock.clone(),
            connector_provider,
        ));
        let processor: Arc<dyn Worker> = Arc::new(ProcessorWorker::new(
            store.clone(),
            clock.clone(),
            connector.clone(),
        ));
        let bridge: Arc<dyn Worker> = Arc::new(BridgeWorker::new(store, clock));

        Self::empty()
            .with_worker(bridge)
            .with_worker(processor)
            .with_worker(connector)
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// Registers `worker` for its kind, replacing any previous one.
    #[must_use]
    pub fn with_worker(mut self, worker: Arc<dyn Worker>) -> Self {
        self.workers.insert(worker.kind(), worker);
        self
    }

    pub fn get(&self, kind: ResourceKind) -> Option<&Arc<dyn Worker>> {
        self.workers.get(&kind)
    }
}
