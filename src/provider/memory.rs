//! # In-Memory Connector Provider
//!
//! New connectors start in `Provisioning`; callers move them along with
//! [`InMemoryConnectorProvider::set_state`]. Deleted connectors pass
//! through `Deleting` and disappear on [`InMemoryConnectorProvider::complete_deletions`].
//! Deleting an unknown connector succeeds.

use super::{ConnectorProvider, ExternalConnector, ExternalConnectorState, ProviderError};
use crate::model::{ErrorPointer, ManagedResource};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::RwLock;

#[derive(Debug, Default)]
pub struct InMemoryConnectorProvider {
    connectors: RwLock<HashMap<String, ExternalConnector>>,
    rejection: RwLock<Option<(ErrorPointer, String)>>,
    create_calls: AtomicUsize,
    delete_calls: AtomicUsize,
}

impl InMemoryConnectorProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forces the state of the connector backing `connector_id`.
    pub async fn set_state(&self, connector_id: &str, state: ExternalConnectorState) {
        if let Some(connector) = self.connectors.write().await.get_mut(connector_id) {
            connector.state = state;
        }
    }

    /// Drops every connector in `Deleting`.
    pub async fn complete_deletions(&self) {
        self.connectors
            .write()
            .await
            .retain(|_, c| c.state != ExternalConnectorState::Deleting);
    }

    /// Rejects every create and delete request until [`Self::accept_requests`].
    pub async fn reject_requests(&self, error: ErrorPointer, message: impl Into<String>) {
        *self.rejection.write().await = Some((error, message.into()));
    }

    pub async fn accept_requests(&self) {
        *self.rejection.write().await = None;
    }

    async fn check_rejection(&self) -> Result<(), ProviderError> {
        match self.rejection.read().await.as_ref() {
            Some((error, message)) => Err(ProviderError::Rejected {
                error: error.clone(),
                message: message.clone(),
            }),
            None => Ok(()),
        }
    }

    pub fn create_calls(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }

    pub fn delete_calls(&self) -> usize {
        self.delete_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ConnectorProvider for InMemoryConnectorProvider {
    async fn fetch_connector(&self, connector_id: &str) -> Result<Option<ExternalConnector>, ProviderError> {
        Ok(self.connectors.read().await.get(connector_id).cloned())
    }

    async fn create_connector(&self, connector: &ManagedResource) -> Result<ExternalConnector, ProviderError> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        self.check_rejection().await?;
        let external = ExternalConnector {
            external_id: uuid::Uuid::new_v4().to_string(),
            connector_id: connector.id.clone(),
            state: ExternalConnectorState::Provisioning,
        };
        self.connectors
            .write()
            .await
            .insert(connector.id.clone(), external.clone());
        Ok(external)
    }

    async fn delete_connector(&self, connector_id: &str) -> Result<(), ProviderError> {
        self.delete_calls.fetch_add(1, Ordering::SeqCst);
        self.check_rejection().await?;
        if let Some(connector) = self.connectors.write().await.get_mut(connector_id) {
            connector.state = ExternalConnectorState::Deleting;
        }
        Ok(())
    }
}
