//! # Connector Providers
//!
//! External service that runs managed connectors. The connector worker
//! creates, observes and deletes connectors through [`ConnectorProvider`].
//!
//! - `memory` - process-local provider used by tests and local runs

pub mod memory;

pub use memory::InMemoryConnectorProvider;

use crate::model::{ErrorPointer, ManagedResource};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    #[error("Connector provider unavailable: {0}")]
    Unavailable(String),

    /// The provider refused the request for good. The pointer identifies the
    /// refusal in the provider's error catalogue.
    #[error("Connector provider rejected request [{}]: {message}", error.error_id)]
    Rejected { error: ErrorPointer, message: String },
}

impl ProviderError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}


/// Observed state of an external connector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "state")]
pub enum ExternalConnectorState {
    Provisioning,
    Ready,
    Failed {
        error: ErrorPointer,
        message: String,
    },
    Deleting,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalConnector {
    /// Id assigned by the provider
    pub external_id: String,
    /// Id of the managed connector resource it backs
    pub connector_id: String,
    pub state: ExternalConnectorState,
}

#[async_trait]
pub trait ConnectorProvider: Send + Sync + std::fmt::Debug {
    /// Looks up the external connector backing `connector_id`.
    async fn fetch_connector(&self, connector_id: &str) -> Result<Option<ExternalConnector>, ProviderError>;

    /// Requests a new external connector for `connector`.
    async fn create_connector(&self, connector: &ManagedResource) -> Result<ExternalConnector, ProviderError>;

    /// Requests deletion of the external connector backing `connector_id`.
    async fn delete_connector(&self, connector_id: &str) -> Result<(), ProviderError>;
}
