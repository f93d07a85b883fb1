//! # Persistence
//!
//! Storage contract consumed by the dependency workers.
//!
//! `persist` is an atomic upsert guarded by the resource `version`: the
//! store rejects a write whose version does not match the stored one, which
//! keeps concurrent ticks for the same resource from interleaving.

pub mod memory;

pub use memory::InMemoryResourceStore;

use crate::model::{ManagedResource, ResourceKind};
use async_trait::async_trait;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PersistenceError {
    #[error("{kind} '{id}' not found")]
    NotFound { kind: ResourceKind, id: String },

    #[error("Version conflict for {kind} '{id}': expected {expected}, found {found}")]
    Conflict {
        kind: ResourceKind,
        id: String,
        expected: u64,
        found: u64,
    },

    #[error("Storage backend error: {0}")]
    Backend(String),
}

impl PersistenceError {
    /// Conflicts and backend errors clear up on a later tick; a missing
    /// record does not.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Conflict { .. } | Self::Backend(_))
    }
}

#[async_trait]
pub trait ResourceStore: Send + Sync + std::fmt::Debug {
    /// Loads a resource by kind and id.
    async fn find(&self, kind: ResourceKind, id: &str) -> Result<Option<ManagedResource>, PersistenceError>;

    /// Upserts `resource` and returns the stored representation with the
    /// store-maintained fields (version) populated.
    async fn persist(&self, resource: ManagedResource) -> Result<ManagedResource, PersistenceError>;

    /// Loads the dependency of `kind` owned by `owner_id`, if any.
    async fn find_dependency_by_owner_id(
        &self,
        kind: ResourceKind,
        owner_id: &str,
    ) -> Result<Option<ManagedResource>, PersistenceError>;
}
