//! # Managed Resources
//!
//! The lifecycle-tracked entities exposed to end users (bridges, processors,
//! connectors) and the operation that currently drives them.

use super::condition::{self, types, Condition};
use super::status::{ComponentType, ConditionStatus, ManagedResourceStatus, OperationType};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Kind of managed resource. Fixes the shape of the dependency tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResourceKind {
    Bridge,
    Processor,
    Connector,
}

impl ResourceKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Bridge => "BRIDGE",
            Self::Processor => "PROCESSOR",
            Self::Connector => "CONNECTOR",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The in-flight user-requested action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Operation {
    pub r#type: OperationType,
    pub requested_at: DateTime<Utc>,
}

impl Operation {
    pub fn new(r#type: OperationType, requested_at: DateTime<Utc>) -> Self {
        Self {
            r#type,
            requested_at,
        }
    }
}

/// Pointer to a detailed error record held by the error-message catalogue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorPointer {
    pub error_id: i32,
    pub error_uuid: String,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LifecycleError {
    /// Only READY and FAILED resources accept new operations
    #[error("{kind} '{id}' is {status} and cannot accept a new {requested} operation")]
    NotActionable {
        kind: ResourceKind,
        id: String,
        status: ManagedResourceStatus,
        requested: OperationType,
    },
}

/// A lifecycle-tracked resource together with its condition list.
///
/// `status` is a cache of what [`crate::status::derive_status`] computes from
/// `operation` and `conditions`; it is refreshed by the dependency workers and
/// never authoritative.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManagedResource {
    pub id: String,
    pub kind: ResourceKind,
    pub name: String,
    /// Parent resource: the bridge of a processor, the processor of a connector
    #[serde(default)]
    pub owner_id: Option<String>,
    #[serde(default)]
    pub operation: Option<Operation>,
    pub status: ManagedResourceStatus,
    #[serde(default)]
    pub dependency_status: Option<ManagedResourceStatus>,
    #[serde(default)]
    pub deletion_requested_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub error: Option<ErrorPointer>,
    #[serde(default)]
    pub conditions: Vec<Condition>,
    /// Compare-and-set token maintained by the store
    #[serde(default)]
    pub version: u64,
}

impl ManagedResource {
    /// A freshly created resource with a CREATE operation in ACCEPTED state.
    pub fn accepted(
        kind: ResourceKind,
        id: impl Into<String>,
        name: impl Into<String>,
        owner_id: Option<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            kind,
            name: name.into(),
            owner_id,
            operation: Some(Operation::new(OperationType::Create, now)),
            status: ManagedResourceStatus::Accepted,
            dependency_status: None,
            deletion_requested_at: None,
            error: None,
            conditions: seed_conditions(OperationType::Create, now),
            version: 0,
        }
    }

    /// Whether the resource may accept a new operation.
    pub fn is_actionable(&self) -> bool {
        self.status.is_actionable()
    }

    pub fn operation_type(&self) -> Option<OperationType> {
        self.operation.map(|op| op.r#type)
    }

    /// Replaces the current operation with a new one.
    ///
    /// Resets the condition list to the seed for the new operation, clears
    /// the error pointer and dependency status. Rejected unless the resource
    /// is actionable.
    pub fn request_operation(
        &mut self,
        operation_type: OperationType,
        now: DateTime<Utc>,
    ) -> Result<(), LifecycleError> {
        if !self.is_actionable() {
            return Err(LifecycleError::NotActionable {
                kind: self.kind,
                id: self.id.clone(),
                status: self.status,
                requested: operation_type,
            });
        }

        self.operation = Some(Operation::new(operation_type, now));
        self.conditions = seed_conditions(operation_type, now);
        self.dependency_status = None;
        self.error = None;
        self.status = match operation_type {
            OperationType::Create | OperationType::Update => ManagedResourceStatus::Accepted,
            OperationType::Delete => {
                self.deletion_requested_at = Some(now);
                ManagedResourceStatus::Deprovision
            }
        };
        Ok(())
    }

    /// See [`crate::status::modified_at`].
    pub fn modified_at(&self) -> Option<DateTime<Utc>> {
        crate::status::modified_at(self.operation.as_ref())
    }

    /// Records a MANAGER condition, returning whether the list changed.
    pub fn record_manager_condition(&mut self, condition: Condition) -> bool {
        debug_assert_eq!(condition.component, ComponentType::Manager);
        condition::record(&mut self.conditions, condition)
    }

    /// Replaces every SHARD condition with `shard_conditions`.
    ///
    /// MANAGER conditions keep their position; the new SHARD conditions are
    /// appended in the order given.
    pub fn replace_shard_conditions(&mut self, shard_conditions: Vec<Condition>) {
        self.conditions
            .retain(|c| c.component != ComponentType::Shard);
        self.conditions.extend(
            shard_conditions
                .into_iter()
                .filter(|c| c.component == ComponentType::Shard),
        );
    }
}

/// Initial condition list for an operation.
///
/// One UNKNOWN entry per component so the aggregator reports ACCEPTED
/// (or DEPROVISION) until an actor picks the work up.
pub fn seed_conditions(operation_type: OperationType, now: DateTime<Utc>) -> Vec<Condition> {
    let (manager_type, shard_type) = match operation_type {
        OperationType::Create | OperationType::Update => (types::DEPENDENCIES_READY, types::READY),
        OperationType::Delete => (types::DEPENDENCIES_DELETED, types::DELETED),
    };
    vec![
        Condition::new(ComponentType::Manager, manager_type, ConditionStatus::Unknown, now),
        Condition::new(ComponentType::Shard, shard_type, ConditionStatus::Unknown, now),
    ]
}
