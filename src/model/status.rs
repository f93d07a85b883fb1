//! # Lifecycle Enums
//!
//! Closed sets shared by the manager and the operator: lifecycle status,
//! condition status, reporting component and operation type.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Externally visible lifecycle status of a managed resource.
///
/// Also used for `dependency_status`, which tracks sub-resource convergence
/// independently of the resource itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ManagedResourceStatus {
    Accepted,
    Preparing,
    Provisioning,
    Ready,
    Deprovision,
    Deleting,
    Deleted,
    Failed,
}

impl ManagedResourceStatus {
    /// Statuses in which a resource accepts a new operation.
    pub const ACTIONABLE: [Self; 2] = [Self::Ready, Self::Failed];

    pub fn is_actionable(self) -> bool {
        Self::ACTIONABLE.contains(&self)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Accepted => "ACCEPTED",
            Self::Preparing => "PREPARING",
            Self::Provisioning => "PROVISIONING",
            Self::Ready => "READY",
            Self::Deprovision => "DEPROVISION",
            Self::Deleting => "DELETING",
            Self::Deleted => "DELETED",
            Self::Failed => "FAILED",
        }
    }
}

impl fmt::Display for ManagedResourceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status carried by a single [`Condition`](super::Condition).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConditionStatus {
    True,
    False,
    Unknown,
    Failed,
}

/// The actor that produced a condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ComponentType {
    /// Control plane (dependency workers)
    Manager,
    /// Cluster operator
    Shard,
}

impl ComponentType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Manager => "MANAGER",
            Self::Shard => "SHARD",
        }
    }
}

impl fmt::Display for ComponentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Type of the in-flight user-requested action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OperationType {
    Create,
    Update,
    Delete,
}

impl OperationType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Create => "CREATE",
            Self::Update => "UPDATE",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for OperationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
