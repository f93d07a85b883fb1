//! # Status Aggregation
//!
//! Folds the MANAGER and SHARD condition phases plus the pending operation
//! type into one lifecycle status, and renders condition errors for display.

use super::phase::{classify_component, ComponentPhase};
use crate::model::{ComponentType, Condition, ManagedResourceStatus, Operation, OperationType};
use chrono::{DateTime, Utc};
use thiserror::Error;

/// Aggregation errors.
///
/// These indicate corrupt data upstream and are never retried.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StatusError {
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),
}

/// Derives the lifecycle status from the operation type and the full,
/// ordered condition list.
///
/// | Operation     | any FAILED | mgr not started | mgr in progress | mgr done, shard not | both done |
/// |---------------|------------|-----------------|-----------------|---------------------|-----------|
/// | CREATE/UPDATE | FAILED     | ACCEPTED        | PREPARING       | PROVISIONING        | READY     |
/// | DELETE        | FAILED     | DEPROVISION     | DEPROVISION     | DELETING            | DELETED   |
///
/// # Errors
///
/// [`StatusError::InvariantViolation`] when the list is empty or either
/// component has no condition at all.
pub fn derive_status(
    operation_type: OperationType,
    conditions: &[Condition],
) -> Result<ManagedResourceStatus, StatusError> {
    if conditions.is_empty() {
        return Err(StatusError::InvariantViolation(
            "managed resource has no conditions".to_string(),
        ));
    }

    let manager = required_phase(conditions, ComponentType::Manager)?;
    let shard = required_phase(conditions, ComponentType::Shard)?;

    if manager == ComponentPhase::Failed || shard == ComponentPhase::Failed {
        return Ok(ManagedResourceStatus::Failed);
    }

    let status = match operation_type {
        OperationType::Create | OperationType::Update => match (manager, shard) {
            (ComponentPhase::NotStarted, _) => ManagedResourceStatus::Accepted,
            (ComponentPhase::InProgress, _) => ManagedResourceStatus::Preparing,
            (ComponentPhase::Done, ComponentPhase::Done) => ManagedResourceStatus::Ready,
            (_, _) => ManagedResourceStatus::Provisioning,
        },
        // A second UNKNOWN manager entry during deletion still reads as DEPROVISION.
        OperationType::Delete => match (manager, shard) {
            (ComponentPhase::NotStarted | ComponentPhase::InProgress, _) => {
                ManagedResourceStatus::Deprovision
            }
            (ComponentPhase::Done, ComponentPhase::Done) => ManagedResourceStatus::Deleted,
            (_, _) => ManagedResourceStatus::Deleting,
        },
    };
    Ok(status)
}

fn required_phase(
    conditions: &[Condition],
    component: ComponentType,
) -> Result<ComponentPhase, StatusError> {
    classify_component(conditions, component).ok_or_else(|| {
        StatusError::InvariantViolation(format!("no {component} condition present"))
    })
}

/// Renders every condition that carries both an error code and a message as
/// `"[<code>] <message>"`, joined in list order.
///
/// Returns `None` when nothing qualifies.
pub fn status_message(conditions: &[Condition]) -> Option<String> {
    let messages: Vec<String> = conditions
        .iter()
        .filter_map(|c| match (&c.error_code, &c.message) {
            (Some(code), Some(message)) => Some(format!("[{code}] {message}")),
            _ => None,
        })
        .collect();

    if messages.is_empty() {
        None
    } else {
        Some(messages.join(", "))
    }
}

/// `None` when there is no operation or it is a CREATE; otherwise the time
/// the operation was requested.
pub fn modified_at(operation: Option<&Operation>) -> Option<DateTime<Utc>> {
    operation
        .filter(|op| op.r#type != OperationType::Create)
        .map(|op| op.requested_at)
}
