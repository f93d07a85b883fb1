//! # Status Aggregator
//!
//! Pure functions that turn a resource's condition list and operation into
//! the lifecycle status clients see.
//!
//! ## Sub-modules
//!
//! - `phase` - per-component phase classification
//! - `aggregate` - status table, status message and `modified_at`

pub mod aggregate;
pub mod phase;

pub use aggregate::{derive_status, modified_at, status_message, StatusError};
pub use phase::{classify, classify_component, ComponentPhase};

use crate::model::{ErrorPointer, ManagedResource, ManagedResourceStatus};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Everything the API layer needs to render a resource's status.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusView {
    pub status: ManagedResourceStatus,
    pub status_message: Option<String>,
    pub modified_at: Option<DateTime<Utc>>,
    pub error: Option<ErrorPointer>,
}

/// Derives the lifecycle status of `resource` from its conditions.
///
/// # Errors
///
/// [`StatusError::InvariantViolation`] when the resource has no operation or
/// its conditions do not cover both components.
pub fn lifecycle_status(resource: &ManagedResource) -> Result<ManagedResourceStatus, StatusError> {
    let operation = resource.operation.ok_or_else(|| {
        StatusError::InvariantViolation(format!(
            "{} '{}' has no operation",
            resource.kind, resource.id
        ))
    })?;
    derive_status(operation.r#type, &resource.conditions)
}

/// Re-derives and caches `resource.status`. Returns the derived value.
///
/// # Errors
///
/// See [`lifecycle_status`].
pub fn refresh_status(resource: &mut ManagedResource) -> Result<ManagedResourceStatus, StatusError> {
    let status = lifecycle_status(resource)?;
    resource.status = status;
    Ok(status)
}

/// Builds the public status view of `resource`.
///
/// # Errors
///
/// See [`lifecycle_status`].
pub fn status_view(resource: &ManagedResource) -> Result<StatusView, StatusError> {
    Ok(StatusView {
        status: lifecycle_status(resource)?,
        status_message: status_message(&resource.conditions),
        modified_at: resource.modified_at(),
        error: resource.error.clone(),
    })
}
