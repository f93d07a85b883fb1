//! # Work
//!
//! Scheduling unit handed to a dependency worker.

use super::resource::ResourceKind;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifies the managed resource a worker tick concerns.
///
/// Produced at create, update and delete time and re-delivered on the polling
/// interval until the worker reports completion. When a parent worker
/// delegates to a child worker it passes the same `Work`; the child resolves
/// its own target from it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Work {
    pub managed_resource_id: String,
    pub kind: ResourceKind,
    pub submitted_at: DateTime<Utc>,
    #[serde(default)]
    pub attempts: u32,
}

impl Work {
    pub fn new(kind: ResourceKind, managed_resource_id: impl Into<String>, submitted_at: DateTime<Utc>) -> Self {
        Self {
            managed_resource_id: managed_resource_id.into(),
            kind,
            submitted_at,
            attempts: 0,
        }
    }
}
