//! # Conditions
//!
//! Timestamped, component-scoped progress reports attached to a managed resource.
//!
//! A condition is immutable once created. A status change replaces the record
//! (new id, new transition time) in place, so the list keeps its insertion order.
//! Several conditions may exist for the same component; they are not keyed by
//! `(component, type)` for aggregation purposes.

use super::status::{ComponentType, ConditionStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Condition type names written by the manager and expected from the shard.
pub mod types {
    /// MANAGER: a worker picked up a create/update operation
    pub const PROVISIONING_STARTED: &str = "ProvisioningStarted";
    /// MANAGER: a worker picked up a delete operation
    pub const DEPROVISIONING_STARTED: &str = "DeprovisioningStarted";
    /// MANAGER: all dependencies provisioned
    pub const DEPENDENCIES_READY: &str = "DependenciesReady";
    /// MANAGER: all dependencies removed
    pub const DEPENDENCIES_DELETED: &str = "DependenciesDeleted";
    /// SHARD: infrastructure converged
    pub const READY: &str = "Ready";
    /// SHARD: infrastructure removed
    pub const DELETED: &str = "Deleted";
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    pub id: String,
    pub r#type: String,
    pub status: ConditionStatus,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error_code: Option<String>,
    pub component: ComponentType,
    pub last_transition_time: DateTime<Utc>,
}

impl Condition {
    pub fn new(
        component: ComponentType,
        condition_type: &str,
        status: ConditionStatus,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            r#type: condition_type.to_string(),
            status,
            reason: None,
            message: None,
            error_code: None,
            component,
            last_transition_time: now,
        }
    }

    #[must_use]
    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    #[must_use]
    pub fn with_error(mut self, error_code: impl Into<String>, message: impl Into<String>) -> Self {
        self.error_code = Some(error_code.into());
        self.message = Some(message.into());
        self
    }
}

/// Records `condition` in `conditions`.
///
/// If a condition with the same component and type exists and already carries
/// the same status, nothing changes. If it exists with another status it is
/// replaced at the same position. Otherwise the condition is appended.
///
/// Returns `true` when the list changed.
pub fn record(conditions: &mut Vec<Condition>, condition: Condition) -> bool {
    let existing = conditions
        .iter()
        .position(|c| c.component == condition.component && c.r#type == condition.r#type);

    match existing {
        Some(index) if conditions[index].status == condition.status => false,
        Some(index) => {
            conditions[index] = condition;
            true
        }
        None => {
            conditions.push(condition);
            true
        }
    }
}

/// Finds the first condition of the given component and type.
pub fn find<'a>(
    conditions: &'a [Condition],
    component: ComponentType,
    condition_type: &str,
) -> Option<&'a Condition> {
    conditions
        .iter()
        .find(|c| c.component == component && c.r#type == condition_type)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> DateTime<Utc> {
        Utc::now()
    }

    #[test]
    fn test_record_appends_new_condition() {
        let mut conditions = Vec::new();
        let changed = record(
            &mut conditions,
            Condition::new(ComponentType::Manager, types::DEPENDENCIES_READY, ConditionStatus::Unknown, now()),
        );
        assert!(changed);
        assert_eq!(conditions.len(), 1);
    }

    #[test]
    fn test_record_same_status_is_noop() {
        let original = Condition::new(ComponentType::Shard, types::READY, ConditionStatus::True, now());
        let mut conditions = vec![original.clone()];
        let changed = record(
            &mut conditions,
            Condition::new(ComponentType::Shard, types::READY, ConditionStatus::True, now()),
        );
        assert!(!changed);
        assert_eq!(conditions[0].id, original.id);
    }

    #[test]
    fn test_record_replaces_in_place() {
        let mut conditions = vec![
            Condition::new(ComponentType::Manager, types::DEPENDENCIES_READY, ConditionStatus::Unknown, now()),
            Condition::new(ComponentType::Shard, types::READY, ConditionStatus::Unknown, now()),
        ];
        let first_id = conditions[0].id.clone();
        let changed = record(
            &mut conditions,
            Condition::new(ComponentType::Manager, types::DEPENDENCIES_READY, ConditionStatus::True, now()),
        );
        assert!(changed);
        assert_eq!(conditions.len(), 2);
        assert_eq!(conditions[0].status, ConditionStatus::True);
        assert_ne!(conditions[0].id, first_id);
        assert_eq!(conditions[1].component, ComponentType::Shard);
    }

    #[test]
    fn test_same_type_different_component_are_distinct() {
        let mut conditions = vec![Condition::new(
            ComponentType::Manager,
            types::READY,
            ConditionStatus::True,
            now(),
        )];
        record(
            &mut conditions,
            Condition::new(ComponentType::Shard, types::READY, ConditionStatus::Unknown, now()),
        );
        assert_eq!(conditions.len(), 2);
        assert!(find(&conditions, ComponentType::Shard, types::READY).is_some());
    }
}
