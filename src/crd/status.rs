//! # ManagedBridge Status
//!
//! Kubernetes-style conditions written by the operator, and their hand-off
//! to the manager as SHARD conditions.

use crate::model::{self, ComponentType, ConditionStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const READY: &str = "Ready";
pub const SECRET_AVAILABLE: &str = "SecretAvailable";
pub const CONFIG_MAP_AVAILABLE: &str = "ConfigMapAvailable";
pub const KNATIVE_BROKER_AVAILABLE: &str = "KnativeBrokerAvailable";

const TRUE: &str = "True";
const FALSE: &str = "False";
const UNKNOWN: &str = "Unknown";

/// Condition represents a condition of a resource
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    /// Type of condition
    pub r#type: String,
    /// Status of the condition (True, False, Unknown)
    pub status: String,
    #[serde(default)]
    pub last_transition_time: Option<String>,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl Condition {
    fn unknown(condition_type: &str) -> Self {
        Self {
            r#type: condition_type.to_string(),
            status: UNKNOWN.to_string(),
            last_transition_time: None,
            reason: None,
            message: None,
        }
    }
}

/// Status of the ManagedBridge resource
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ManagedBridgeStatus {
    #[serde(default)]
    pub conditions: Vec<Condition>,
}

impl Default for ManagedBridgeStatus {
    fn default() -> Self {
        Self::new()
    }
}

impl ManagedBridgeStatus {
    /// Every condition the operator maintains, all Unknown.
    pub fn new() -> Self {
        Self {
            conditions: [READY, SECRET_AVAILABLE, CONFIG_MAP_AVAILABLE, KNATIVE_BROKER_AVAILABLE]
                .into_iter()
                .map(Condition::unknown)
                .collect(),
        }
    }

    fn condition(&self, condition_type: &str) -> Option<&Condition> {
        self.conditions.iter().find(|c| c.r#type == condition_type)
    }

    fn has_status(&self, condition_type: &str, status: &str) -> bool {
        self.condition(condition_type).is_some_and(|c| c.status == status)
    }

    pub fn is_condition_type_true(&self, condition_type: &str) -> bool {
        self.has_status(condition_type, TRUE)
    }

    pub fn is_condition_type_false(&self, condition_type: &str) -> bool {
        self.has_status(condition_type, FALSE)
    }

    pub fn is_ready(&self) -> bool {
        self.is_condition_type_true(READY)
    }

    fn mark(&mut self, condition_type: &str, status: &str, now: DateTime<Utc>) {
        let condition = Condition {
            r#type: condition_type.to_string(),
            status: status.to_string(),
            last_transition_time: Some(now.to_rfc3339()),
            reason: None,
            message: None,
        };
        match self.conditions.iter_mut().find(|c| c.r#type == condition_type) {
            Some(existing) => *existing = condition,
            None => self.conditions.push(condition),
        }
    }

    pub fn mark_condition_true(&mut self, condition_type: &str, now: DateTime<Utc>) {
        self.mark(condition_type, TRUE, now);
    }

    pub fn mark_condition_false(&mut self, condition_type: &str, now: DateTime<Utc>) {
        self.mark(condition_type, FALSE, now);
    }

    /// Converts the operator conditions into SHARD conditions for the manager.
    ///
    /// The operator reports "not yet" rather than "broken", so `False` maps to
    /// UNKNOWN. It never produces FAILED.
    pub fn to_shard_conditions(&self, now: DateTime<Utc>) -> Vec<model::Condition> {
        self.conditions
            .iter()
            .map(|c| {
                let status = if c.status == TRUE {
                    ConditionStatus::True
                } else {
                    ConditionStatus::Unknown
                };
                let transition = c
                    .last_transition_time
                    .as_deref()
                    .and_then(|t| DateTime::parse_from_rfc3339(t).ok())
                    .map_or(now, |t| t.with_timezone(&Utc));
                let mut condition = model::Condition::new(ComponentType::Shard, &c.r#type, status, transition);
                condition.reason.clone_from(&c.reason);
                condition.message.clone_from(&c.message);
                condition
            })
            .collect()
    }
}
