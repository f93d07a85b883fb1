//! # Component Phase
//!
//! Classifies the conditions reported by one component into a coarse phase.
//! Both the number of entries and the presence of UNKNOWN matter, so the
//! input is the full ordered list for that component.

use crate::model::{ComponentType, Condition, ConditionStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComponentPhase {
    NotStarted,
    InProgress,
    Done,
    Failed,
}

/// Classifies `conditions` (already filtered to one component).
///
/// Precedence: any FAILED, then a single UNKNOWN entry (not started), then
/// any UNKNOWN among two or more entries (in progress), otherwise done.
///
/// Returns `None` for an empty list.
pub fn classify<'a, I>(conditions: I) -> Option<ComponentPhase>
where
    I: IntoIterator<Item = &'a Condition>,
{
    let mut count = 0usize;
    let mut unknown = 0usize;
    let mut failed = false;

    for condition in conditions {
        count += 1;
        match condition.status {
            ConditionStatus::Failed => failed = true,
            ConditionStatus::Unknown => unknown += 1,
            ConditionStatus::True | ConditionStatus::False => {}
        }
    }

    if count == 0 {
        return None;
    }

    let phase = if failed {
        ComponentPhase::Failed
    } else if count == 1 && unknown == 1 {
        ComponentPhase::NotStarted
    } else if unknown > 0 {
        ComponentPhase::InProgress
    } else {
        ComponentPhase::Done
    };
    Some(phase)
}

/// Classifies the conditions of `component` within a mixed list.
pub fn classify_component(conditions: &[Condition], component: ComponentType) -> Option<ComponentPhase> {
    classify(conditions.iter().filter(|c| c.component == component))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn manager(status: ConditionStatus) -> Condition {
        Condition::new(ComponentType::Manager, "Test", status, Utc::now())
    }

    #[test]
    fn test_empty_is_none() {
        let empty: Vec<Condition> = Vec::new();
        assert_eq!(classify(&empty), None);
    }

    #[test]
    fn test_single_unknown_is_not_started() {
        assert_eq!(classify(&[manager(ConditionStatus::Unknown)]), Some(ComponentPhase::NotStarted));
    }

    #[test]
    fn test_two_unknown_is_in_progress() {
        let conditions = [manager(ConditionStatus::Unknown), manager(ConditionStatus::Unknown)];
        assert_eq!(classify(&conditions), Some(ComponentPhase::InProgress));
    }

    #[test]
    fn test_unknown_with_true_is_in_progress() {
        let conditions = [manager(ConditionStatus::True), manager(ConditionStatus::Unknown)];
        assert_eq!(classify(&conditions), Some(ComponentPhase::InProgress));
    }

    #[test]
    fn test_false_counts_as_done() {
        let conditions = [manager(ConditionStatus::False)];
        assert_eq!(classify(&conditions), Some(ComponentPhase::Done));
    }

    #[test]
    fn test_failed_wins_over_unknown() {
        let conditions = [manager(ConditionStatus::Unknown), manager(ConditionStatus::Failed)];
        assert_eq!(classify(&conditions), Some(ComponentPhase::Failed));
    }

    #[test]
    fn test_classify_component_filters() {
        let conditions = vec![
            manager(ConditionStatus::True),
            Condition::new(ComponentType::Shard, "Ready", ConditionStatus::Unknown, Utc::now()),
        ];
        assert_eq!(
            classify_component(&conditions, ComponentType::Manager),
            Some(ComponentPhase::Done)
        );
        assert_eq!(
            classify_component(&conditions, ComponentType::Shard),
            Some(ComponentPhase::NotStarted)
        );
    }
}
