//! # Worker Metrics
//!
//! Metrics for the dependency worker chain and the work scheduler.

use crate::observability::metrics::registry::REGISTRY;
use anyhow::Result;
use prometheus::{IntCounterVec, IntGauge};
use std::sync::LazyLock;

static WORKER_TICKS_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new(
            "lifecycle_worker_ticks_total",
            "Total number of worker ticks by resource kind",
        ),
        &["kind"],
    )
    .expect("Failed to create WORKER_TICKS_TOTAL metric - this should never happen")
});

static WORK_COMPLETED_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new(
            "lifecycle_work_completed_total",
            "Total number of work items dropped by the scheduler, by outcome",
        ),
        &["kind", "outcome"],
    )
    .expect("Failed to create WORK_COMPLETED_TOTAL metric - this should never happen")
});

static WORK_RESCHEDULED_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new(
            "lifecycle_work_rescheduled_total",
            "Total number of work items put back on the schedule",
        ),
        &["kind"],
    )
    .expect("Failed to create WORK_RESCHEDULED_TOTAL metric - this should never happen")
});

static WORK_PENDING: LazyLock<IntGauge> = LazyLock::new(|| {
    IntGauge::new(
        "lifecycle_work_pending",
        "Current number of work items waiting on the schedule",
    )
    .expect("Failed to create WORK_PENDING metric - this should never happen")
});

/// Register worker metrics with the registry
pub(crate) fn register_worker_metrics() -> Result<()> {
    REGISTRY.register(Box::new(WORKER_TICKS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(WORK_COMPLETED_TOTAL.clone()))?;
    REGISTRY.register(Box::new(WORK_RESCHEDULED_TOTAL.clone()))?;
    REGISTRY.register(Box::new(WORK_PENDING.clone()))?;
    Ok(())
}

pub fn increment_worker_ticks(kind: &str) {
    WORKER_TICKS_TOTAL.with_label_values(&[kind]).inc();
}

/// `outcome` is one of `complete`, `failed` or `error`.
pub fn increment_work_completed(kind: &str, outcome: &str) {
    WORK_COMPLETED_TOTAL.with_label_values(&[kind, outcome]).inc();
}

pub fn increment_work_rescheduled(kind: &str) {
    WORK_RESCHEDULED_TOTAL.with_label_values(&[kind]).inc();
}

pub fn set_work_pending(count: usize) {
    WORK_PENDING.set(i64::try_from(count).unwrap_or(i64::MAX));
}
