//! # Work Scheduler
//!
//! Delivers [`Work`] to the worker registered for its kind on a fixed
//! interval until the worker reports completion.
//!
//! - At most one tick runs per chain at a time. A connector shares its
//!   owning processor's chain, since the processor tick drives it too.
//! - Complete or FAILED work is dropped, as is work that failed with a
//!   non-retryable error.
//! - Anything else is due again one interval later with `attempts + 1`.

use super::{WorkerError, WorkerRegistry};
use crate::clock::Clock;
use crate::config::ControllerConfig;
use crate::constants::DEFAULT_WORKER_SCHEDULE_INTERVAL_SECS;
use crate::model::{ManagedResource, ManagedResourceStatus, ResourceKind, Work};
use crate::observability::metrics;
use chrono::{DateTime, TimeDelta, Utc};
use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

type WorkKey = (ResourceKind, String);

#[derive(Debug, Clone)]
struct Scheduled {
    work: Work,
    due_at: DateTime<Utc>,
}

/// Outcome counts of one [`WorkScheduler::tick`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    pub dispatched: usize,
    pub completed: usize,
    pub failed: usize,
    pub rescheduled: usize,
    /// Work dropped because of a non-retryable error
    pub errored: usize,
}

enum Outcome {
    Complete,
    Failed,
    Reschedule,
    Abandon,
}

#[derive(Debug)]
pub struct WorkScheduler {
    registry: Arc<WorkerRegistry>,
    clock: Arc<dyn Clock>,
    interval: Duration,
    pending: Mutex<HashMap<WorkKey, Scheduled>>,
    in_flight: Mutex<HashSet<WorkKey>>,
}

impl WorkScheduler {
    pub fn new(registry: Arc<WorkerRegistry>, clock: Arc<dyn Clock>, interval: Duration) -> Self {
        Self {
            registry,
            clock,
            interval,
            pending: Mutex::new(HashMap::new()),
            in_flight: Mutex::new(HashSet::new()),
        }
    }

    /// Scheduler ticking every `worker_schedule_interval_secs`.
    pub fn from_config(registry: Arc<WorkerRegistry>, clock: Arc<dyn Clock>, config: &ControllerConfig) -> Self {
        Self::new(registry, clock, config.worker_schedule_interval())
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    fn retry_delay(&self) -> TimeDelta {
        TimeDelta::from_std(self.interval).unwrap_or_else(|_| {
            TimeDelta::seconds(i64::try_from(DEFAULT_WORKER_SCHEDULE_INTERVAL_SECS).unwrap_or(i64::MAX))
        })
    }

    /// Queues `work`, due immediately. Replaces any entry for the same resource.
    pub async fn schedule(&self, work: Work) {
        let key = (work.kind, work.managed_resource_id.clone());
        let due_at = self.clock.now();
        let mut pending = self.pending.lock().await;
        pending.insert(key, Scheduled { work, due_at });
        metrics::set_work_pending(pending.len());
    }

    pub async fn pending_count(&self) -> usize {
        self.pending.lock().await.len()
    }

    /// The scheduled work for a resource, if any.
    pub async fn pending_work(&self, kind: ResourceKind, id: &str) -> Option<(Work, DateTime<Utc>)> {
        self.pending
            .lock()
            .await
            .get(&(kind, id.to_string()))
            .map(|s| (s.work.clone(), s.due_at))
    }

    /// Chain guard key for `work`; falls back to the work's own resource.
    async fn chain_root(&self, work: &Work) -> WorkKey {
        let own = (work.kind, work.managed_resource_id.clone());
        let Some(worker) = self.registry.get(work.kind) else {
            return own;
        };
        match worker.chain_root(work).await {
            Ok(root) => root,
            Err(e) => {
                debug!(kind = %work.kind, id = %work.managed_resource_id, "Chain root lookup failed: {}", e);
                own
            }
        }
    }

    /// Takes the due work whose chain is not already in flight, paired with
    /// its chain root.
    async fn claim_due(&self, now: DateTime<Utc>) -> Vec<(Work, WorkKey)> {
        let due: Vec<Work> = self
            .pending
            .lock()
            .await
            .values()
            .filter(|scheduled| scheduled.due_at <= now)
            .map(|scheduled| scheduled.work.clone())
            .collect();

        let mut candidates = Vec::with_capacity(due.len());
        for work in due {
            let root = self.chain_root(&work).await;
            candidates.push((work, root));
        }

        let mut pending = self.pending.lock().await;
        let mut in_flight = self.in_flight.lock().await;
        candidates
            .into_iter()
            .filter_map(|(work, root)| {
                let key = (work.kind, work.managed_resource_id.clone());
                if in_flight.contains(&root) {
                    return None;
                }
                // Replaced by schedule() while roots were resolved.
                if pending.get(&key).map(|s| &s.work) != Some(&work) {
                    return None;
                }
                pending.remove(&key);
                in_flight.insert(root.clone());
                Some((work, root))
            })
            .collect()
    }

    async fn dispatch(&self, work: &Work) -> Result<ManagedResource, WorkerError> {
        let worker = self
            .registry
            .get(work.kind)
            .ok_or(WorkerError::NoWorker(work.kind))?;
        metrics::increment_worker_ticks(work.kind.as_str());
        worker.handle_work(work).await
    }

    fn classify(&self, work: &Work, result: &Result<ManagedResource, WorkerError>) -> Outcome {
        match result {
            Ok(resource) if resource.status == ManagedResourceStatus::Failed => Outcome::Failed,
            Ok(resource) => {
                let complete = self
                    .registry
                    .get(work.kind)
                    .is_some_and(|worker| worker.is_complete(resource));
                if complete {
                    Outcome::Complete
                } else {
                    Outcome::Reschedule
                }
            }
            Err(e) if e.is_retryable() => {
                warn!(
                    kind = %work.kind,
                    id = %work.managed_resource_id,
                    attempts = work.attempts,
                    "Worker tick failed, retrying: {}", e
                );
                Outcome::Reschedule
            }
            Err(e) => {
                error!(
                    kind = %work.kind,
                    id = %work.managed_resource_id,
                    "❌ Dropping work after non-retryable error: {}", e
                );
                Outcome::Abandon
            }
        }
    }

    /// Runs every due work item concurrently and files the outcomes.
    pub async fn tick(&self) -> TickReport {
        let now = self.clock.now();
        let claimed = self.claim_due(now).await;
        let mut report = TickReport {
            dispatched: claimed.len(),
            ..TickReport::default()
        };
        if claimed.is_empty() {
            return report;
        }

        let results = futures::future::join_all(claimed.iter().map(|(work, _)| self.dispatch(work))).await;

        let due_at = self.clock.now() + self.retry_delay();
        let mut pending = self.pending.lock().await;
        let mut in_flight = self.in_flight.lock().await;

        for ((work, root), result) in claimed.into_iter().zip(results) {
            in_flight.remove(&root);
            let key = (work.kind, work.managed_resource_id.clone());
            let kind = work.kind.as_str();

            match self.classify(&work, &result) {
                Outcome::Complete => {
                    report.completed += 1;
                    metrics::increment_work_completed(kind, "complete");
                }
                Outcome::Failed => {
                    report.failed += 1;
                    metrics::increment_work_completed(kind, "failed");
                }
                Outcome::Abandon => {
                    report.errored += 1;
                    metrics::increment_work_completed(kind, "error");
                }
                Outcome::Reschedule => {
                    report.rescheduled += 1;
                    metrics::increment_work_rescheduled(kind);
                    // A schedule() during the tick wins over the retry.
                    pending.entry(key).or_insert_with(|| {
                        let mut work = work;
                        work.attempts += 1;
                        Scheduled { work, due_at }
                    });
                }
            }
        }
        metrics::set_work_pending(pending.len());
        report
    }

    /// Ticks every interval until `shutdown` resolves.
    pub async fn run<F>(&self, shutdown: F)
    where
        F: Future<Output = ()> + Send,
    {
        info!("⏱️ Work scheduler started (interval: {:?})", self.interval);
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                () = &mut shutdown => {
                    info!("Work scheduler stopping");
                    break;
                }
                _ = ticker.tick() => {
                    let report = self.tick().await;
                    if report.dispatched > 0 {
                        debug!(?report, "Scheduler tick finished");
                    }
                }
            }
        }
    }
}
