//! # Lifecycle Controller
//!
//! Lifecycle reconciliation for managed bridges, processors and connectors.
//!
//! Provisioning spans two actors that report progress as typed conditions:
//!
//! - the **manager** drives dependency creation and deletion through the
//!   poll-driven [`worker`] chain, scheduled by [`worker::WorkScheduler`]
//! - the **shard operator** converges cluster objects for a `ManagedBridge`
//!   through the [`controller`] reconcile loop, hosted by [`runtime`]
//!
//! The [`status`] aggregator folds both actors' conditions and the pending
//! operation into the single lifecycle status clients see.

pub mod clock;
pub mod config;
pub mod constants;
pub mod controller;
pub mod crd;
pub mod model;
pub mod observability;
pub mod persistence;
pub mod provider;
pub mod runtime;
pub mod status;
pub mod worker;
