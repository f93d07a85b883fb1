//! # Initialization
//!
//! Operator start-up: rustls provider, tracing, metrics, the health server,
//! the Kubernetes client and the reconcile context.

use crate::config::{ControllerConfig, HealthServerConfig};
use crate::controller::reconciler::{KubeClusterState, PrometheusOperationMetrics, Reconciler};
use crate::controller::server::{start_server, ServerState};
use crate::crd::ManagedBridge;
use crate::observability;
use anyhow::{Context, Result};
use kube::api::{Api, ListParams};
use kube::Client;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};

/// Everything the watch loop needs
#[allow(missing_debug_implementations, reason = "Holds trait objects without Debug")]
pub struct InitializationResult {
    pub client: Client,
    /// ManagedBridge API, scoped to the watch namespace when one is set
    pub bridges: Api<ManagedBridge>,
    pub reconciler: Arc<Reconciler>,
    pub server_state: Arc<ServerState>,
    pub config: ControllerConfig,
}

/// Installs the tracing subscriber. Safe to call more than once.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "lifecycle_controller=info,shard_operator=info".into()),
        )
        .try_init();
}

pub async fn initialize(config: ControllerConfig, health_config: HealthServerConfig) -> Result<InitializationResult> {
    // Must run before any rustls client is built.
    if rustls::crypto::ring::default_provider()
        .install_default()
        .is_err()
    {
        return Err(anyhow::anyhow!("Failed to install rustls crypto provider"));
    }

    init_tracing();
    info!("Starting ManagedBridge shard operator v{}", env!("CARGO_PKG_VERSION"));

    observability::metrics::register_metrics()?;

    let server_state = Arc::new(ServerState::new());
    let server_state_clone = server_state.clone();
    let listen_addr = health_config.listen_addr;
    let server_handle = tokio::spawn(async move {
        if let Err(e) = start_server(listen_addr, server_state_clone).await {
            error!("HTTP server error: {}", e);
        }
    });
    wait_for_server_ready(&server_state, &server_handle, &health_config).await?;

    let client = Client::try_default()
        .await
        .context("Failed to create Kubernetes client")?;

    let bridges: Api<ManagedBridge> = match &config.watch_namespace {
        Some(ns) => Api::namespaced(client.clone(), ns),
        None => Api::all(client.clone()),
    };

    let reconciler = Arc::new(Reconciler::new(
        Arc::new(KubeClusterState::new(client.clone(), config.field_manager.clone())),
        Arc::new(PrometheusOperationMetrics),
        config.clone(),
    ));

    check_crd_queryable(&bridges, &config.label_selector).await;
    info!("Operator initialized, starting watch loop...");

    Ok(InitializationResult {
        client,
        bridges,
        reconciler,
        server_state,
        config,
    })
}

/// Wait for the HTTP server to become ready
async fn wait_for_server_ready(
    server_state: &Arc<ServerState>,
    server_handle: &tokio::task::JoinHandle<()>,
    health_config: &HealthServerConfig,
) -> Result<()> {
    let start_time = Instant::now();

    loop {
        if server_handle.is_finished() {
            return Err(anyhow::anyhow!("HTTP server failed to start"));
        }
        if server_state.is_ready() {
            info!("HTTP server is ready and accepting connections");
            return Ok(());
        }
        if start_time.elapsed() > health_config.ready_timeout {
            return Err(anyhow::anyhow!(
                "HTTP server failed to become ready within {:?}",
                health_config.ready_timeout
            ));
        }
        tokio::time::sleep(health_config.ready_check_interval).await;
    }
}

/// Logs how many bridges exist, or why they cannot be listed.
async fn check_crd_queryable(bridges: &Api<ManagedBridge>, label_selector: &str) {
    match bridges.list(&ListParams::default().labels(label_selector)).await {
        Ok(list) => info!(
            "CRD is queryable, found {} existing ManagedBridge resources",
            list.items.len()
        ),
        Err(e) => {
            error!("CRD is not queryable; {:?}. Is the CRD installed?", e);
            error!("Installation: cargo run --bin crdgen | kubectl apply -f -");
            warn!("Continuing despite CRD queryability check failure - controller will retry");
        }
    }
}
