//! # Shard Operator
//!
//! Kubernetes operator that provisions a Kafka-backed Knative broker for
//! every `ManagedBridge` placed on the cluster and reports progress as
//! conditions on the bridge.
//!
//! Settings come from environment variables (see [`lifecycle_controller::config`]);
//! the flags below override them.

use anyhow::Result;
use clap::Parser;
use lifecycle_controller::config::load_config;
use lifecycle_controller::runtime::{initialize, run_watch_loop};
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "shard-operator")]
#[command(about = "ManagedBridge shard operator", long_about = None)]
struct Args {
    /// Namespace to watch (all namespaces when omitted)
    #[arg(short, long, env = "WATCH_NAMESPACE")]
    namespace: Option<String>,

    /// Port for /metrics, /healthz and /readyz
    #[arg(long, env = "METRICS_PORT")]
    metrics_port: Option<u16>,

    /// Requeue delay while a bridge waits on its secret or broker
    #[arg(long, env = "BRIDGE_POLL_INTERVAL_MS")]
    poll_interval_ms: Option<u64>,

    /// Label selector for managed bridges and their secrets
    #[arg(long, env = "LABEL_SELECTOR")]
    label_selector: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let (mut controller_config, mut health_config) = load_config();

    if let Some(namespace) = args.namespace.filter(|ns| !ns.is_empty()) {
        controller_config.watch_namespace = Some(namespace);
    }
    if let Some(port) = args.metrics_port {
        health_config = health_config.with_port(port);
    }
    if let Some(poll_interval_ms) = args.poll_interval_ms {
        controller_config.bridge_poll_interval_ms = poll_interval_ms;
    }
    if let Some(selector) = args.label_selector {
        controller_config.label_selector = selector;
    }

    let init_result = initialize(controller_config, health_config).await?;

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("Shutdown signal received"),
            Err(e) => {
                warn!("Failed to listen for shutdown signal: {}", e);
                return;
            }
        }
        let _ = shutdown_tx.send(());
    });

    // A dropped sender also resolves the receiver, so only stop on a real signal.
    run_watch_loop(init_result, async move {
        if shutdown_rx.await.is_err() {
            std::future::pending::<()>().await;
        }
    })
    .await
}
