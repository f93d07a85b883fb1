//! # Watch Loop
//!
//! Hosts the bridge reconciler in a `kube` runtime controller. Bridges are
//! selected by label; their config maps and brokers are owned so changes to
//! either trigger a reconcile, and labelled secrets are mapped back to the
//! bridge of the same name.

use super::error_policy::handle_reconciliation_error;
use super::initialization::InitializationResult;
use crate::constants::{BRIDGE_FINALIZER, MANAGED_BY_LABEL, MANAGED_BY_VALUE};
use crate::controller::reconciler::{self, Reconciler, ReconcilerError};
use crate::crd::{KnativeBroker, ManagedBridge};
use futures::StreamExt;
use k8s_openapi::api::core::v1::{ConfigMap, Secret};
use kube::api::Api;
use kube::runtime::finalizer::{finalizer, Error as FinalizerError, Event as FinalizerEvent};
use kube::runtime::reflector::ObjectRef;
use kube::runtime::watcher::Config;
use kube::runtime::Controller;
use kube::{Client, Resource, ResourceExt};
use kube_runtime::controller::Action;
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, error, info, instrument};

/// Context handed to every reconcile and error-policy call.
#[allow(missing_debug_implementations, reason = "Holds trait objects without Debug")]
pub struct ControllerContext {
    pub client: Client,
    pub reconciler: Arc<Reconciler>,
}

fn scoped_api<K>(client: &Client, namespace: Option<&str>) -> Api<K>
where
    K: Resource<Scope = k8s_openapi::NamespaceResourceScope>,
    <K as Resource>::DynamicType: Default,
{
    match namespace {
        Some(ns) => Api::namespaced(client.clone(), ns),
        None => Api::all(client.clone()),
    }
}

#[instrument(skip(bridge, ctx), fields(name = %bridge.name_any(), namespace = bridge.namespace()))]
async fn reconcile(bridge: Arc<ManagedBridge>, ctx: Arc<ControllerContext>) -> Result<Action, ReconcilerError> {
    let namespace = bridge.namespace().ok_or_else(|| ReconcilerError::MissingNamespace {
        kind: "ManagedBridge",
        name: bridge.name_any(),
    })?;
    let bridges: Api<ManagedBridge> = Api::namespaced(ctx.client.clone(), &namespace);

    finalizer(&bridges, BRIDGE_FINALIZER, bridge, |event| async {
        match event {
            FinalizerEvent::Apply(bridge) => reconciler::apply(bridge, ctx.reconciler.clone()).await,
            FinalizerEvent::Cleanup(bridge) => reconciler::cleanup(bridge, ctx.reconciler.clone()).await,
        }
    })
    .await
    .map_err(|e| match e {
        FinalizerError::ApplyFailed(e) | FinalizerError::CleanupFailed(e) => e,
        other => ReconcilerError::Finalizer(other.to_string()),
    })
}

/// Runs the controller until `shutdown` resolves.
pub async fn run_watch_loop<F>(init: InitializationResult, shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + Sync + 'static,
{
    let InitializationResult {
        client,
        bridges,
        reconciler,
        config,
        ..
    } = init;
    let namespace = config.watch_namespace.as_deref();

    let selector = Config::default().labels(&config.label_selector);
    let owned_selector = Config::default().labels(&format!("{MANAGED_BY_LABEL}={MANAGED_BY_VALUE}"));

    let config_maps = scoped_api::<ConfigMap>(&client, namespace);
    let brokers = scoped_api::<KnativeBroker>(&client, namespace);
    let secrets = scoped_api::<Secret>(&client, namespace);

    let ctx = Arc::new(ControllerContext {
        client: client.clone(),
        reconciler,
    });

    info!(
        namespace = namespace.unwrap_or("all"),
        selector = %config.label_selector,
        "🚀 Starting ManagedBridge controller"
    );

    Controller::new(bridges, selector.clone())
        .owns(config_maps, owned_selector.clone())
        .owns(brokers, owned_selector)
        .watches(secrets, selector, |secret: Secret| {
            secret
                .namespace()
                .map(|ns| ObjectRef::<ManagedBridge>::new(&secret.name_any()).within(&ns))
        })
        .graceful_shutdown_on(shutdown)
        .run(reconcile, handle_reconciliation_error, ctx)
        .for_each(|result| async move {
            match result {
                Ok((obj, action)) => {
                    debug!(name = obj.name, namespace = obj.namespace, ?action, "Reconciliation completed");
                }
                Err(e) => {
                    error!(error = %e, "Reconciliation failed");
                }
            }
        })
        .await;

    info!("ManagedBridge controller stopped");
    Ok(())
}
