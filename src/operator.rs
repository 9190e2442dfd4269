// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Controller runtime for the operator process.
//!
//! One `kube::runtime::Controller` runs per kind. The controller queue
//! collapses bursts of events for one key into a single pending reconcile and
//! runs different keys in parallel up to the kind's worker count.
//!
//! Every reconcile passes through [`drive`], which:
//! - enforces the reconcile deadline
//! - resets the key's error backoff after any success
//! - turns "converged" into a periodic resync
//! - records reconcile metrics
//!
//! Failures reach [`on_error`], which requeues with per-key exponential
//! backoff. A key's backoff entry is dropped once the controller reports the
//! object gone from its cache, see [`forget_deleted`].

use crate::config::OperatorArgs;
use crate::constants::{
    CONTROLLER_DEBOUNCE, KIND_APP, KIND_CERTIFICATE, KIND_DNS_RECORD, KIND_PROJECT, KIND_TENANT,
    PROVISIONER_TIMEOUT, SERVICE_OPERATOR,
};
use crate::context::Context;
use crate::crd::{App, Certificate, DNSRecord, Project, Tenant};
use crate::health;
use crate::http::serve;
use crate::labels::TENANT_LABEL;
use crate::metrics::{
    record_reconciliation_error, record_reconciliation_requeue, record_reconciliation_success,
};
use crate::notify::Notifier;
use crate::reconcilers::project::projects_for_namespace;
use crate::reconcilers::{
    reconcile_app, reconcile_certificate, reconcile_dns_record, reconcile_project,
    reconcile_tenant,
};
use crate::store::{KubeStore, ObjectKey};
use anyhow::{anyhow, Result};
use futures::StreamExt;
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::Namespace;
use kube::{
    runtime::{
        controller::{self, Action},
        watcher, Controller,
    },
    Api, Client, Resource, ResourceExt,
};
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

#[derive(Debug, thiserror::Error)]
#[error(transparent)]
pub struct ReconcileError(#[from] anyhow::Error);

type OperatorContext = Arc<Context<KubeStore>>;

type ControllerError = controller::Error<ReconcileError, watcher::Error>;

/// Backoff bucket of one object: `Kind/namespace/name`.
#[must_use]
pub fn backoff_key<K: Resource<DynamicType = ()>>(obj: &K) -> String {
    format!("{}/{}", K::kind(&()), ObjectKey::of(obj))
}

/// Drop the backoff entry of an object the controller no longer has cached.
///
/// Returns `true` when `result` reports a deleted object.
pub fn forget_deleted<S, T>(ctx: &Context<S>, result: &Result<T, ControllerError>) -> bool {
    let Err(controller::Error::ObjectNotFound(obj_ref)) = result else {
        return false;
    };
    let object = ObjectKey {
        namespace: obj_ref.namespace.clone(),
        name: obj_ref.name.clone(),
    };
    let key = format!("{}/{object}", obj_ref.dyntype.kind);
    debug!(key, "Object gone, dropping its backoff");
    ctx.backoff.reset(&key);
    true
}

/// Run one reconcile under the context's deadline and bookkeeping.
///
/// # Errors
///
/// Returns the reconcile error, or a deadline error when it did not finish
/// in time.
pub async fn drive<S, F>(
    ctx: &Context<S>,
    kind: &str,
    key: &str,
    reconcile: F,
) -> Result<Action, ReconcileError>
where
    F: Future<Output = Result<Action>>,
{
    let started = Instant::now();
    let deadline = ctx.settings.reconcile_timeout;
    let outcome = match tokio::time::timeout(deadline, reconcile).await {
        Ok(outcome) => outcome,
        Err(_) => Err(anyhow!(
            "reconcile of {key} timed out after {}s",
            deadline.as_secs_f64()
        )),
    };

    match outcome {
        Ok(action) => {
            ctx.backoff.reset(key);
            record_reconciliation_success(kind, started.elapsed());
            if action == Action::await_change() {
                debug!(key, "Reconciled, resyncing later");
                Ok(Action::requeue(ctx.settings.resync_interval))
            } else {
                debug!(key, "Reconciled, waiting on dependent state");
                record_reconciliation_requeue(kind, "dependency_wait");
                Ok(action)
            }
        }
        Err(e) => {
            error!(key, error = %e, "Reconcile failed");
            record_reconciliation_error(kind, started.elapsed());
            Err(e.into())
        }
    }
}

/// Requeue a failed key with exponential backoff.
pub fn on_error<S>(ctx: &Context<S>, kind: &str, key: &str, err: &ReconcileError) -> Action {
    let delay = ctx.backoff.next_delay(key);
    warn!(
        key,
        attempt = ctx.backoff.attempts(key),
        retry_in_ms = delay.as_millis(),
        error = %err,
        "Retrying with backoff"
    );
    record_reconciliation_requeue(kind, "error");
    Action::requeue(delay)
}

fn error_policy<K: Resource<DynamicType = ()>>(
    obj: Arc<K>,
    err: &ReconcileError,
    ctx: OperatorContext,
) -> Action {
    let kind = K::kind(&()).to_string();
    on_error(&*ctx, &kind, &backoff_key(obj.as_ref()), err)
}

fn controller_config(workers: u16) -> controller::Config {
    controller::Config::default()
        .concurrency(workers)
        .debounce(CONTROLLER_DEBOUNCE)
}

async fn reconcile_tenant_wrapper(
    tenant: Arc<Tenant>,
    ctx: OperatorContext,
) -> Result<Action, ReconcileError> {
    let name = tenant.name_any();
    let key = backoff_key(tenant.as_ref());
    drive(&*ctx, KIND_TENANT, &key, reconcile_tenant(&*ctx, &name)).await
}

async fn reconcile_project_wrapper(
    project: Arc<Project>,
    ctx: OperatorContext,
) -> Result<Action, ReconcileError> {
    let name = project.name_any();
    let key = backoff_key(project.as_ref());
    drive(&*ctx, KIND_PROJECT, &key, reconcile_project(&*ctx, &name)).await
}

async fn reconcile_app_wrapper(app: Arc<App>, ctx: OperatorContext) -> Result<Action, ReconcileError> {
    let name = app.name_any();
    let namespace = app.namespace().unwrap_or_default();
    let key = backoff_key(app.as_ref());
    drive(&*ctx, KIND_APP, &key, reconcile_app(&*ctx, &namespace, &name)).await
}

async fn reconcile_dns_record_wrapper(
    record: Arc<DNSRecord>,
    ctx: OperatorContext,
) -> Result<Action, ReconcileError> {
    let name = record.name_any();
    let namespace = record.namespace().unwrap_or_default();
    let key = backoff_key(record.as_ref());
    drive(&*ctx, KIND_DNS_RECORD, &key, reconcile_dns_record(&*ctx, &namespace, &name)).await
}

async fn reconcile_certificate_wrapper(
    cert: Arc<Certificate>,
    ctx: OperatorContext,
) -> Result<Action, ReconcileError> {
    let name = cert.name_any();
    let namespace = cert.namespace().unwrap_or_default();
    let key = backoff_key(cert.as_ref());
    drive(&*ctx, KIND_CERTIFICATE, &key, reconcile_certificate(&*ctx, &namespace, &name)).await
}

/// Run the `Tenant` controller
async fn run_tenant_controller(client: Client, ctx: OperatorContext, workers: u16) -> Result<()> {
    info!(workers, "Starting Tenant controller");

    Controller::new(Api::<Tenant>::all(client), watcher::Config::default())
        .with_config(controller_config(workers))
        .shutdown_on_signal()
        .run(reconcile_tenant_wrapper, error_policy, ctx.clone())
        .for_each(|result| {
            forget_deleted(&*ctx, &result);
            futures::future::ready(())
        })
        .await;

    Ok(())
}

/// Run the `Project` controller, which also watches tenancy-labelled
/// Namespaces and maps them back to their Project
async fn run_project_controller(client: Client, ctx: OperatorContext, workers: u16) -> Result<()> {
    info!(workers, "Starting Project controller");

    let controller = Controller::new(Api::<Project>::all(client.clone()), watcher::Config::default());
    let projects = controller.store();

    controller
        .watches(
            Api::<Namespace>::all(client),
            watcher::Config::default().labels(TENANT_LABEL),
            move |ns| projects_for_namespace(&ns, &projects.state()),
        )
        .with_config(controller_config(workers))
        .shutdown_on_signal()
        .run(reconcile_project_wrapper, error_policy, ctx.clone())
        .for_each(|result| {
            forget_deleted(&*ctx, &result);
            futures::future::ready(())
        })
        .await;

    Ok(())
}

/// Run the `App` controller, which also watches the Deployments it owns
async fn run_app_controller(client: Client, ctx: OperatorContext, workers: u16) -> Result<()> {
    info!(workers, "Starting App controller");

    Controller::new(Api::<App>::all(client.clone()), watcher::Config::default())
        .owns(Api::<Deployment>::all(client), watcher::Config::default())
        .with_config(controller_config(workers))
        .shutdown_on_signal()
        .run(reconcile_app_wrapper, error_policy, ctx.clone())
        .for_each(|result| {
            forget_deleted(&*ctx, &result);
            futures::future::ready(())
        })
        .await;

    Ok(())
}

/// Run the `DNSRecord` controller
async fn run_dns_record_controller(client: Client, ctx: OperatorContext, workers: u16) -> Result<()> {
    info!(workers, "Starting DNSRecord controller");

    Controller::new(Api::<DNSRecord>::all(client), watcher::Config::default())
        .with_config(controller_config(workers))
        .shutdown_on_signal()
        .run(reconcile_dns_record_wrapper, error_policy, ctx.clone())
        .for_each(|result| {
            forget_deleted(&*ctx, &result);
            futures::future::ready(())
        })
        .await;

    Ok(())
}

/// Run the `Certificate` controller
async fn run_certificate_controller(
    client: Client,
    ctx: OperatorContext,
    workers: u16,
) -> Result<()> {
    info!(workers, "Starting Certificate controller");

    Controller::new(Api::<Certificate>::all(client), watcher::Config::default())
        .with_config(controller_config(workers))
        .shutdown_on_signal()
        .run(reconcile_certificate_wrapper, error_policy, ctx.clone())
        .for_each(|result| {
            forget_deleted(&*ctx, &result);
            futures::future::ready(())
        })
        .await;

    Ok(())
}

/// Run all controllers and the health listener until shutdown.
///
/// # Errors
///
/// Returns an error if the cluster or HTTP clients cannot be built, or a
/// controller fails.
pub async fn run_operator(args: OperatorArgs) -> Result<()> {
    debug!("Initializing Kubernetes client");
    let client = Client::try_default().await?;
    debug!("Kubernetes client initialized successfully");

    let http = reqwest::Client::builder()
        .timeout(PROVISIONER_TIMEOUT)
        .build()?;
    let dns_notifier = Notifier::new(http.clone(), args.dns_endpoint.clone(), args.notify_policy);
    let cert_notifier = Notifier::new(http, args.acme_endpoint.clone(), args.notify_policy);
    info!(
        dns_endpoint = ?args.dns_endpoint.as_ref().map(url::Url::as_str),
        acme_endpoint = ?args.acme_endpoint.as_ref().map(url::Url::as_str),
        notify_policy = ?args.notify_policy,
        "Provisioner notifiers configured"
    );

    let ctx: OperatorContext = Arc::new(
        Context::new(KubeStore::new(client.clone()), args.reconcile_settings())
            .with_notifiers(dns_notifier, cert_notifier),
    );

    let health_addr = args.health_addr;
    tokio::spawn(async move {
        if let Err(e) = serve(health::router(SERVICE_OPERATOR), health_addr, None).await {
            error!(error = %e, "Health listener failed");
        }
    });

    info!("Starting all controllers");

    // A controller only returns once shutdown was signalled
    tokio::select! {
        result = run_tenant_controller(client.clone(), ctx.clone(), args.tenant_workers) => {
            info!("Tenant controller stopped");
            result
        }
        result = run_project_controller(client.clone(), ctx.clone(), args.project_workers) => {
            info!("Project controller stopped");
            result
        }
        result = run_app_controller(client.clone(), ctx.clone(), args.app_workers) => {
            info!("App controller stopped");
            result
        }
        result = run_dns_record_controller(client.clone(), ctx.clone(), args.dns_workers) => {
            info!("DNSRecord controller stopped");
            result
        }
        result = run_certificate_controller(client, ctx, args.cert_workers) => {
            info!("Certificate controller stopped");
            result
        }
    }
}

#[cfg(test)]
#[path = "operator_tests.rs"]
mod operator_tests;
