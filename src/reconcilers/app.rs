// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! App reconciliation.
//!
//! An `App` of type `Image` with a non-empty image materializes as a single
//! Deployment named `app-{name}`. Any other App is converged without a
//! workload.
//!
//! ## Revisions
//!
//! `status.revision` is the 12-hex SHA-1 prefix of the image for materialized
//! apps. Other apps keep the revision they already have, or get a UTC
//! timestamp token on first reconcile, so repeated reconciles stay write-free.
//!
//! ## Readiness
//!
//! The App is ready once its Deployment reports at least one available
//! replica. Until then it is `Ready=False/Progressing` and the reconcile
//! returns a short fixed requeue as a success, which accrues no backoff.

use crate::constants::{
    APP_TYPE_IMAGE, CONDITION_STATUS_FALSE, CONDITION_STATUS_TRUE, CONDITION_TYPE_READY,
};
use crate::context::Context;
use crate::crd::{App, AppStatus};
use crate::metrics::{record_resource_created, record_resource_updated};
use crate::reconcilers::status::{update_status, with_condition};
use crate::reconcilers::workload::{apply_to_existing, available_replicas, build_deployment};
use crate::status_reasons::{
    MESSAGE_APP_CONVERGED, MESSAGE_APP_PROGRESSING, REASON_CONVERGED, REASON_PROGRESSING,
};
use crate::store::{ObjectKey, ObjectStore};
use crate::tenancy::{image_revision, timestamp_revision, workload_name};
use anyhow::Result;
use k8s_openapi::api::apps::v1::Deployment;
use kube::runtime::controller::Action;
use kube::ResourceExt;
use tracing::{debug, info};

/// Returns `true` when `app` is backed by a workload.
#[must_use]
pub fn materializes(app: &App) -> bool {
    app.spec.r#type == APP_TYPE_IMAGE && !app.spec.image.is_empty()
}

/// Create or update the workload of `app`; returns its available replicas.
async fn ensure_workload<S: ObjectStore>(
    store: &S,
    app: &App,
    namespace: &str,
    revision: &str,
) -> Result<i32> {
    let key = ObjectKey::namespaced(namespace, workload_name(&app.name_any()));

    let deployment = match store.get::<Deployment>(&key).await? {
        None => {
            let created = store.create(&build_deployment(app, revision)).await?;
            info!(deployment = %key, revision, "Created workload");
            record_resource_created("Deployment");
            created
        }
        Some(existing) => {
            let updated = apply_to_existing(&existing, &app.spec.image, revision);
            if updated == existing {
                debug!(deployment = %key, "Workload up to date");
                existing
            } else {
                let replaced = store.replace(&updated).await?;
                info!(deployment = %key, revision, "Updated workload");
                record_resource_updated("Deployment");
                replaced
            }
        }
    };

    Ok(available_replicas(&deployment))
}

/// Reconcile the App `namespace/name`.
///
/// # Errors
///
/// Returns the store error of any read or write.
pub async fn reconcile_app<S: ObjectStore>(
    ctx: &Context<S>,
    namespace: &str,
    name: &str,
) -> Result<Action> {
    if let Some(delay) = ctx.settings.app_reconcile_delay {
        debug!(app = %name, delay_ms = delay.as_millis(), "Applying synthetic reconcile delay");
        tokio::time::sleep(delay).await;
    }

    let key = ObjectKey::namespaced(namespace, name);
    let Some(app) = ctx.store.get::<App>(&key).await? else {
        debug!(app = %key, "App no longer exists, nothing to reconcile");
        return Ok(Action::await_change());
    };
    let current = app.status.clone().unwrap_or_default();

    let (revision, ready) = if materializes(&app) {
        let revision = image_revision(&app.spec.image);
        let available = ensure_workload(&ctx.store, &app, namespace, &revision).await?;
        (revision, available >= 1)
    } else {
        let revision = if current.revision.is_empty() {
            timestamp_revision(chrono::Utc::now())
        } else {
            current.revision.clone()
        };
        (revision, true)
    };

    let (status, reason, message) = if ready {
        (CONDITION_STATUS_TRUE, REASON_CONVERGED, MESSAGE_APP_CONVERGED)
    } else {
        (CONDITION_STATUS_FALSE, REASON_PROGRESSING, MESSAGE_APP_PROGRESSING)
    };
    let desired = AppStatus {
        ready,
        revision: revision.clone(),
        conditions: with_condition(
            &current.conditions,
            CONDITION_TYPE_READY,
            status,
            reason,
            message,
        ),
    };
    if update_status(&ctx.store, &app, desired).await? {
        info!(app = %key, revision = %revision, ready, "App status updated");
    }

    if ready {
        Ok(Action::await_change())
    } else {
        debug!(app = %key, "Workload not available yet, re-checking");
        Ok(Action::requeue(ctx.settings.readiness_requeue))
    }
}
