// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Project reconciliation.
//!
//! A Project owns exactly one namespace, named by [`project_namespace`], and
//! the baseline objects seeded into it. The namespace is created when absent
//! and is otherwise left alone.

use crate::constants::{CONDITION_STATUS_FALSE, CONDITION_STATUS_TRUE, CONDITION_TYPE_READY};
use crate::context::Context;
use crate::crd::{Project, ProjectStatus};
use crate::metrics::record_resource_created;
use crate::reconcilers::baseline::{ensure_baseline, operator_labels};
use crate::reconcilers::status::{update_status, with_condition};
use crate::status_reasons::{MESSAGE_PROJECT_READY, REASON_BOOTSTRAPPED, REASON_CREATE_FAILED};
use crate::store::{ObjectKey, ObjectStore, StoreError};
use crate::labels::{PROJECT_LABEL, TENANT_LABEL};
use crate::tenancy::{is_owned_namespace, namespace_labels, project_namespace};
use anyhow::Result;
use k8s_openapi::api::core::v1::Namespace;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kube::runtime::controller::Action;
use kube::runtime::reflector::ObjectRef;
use kube::ResourceExt;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Namespace object for a tenancy pair.
#[must_use]
pub fn build_namespace(tenant: &str, project: &str) -> Namespace {
    let mut labels = operator_labels();
    labels.extend(namespace_labels(tenant, project));
    Namespace {
        metadata: ObjectMeta {
            name: Some(project_namespace(tenant, project)),
            labels: Some(labels),
            ..Default::default()
        },
        ..Default::default()
    }
}

/// Create the project namespace, tolerating a concurrent create.
///
/// Returns `true` when this call created it.
async fn create_namespace<S: ObjectStore>(store: &S, ns: &Namespace) -> Result<bool, StoreError> {
    match store.create(ns).await {
        Ok(_) => {
            record_resource_created("Namespace");
            Ok(true)
        }
        Err(e) if e.is_already_exists() => {
            debug!(namespace = %ObjectKey::of(ns), "Namespace created concurrently");
            Ok(false)
        }
        Err(e) => Err(e),
    }
}

/// Reconcile the Project `name`.
///
/// # Errors
///
/// Returns the store error of any read or write. A failed namespace create is
/// recorded as `Ready=False/CreateFailed` before the error is returned.
pub async fn reconcile_project<S: ObjectStore>(ctx: &Context<S>, name: &str) -> Result<Action> {
    let Some(project) = ctx.store.get::<Project>(&ObjectKey::cluster(name)).await? else {
        debug!(project = %name, "Project no longer exists, nothing to reconcile");
        return Ok(Action::await_change());
    };

    let tenant = project.spec.tenant_ref.as_str();
    let namespace = build_namespace(tenant, &project.spec.name);
    let namespace_name = project_namespace(tenant, &project.spec.name);
    let current = project.status.clone().unwrap_or_default();

    let existing = ctx
        .store
        .get::<Namespace>(&ObjectKey::cluster(&namespace_name))
        .await?;
    if existing.is_none() {
        match create_namespace(&ctx.store, &namespace).await {
            Ok(true) => {
                info!(project = %name, namespace = %namespace_name, "Created project namespace");
            }
            Ok(false) => {}
            Err(e) => {
                error!(
                    project = %name,
                    namespace = %namespace_name,
                    error = %e,
                    "Failed to create project namespace"
                );
                let failed = ProjectStatus {
                    namespace: current.namespace.clone(),
                    ready: false,
                    conditions: with_condition(
                        &current.conditions,
                        CONDITION_TYPE_READY,
                        CONDITION_STATUS_FALSE,
                        REASON_CREATE_FAILED,
                        &e.to_string(),
                    ),
                };
                if let Err(status_err) = update_status(&ctx.store, &project, failed).await {
                    warn!(project = %name, error = %status_err, "Failed to record namespace create failure");
                }
                return Err(e.into());
            }
        }
    } else {
        debug!(project = %name, namespace = %namespace_name, "Namespace already exists");
    }

    ensure_baseline(&ctx.store, &namespace_name).await?;

    let desired = ProjectStatus {
        namespace: namespace_name.clone(),
        ready: true,
        conditions: with_condition(
            &current.conditions,
            CONDITION_TYPE_READY,
            CONDITION_STATUS_TRUE,
            REASON_BOOTSTRAPPED,
            MESSAGE_PROJECT_READY,
        ),
    };
    if update_status(&ctx.store, &project, desired).await? {
        info!(project = %name, namespace = %namespace_name, "Project marked ready");
    }

    Ok(Action::await_change())
}

/// Projects owning `ns`, found through its tenancy labels.
///
/// Namespaces whose labels do not agree with their name map to nothing.
#[must_use]
pub fn projects_for_namespace(ns: &Namespace, projects: &[Arc<Project>]) -> Vec<ObjectRef<Project>> {
    let labels = ns.labels();
    if !is_owned_namespace(&ns.name_any(), labels) {
        return Vec::new();
    }
    let (Some(tenant), Some(project)) = (labels.get(TENANT_LABEL), labels.get(PROJECT_LABEL)) else {
        return Vec::new();
    };
    projects
        .iter()
        .filter(|p| &p.spec.tenant_ref == tenant && &p.spec.name == project)
        .map(|p| ObjectRef::from_obj(p.as_ref()))
        .collect()
}
