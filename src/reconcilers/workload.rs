// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Deployment builders for `App` workloads.
//!
//! Every workload runs under a hardened security profile. The profile is
//! written on creation and reasserted on every update, so an external edit
//! that loosens it is reverted on the next reconcile.

use crate::constants::{
    APP_CONTAINER_NAME, APP_CONTAINER_PORT, APP_REPLICAS, SECCOMP_RUNTIME_DEFAULT,
};
use crate::crd::App;
use crate::labels::{
    APP_LABEL, K8S_MANAGED_BY, K8S_PART_OF, MANAGED_BY_OPERATOR, PART_OF_KUBEOP,
    REVISION_ANNOTATION,
};
use crate::tenancy::workload_name;
use k8s_openapi::api::apps::v1::{Deployment, DeploymentSpec};
use k8s_openapi::api::core::v1::{
    Capabilities, Container, ContainerPort, PodSecurityContext, PodSpec, PodTemplateSpec,
    SeccompProfile, SecurityContext,
};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{LabelSelector, ObjectMeta};
use kube::{Resource, ResourceExt};
use std::collections::BTreeMap;
use tracing::debug;

fn runtime_default_seccomp() -> SeccompProfile {
    SeccompProfile {
        type_: SECCOMP_RUNTIME_DEFAULT.to_string(),
        ..Default::default()
    }
}

/// Pod-level half of the hardened profile.
#[must_use]
pub fn hardened_pod_security() -> PodSecurityContext {
    PodSecurityContext {
        run_as_non_root: Some(true),
        seccomp_profile: Some(runtime_default_seccomp()),
        ..Default::default()
    }
}

/// Container-level half of the hardened profile.
#[must_use]
pub fn hardened_container_security() -> SecurityContext {
    SecurityContext {
        run_as_non_root: Some(true),
        allow_privilege_escalation: Some(false),
        read_only_root_filesystem: Some(true),
        capabilities: Some(Capabilities {
            drop: Some(vec!["ALL".to_string()]),
            ..Default::default()
        }),
        seccomp_profile: Some(runtime_default_seccomp()),
        ..Default::default()
    }
}

fn selector_labels(app: &str) -> BTreeMap<String, String> {
    BTreeMap::from([(APP_LABEL.to_string(), app.to_string())])
}

fn app_container(image: &str) -> Container {
    Container {
        name: APP_CONTAINER_NAME.to_string(),
        image: Some(image.to_string()),
        ports: Some(vec![ContainerPort {
            container_port: APP_CONTAINER_PORT,
            ..Default::default()
        }]),
        security_context: Some(hardened_container_security()),
        ..Default::default()
    }
}

/// Build the Deployment for `app` at `revision`.
#[must_use]
pub fn build_deployment(app: &App, revision: &str) -> Deployment {
    let app_name = app.name_any();
    let name = workload_name(&app_name);
    debug!(app = %app_name, deployment = %name, revision, "Building workload");

    let selector = selector_labels(&app_name);
    let mut labels = selector.clone();
    labels.insert(K8S_MANAGED_BY.to_string(), MANAGED_BY_OPERATOR.to_string());
    labels.insert(K8S_PART_OF.to_string(), PART_OF_KUBEOP.to_string());

    Deployment {
        metadata: ObjectMeta {
            name: Some(name),
            namespace: app.namespace(),
            labels: Some(labels),
            annotations: Some(BTreeMap::from([(
                REVISION_ANNOTATION.to_string(),
                revision.to_string(),
            )])),
            owner_references: app.controller_owner_ref(&()).map(|owner| vec![owner]),
            ..Default::default()
        },
        spec: Some(DeploymentSpec {
            replicas: Some(APP_REPLICAS),
            selector: LabelSelector {
                match_labels: Some(selector.clone()),
                ..Default::default()
            },
            template: PodTemplateSpec {
                metadata: Some(ObjectMeta {
                    labels: Some(selector),
                    ..Default::default()
                }),
                spec: Some(PodSpec {
                    containers: vec![app_container(&app.spec.image)],
                    security_context: Some(hardened_pod_security()),
                    ..Default::default()
                }),
            },
            ..Default::default()
        }),
        ..Default::default()
    }
}

/// Apply `image`, `revision` and the hardened profile to an existing
/// Deployment, leaving every other field as found.
///
/// The image goes to the first container; a template without containers gets
/// the standard app container.
#[must_use]
pub fn apply_to_existing(existing: &Deployment, image: &str, revision: &str) -> Deployment {
    let mut updated = existing.clone();
    updated
        .annotations_mut()
        .insert(REVISION_ANNOTATION.to_string(), revision.to_string());

    let spec = updated.spec.get_or_insert_with(Default::default);
    let pod = spec.template.spec.get_or_insert_with(Default::default);
    pod.security_context = Some(hardened_pod_security());

    match pod.containers.first_mut() {
        Some(first) => first.image = Some(image.to_string()),
        None => pod.containers.push(app_container(image)),
    }
    for container in &mut pod.containers {
        container.security_context = Some(hardened_container_security());
    }

    updated
}

/// Available replica count reported by a Deployment.
#[must_use]
pub fn available_replicas(deployment: &Deployment) -> i32 {
    deployment
        .status
        .as_ref()
        .and_then(|s| s.available_replicas)
        .unwrap_or(0)
}
