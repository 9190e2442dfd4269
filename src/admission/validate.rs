// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Validating admission.
//!
//! | Kind | Rule |
//! |---|---|
//! | `paas.kubeop.io/App` | image registry allow-listed; namespace owned by a tenancy pair |
//! | `paas.kubeop.io/Project` | `spec.tenantRef` set and the Tenant exists |
//! | `networking.k8s.io/NetworkPolicy` | in tenant namespaces, every egress ipBlock inside the baseline |
//! | `ResourceQuota` | requests for CPU and memory set, within configured maxima |
//!
//! Anything else is allowed. A violation is always a clean denial with a
//! message, never a transport error.

use crate::admission::cidr::cidr_allowed;
use crate::admission::image::{image_host, registry_allowed};
use crate::admission::policy::ResolvedPolicy;
use crate::admission::{is_kind, AdmissionState, LookupFailurePolicy};
use crate::constants::{
    API_GROUP, KIND_APP, KIND_NETWORK_POLICY, KIND_PROJECT, KIND_RESOURCE_QUOTA,
    NETWORKING_API_GROUP,
};
use crate::crd::Tenant;
use crate::labels::TENANT_LABEL;
use crate::quantity::quantity_le;
use crate::store::{ObjectKey, ObjectStore, StoreError};
use crate::tenancy::is_owned_namespace;
use k8s_openapi::api::core::v1::{Namespace, ResourceQuotaSpec};
use k8s_openapi::api::networking::v1::NetworkPolicySpec;
use kube::api::DynamicObject;
use kube::core::admission::{AdmissionRequest, AdmissionResponse, Operation};
use serde_json::Value;
use tracing::{debug, warn};

/// `Err` carries the denial message.
type Verdict = Result<(), String>;

fn spec_str<'a>(obj: &'a DynamicObject, field: &str) -> &'a str {
    obj.data
        .get("spec")
        .and_then(|spec| spec.get(field))
        .and_then(Value::as_str)
        .unwrap_or_default()
}

fn spec_of<T: serde::de::DeserializeOwned>(obj: &DynamicObject) -> Option<T> {
    let spec = obj
        .data
        .get("spec")
        .cloned()
        .unwrap_or_else(|| Value::Object(serde_json::Map::new()));
    serde_json::from_value(spec).ok()
}

/// Target namespace: the object's own, else the request's.
fn target_namespace(req: &AdmissionRequest<DynamicObject>, obj: &DynamicObject) -> Option<String> {
    obj.metadata
        .namespace
        .clone()
        .or_else(|| req.namespace.clone())
        .filter(|ns| !ns.is_empty())
}

async fn lookup_namespace<S: ObjectStore>(
    store: &S,
    name: &str,
) -> Result<Option<Namespace>, StoreError> {
    store.get::<Namespace>(&ObjectKey::cluster(name)).await
}

fn on_lookup_failure(policy: LookupFailurePolicy, namespace: &str, err: &StoreError) -> Verdict {
    match policy {
        LookupFailurePolicy::FailOpen => {
            warn!(namespace, error = %err, "Namespace lookup failed, skipping check");
            Ok(())
        }
        LookupFailurePolicy::FailClosed => {
            warn!(namespace, error = %err, "Namespace lookup failed, denying");
            Err(format!("namespace lookup failed: {err}"))
        }
    }
}

async fn validate_app<S: ObjectStore>(
    state: &AdmissionState<S>,
    req: &AdmissionRequest<DynamicObject>,
    obj: &DynamicObject,
) -> Verdict {
    if let Some(host) = image_host(spec_str(obj, "image")) {
        let policy: ResolvedPolicy = state.policy.resolve(&state.store).await;
        if !registry_allowed(host, &policy.image_allowlist) {
            return Err(format!("registry {host} is not allowed"));
        }
    }

    let Some(namespace) = target_namespace(req, obj) else {
        return Ok(());
    };
    match lookup_namespace(&state.store, &namespace).await {
        Ok(Some(ns)) => {
            let labels = ns.metadata.labels.unwrap_or_default();
            if is_owned_namespace(&namespace, &labels) {
                Ok(())
            } else {
                Err("namespace not owned by a tenant/project".to_string())
            }
        }
        Ok(None) => {
            debug!(namespace = %namespace, "Namespace not found, skipping ownership check");
            Ok(())
        }
        Err(e) => on_lookup_failure(state.lookup_failure, &namespace, &e),
    }
}

async fn validate_project<S: ObjectStore>(state: &AdmissionState<S>, obj: &DynamicObject) -> Verdict {
    let tenant_ref = spec_str(obj, "tenantRef");
    if tenant_ref.is_empty() {
        return Err("spec.tenantRef is required".to_string());
    }
    match state.store.get::<Tenant>(&ObjectKey::cluster(tenant_ref)).await {
        Ok(Some(_)) => Ok(()),
        Ok(None) => Err("referenced tenant does not exist".to_string()),
        Err(e) => {
            warn!(tenant = tenant_ref, error = %e, "Tenant lookup failed, denying");
            Err("referenced tenant does not exist".to_string())
        }
    }
}

/// Check every egress ipBlock of `spec` against `baseline`.
fn check_egress(spec: &NetworkPolicySpec, baseline: &[ipnet::IpNet]) -> Verdict {
    let blocks = spec
        .egress
        .iter()
        .flatten()
        .flat_map(|rule| rule.to.iter().flatten())
        .filter_map(|peer| peer.ip_block.as_ref());

    for block in blocks {
        if !cidr_allowed(&block.cidr, baseline) {
            return Err(format!(
                "egress CIDR {} not in baseline allowlist",
                block.cidr
            ));
        }
        for except in block.except.iter().flatten() {
            if !cidr_allowed(except, baseline) {
                return Err(format!(
                    "egress except CIDR {except} not in baseline allowlist"
                ));
            }
        }
    }
    Ok(())
}

async fn validate_network_policy<S: ObjectStore>(
    state: &AdmissionState<S>,
    req: &AdmissionRequest<DynamicObject>,
    obj: &DynamicObject,
) -> Verdict {
    let Some(spec) = spec_of::<NetworkPolicySpec>(obj) else {
        debug!(uid = %req.uid, "NetworkPolicy spec not decodable, skipping");
        return Ok(());
    };
    let Some(namespace) = target_namespace(req, obj) else {
        return Ok(());
    };

    let tenant_owned = match lookup_namespace(&state.store, &namespace).await {
        Ok(Some(ns)) => ns
            .metadata
            .labels
            .as_ref()
            .and_then(|l| l.get(TENANT_LABEL))
            .is_some_and(|t| !t.is_empty()),
        Ok(None) => false,
        Err(e) => return on_lookup_failure(state.lookup_failure, &namespace, &e),
    };
    if !tenant_owned {
        return Ok(());
    }

    let policy = state.policy.resolve(&state.store).await;
    check_egress(&spec, &policy.egress_baseline)
}

/// Check a quota's CPU and memory requests against `policy`.
fn check_quota(spec: &ResourceQuotaSpec, policy: &ResolvedPolicy) -> Verdict {
    let hard = spec.hard.clone().unwrap_or_default();

    // Plain `cpu`/`memory` keys do not satisfy the requests requirement
    let (Some(cpu), Some(memory)) = (hard.get("requests.cpu"), hard.get("requests.memory")) else {
        return Err("resourcequota must set requests.cpu and requests.memory".to_string());
    };

    if let Some(max) = &policy.quota_max_requests_cpu {
        if !matches!(quantity_le(&cpu.0, max), Ok(true)) {
            return Err(format!("requests.cpu exceeds maximum {max}"));
        }
    }
    if let Some(max) = &policy.quota_max_requests_memory {
        if !matches!(quantity_le(&memory.0, max), Ok(true)) {
            return Err(format!("requests.memory exceeds maximum {max}"));
        }
    }
    Ok(())
}

async fn validate_resource_quota<S: ObjectStore>(
    state: &AdmissionState<S>,
    obj: &DynamicObject,
) -> Verdict {
    let Some(spec) = spec_of::<ResourceQuotaSpec>(obj) else {
        return Ok(());
    };
    let policy = state.policy.resolve(&state.store).await;
    check_quota(&spec, &policy)
}

/// Evaluate one validating review.
pub async fn validate<S: ObjectStore>(
    state: &AdmissionState<S>,
    req: &AdmissionRequest<DynamicObject>,
) -> AdmissionResponse {
    let allow = AdmissionResponse::from(req);
    if matches!(req.operation, Operation::Delete) {
        return allow;
    }
    let Some(obj) = &req.object else {
        return allow;
    };

    let verdict = if is_kind(&req.kind, API_GROUP, KIND_APP) {
        validate_app(state, req, obj).await
    } else if is_kind(&req.kind, API_GROUP, KIND_PROJECT) {
        validate_project(state, obj).await
    } else if is_kind(&req.kind, NETWORKING_API_GROUP, KIND_NETWORK_POLICY) {
        validate_network_policy(state, req, obj).await
    } else if is_kind(&req.kind, "", KIND_RESOURCE_QUOTA) {
        validate_resource_quota(state, obj).await
    } else {
        Ok(())
    };

    match verdict {
        Ok(()) => allow,
        Err(message) => {
            debug!(uid = %req.uid, kind = %req.kind.kind, message = %message, "Denying request");
            allow.deny(message)
        }
    }
}

#[cfg(test)]
#[path = "validate_tests.rs"]
mod validate_tests;
