// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Baseline objects seeded into every project namespace.
//!
//! | Object | Name | Effect |
//! |---|---|---|
//! | `LimitRange` | `kubeop-defaults` | container requests 100m/64Mi, limits 500m/256Mi |
//! | `ResourceQuota` | `kubeop-quota` | 10 pods, 1 CPU and 1Gi memory requested |
//! | `NetworkPolicy` | `kubeop-egress` | denies all egress not allowed by a later policy |
//! | `NetworkPolicy` | `kubeop-ingress` | admits ingress only from pods in the namespace |
//!
//! Baselines are created when absent and never modified afterwards, so edits
//! made by cluster operators are left alone.

use crate::constants::{
    DEFAULT_LIMIT_CPU, DEFAULT_LIMIT_MEMORY, DEFAULT_REQUEST_CPU, DEFAULT_REQUEST_MEMORY,
    EGRESS_POLICY_NAME, INGRESS_POLICY_NAME, LIMIT_RANGE_NAME, QUOTA_PODS, QUOTA_REQUESTS_CPU,
    QUOTA_REQUESTS_MEMORY, RESOURCE_QUOTA_NAME,
};
use crate::labels::{K8S_MANAGED_BY, K8S_PART_OF, MANAGED_BY_OPERATOR, PART_OF_KUBEOP};
use crate::metrics::record_resource_created;
use crate::store::{ObjectKey, ObjectStore, StoreError, StoreResource};
use k8s_openapi::api::core::v1::{
    LimitRange, LimitRangeItem, LimitRangeSpec, ResourceQuota, ResourceQuotaSpec,
};
use k8s_openapi::api::networking::v1::{
    NetworkPolicy, NetworkPolicyIngressRule, NetworkPolicyPeer, NetworkPolicySpec,
};
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{LabelSelector, ObjectMeta};
use std::collections::BTreeMap;
use tracing::{debug, info};

fn quantities(entries: &[(&str, &str)]) -> BTreeMap<String, Quantity> {
    entries
        .iter()
        .map(|(k, v)| ((*k).to_string(), Quantity((*v).to_string())))
        .collect()
}

/// Labels stamped on every object the operator creates.
#[must_use]
pub fn operator_labels() -> BTreeMap<String, String> {
    BTreeMap::from([
        (K8S_MANAGED_BY.to_string(), MANAGED_BY_OPERATOR.to_string()),
        (K8S_PART_OF.to_string(), PART_OF_KUBEOP.to_string()),
    ])
}

fn baseline_meta(name: &str, namespace: &str) -> ObjectMeta {
    ObjectMeta {
        name: Some(name.to_string()),
        namespace: Some(namespace.to_string()),
        labels: Some(operator_labels()),
        ..Default::default()
    }
}

/// Default container requests and limits.
#[must_use]
pub fn build_limit_range(namespace: &str) -> LimitRange {
    LimitRange {
        metadata: baseline_meta(LIMIT_RANGE_NAME, namespace),
        spec: Some(LimitRangeSpec {
            limits: vec![LimitRangeItem {
                type_: "Container".to_string(),
                default_request: Some(quantities(&[
                    ("cpu", DEFAULT_REQUEST_CPU),
                    ("memory", DEFAULT_REQUEST_MEMORY),
                ])),
                default: Some(quantities(&[
                    ("cpu", DEFAULT_LIMIT_CPU),
                    ("memory", DEFAULT_LIMIT_MEMORY),
                ])),
                ..Default::default()
            }],
        }),
    }
}

/// Namespace-wide resource caps.
#[must_use]
pub fn build_resource_quota(namespace: &str) -> ResourceQuota {
    ResourceQuota {
        metadata: baseline_meta(RESOURCE_QUOTA_NAME, namespace),
        spec: Some(ResourceQuotaSpec {
            hard: Some(quantities(&[
                ("pods", QUOTA_PODS),
                ("requests.cpu", QUOTA_REQUESTS_CPU),
                ("requests.memory", QUOTA_REQUESTS_MEMORY),
            ])),
            ..Default::default()
        }),
        ..Default::default()
    }
}

/// Egress default-deny: selects every pod and allows no egress.
#[must_use]
pub fn build_egress_policy(namespace: &str) -> NetworkPolicy {
    NetworkPolicy {
        metadata: baseline_meta(EGRESS_POLICY_NAME, namespace),
        spec: Some(NetworkPolicySpec {
            pod_selector: Some(LabelSelector::default()),
            policy_types: Some(vec!["Egress".to_string()]),
            egress: None,
            ..Default::default()
        }),
    }
}

/// Ingress isolation: only pods of the same namespace may connect.
#[must_use]
pub fn build_ingress_policy(namespace: &str) -> NetworkPolicy {
    NetworkPolicy {
        metadata: baseline_meta(INGRESS_POLICY_NAME, namespace),
        spec: Some(NetworkPolicySpec {
            pod_selector: Some(LabelSelector::default()),
            policy_types: Some(vec!["Ingress".to_string()]),
            ingress: Some(vec![NetworkPolicyIngressRule {
                from: Some(vec![NetworkPolicyPeer {
                    pod_selector: Some(LabelSelector::default()),
                    ..Default::default()
                }]),
                ..Default::default()
            }]),
            ..Default::default()
        }),
    }
}

/// Create `obj` unless an object with its key already exists.
///
/// Returns `true` when this call created it.
///
/// # Errors
///
/// Returns any store error other than a lost create race.
pub async fn create_if_absent<S, K>(store: &S, obj: &K) -> Result<bool, StoreError>
where
    S: ObjectStore,
    K: StoreResource,
{
    let key = ObjectKey::of(obj);
    let kind = K::kind(&()).to_string();
    if store.get::<K>(&key).await?.is_some() {
        debug!(kind = %kind, key = %key, "Baseline object present, leaving as is");
        return Ok(false);
    }

    match store.create(obj).await {
        Ok(_) => {
            info!(kind = %kind, key = %key, "Created baseline object");
            record_resource_created(&kind);
            Ok(true)
        }
        Err(e) if e.is_already_exists() => {
            debug!(kind = %kind, key = %key, "Baseline object created concurrently");
            Ok(false)
        }
        Err(e) => Err(e),
    }
}

/// Seed all baseline objects into `namespace`.
///
/// # Errors
///
/// Returns the first store error encountered.
pub async fn ensure_baseline<S: ObjectStore>(store: &S, namespace: &str) -> Result<(), StoreError> {
    create_if_absent(store, &build_limit_range(namespace)).await?;
    create_if_absent(store, &build_resource_quota(namespace)).await?;
    create_if_absent(store, &build_egress_policy(namespace)).await?;
    create_if_absent(store, &build_ingress_policy(namespace)).await?;
    Ok(())
}
