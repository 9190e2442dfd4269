// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Fixtures shared by the admission tests.

use super::{AdmissionState, LookupFailurePolicy, PolicyResolver, PolicySettings};
use crate::reconcilers::project::build_namespace;
use crate::store::memory::MemoryStore;
use kube::api::DynamicObject;
use kube::core::admission::AdmissionRequest;
use serde_json::{json, Value};
use std::time::Duration;

pub const TEST_UID: &str = "705ab4f5-6393-11e8-b7cc-42010a800002";

/// Raw `AdmissionReview` body for `object`.
pub fn review_json(group: &str, kind: &str, operation: &str, namespace: Option<&str>, object: Value) -> Value {
    let resource = format!("{}s", kind.to_lowercase());
    json!({
        "apiVersion": "admission.k8s.io/v1",
        "kind": "AdmissionReview",
        "request": {
            "uid": TEST_UID,
            "kind": {"group": group, "version": "v1", "kind": kind},
            "resource": {"group": group, "version": "v1", "resource": resource},
            "name": object.pointer("/metadata/name").cloned().unwrap_or_else(|| json!("")),
            "namespace": namespace,
            "operation": operation,
            "userInfo": {"username": "alice"},
            "object": object,
            "oldObject": null,
            "dryRun": false,
        }
    })
}

pub fn request(group: &str, kind: &str, namespace: Option<&str>, object: Value) -> AdmissionRequest<DynamicObject> {
    let body = review_json(group, kind, "CREATE", namespace, object);
    super::decode_review(&serde_json::to_vec(&body).unwrap()).unwrap()
}

pub fn app_object(namespace: &str, image: &str) -> Value {
    json!({
        "apiVersion": "paas.kubeop.io/v1alpha1",
        "kind": "App",
        "metadata": {"name": "web", "namespace": namespace},
        "spec": {"type": "Image", "image": image},
    })
}

pub fn state_with(store: MemoryStore, overrides: PolicySettings) -> AdmissionState<MemoryStore> {
    AdmissionState::new(
        store,
        PolicyResolver::new(overrides),
        LookupFailurePolicy::FailOpen,
        Duration::from_secs(2),
    )
}

/// Store holding the owned namespace `kubeop-acme-web`.
pub fn store_with_tenant_namespace() -> MemoryStore {
    let store = MemoryStore::new();
    store.insert(build_namespace("acme", "web"));
    store
}
