// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `mutate.rs`

use super::*;
use std::collections::BTreeMap;

fn app_object(labels: Option<BTreeMap<String, String>>) -> DynamicObject {
    let mut obj: DynamicObject = serde_json::from_value(json!({
        "apiVersion": "paas.kubeop.io/v1alpha1",
        "kind": "App",
        "metadata": {"name": "web", "namespace": "kubeop-acme-web"},
        "spec": {"type": "Image", "image": "nginx:1.25"},
    }))
    .unwrap();
    obj.metadata.labels = labels;
    obj
}

#[test]
fn test_missing_labels_map_is_created() {
    let patch = managed_by_patch(&app_object(None)).unwrap();
    assert_eq!(
        serde_json::to_value(&patch).unwrap(),
        json!([{
            "op": "add",
            "path": "/metadata/labels",
            "value": {"app.kubeop.io/managed-by": "kubeop-admission"},
        }])
    );
}

#[test]
fn test_existing_labels_get_escaped_key() {
    let labels = BTreeMap::from([("team".to_string(), "web".to_string())]);
    let patch = managed_by_patch(&app_object(Some(labels))).unwrap();
    assert_eq!(
        serde_json::to_value(&patch).unwrap(),
        json!([{
            "op": "add",
            "path": "/metadata/labels/app.kubeop.io~1managed-by",
            "value": "kubeop-admission",
        }])
    );
}

#[test]
fn test_empty_labels_map_gets_key() {
    let patch = managed_by_patch(&app_object(Some(BTreeMap::new()))).unwrap();
    let value = serde_json::to_value(&patch).unwrap();
    assert_eq!(value[0]["path"], "/metadata/labels/app.kubeop.io~1managed-by");
}

#[test]
fn test_labelled_app_gets_no_patch() {
    let labels = BTreeMap::from([(
        "app.kubeop.io/managed-by".to_string(),
        "someone-else".to_string(),
    )]);
    assert!(managed_by_patch(&app_object(Some(labels))).is_none());
}

#[test]
fn test_patch_produces_labelled_object() {
    let obj = app_object(None);
    let patch = managed_by_patch(&obj).unwrap();
    let mut doc = serde_json::to_value(&obj).unwrap();
    json_patch::patch(&mut doc, &patch.0).unwrap();

    let patched: DynamicObject = serde_json::from_value(doc).unwrap();
    assert!(managed_by_patch(&patched).is_none());
}
