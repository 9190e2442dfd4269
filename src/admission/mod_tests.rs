// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for the admission router

use super::*;
use crate::admission::test_helpers::{
    app_object, review_json, state_with, store_with_tenant_namespace, TEST_UID,
};
use crate::store::{ObjectKey, StoreError, StoreResource};
use async_trait::async_trait;
use axum::body::Body;
use axum::http::Request;
use serde_json::{json, Value};
use tower::ServiceExt;

const NS: &str = "kubeop-acme-web";

async fn post(app: Router, path: &str, body: Vec<u8>) -> (StatusCode, Value) {
    let response = app
        .oneshot(
            Request::post(path)
                .header("content-type", "application/json")
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), 1 << 20)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

fn app_router(settings: PolicySettings) -> Router {
    router(Arc::new(state_with(store_with_tenant_namespace(), settings)))
}

fn app_review(object: Value) -> Vec<u8> {
    serde_json::to_vec(&review_json("paas.kubeop.io", "App", "CREATE", Some(NS), object)).unwrap()
}

#[tokio::test]
async fn test_mutate_returns_json_patch() {
    let (status, body) = post(
        app_router(PolicySettings::default()),
        "/mutate",
        app_review(app_object(NS, "nginx:1.25")),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let response = &body["response"];
    assert_eq!(response["uid"], TEST_UID);
    assert_eq!(response["allowed"], true);
    assert_eq!(response["patchType"], "JSONPatch");

    // The patch travels as the serialized bytes of the operation list
    let bytes: Vec<u8> = serde_json::from_value(response["patch"].clone()).unwrap();
    let operations: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(
        operations,
        json!([{
            "op": "add",
            "path": "/metadata/labels",
            "value": {"app.kubeop.io/managed-by": "kubeop-admission"},
        }])
    );
}

#[tokio::test]
async fn test_mutate_labelled_app_has_no_patch() {
    let mut object = app_object(NS, "nginx:1.25");
    object["metadata"]["labels"] = json!({"app.kubeop.io/managed-by": "kubeop-admission"});

    let (status, body) = post(
        app_router(PolicySettings::default()),
        "/mutate",
        app_review(object),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["response"]["allowed"], true);
    assert!(body["response"].get("patch").is_none_or(Value::is_null));
}

#[tokio::test]
async fn test_validate_denial_carries_message() {
    let settings = PolicySettings {
        image_allowlist: Some("docker.io".into()),
        ..Default::default()
    };
    let (status, body) = post(
        app_router(settings),
        "/validate",
        app_review(app_object(NS, "evil.io/forbidden:latest")),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let response = &body["response"];
    assert_eq!(response["uid"], TEST_UID);
    assert_eq!(response["allowed"], false);
    assert_eq!(response["status"]["message"], "registry evil.io is not allowed");
}

#[tokio::test]
async fn test_malformed_body_is_bad_request() {
    for path in ["/mutate", "/validate"] {
        let (status, body) = post(
            app_router(PolicySettings::default()),
            path,
            b"{not json".to_vec(),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let message = body["error"].as_str().unwrap();
        assert!(
            message.starts_with("invalid admission review: "),
            "unexpected error body: {message}"
        );
    }
}

#[tokio::test]
async fn test_review_without_request_is_bad_request() {
    let body = serde_json::to_vec(&json!({
        "apiVersion": "admission.k8s.io/v1",
        "kind": "AdmissionReview",
    }))
    .unwrap();
    let (status, _) = post(app_router(PolicySettings::default()), "/validate", body).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_health_routes_are_merged() {
    let app = app_router(PolicySettings::default());
    let response = app
        .oneshot(Request::get("/version").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), 1 << 20)
        .await
        .unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["service"], "admission");
}

/// Store whose reads never finish in time.
struct StalledStore;

#[async_trait]
impl ObjectStore for StalledStore {
    async fn get<K: StoreResource>(&self, _key: &ObjectKey) -> Result<Option<K>, StoreError> {
        tokio::time::sleep(Duration::from_secs(30)).await;
        Ok(None)
    }

    async fn create<K: StoreResource>(&self, obj: &K) -> Result<K, StoreError> {
        Ok(obj.clone())
    }

    async fn replace<K: StoreResource>(&self, obj: &K) -> Result<K, StoreError> {
        Ok(obj.clone())
    }

    async fn replace_status<K: StoreResource>(&self, obj: &K) -> Result<K, StoreError> {
        Ok(obj.clone())
    }
}

#[tokio::test]
async fn test_validation_deadline_denies() {
    let state = AdmissionState::new(
        StalledStore,
        PolicyResolver::default(),
        LookupFailurePolicy::FailOpen,
        Duration::from_millis(50),
    );
    let (status, body) = post(
        router(Arc::new(state)),
        "/validate",
        app_review(app_object(NS, "nginx:1.25")),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["response"]["allowed"], false);
    assert_eq!(body["response"]["status"]["message"], TIMEOUT_MESSAGE);
}

#[tokio::test]
async fn test_mutate_ignores_store() {
    // mutation never reads the store, so a stalled store does not delay it
    let state = AdmissionState::new(
        StalledStore,
        PolicyResolver::default(),
        LookupFailurePolicy::FailOpen,
        Duration::from_millis(50),
    );
    let (status, body) = post(
        router(Arc::new(state)),
        "/mutate",
        app_review(app_object(NS, "nginx:1.25")),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["response"]["patchType"], "JSONPatch");
}
