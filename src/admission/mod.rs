// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Admission webhook.
//!
//! Two endpoints receive `AdmissionReview` requests from the API server:
//!
//! - `POST /mutate` - stamps the managed-by label on Apps ([`mutate`])
//! - `POST /validate` - tenancy and safety checks ([`validate`])
//!
//! A body that is not an `AdmissionReview` with a `request` is rejected with
//! HTTP 400. Everything else gets a review response echoing the request uid.
//! Validation runs under a deadline and denies when it expires.

pub mod cidr;
pub mod image;
pub mod mutate;
pub mod patch;
pub mod policy;
pub mod server;
pub mod tls;
pub mod validate;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use policy::{PolicyResolver, PolicySettings, ResolvedPolicy};

use crate::constants::SERVICE_ADMISSION;
use crate::health;
use crate::metrics::record_admission_decision;
use crate::store::ObjectStore;
use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use kube::api::DynamicObject;
use kube::core::admission::{AdmissionRequest, AdmissionResponse, AdmissionReview};
use kube::core::GroupVersionKind;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Denial message when validation misses its deadline.
pub const TIMEOUT_MESSAGE: &str = "admission evaluation timed out";

/// How a failed live namespace lookup is treated.
///
/// Applies to the App ownership check and the NetworkPolicy tenant check.
/// The Project tenant-existence check always denies on lookup failure.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum LookupFailurePolicy {
    /// Skip the check
    #[default]
    FailOpen,
    /// Deny the request
    FailClosed,
}

/// Transport-level failures, answered without a review.
#[derive(Debug, thiserror::Error)]
pub enum WebhookError {
    /// The body was not a usable admission review
    #[error("invalid admission review: {0}")]
    InvalidReview(String),
}

impl IntoResponse for WebhookError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            WebhookError::InvalidReview(_) => (StatusCode::BAD_REQUEST, self.to_string()),
        };
        (status, Json(serde_json::json!({"error": message}))).into_response()
    }
}

/// Shared state of the admission handlers.
pub struct AdmissionState<S> {
    pub store: S,
    pub policy: PolicyResolver,
    pub lookup_failure: LookupFailurePolicy,
    /// Deadline of one validating review
    pub timeout: Duration,
}

impl<S> AdmissionState<S> {
    #[must_use]
    pub fn new(store: S, policy: PolicyResolver, lookup_failure: LookupFailurePolicy, timeout: Duration) -> Self {
        Self {
            store,
            policy,
            lookup_failure,
            timeout,
        }
    }
}

/// Returns `true` when `gvk` is `group`/`kind`, comparing the kind
/// case-insensitively.
#[must_use]
pub fn is_kind(gvk: &GroupVersionKind, group: &str, kind: &str) -> bool {
    gvk.group == group && gvk.kind.eq_ignore_ascii_case(kind)
}

/// Decode a raw review body into its request.
///
/// # Errors
///
/// Returns [`WebhookError::InvalidReview`] for malformed JSON or a review
/// without a request.
pub fn decode_review(body: &[u8]) -> Result<AdmissionRequest<DynamicObject>, WebhookError> {
    let review: AdmissionReview<DynamicObject> =
        serde_json::from_slice(body).map_err(|e| WebhookError::InvalidReview(e.to_string()))?;
    let request: Result<AdmissionRequest<DynamicObject>, _> = review.try_into();
    request.map_err(|e| WebhookError::InvalidReview(e.to_string()))
}

fn decision(response: &AdmissionResponse, patched: bool) -> &'static str {
    if !response.allowed {
        "denied"
    } else if patched {
        "patched"
    } else {
        "allowed"
    }
}

async fn mutate_handler<S: ObjectStore>(
    State(_state): State<Arc<AdmissionState<S>>>,
    body: Bytes,
) -> Result<Json<AdmissionReview<DynamicObject>>, WebhookError> {
    let started = Instant::now();
    let req = decode_review(&body).inspect_err(|e| warn!(error = %e, "Rejecting mutate request"))?;

    let (response, patched) = mutate::mutate(&req);
    record_admission_decision("mutate", &req.kind.kind, decision(&response, patched), started.elapsed());
    debug!(uid = %req.uid, kind = %req.kind.kind, patched, "Mutate review answered");
    Ok(Json(response.into_review()))
}

async fn validate_handler<S: ObjectStore>(
    State(state): State<Arc<AdmissionState<S>>>,
    body: Bytes,
) -> Result<Json<AdmissionReview<DynamicObject>>, WebhookError> {
    let started = Instant::now();
    let req = decode_review(&body).inspect_err(|e| warn!(error = %e, "Rejecting validate request"))?;

    let response = match tokio::time::timeout(state.timeout, validate::validate(&state, &req)).await {
        Ok(response) => response,
        Err(_) => {
            warn!(uid = %req.uid, kind = %req.kind.kind, timeout_ms = state.timeout.as_millis(), "Validation deadline exceeded");
            AdmissionResponse::from(&req).deny(TIMEOUT_MESSAGE)
        }
    };
    record_admission_decision("validate", &req.kind.kind, decision(&response, false), started.elapsed());
    debug!(uid = %req.uid, kind = %req.kind.kind, allowed = response.allowed, "Validate review answered");
    Ok(Json(response.into_review()))
}

/// Webhook routes plus the health routes.
pub fn router<S: ObjectStore>(state: Arc<AdmissionState<S>>) -> Router {
    Router::new()
        .route("/mutate", post(mutate_handler::<S>))
        .route("/validate", post(validate_handler::<S>))
        .with_state(state)
        .merge(health::router(SERVICE_ADMISSION))
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod mod_tests;
