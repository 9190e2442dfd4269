// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Liveness, readiness, version and metrics endpoints.
//!
//! Both processes serve the same four routes:
//!
//! - `GET /healthz` - 200 while the process runs
//! - `GET /readyz` - 200 once the listener is up
//! - `GET /version` - `{"service": ..., "version": ...}`
//! - `GET /metrics` - Prometheus text exposition

use crate::metrics::gather_metrics;
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use tracing::error;

#[derive(Debug, Clone, Serialize, serde::Deserialize, PartialEq, Eq)]
pub struct VersionInfo {
    pub service: String,
    pub version: String,
}

async fn ok() -> StatusCode {
    StatusCode::OK
}

async fn version(State(service): State<&'static str>) -> Json<VersionInfo> {
    Json(VersionInfo {
        service: service.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

async fn metrics() -> Response {
    match gather_metrics() {
        Ok(body) => (
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            body,
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "Failed to encode metrics");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// Health routes for `service`, mergeable into any router.
pub fn router<S>(service: &'static str) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    Router::new()
        .route("/healthz", get(ok))
        .route("/readyz", get(ok))
        .route("/version", get(version))
        .route("/metrics", get(metrics))
        .with_state(service)
}

#[cfg(test)]
#[path = "health_tests.rs"]
mod health_tests;
