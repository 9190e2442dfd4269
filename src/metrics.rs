// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Prometheus metrics for the kubeop control plane.
//!
//! All metrics carry the `kubeop_` prefix and are exposed on `/metrics` by
//! both the operator and the admission webhook.
//!
//! # Metrics Categories
//!
//! - **Reconciliation Metrics** - Outcomes and durations of reconciles
//! - **Resource Lifecycle Metrics** - Objects created and updated by reconcilers
//! - **Provisioner Metrics** - Notifications sent to external provisioners
//! - **Admission Metrics** - Decisions taken by the admission gate
//!
//! # Example
//!
//! ```rust,no_run
//! use kubeop::metrics::record_reconciliation_success;
//!
//! record_reconciliation_success("Project", std::time::Duration::from_millis(40));
//! ```

use prometheus::{CounterVec, Encoder, HistogramOpts, HistogramVec, Opts, Registry, TextEncoder};
use std::sync::LazyLock;
use std::time::Duration;

// ============================================================================
// Metric Name Constants
// ============================================================================

/// Namespace prefix for all kubeop metrics
const METRICS_NAMESPACE: &str = "kubeop";

const DURATION_BUCKETS: [f64; 10] = [0.001, 0.01, 0.1, 0.5, 1.0, 2.0, 5.0, 10.0, 30.0, 60.0];

// ============================================================================
// Global Metrics Registry
// ============================================================================

/// Global Prometheus metrics registry
pub static METRICS_REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

fn register_counter(name: &str, help: &str, labels: &[&str]) -> CounterVec {
    let opts = Opts::new(format!("{METRICS_NAMESPACE}_{name}"), help);
    let counter = CounterVec::new(opts, labels).expect("counter options are valid");
    METRICS_REGISTRY
        .register(Box::new(counter.clone()))
        .expect("counter is registered once");
    counter
}

fn register_histogram(name: &str, help: &str, labels: &[&str]) -> HistogramVec {
    let opts = HistogramOpts::new(format!("{METRICS_NAMESPACE}_{name}"), help)
        .buckets(DURATION_BUCKETS.to_vec());
    let histogram = HistogramVec::new(opts, labels).expect("histogram options are valid");
    METRICS_REGISTRY
        .register(Box::new(histogram.clone()))
        .expect("histogram is registered once");
    histogram
}

// ============================================================================
// Reconciliation Metrics
// ============================================================================

/// Total number of reconciliations by resource type and status
///
/// Labels:
/// - `resource_type`: Kind of resource (e.g., `App`, `Project`)
/// - `status`: Outcome (`success`, `error`, `requeue`)
pub static RECONCILIATION_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    register_counter(
        "reconciliations_total",
        "Total number of reconciliations by resource type and status",
        &["resource_type", "status"],
    )
});

/// Duration of reconciliations in seconds
pub static RECONCILIATION_DURATION_SECONDS: LazyLock<HistogramVec> = LazyLock::new(|| {
    register_histogram(
        "reconciliation_duration_seconds",
        "Duration of reconciliations in seconds by resource type",
        &["resource_type"],
    )
});

/// Total number of requeue operations
///
/// Labels:
/// - `resource_type`: Kind of resource
/// - `reason`: Reason for requeue (`error`, `dependency_wait`)
pub static REQUEUE_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    register_counter(
        "requeues_total",
        "Total number of requeue operations by resource type and reason",
        &["resource_type", "reason"],
    )
});

// ============================================================================
// Resource Lifecycle Metrics
// ============================================================================

/// Total number of cluster objects created by reconcilers
pub static RESOURCES_CREATED_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    register_counter(
        "resources_created_total",
        "Total number of resources created by type",
        &["resource_type"],
    )
});

/// Total number of cluster objects updated by reconcilers
pub static RESOURCES_UPDATED_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    register_counter(
        "resources_updated_total",
        "Total number of resources updated by type",
        &["resource_type"],
    )
});

// ============================================================================
// Provisioner Metrics
// ============================================================================

/// Total number of provisioner notifications by kind and outcome
///
/// Labels:
/// - `resource_type`: `DNSRecord` or `Certificate`
/// - `outcome`: `delivered`, `failed`, `skipped`
pub static PROVISIONER_NOTIFICATIONS_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    register_counter(
        "provisioner_notifications_total",
        "Total number of external provisioner notifications by kind and outcome",
        &["resource_type", "outcome"],
    )
});

// ============================================================================
// Admission Metrics
// ============================================================================

/// Total number of admission decisions
///
/// Labels:
/// - `endpoint`: `mutate` or `validate`
/// - `kind`: Kind of the reviewed object
/// - `decision`: `allowed`, `patched`, `denied`
pub static ADMISSION_DECISIONS_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    register_counter(
        "admission_decisions_total",
        "Total number of admission decisions by endpoint, kind and decision",
        &["endpoint", "kind", "decision"],
    )
});

/// Duration of admission reviews in seconds
pub static ADMISSION_DURATION_SECONDS: LazyLock<HistogramVec> = LazyLock::new(|| {
    register_histogram(
        "admission_duration_seconds",
        "Duration of admission reviews in seconds by endpoint",
        &["endpoint"],
    )
});

// ============================================================================
// Helper Functions
// ============================================================================

/// Record a successful reconciliation
pub fn record_reconciliation_success(resource_type: &str, duration: Duration) {
    RECONCILIATION_TOTAL
        .with_label_values(&[resource_type, "success"])
        .inc();
    RECONCILIATION_DURATION_SECONDS
        .with_label_values(&[resource_type])
        .observe(duration.as_secs_f64());
}

/// Record a failed reconciliation
pub fn record_reconciliation_error(resource_type: &str, duration: Duration) {
    RECONCILIATION_TOTAL
        .with_label_values(&[resource_type, "error"])
        .inc();
    RECONCILIATION_DURATION_SECONDS
        .with_label_values(&[resource_type])
        .observe(duration.as_secs_f64());
}

/// Record a requeue
///
/// # Arguments
/// * `resource_type` - The kind of resource reconciled
/// * `reason` - Reason for requeue (e.g., `error`, `dependency_wait`)
pub fn record_reconciliation_requeue(resource_type: &str, reason: &str) {
    RECONCILIATION_TOTAL
        .with_label_values(&[resource_type, "requeue"])
        .inc();
    REQUEUE_TOTAL
        .with_label_values(&[resource_type, reason])
        .inc();
}

/// Record resource creation
pub fn record_resource_created(resource_type: &str) {
    RESOURCES_CREATED_TOTAL
        .with_label_values(&[resource_type])
        .inc();
}

/// Record resource update
pub fn record_resource_updated(resource_type: &str) {
    RESOURCES_UPDATED_TOTAL
        .with_label_values(&[resource_type])
        .inc();
}

/// Record the outcome of a provisioner notification
pub fn record_provisioner_notification(resource_type: &str, outcome: &str) {
    PROVISIONER_NOTIFICATIONS_TOTAL
        .with_label_values(&[resource_type, outcome])
        .inc();
}

/// Record an admission decision and its latency
pub fn record_admission_decision(endpoint: &str, kind: &str, decision: &str, duration: Duration) {
    ADMISSION_DECISIONS_TOTAL
        .with_label_values(&[endpoint, kind, decision])
        .inc();
    ADMISSION_DURATION_SECONDS
        .with_label_values(&[endpoint])
        .observe(duration.as_secs_f64());
}

/// Gather all metrics in Prometheus text format
///
/// # Errors
///
/// Returns an error if the metrics cannot be encoded.
pub fn gather_metrics() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = METRICS_REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(format!("UTF-8 error: {e}")))
}

#[cfg(test)]
#[path = "metrics_tests.rs"]
mod metrics_tests;
