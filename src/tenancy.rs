// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Deterministic identity derivation shared by the reconcilers and the admission gate.
//!
//! A project namespace is named `kubeop-{tenant}-{project}` and labeled with
//! both identifiers. The Project reconciler creates it under that name and the
//! admission gate rejects Apps in namespaces that do not follow it.

use crate::constants::{
    NAMESPACE_PREFIX, REVISION_HEX_LEN, REVISION_TIMESTAMP_FORMAT, WORKLOAD_PREFIX,
};
use crate::labels::{PROJECT_LABEL, TENANT_LABEL};
use chrono::{DateTime, Utc};
use sha1::{Digest, Sha1};
use std::collections::BTreeMap;

/// Namespace backing the `(tenant, project)` pair, lower-cased.
///
/// # Example
///
/// ```rust
/// use kubeop::tenancy::project_namespace;
///
/// assert_eq!(project_namespace("acme", "web"), "kubeop-acme-web");
/// assert_eq!(project_namespace("Acme", "Web"), "kubeop-acme-web");
/// ```
#[must_use]
pub fn project_namespace(tenant: &str, project: &str) -> String {
    format!("{NAMESPACE_PREFIX}-{tenant}-{project}").to_lowercase()
}

/// Tenancy labels stamped on a project namespace.
#[must_use]
pub fn namespace_labels(tenant: &str, project: &str) -> BTreeMap<String, String> {
    BTreeMap::from([
        (TENANT_LABEL.to_string(), tenant.to_string()),
        (PROJECT_LABEL.to_string(), project.to_string()),
    ])
}

/// Returns `true` when `namespace` carries both tenancy labels and its name is
/// the one derived from them.
#[must_use]
pub fn is_owned_namespace(namespace: &str, labels: &BTreeMap<String, String>) -> bool {
    let tenant = labels.get(TENANT_LABEL).map(String::as_str).unwrap_or_default();
    let project = labels.get(PROJECT_LABEL).map(String::as_str).unwrap_or_default();
    if tenant.is_empty() || project.is_empty() {
        return false;
    }
    namespace == project_namespace(tenant, project)
}

/// Name of the workload materialized for an `App`.
#[must_use]
pub fn workload_name(app: &str) -> String {
    format!("{WORKLOAD_PREFIX}-{app}")
}

/// Content fingerprint of an image reference: the first 12 hex characters of
/// its SHA-1 digest.
#[must_use]
pub fn image_revision(image: &str) -> String {
    let mut hasher = Sha1::new();
    hasher.update(image.as_bytes());
    let mut digest = format!("{:x}", hasher.finalize());
    digest.truncate(REVISION_HEX_LEN);
    digest
}

/// Timestamp revision token (`YYYYMMDD-HHMMSS`, UTC).
#[must_use]
pub fn timestamp_revision(now: DateTime<Utc>) -> String {
    now.format(REVISION_TIMESTAMP_FORMAT).to_string()
}

#[cfg(test)]
#[path = "tenancy_tests.rs"]
mod tenancy_tests;
