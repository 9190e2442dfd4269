// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Custom Resource Definitions (CRDs) for the kubeop platform.
//!
//! All resources live in the `paas.kubeop.io/v1alpha1` group. Reconcilers only
//! ever read `spec` and write `status`; the records themselves are created and
//! deleted by external actors.
//!
//! # Resource Types
//!
//! ## Tenancy
//!
//! - [`Tenant`] - Root of a tenancy (cluster-scoped)
//! - [`Project`] - A tenant's isolation boundary, backed by one namespace (cluster-scoped)
//!
//! ## Workloads
//!
//! - [`App`] - A workload deployed inside a project namespace
//! - [`DNSRecord`] - One external DNS binding
//! - [`Certificate`] - One external certificate issuance
//!
//! ## Declarative Policy
//!
//! - [`Policy`] - Egress baseline (cluster-scoped, schema only)
//! - [`Registry`] - Image registry credentials (schema only)
//!
//! # Example: Declaring a Project
//!
//! ```rust,no_run
//! use kubeop::crd::{Project, ProjectSpec};
//!
//! let project = Project::new(
//!     "acme-web",
//!     ProjectSpec {
//!         tenant_ref: "acme".to_string(),
//!         name: "web".to_string(),
//!     },
//! );
//! ```

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Condition represents an observation of a resource's current state.
///
/// At most one condition exists per `type` in a status; see
/// [`crate::reconcilers::status::ConditionLedger`].
#[derive(Clone, Debug, Serialize, Deserialize, Default, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    /// Type of condition. kubeop reports `Ready`.
    pub r#type: String,

    /// Status of the condition: True, False, or Unknown.
    pub status: String,

    /// Brief CamelCase reason for the condition's last transition.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,

    /// Human-readable message indicating details about the transition.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// Last time the condition was written (RFC3339 format).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_transition_time: Option<String>,
}

// ============================================================================
// Tenant
// ============================================================================

/// `Tenant` status
#[derive(Clone, Debug, Serialize, Deserialize, Default, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TenantStatus {
    #[serde(default)]
    pub ready: bool,
    #[serde(default)]
    pub conditions: Vec<Condition>,
}

#[derive(CustomResource, Clone, Debug, Serialize, Deserialize, Default, JsonSchema)]
#[kube(
    group = "paas.kubeop.io",
    version = "v1alpha1",
    kind = "Tenant",
    doc = "Tenant is the root of a tenancy. It has no external side effects; Projects reference it by name."
)]
#[kube(status = "TenantStatus")]
#[serde(rename_all = "camelCase")]
pub struct TenantSpec {
    /// Display name of the tenant.
    #[serde(default)]
    pub name: String,
}

// ============================================================================
// Project
// ============================================================================

/// `Project` status
#[derive(Clone, Debug, Serialize, Deserialize, Default, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProjectStatus {
    /// Namespace backing this project (`kubeop-{tenant}-{project}`).
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub namespace: String,
    #[serde(default)]
    pub ready: bool,
    #[serde(default)]
    pub conditions: Vec<Condition>,
}

#[derive(CustomResource, Clone, Debug, Serialize, Deserialize, Default, JsonSchema)]
#[kube(
    group = "paas.kubeop.io",
    version = "v1alpha1",
    kind = "Project",
    doc = "Project is a tenant's isolation boundary. The operator provisions one namespace per Project, seeded with a default LimitRange, ResourceQuota and NetworkPolicies."
)]
#[kube(status = "ProjectStatus")]
#[serde(rename_all = "camelCase")]
pub struct ProjectSpec {
    /// Name of the owning `Tenant`.
    #[serde(default)]
    pub tenant_ref: String,

    /// Project name, combined with `tenantRef` to derive the namespace.
    #[serde(default)]
    pub name: String,
}

// ============================================================================
// App
// ============================================================================

/// `App` status
#[derive(Clone, Debug, Serialize, Deserialize, Default, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AppStatus {
    #[serde(default)]
    pub ready: bool,
    /// Deterministic fingerprint of the deployed image.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub revision: String,
    #[serde(default)]
    pub conditions: Vec<Condition>,
}

#[derive(CustomResource, Clone, Debug, Serialize, Deserialize, Default, JsonSchema)]
#[kube(
    group = "paas.kubeop.io",
    version = "v1alpha1",
    kind = "App",
    namespaced,
    doc = "App declares a workload inside a project namespace. Apps of type Image are materialized as a single-replica Deployment with a hardened security profile."
)]
#[kube(status = "AppStatus")]
#[serde(rename_all = "camelCase")]
pub struct AppSpec {
    /// Kind of app. `Image` drives workload materialization.
    #[serde(default)]
    pub r#type: String,

    /// Container image reference (e.g. `docker.io/library/nginx:1.25`).
    #[serde(default)]
    pub image: String,

    /// External host name served by this app.
    #[serde(default)]
    pub host: String,
}

// ============================================================================
// DNSRecord
// ============================================================================

/// `DNSRecord` status
#[derive(Clone, Debug, Serialize, Deserialize, Default, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DNSRecordStatus {
    #[serde(default)]
    pub ready: bool,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub message: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<Condition>,
}

#[derive(CustomResource, Clone, Debug, Serialize, Deserialize, Default, JsonSchema)]
#[kube(
    group = "paas.kubeop.io",
    version = "v1alpha1",
    kind = "DNSRecord",
    namespaced,
    doc = "DNSRecord represents one external DNS binding from a host name to a target."
)]
#[kube(status = "DNSRecordStatus")]
#[serde(rename_all = "camelCase")]
pub struct DNSRecordSpec {
    /// Fully qualified host name.
    #[serde(default)]
    pub host: String,

    /// Address or canonical name the host resolves to.
    #[serde(default)]
    pub target: String,
}

// ============================================================================
// Certificate
// ============================================================================

/// `Certificate` status
#[derive(Clone, Debug, Serialize, Deserialize, Default, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CertificateStatus {
    #[serde(default)]
    pub ready: bool,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub message: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<Condition>,
}

#[derive(CustomResource, Clone, Debug, Serialize, Deserialize, Default, JsonSchema)]
#[kube(
    group = "paas.kubeop.io",
    version = "v1alpha1",
    kind = "Certificate",
    namespaced,
    doc = "Certificate represents one external certificate issuance for a host."
)]
#[kube(status = "CertificateStatus")]
#[serde(rename_all = "camelCase")]
pub struct CertificateSpec {
    /// Host name the certificate is issued for.
    #[serde(default)]
    pub host: String,

    /// Name of the `DNSRecord` that proves control of `host`.
    #[serde(default)]
    pub dns_record_ref: String,
}

// ============================================================================
// Policy & Registry
// ============================================================================

#[derive(CustomResource, Clone, Debug, Serialize, Deserialize, Default, JsonSchema)]
#[kube(
    group = "paas.kubeop.io",
    version = "v1alpha1",
    kind = "Policy",
    doc = "Policy declares the egress baseline for tenant namespaces. The admission gate currently resolves the baseline from its environment or the kubeop-policy ConfigMap."
)]
#[serde(rename_all = "camelCase")]
pub struct PolicySpec {
    /// CIDR blocks tenant egress rules may target.
    #[serde(default, rename = "egressAllowCIDRs")]
    pub egress_allow_cidrs: Vec<String>,
}

#[derive(CustomResource, Clone, Debug, Serialize, Deserialize, Default, JsonSchema)]
#[kube(
    group = "paas.kubeop.io",
    version = "v1alpha1",
    kind = "Registry",
    namespaced,
    doc = "Registry declares credentials for a private image registry."
)]
#[serde(rename_all = "camelCase")]
pub struct RegistrySpec {
    #[serde(default)]
    pub host: String,
    #[serde(default)]
    pub username: String,
    /// Name of the Secret holding the registry password.
    #[serde(default)]
    pub password_ref: String,
}
