// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Global constants for the kubeop control plane.
//!
//! This module contains the numeric and string constants shared by the
//! reconcilers and the admission gate. Constants are organized by category.

use std::time::Duration;

// ============================================================================
// API Constants
// ============================================================================

/// API group for all kubeop CRDs
pub const API_GROUP: &str = "paas.kubeop.io";

/// API version for all kubeop CRDs
pub const API_VERSION: &str = "v1alpha1";

/// Fully qualified API version (group/version)
pub const API_GROUP_VERSION: &str = "paas.kubeop.io/v1alpha1";

/// Kind name for `Tenant` resource
pub const KIND_TENANT: &str = "Tenant";

/// Kind name for `Project` resource
pub const KIND_PROJECT: &str = "Project";

/// Kind name for `App` resource
pub const KIND_APP: &str = "App";

/// Kind name for `DNSRecord` resource
pub const KIND_DNS_RECORD: &str = "DNSRecord";

/// Kind name for `Certificate` resource
pub const KIND_CERTIFICATE: &str = "Certificate";

/// Kind name for `Policy` resource
pub const KIND_POLICY: &str = "Policy";

/// Kind name for `Registry` resource
pub const KIND_REGISTRY: &str = "Registry";

/// API group of `NetworkPolicy`
pub const NETWORKING_API_GROUP: &str = "networking.k8s.io";

/// Kind name of `NetworkPolicy`
pub const KIND_NETWORK_POLICY: &str = "NetworkPolicy";

/// Kind name of `ResourceQuota` (core group)
pub const KIND_RESOURCE_QUOTA: &str = "ResourceQuota";

// ============================================================================
// Condition Constants
// ============================================================================

/// Condition type reported by every reconciler
pub const CONDITION_TYPE_READY: &str = "Ready";

/// Condition status `True`
pub const CONDITION_STATUS_TRUE: &str = "True";

/// Condition status `False`
pub const CONDITION_STATUS_FALSE: &str = "False";

// ============================================================================
// Tenancy Constants
// ============================================================================

/// Prefix of every project namespace (`kubeop-{tenant}-{project}`)
pub const NAMESPACE_PREFIX: &str = "kubeop";

/// Prefix of the workload created for an `App` (`app-{name}`)
pub const WORKLOAD_PREFIX: &str = "app";

/// App type that materializes a workload
pub const APP_TYPE_IMAGE: &str = "Image";

/// Number of hex characters kept from the image digest
pub const REVISION_HEX_LEN: usize = 12;

/// `chrono` format of the timestamp revision token (UTC)
pub const REVISION_TIMESTAMP_FORMAT: &str = "%Y%m%d-%H%M%S";

// ============================================================================
// Project Baseline Constants
// ============================================================================

/// Name of the default `LimitRange` in every project namespace
pub const LIMIT_RANGE_NAME: &str = "kubeop-defaults";

/// Name of the default `ResourceQuota` in every project namespace
pub const RESOURCE_QUOTA_NAME: &str = "kubeop-quota";

/// Name of the egress default-deny `NetworkPolicy`
pub const EGRESS_POLICY_NAME: &str = "kubeop-egress";

/// Name of the same-namespace ingress `NetworkPolicy`
pub const INGRESS_POLICY_NAME: &str = "kubeop-ingress";

/// Default container CPU request
pub const DEFAULT_REQUEST_CPU: &str = "100m";

/// Default container memory request
pub const DEFAULT_REQUEST_MEMORY: &str = "64Mi";

/// Default container CPU limit
pub const DEFAULT_LIMIT_CPU: &str = "500m";

/// Default container memory limit
pub const DEFAULT_LIMIT_MEMORY: &str = "256Mi";

/// Pod count cap of the baseline quota
pub const QUOTA_PODS: &str = "10";

/// CPU request cap of the baseline quota
pub const QUOTA_REQUESTS_CPU: &str = "1";

/// Memory request cap of the baseline quota
pub const QUOTA_REQUESTS_MEMORY: &str = "1Gi";

// ============================================================================
// Workload Constants
// ============================================================================

/// Replica count of an `App` workload
pub const APP_REPLICAS: i32 = 1;

/// Name of the single container in an `App` workload
pub const APP_CONTAINER_NAME: &str = "app";

/// Container port exposed by an `App` workload
pub const APP_CONTAINER_PORT: i32 = 80;

/// Seccomp profile type applied to every `App` workload
pub const SECCOMP_RUNTIME_DEFAULT: &str = "RuntimeDefault";

// ============================================================================
// Controller Timing Constants
// ============================================================================

/// Re-check delay while an `App` waits for its rollout
pub const APP_READINESS_REQUEUE: Duration = Duration::from_secs(5);

/// Periodic resync of a converged object
pub const RESYNC_INTERVAL: Duration = Duration::from_secs(300);

/// Initial error backoff
pub const BACKOFF_INITIAL: Duration = Duration::from_secs(1);

/// Error backoff cap
pub const BACKOFF_MAX: Duration = Duration::from_secs(300);

/// Error backoff growth factor
pub const BACKOFF_MULTIPLIER: f64 = 2.0;

/// Randomization factor applied to error backoff (±10%)
pub const BACKOFF_JITTER: f64 = 0.1;

/// Default per-reconcile deadline in seconds
pub const DEFAULT_RECONCILE_TIMEOUT_SECS: u64 = 30;

/// Debounce applied by the controller queue
pub const CONTROLLER_DEBOUNCE: Duration = Duration::from_millis(500);

// ============================================================================
// Provisioner Constants
// ============================================================================

/// Path appended to the DNS provisioner endpoint
pub const DNS_RECORDS_PATH: &str = "/v1/dnsrecords";

/// Path appended to the certificate provisioner endpoint
pub const CERTIFICATES_PATH: &str = "/v1/certificates";

/// Status message of a provisioned `DNSRecord`
pub const DNS_RECORD_READY_MESSAGE: &str = "mocked";

/// Status message of an issued `Certificate`
pub const CERTIFICATE_READY_MESSAGE: &str = "issued";

/// Timeout of a single provisioner request
pub const PROVISIONER_TIMEOUT: Duration = Duration::from_secs(5);

// ============================================================================
// Admission Constants
// ============================================================================

/// Value of the managed-by label stamped on every `App`
pub const MANAGED_BY_ADMISSION: &str = "kubeop-admission";

/// Registry assumed for image references without a host segment
pub const DEFAULT_REGISTRY_HOST: &str = "docker.io";

/// Namespace of the cluster policy `ConfigMap`
pub const POLICY_CONFIGMAP_NAMESPACE: &str = "kubeop-system";

/// Name of the cluster policy `ConfigMap`
pub const POLICY_CONFIGMAP_NAME: &str = "kubeop-policy";

/// Policy key: image registry allow-list
pub const POLICY_KEY_IMAGE_ALLOWLIST: &str = "KUBEOP_IMAGE_ALLOWLIST";

/// Policy key: egress baseline CIDRs
pub const POLICY_KEY_EGRESS_BASELINE: &str = "KUBEOP_EGRESS_BASELINE";

/// Policy key: maximum `requests.cpu` of a quota
pub const POLICY_KEY_QUOTA_MAX_CPU: &str = "KUBEOP_QUOTA_MAX_REQUESTS_CPU";

/// Policy key: maximum `requests.memory` of a quota
pub const POLICY_KEY_QUOTA_MAX_MEMORY: &str = "KUBEOP_QUOTA_MAX_REQUESTS_MEMORY";

/// Default deadline of a single admission review in milliseconds
pub const DEFAULT_ADMISSION_TIMEOUT_MS: u64 = 2500;

// ============================================================================
// Admission TLS Bootstrap Constants
// ============================================================================

/// Namespace holding the webhook Service and its TLS Secret
pub const ADMISSION_NAMESPACE: &str = "kubeop-system";

/// Service fronting the webhook; the serving certificate covers its DNS names
pub const ADMISSION_SERVICE_NAME: &str = "kubeop-admission";

/// Secret storing the self-signed CA and serving certificate
pub const ADMISSION_TLS_SECRET_NAME: &str = "kubeop-admission-tls";

/// Name of both the mutating and the validating webhook configuration
pub const ADMISSION_WEBHOOK_CONFIG_NAME: &str = "kubeop-admission-webhook";

/// Common name of the self-signed CA
pub const ADMISSION_CA_COMMON_NAME: &str = "kubeop-admission-ca";

/// Validity of the self-signed CA and serving certificate in days
pub const ADMISSION_CERT_VALIDITY_DAYS: i64 = 365;

/// Backdating of `notBefore` to tolerate clock skew, in hours
pub const ADMISSION_CERT_BACKDATE_HOURS: i64 = 1;

// ============================================================================
// Server Constants
// ============================================================================

/// Default listen address of the admission webhook
pub const DEFAULT_ADMISSION_ADDR: &str = "0.0.0.0:8443";

/// Default listen address of the operator health/metrics server
pub const DEFAULT_OPERATOR_HEALTH_ADDR: &str = "0.0.0.0:8082";

/// Service name reported by `/version` for the operator
pub const SERVICE_OPERATOR: &str = "operator";

/// Service name reported by `/version` for the admission webhook
pub const SERVICE_ADMISSION: &str = "admission";

// ============================================================================
// Runtime Constants
// ============================================================================

/// Number of tokio worker threads
pub const TOKIO_WORKER_THREADS: usize = 4;
