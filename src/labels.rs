// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Label and annotation keys shared by the reconcilers and the admission gate.
//!
//! The tenancy labels are the only binding between a namespace and the
//! tenant/project pair that owns it, so every component reads them from here.

// ============================================================================
// Kubernetes Standard Labels
// https://kubernetes.io/docs/concepts/overview/working-with-objects/common-labels/
// ============================================================================

/// Standard label for the tool being used to manage the operation of an application
pub const K8S_MANAGED_BY: &str = "app.kubernetes.io/managed-by";

/// Standard label for the name of a higher-level application this one is part of
pub const K8S_PART_OF: &str = "app.kubernetes.io/part-of";

/// Value for `app.kubernetes.io/part-of` on every object kubeop creates
pub const PART_OF_KUBEOP: &str = "kubeop";

/// Value for `app.kubernetes.io/managed-by` on objects created by the operator
pub const MANAGED_BY_OPERATOR: &str = "kubeop-operator";

// ============================================================================
// Tenancy Labels
// ============================================================================

/// Tenant that owns a namespace
pub const TENANT_LABEL: &str = "app.kubeop.io/tenant";

/// Project that owns a namespace
pub const PROJECT_LABEL: &str = "app.kubeop.io/project";

/// Selector label of an `App` workload
pub const APP_LABEL: &str = "app.kubeop.io/app";

/// Label stamped on every `App` by the mutating webhook
pub const MANAGED_BY_LABEL: &str = "app.kubeop.io/managed-by";

// ============================================================================
// Annotations
// ============================================================================

/// Revision of the image currently rolled out by an `App` workload
pub const REVISION_ANNOTATION: &str = "app.kubeop.io/revision";
