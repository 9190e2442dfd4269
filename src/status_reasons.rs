// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Condition reasons reported on kubeop resources.
//!
//! Reasons are programmatic identifiers in CamelCase that explain why the
//! `Ready` condition has its current status.
//!
//! # Example Status
//!
//! ```yaml
//! status:
//!   ready: false
//!   revision: 9b1b3b1f4c2a
//!   conditions:
//!     - type: Ready
//!       status: "False"
//!       reason: Progressing
//!       message: "Waiting for rollout"
//! ```

// ============================================================================
// Ready=True reasons
// ============================================================================

/// Tenant or Project initialized
pub const REASON_BOOTSTRAPPED: &str = "Bootstrapped";

/// App workload available
pub const REASON_CONVERGED: &str = "Converged";

/// External provisioner accepted the DNS record or certificate
pub const REASON_PROVISIONED: &str = "Provisioned";

// ============================================================================
// Ready=False reasons
// ============================================================================

/// Project namespace could not be created
pub const REASON_CREATE_FAILED: &str = "CreateFailed";

/// App workload exists but has no available replica yet
pub const REASON_PROGRESSING: &str = "Progressing";

/// External provisioner rejected or could not be reached
pub const REASON_PROVISION_FAILED: &str = "ProvisionFailed";

// ============================================================================
// Messages
// ============================================================================

/// Message of a ready Tenant
pub const MESSAGE_TENANT_READY: &str = "Tenant initialized";

/// Message of a ready Project
pub const MESSAGE_PROJECT_READY: &str = "Project namespace ready";

/// Message of a converged App
pub const MESSAGE_APP_CONVERGED: &str = "App reconciled";

/// Message of an App waiting for its rollout
pub const MESSAGE_APP_PROGRESSING: &str = "Waiting for rollout";
