// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! # kubeop - multi-tenant platform control plane for Kubernetes
//!
//! kubeop turns a few high level custom resources into isolated tenant
//! environments. It ships as one binary with two roles.
//!
//! The **operator** reconciles:
//! - `Tenant` readiness
//! - `Project` namespaces and their security baseline
//! - `App` Deployments
//! - `DNSRecord` and `Certificate` provisioning through HTTP provisioners
//!
//! The **admission** webhook defaults and validates tenant workloads and
//! guardrail objects before they are stored.
//!
//! ## Modules
//!
//! - [`crd`] - Custom Resource Definition types
//! - [`reconcilers`] - Reconciliation logic for each resource type
//! - [`admission`] - Mutating and validating webhook
//! - [`store`] - Cluster access seam used by reconcilers and the webhook
//! - [`operator`] - Controller runtime
//! - [`tenancy`] - Namespace and revision naming rules
//!
//! ## Example
//!
//! ```rust
//! use kubeop::tenancy::project_namespace;
//!
//! assert_eq!(project_namespace("Acme", "Web"), "kubeop-acme-web");
//! ```

pub mod admission;
pub mod config;
pub mod constants;
pub mod context;
pub mod crd;
pub mod health;
pub mod http;
pub mod labels;
pub mod metrics;
pub mod notify;
pub mod operator;
pub mod quantity;
pub mod reconcilers;
pub mod status_reasons;
pub mod store;
pub mod tenancy;
