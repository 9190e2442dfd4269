// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Reconciliation logic for the kubeop custom resources.
//!
//! Every reconciler is a level-triggered function of one object key: it
//! re-reads the object, recomputes the full desired state from its spec and
//! writes only what differs. The store's optimistic concurrency is the only
//! coordination between writers; a version conflict is returned as an error
//! and retried by the controller with backoff.
//!
//! # Outcomes
//!
//! | Outcome | Meaning | Controller effect |
//! |---|---|---|
//! | `Ok(Action::await_change())` | converged, or object gone | periodic resync only |
//! | `Ok(Action::requeue(d))` | waiting on a dependent object | re-check after `d`, no backoff |
//! | `Err(_)` | transient failure | retry with exponential backoff |
//!
//! # Available Reconcilers
//!
//! - [`reconcile_tenant`] - marks a Tenant ready
//! - [`reconcile_project`] - provisions the project namespace and its baselines
//! - [`reconcile_app`] - materializes the workload and gates readiness on rollout
//! - [`reconcile_dns_record`] - announces a `DNSRecord` to the DNS provisioner
//! - [`reconcile_certificate`] - announces a `Certificate` to the certificate provisioner
//!
//! # Example
//!
//! ```rust,no_run
//! use kubeop::context::{Context, ReconcileSettings};
//! use kubeop::reconcilers::reconcile_tenant;
//! use kubeop::store::KubeStore;
//!
//! async fn reconcile_acme(client: kube::Client) -> anyhow::Result<()> {
//!     let ctx = Context::new(KubeStore::new(client), ReconcileSettings::default());
//!     reconcile_tenant(&ctx, "acme").await?;
//!     Ok(())
//! }
//! ```

pub mod app;
pub mod backoff;
pub mod baseline;
pub mod project;
pub mod provisioner;
pub mod status;
pub mod tenant;
pub mod workload;

#[cfg(test)]
pub(crate) mod test_helpers;

#[cfg(test)]
mod backoff_tests;
#[cfg(test)]
mod status_tests;
#[cfg(test)]
mod workload_tests;

pub use app::reconcile_app;
pub use project::reconcile_project;
pub use provisioner::{reconcile_certificate, reconcile_dns_record};
pub use tenant::reconcile_tenant;
