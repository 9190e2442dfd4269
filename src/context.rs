// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Shared context for all controllers.
//!
//! One [`Context`] is built at process start, before any controller runs, and
//! handed to every reconciler behind an `Arc`. It holds:
//! - the cluster store handle
//! - the provisioner notifiers for `DNSRecord` and `Certificate`
//! - reconcile tuning knobs
//! - the per-object error backoff counters

use crate::constants::{APP_READINESS_REQUEUE, DEFAULT_RECONCILE_TIMEOUT_SECS, RESYNC_INTERVAL};
use crate::notify::Notifier;
use crate::reconcilers::backoff::BackoffTracker;
use std::time::Duration;

/// Tuning knobs read by the reconcilers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReconcileSettings {
    /// Synthetic delay at the top of every App reconcile (load testing only).
    pub app_reconcile_delay: Option<Duration>,

    /// Re-check delay while an App waits for its rollout.
    pub readiness_requeue: Duration,

    /// Requeue delay of a converged object.
    pub resync_interval: Duration,

    /// Deadline of a single reconcile.
    pub reconcile_timeout: Duration,
}

impl Default for ReconcileSettings {
    fn default() -> Self {
        Self {
            app_reconcile_delay: None,
            readiness_requeue: APP_READINESS_REQUEUE,
            resync_interval: RESYNC_INTERVAL,
            reconcile_timeout: Duration::from_secs(DEFAULT_RECONCILE_TIMEOUT_SECS),
        }
    }
}

/// Shared context passed to all controllers.
pub struct Context<S> {
    /// Cluster store for all reads and writes
    pub store: S,

    /// Notifier for the DNS provisioner
    pub dns_notifier: Notifier,

    /// Notifier for the certificate provisioner
    pub cert_notifier: Notifier,

    pub settings: ReconcileSettings,

    /// Error backoff per object key
    pub backoff: BackoffTracker,
}

impl<S> Context<S> {
    #[must_use]
    pub fn new(store: S, settings: ReconcileSettings) -> Self {
        Self {
            store,
            dns_notifier: Notifier::disabled(),
            cert_notifier: Notifier::disabled(),
            settings,
            backoff: BackoffTracker::default(),
        }
    }

    #[must_use]
    pub fn with_notifiers(mut self, dns: Notifier, cert: Notifier) -> Self {
        self.dns_notifier = dns;
        self.cert_notifier = cert;
        self
    }

    #[must_use]
    pub fn with_backoff(mut self, backoff: BackoffTracker) -> Self {
        self.backoff = backoff;
        self
    }
}
