// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Notifications to external provisioners.
//!
//! `DNSRecord` and `Certificate` reconcilers announce each object to an
//! external provisioner with a plain JSON `POST`. Whether a failed delivery
//! matters is a [`NotifyPolicy`] chosen at startup, not at the call site:
//!
//! - [`NotifyPolicy::BestEffort`] - failures and non-2xx responses are logged
//!   and ignored; the object is reported ready regardless
//! - [`NotifyPolicy::MustSucceed`] - failures surface as [`NotifyError`] so the
//!   reconciler can report `Ready=False` and retry with backoff

use serde::Serialize;
use tracing::{debug, warn};
use url::Url;

/// How a failed notification is treated.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum NotifyPolicy {
    /// Ignore delivery failures
    #[default]
    BestEffort,
    /// Propagate delivery failures to the caller
    MustSucceed,
}

/// Delivery failure under [`NotifyPolicy::MustSucceed`].
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} responded with HTTP {status}")]
    Status { url: String, status: u16 },
}

/// Result of a notification that did not fail the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    /// The provisioner answered with a 2xx status
    Delivered,
    /// No endpoint is configured
    Skipped,
    /// Delivery failed and the policy ignores failures
    Ignored(String),
}

/// Client for one provisioner endpoint.
#[derive(Clone, Debug)]
pub struct Notifier {
    http: reqwest::Client,
    endpoint: Option<Url>,
    policy: NotifyPolicy,
}

impl Notifier {
    #[must_use]
    pub fn new(http: reqwest::Client, endpoint: Option<Url>, policy: NotifyPolicy) -> Self {
        Self {
            http,
            endpoint,
            policy,
        }
    }

    /// Notifier without an endpoint; every call is [`Delivery::Skipped`].
    #[must_use]
    pub fn disabled() -> Self {
        Self::new(reqwest::Client::new(), None, NotifyPolicy::BestEffort)
    }

    #[must_use]
    pub fn policy(&self) -> NotifyPolicy {
        self.policy
    }

    /// Full URL of `path` under the configured endpoint.
    #[must_use]
    pub fn url_for(&self, path: &str) -> Option<String> {
        self.endpoint
            .as_ref()
            .map(|base| format!("{}{path}", base.as_str().trim_end_matches('/')))
    }

    /// POST `payload` as JSON to `path` under the endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`NotifyError`] only under [`NotifyPolicy::MustSucceed`].
    pub async fn notify<T: Serialize + ?Sized>(
        &self,
        path: &str,
        payload: &T,
    ) -> Result<Delivery, NotifyError> {
        let Some(url) = self.url_for(path) else {
            debug!(path, "No provisioner endpoint configured, skipping notification");
            return Ok(Delivery::Skipped);
        };

        let outcome = match self.http.post(&url).json(payload).send().await {
            Ok(response) if response.status().is_success() => {
                debug!(url = %url, status = %response.status(), "Provisioner notified");
                return Ok(Delivery::Delivered);
            }
            Ok(response) => NotifyError::Status {
                url,
                status: response.status().as_u16(),
            },
            Err(source) => NotifyError::Request { url, source },
        };

        match self.policy {
            NotifyPolicy::BestEffort => {
                warn!(error = %outcome, "Provisioner notification failed, ignoring");
                Ok(Delivery::Ignored(outcome.to_string()))
            }
            NotifyPolicy::MustSucceed => Err(outcome),
        }
    }
}

#[cfg(test)]
#[path = "notify_tests.rs"]
mod notify_tests;
