// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Admission policy resolution.
//!
//! Each policy key resolves independently, first match wins:
//!
//! 1. an explicit override (flag or environment variable)
//! 2. the `kubeop-system/kubeop-policy` ConfigMap, read live on every review
//! 3. unset
//!
//! | Key | Shape | Unset means |
//! |---|---|---|
//! | `KUBEOP_IMAGE_ALLOWLIST` | comma separated hosts | every registry allowed |
//! | `KUBEOP_EGRESS_BASELINE` | comma separated CIDRs | every ipBlock denied |
//! | `KUBEOP_QUOTA_MAX_REQUESTS_CPU` | quantity | no CPU cap |
//! | `KUBEOP_QUOTA_MAX_REQUESTS_MEMORY` | quantity | no memory cap |

use crate::admission::cidr::parse_cidrs;
use crate::constants::{
    POLICY_CONFIGMAP_NAME, POLICY_CONFIGMAP_NAMESPACE, POLICY_KEY_EGRESS_BASELINE,
    POLICY_KEY_IMAGE_ALLOWLIST, POLICY_KEY_QUOTA_MAX_CPU, POLICY_KEY_QUOTA_MAX_MEMORY,
};
use crate::store::{ObjectKey, ObjectStore};
use ipnet::IpNet;
use k8s_openapi::api::core::v1::ConfigMap;
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Explicit per-key overrides.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PolicySettings {
    pub image_allowlist: Option<String>,
    pub egress_baseline: Option<String>,
    pub quota_max_requests_cpu: Option<String>,
    pub quota_max_requests_memory: Option<String>,
}

/// Policy in effect for one review.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ResolvedPolicy {
    pub image_allowlist: Vec<String>,
    pub egress_baseline: Vec<IpNet>,
    pub quota_max_requests_cpu: Option<String>,
    pub quota_max_requests_memory: Option<String>,
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(ToString::to_string)
}

fn split_list(csv: &str) -> Vec<String> {
    csv.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
        .collect()
}

#[derive(Clone, Debug, Default)]
pub struct PolicyResolver {
    overrides: PolicySettings,
}

impl PolicyResolver {
    #[must_use]
    pub fn new(overrides: PolicySettings) -> Self {
        Self { overrides }
    }

    fn fully_overridden(&self) -> bool {
        let o = &self.overrides;
        [
            &o.image_allowlist,
            &o.egress_baseline,
            &o.quota_max_requests_cpu,
            &o.quota_max_requests_memory,
        ]
        .iter()
        .all(|v| non_empty(v.as_deref()).is_some())
    }

    async fn configmap_data<S: ObjectStore>(&self, store: &S) -> BTreeMap<String, String> {
        let key = ObjectKey::namespaced(POLICY_CONFIGMAP_NAMESPACE, POLICY_CONFIGMAP_NAME);
        match store.get::<ConfigMap>(&key).await {
            Ok(Some(cm)) => cm.data.unwrap_or_default(),
            Ok(None) => {
                debug!(configmap = %key, "No policy ConfigMap");
                BTreeMap::new()
            }
            Err(e) => {
                warn!(configmap = %key, error = %e, "Failed to read policy ConfigMap, treating as unset");
                BTreeMap::new()
            }
        }
    }

    /// Resolve every policy key.
    pub async fn resolve<S: ObjectStore>(&self, store: &S) -> ResolvedPolicy {
        let data = if self.fully_overridden() {
            BTreeMap::new()
        } else {
            self.configmap_data(store).await
        };
        let pick = |over: &Option<String>, key: &str| {
            non_empty(over.as_deref()).or_else(|| non_empty(data.get(key).map(String::as_str)))
        };

        let o = &self.overrides;
        ResolvedPolicy {
            image_allowlist: pick(&o.image_allowlist, POLICY_KEY_IMAGE_ALLOWLIST)
                .map(|v| split_list(&v))
                .unwrap_or_default(),
            egress_baseline: pick(&o.egress_baseline, POLICY_KEY_EGRESS_BASELINE)
                .map(|v| parse_cidrs(&v))
                .unwrap_or_default(),
            quota_max_requests_cpu: pick(&o.quota_max_requests_cpu, POLICY_KEY_QUOTA_MAX_CPU),
            quota_max_requests_memory: pick(
                &o.quota_max_requests_memory,
                POLICY_KEY_QUOTA_MAX_MEMORY,
            ),
        }
    }
}

#[cfg(test)]
#[path = "policy_tests.rs"]
mod policy_tests;
