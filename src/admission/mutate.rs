// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Mutating admission: stamps the managed-by label on Apps.

use crate::admission::is_kind;
use crate::admission::patch::PatchBuilder;
use crate::constants::{API_GROUP, KIND_APP, MANAGED_BY_ADMISSION};
use crate::labels::MANAGED_BY_LABEL;
use json_patch::Patch;
use kube::api::DynamicObject;
use kube::core::admission::{AdmissionRequest, AdmissionResponse};
use serde_json::{json, Value};
use tracing::{debug, error};

/// Patch adding the managed-by label, or `None` when it is already set.
///
/// A missing labels map is created whole; an existing one gets a single key.
#[must_use]
pub fn managed_by_patch(obj: &DynamicObject) -> Option<Patch> {
    let builder = match &obj.metadata.labels {
        None => PatchBuilder::new().add(
            &["metadata", "labels"],
            json!({ MANAGED_BY_LABEL: MANAGED_BY_ADMISSION }),
        ),
        Some(labels) if labels.contains_key(MANAGED_BY_LABEL) => return None,
        Some(_) => PatchBuilder::new().add(
            &["metadata", "labels", MANAGED_BY_LABEL],
            Value::String(MANAGED_BY_ADMISSION.to_string()),
        ),
    };
    builder.build()
}

/// Outcome of the mutating review and whether it carries a patch.
#[must_use]
pub fn mutate(req: &AdmissionRequest<DynamicObject>) -> (AdmissionResponse, bool) {
    let allow = AdmissionResponse::from(req);
    if !is_kind(&req.kind, API_GROUP, KIND_APP) {
        return (allow, false);
    }
    let Some(obj) = &req.object else {
        return (allow, false);
    };
    let Some(patch) = managed_by_patch(obj) else {
        debug!(uid = %req.uid, name = ?obj.metadata.name, "App already labelled");
        return (allow, false);
    };

    match allow.with_patch(patch) {
        Ok(response) => {
            debug!(uid = %req.uid, name = ?obj.metadata.name, "Adding managed-by label");
            (response, true)
        }
        Err(e) => {
            error!(uid = %req.uid, error = %e, "Failed to serialize patch");
            (
                AdmissionResponse::from(req).deny(format!("patch serialization error: {e}")),
                false,
            )
        }
    }
}

#[cfg(test)]
#[path = "mutate_tests.rs"]
mod mutate_tests;
