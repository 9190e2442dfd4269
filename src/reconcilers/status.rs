// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Status condition helpers for kubeop resources.
//!
//! # Condition Ledger
//!
//! A status holds at most one condition per `type`. [`ConditionLedger`] keeps
//! conditions in a type-keyed map that preserves the order in which each type
//! first appeared; writing an existing type replaces it in place. Every write
//! stamps a fresh `lastTransitionTime`.
//!
//! # Write Suppression
//!
//! Reconcilers compute the full desired status on every pass and persist it
//! only when it differs semantically from the stored one ([`StatusEq`]), so a
//! repeated reconcile of an unchanged object issues no write at all.
//!
//! # Example
//!
//! ```rust
//! use kubeop::reconcilers::status::ConditionLedger;
//!
//! let mut ledger = ConditionLedger::default();
//! ledger.upsert("Ready", "False", "Progressing", "Waiting for rollout");
//! ledger.upsert("Ready", "True", "Converged", "App reconciled");
//!
//! let conditions = ledger.into_conditions();
//! assert_eq!(conditions.len(), 1);
//! assert_eq!(conditions[0].status, "True");
//! ```

use crate::crd::{
    AppStatus, CertificateStatus, Condition, DNSRecordStatus, ProjectStatus, TenantStatus,
};
use crate::store::{ObjectKey, ObjectStore, StoreError, StoreResource};
use chrono::Utc;
use indexmap::IndexMap;
use kube::core::object::HasStatus;
use tracing::debug;

/// Create a new condition stamped with the current time.
#[must_use]
pub fn create_condition(
    condition_type: &str,
    status: &str,
    reason: &str,
    message: &str,
) -> Condition {
    Condition {
        r#type: condition_type.to_string(),
        status: status.to_string(),
        reason: Some(reason.to_string()),
        message: Some(message.to_string()),
        last_transition_time: Some(Utc::now().to_rfc3339()),
    }
}

/// Find a condition by type in a list of conditions.
#[must_use]
pub fn find_condition<'a>(
    conditions: &'a [Condition],
    condition_type: &str,
) -> Option<&'a Condition> {
    conditions.iter().find(|c| c.r#type == condition_type)
}

/// Ordered, type-keyed set of conditions with upsert semantics.
#[derive(Clone, Debug, Default)]
pub struct ConditionLedger {
    entries: IndexMap<String, Condition>,
}

impl ConditionLedger {
    /// Build a ledger from stored conditions.
    ///
    /// A type repeated in the input keeps its first position and its last value.
    #[must_use]
    pub fn from_conditions(conditions: &[Condition]) -> Self {
        let mut entries = IndexMap::with_capacity(conditions.len());
        for condition in conditions {
            entries.insert(condition.r#type.clone(), condition.clone());
        }
        Self { entries }
    }

    /// Insert or replace the condition of `condition_type`.
    pub fn upsert(&mut self, condition_type: &str, status: &str, reason: &str, message: &str) {
        self.entries.insert(
            condition_type.to_string(),
            create_condition(condition_type, status, reason, message),
        );
    }

    #[must_use]
    pub fn get(&self, condition_type: &str) -> Option<&Condition> {
        self.entries.get(condition_type)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Conditions in first-seen order.
    #[must_use]
    pub fn into_conditions(self) -> Vec<Condition> {
        self.entries.into_values().collect()
    }
}

/// Upsert one condition into a stored condition list.
#[must_use]
pub fn with_condition(
    conditions: &[Condition],
    condition_type: &str,
    status: &str,
    reason: &str,
    message: &str,
) -> Vec<Condition> {
    let mut ledger = ConditionLedger::from_conditions(conditions);
    ledger.upsert(condition_type, status, reason, message);
    ledger.into_conditions()
}

/// Compare two condition lists ignoring `lastTransitionTime`.
///
/// Order matters: a reordered list is a different status.
#[must_use]
pub fn conditions_equal(current: &[Condition], new: &[Condition]) -> bool {
    current.len() == new.len()
        && current.iter().zip(new).all(|(a, b)| {
            a.r#type == b.r#type
                && a.status == b.status
                && a.reason == b.reason
                && a.message == b.message
        })
}

/// Semantic equality of a status, ignoring condition timestamps.
pub trait StatusEq {
    fn status_eq(&self, other: &Self) -> bool;
}

impl StatusEq for TenantStatus {
    fn status_eq(&self, other: &Self) -> bool {
        self.ready == other.ready && conditions_equal(&self.conditions, &other.conditions)
    }
}

impl StatusEq for ProjectStatus {
    fn status_eq(&self, other: &Self) -> bool {
        self.ready == other.ready
            && self.namespace == other.namespace
            && conditions_equal(&self.conditions, &other.conditions)
    }
}

impl StatusEq for AppStatus {
    fn status_eq(&self, other: &Self) -> bool {
        self.ready == other.ready
            && self.revision == other.revision
            && conditions_equal(&self.conditions, &other.conditions)
    }
}

impl StatusEq for DNSRecordStatus {
    fn status_eq(&self, other: &Self) -> bool {
        self.ready == other.ready
            && self.message == other.message
            && conditions_equal(&self.conditions, &other.conditions)
    }
}

impl StatusEq for CertificateStatus {
    fn status_eq(&self, other: &Self) -> bool {
        self.ready == other.ready
            && self.message == other.message
            && conditions_equal(&self.conditions, &other.conditions)
    }
}

/// Persist `desired` as the status of `obj` unless it is semantically equal
/// to the stored status.
///
/// The write is version-checked against `obj`; a concurrent modification
/// surfaces as [`StoreError::Conflict`].
///
/// Returns `true` when a write was issued.
///
/// # Errors
///
/// Returns the store error of the status write.
pub async fn update_status<S, K>(store: &S, obj: &K, desired: K::Status) -> Result<bool, StoreError>
where
    S: ObjectStore,
    K: StoreResource + HasStatus,
    K::Status: StatusEq + Send,
{
    if obj
        .status()
        .is_some_and(|current| current.status_eq(&desired))
    {
        debug!(
            kind = %K::kind(&()),
            key = %ObjectKey::of(obj),
            "Status unchanged, skipping update"
        );
        return Ok(false);
    }

    let mut updated = obj.clone();
    *updated.status_mut() = Some(desired);
    store.replace_status(&updated).await?;
    Ok(true)
}
