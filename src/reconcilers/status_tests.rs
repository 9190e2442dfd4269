// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `status.rs`

#[cfg(test)]
mod tests {
    use crate::crd::{AppStatus, Condition, ProjectStatus};
    use crate::reconcilers::status::{
        conditions_equal, create_condition, find_condition, with_condition, ConditionLedger,
        StatusEq,
    };

    const CONDITION_TYPE_READY: &str = "Ready";
    const STATUS_TRUE: &str = "True";
    const STATUS_FALSE: &str = "False";

    fn stamped(condition_type: &str, status: &str, reason: &str, at: &str) -> Condition {
        Condition {
            r#type: condition_type.into(),
            status: status.into(),
            reason: Some(reason.into()),
            message: Some(format!("{reason} message")),
            last_transition_time: Some(at.into()),
        }
    }

    #[test]
    fn test_create_condition_basic() {
        let condition = create_condition(CONDITION_TYPE_READY, STATUS_TRUE, "Converged", "ok");

        assert_eq!(condition.r#type, CONDITION_TYPE_READY);
        assert_eq!(condition.status, STATUS_TRUE);
        assert_eq!(condition.reason.as_deref(), Some("Converged"));
        assert_eq!(condition.message.as_deref(), Some("ok"));
        assert!(condition.last_transition_time.is_some());
    }

    #[test]
    fn test_ledger_upsert_appends_new_type() {
        let mut ledger = ConditionLedger::default();
        ledger.upsert("Ready", STATUS_FALSE, "Progressing", "waiting");
        ledger.upsert("Available", STATUS_TRUE, "MinimumReplicas", "1 replica");

        assert_eq!(ledger.len(), 2);
        let conditions = ledger.into_conditions();
        assert_eq!(conditions[0].r#type, "Ready");
        assert_eq!(conditions[1].r#type, "Available");
    }

    #[test]
    fn test_ledger_replaces_in_place_preserving_order() {
        let stored = vec![
            stamped("Ready", STATUS_FALSE, "Progressing", "2025-01-01T00:00:00+00:00"),
            stamped("Available", STATUS_FALSE, "NoReplicas", "2025-01-01T00:00:00+00:00"),
        ];
        let mut ledger = ConditionLedger::from_conditions(&stored);
        ledger.upsert("Ready", STATUS_TRUE, "Converged", "App reconciled");

        let conditions = ledger.into_conditions();
        assert_eq!(conditions.len(), 2);
        assert_eq!(conditions[0].r#type, "Ready");
        assert_eq!(conditions[0].status, STATUS_TRUE);
        assert_eq!(conditions[1].r#type, "Available");
    }

    #[test]
    fn test_ledger_refreshes_timestamp_on_identical_write() {
        let stored = vec![Condition {
            r#type: "Ready".into(),
            status: STATUS_TRUE.into(),
            reason: Some("Bootstrapped".into()),
            message: Some("Tenant initialized".into()),
            last_transition_time: Some("2000-01-01T00:00:00+00:00".into()),
        }];
        let updated = with_condition(
            &stored,
            "Ready",
            STATUS_TRUE,
            "Bootstrapped",
            "Tenant initialized",
        );

        assert_eq!(updated.len(), 1);
        assert_ne!(
            updated[0].last_transition_time,
            stored[0].last_transition_time
        );
        assert!(conditions_equal(&stored, &updated));
    }

    #[test]
    fn test_ledger_collapses_duplicate_types() {
        let stored = vec![
            stamped("Ready", STATUS_FALSE, "Progressing", "t1"),
            stamped("Other", STATUS_TRUE, "Fine", "t1"),
            stamped("Ready", STATUS_TRUE, "Converged", "t2"),
        ];
        let ledger = ConditionLedger::from_conditions(&stored);

        assert_eq!(ledger.len(), 2);
        assert_eq!(ledger.get("Ready").map(|c| c.status.as_str()), Some(STATUS_TRUE));
        let conditions = ledger.into_conditions();
        assert_eq!(conditions[0].r#type, "Ready");
    }

    #[test]
    fn test_ledger_empty() {
        let ledger = ConditionLedger::from_conditions(&[]);
        assert!(ledger.is_empty());
        assert!(ledger.get("Ready").is_none());
    }

    #[test]
    fn test_find_condition() {
        let conditions = vec![stamped("Ready", STATUS_TRUE, "Converged", "t")];
        assert!(find_condition(&conditions, "Ready").is_some());
        assert!(find_condition(&conditions, "Degraded").is_none());
    }

    #[test]
    fn test_conditions_equal_ignores_timestamps() {
        let a = vec![stamped("Ready", STATUS_TRUE, "Converged", "t1")];
        let b = vec![stamped("Ready", STATUS_TRUE, "Converged", "t2")];
        assert!(conditions_equal(&a, &b));
    }

    #[test]
    fn test_conditions_equal_detects_changes() {
        let a = vec![stamped("Ready", STATUS_TRUE, "Converged", "t")];
        let b = vec![stamped("Ready", STATUS_FALSE, "Progressing", "t")];
        assert!(!conditions_equal(&a, &b));
        assert!(!conditions_equal(&a, &[]));
    }

    #[test]
    fn test_app_status_eq_compares_revision() {
        let base = AppStatus {
            ready: true,
            revision: "abc".into(),
            conditions: vec![stamped("Ready", STATUS_TRUE, "Converged", "t1")],
        };
        let mut same = base.clone();
        same.conditions[0].last_transition_time = Some("t2".into());
        assert!(base.status_eq(&same));

        let mut other = base.clone();
        other.revision = "def".into();
        assert!(!base.status_eq(&other));
    }

    #[test]
    fn test_project_status_eq_compares_namespace() {
        let base = ProjectStatus {
            namespace: "kubeop-acme-web".into(),
            ready: true,
            conditions: vec![],
        };
        let mut other = base.clone();
        other.namespace = "kubeop-acme-api".into();
        assert!(!base.status_eq(&other));
        assert!(base.status_eq(&base.clone()));
    }
}
