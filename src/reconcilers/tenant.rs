// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Tenant reconciliation.
//!
//! A Tenant has no external side effects: reconciling it only marks it ready.

use crate::constants::{CONDITION_STATUS_TRUE, CONDITION_TYPE_READY};
use crate::context::Context;
use crate::crd::{Tenant, TenantStatus};
use crate::reconcilers::status::{update_status, with_condition};
use crate::status_reasons::{MESSAGE_TENANT_READY, REASON_BOOTSTRAPPED};
use crate::store::{ObjectKey, ObjectStore};
use anyhow::Result;
use kube::runtime::controller::Action;
use tracing::{debug, info};

/// Reconcile the Tenant `name`.
///
/// # Errors
///
/// Returns the store error of the read or status write.
pub async fn reconcile_tenant<S: ObjectStore>(ctx: &Context<S>, name: &str) -> Result<Action> {
    let key = ObjectKey::cluster(name);
    let Some(tenant) = ctx.store.get::<Tenant>(&key).await? else {
        debug!(tenant = %name, "Tenant no longer exists, nothing to reconcile");
        return Ok(Action::await_change());
    };

    let current = tenant.status.clone().unwrap_or_default();
    let desired = TenantStatus {
        ready: true,
        conditions: with_condition(
            &current.conditions,
            CONDITION_TYPE_READY,
            CONDITION_STATUS_TRUE,
            REASON_BOOTSTRAPPED,
            MESSAGE_TENANT_READY,
        ),
    };

    if update_status(&ctx.store, &tenant, desired).await? {
        info!(tenant = %name, "Tenant marked ready");
    }

    Ok(Action::await_change())
}
