// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! `DNSRecord` and `Certificate` reconciliation.
//!
//! Both kinds are announced to an external provisioner and then reported
//! ready with a fixed message. Whether a failed announcement blocks readiness
//! is decided by the [`NotifyPolicy`](crate::notify::NotifyPolicy) of the
//! context's notifier.

use crate::constants::{
    CERTIFICATES_PATH, CERTIFICATE_READY_MESSAGE, CONDITION_STATUS_FALSE, CONDITION_STATUS_TRUE,
    CONDITION_TYPE_READY, DNS_RECORDS_PATH, DNS_RECORD_READY_MESSAGE,
};
use crate::context::Context;
use crate::crd::{Certificate, CertificateStatus, Condition, DNSRecord, DNSRecordStatus};
use crate::metrics::record_provisioner_notification;
use crate::notify::{Delivery, NotifyError};
use crate::reconcilers::status::{update_status, with_condition};
use crate::status_reasons::{REASON_PROVISIONED, REASON_PROVISION_FAILED};
use crate::store::{ObjectKey, ObjectStore};
use anyhow::Result;
use kube::runtime::controller::Action;
use serde::Serialize;
use tracing::{debug, info, warn};

/// Body posted to `/v1/dnsrecords`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DnsRecordPayload<'a> {
    pub namespace: &'a str,
    pub name: &'a str,
    pub host: &'a str,
    pub target: &'a str,
}

/// Body posted to `/v1/certificates`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CertificatePayload<'a> {
    pub namespace: &'a str,
    pub name: &'a str,
    pub host: &'a str,
    pub dns_record_ref: &'a str,
}

fn outcome_label(outcome: &Result<Delivery, NotifyError>) -> &'static str {
    match outcome {
        Ok(Delivery::Delivered) => "delivered",
        Ok(Delivery::Skipped) => "skipped",
        Ok(Delivery::Ignored(_)) => "ignored",
        Err(_) => "failed",
    }
}

/// `(ready, message, conditions)` after a notification.
fn provisioned_state(
    current: &[Condition],
    outcome: &Result<Delivery, NotifyError>,
    ready_message: &str,
) -> (bool, String, Vec<Condition>) {
    match outcome {
        Ok(_) => (
            true,
            ready_message.to_string(),
            with_condition(
                current,
                CONDITION_TYPE_READY,
                CONDITION_STATUS_TRUE,
                REASON_PROVISIONED,
                ready_message,
            ),
        ),
        Err(e) => {
            let message = e.to_string();
            let conditions = with_condition(
                current,
                CONDITION_TYPE_READY,
                CONDITION_STATUS_FALSE,
                REASON_PROVISION_FAILED,
                &message,
            );
            (false, message, conditions)
        }
    }
}

/// Reconcile the `DNSRecord` `namespace/name`.
///
/// # Errors
///
/// Returns store errors, and the delivery error when the notifier requires
/// delivery to succeed. The failure is persisted as `Ready=False` first.
pub async fn reconcile_dns_record<S: ObjectStore>(
    ctx: &Context<S>,
    namespace: &str,
    name: &str,
) -> Result<Action> {
    let key = ObjectKey::namespaced(namespace, name);
    let Some(record) = ctx.store.get::<DNSRecord>(&key).await? else {
        debug!(dnsrecord = %key, "DNSRecord no longer exists, nothing to reconcile");
        return Ok(Action::await_change());
    };

    let payload = DnsRecordPayload {
        namespace,
        name,
        host: &record.spec.host,
        target: &record.spec.target,
    };
    let outcome = ctx.dns_notifier.notify(DNS_RECORDS_PATH, &payload).await;
    record_provisioner_notification("DNSRecord", outcome_label(&outcome));

    let current = record.status.clone().unwrap_or_default();
    let (ready, message, conditions) =
        provisioned_state(&current.conditions, &outcome, DNS_RECORD_READY_MESSAGE);
    let desired = DNSRecordStatus {
        ready,
        message,
        conditions,
    };
    if update_status(&ctx.store, &record, desired).await? {
        info!(dnsrecord = %key, ready, "DNSRecord status updated");
    }

    if let Err(e) = outcome {
        warn!(dnsrecord = %key, error = %e, "DNS provisioning failed");
        return Err(e.into());
    }
    Ok(Action::await_change())
}

/// Reconcile the `Certificate` `namespace/name`.
///
/// # Errors
///
/// Returns store errors, and the delivery error when the notifier requires
/// delivery to succeed. The failure is persisted as `Ready=False` first.
pub async fn reconcile_certificate<S: ObjectStore>(
    ctx: &Context<S>,
    namespace: &str,
    name: &str,
) -> Result<Action> {
    let key = ObjectKey::namespaced(namespace, name);
    let Some(cert) = ctx.store.get::<Certificate>(&key).await? else {
        debug!(certificate = %key, "Certificate no longer exists, nothing to reconcile");
        return Ok(Action::await_change());
    };

    let payload = CertificatePayload {
        namespace,
        name,
        host: &cert.spec.host,
        dns_record_ref: &cert.spec.dns_record_ref,
    };
    let outcome = ctx.cert_notifier.notify(CERTIFICATES_PATH, &payload).await;
    record_provisioner_notification("Certificate", outcome_label(&outcome));

    let current = cert.status.clone().unwrap_or_default();
    let (ready, message, conditions) =
        provisioned_state(&current.conditions, &outcome, CERTIFICATE_READY_MESSAGE);
    let desired = CertificateStatus {
        ready,
        message,
        conditions,
    };
    if update_status(&ctx.store, &cert, desired).await? {
        info!(certificate = %key, ready, "Certificate status updated");
    }

    if let Err(e) = outcome {
        warn!(certificate = %key, error = %e, "Certificate issuance failed");
        return Err(e.into());
    }
    Ok(Action::await_change())
}
