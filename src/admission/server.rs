// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Admission process entry point.

use crate::admission::tls::{ensure_tls_secret, register_ca_bundle};
use crate::admission::{router, AdmissionState, PolicyResolver};
use crate::config::AdmissionArgs;
use crate::http::{serve, TlsSource};
use crate::store::KubeStore;
use anyhow::Result;
use kube::Client;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Serving material for the listener: self-signed from the TLS Secret, PEM
/// files, or none for plain HTTP.
async fn resolve_tls(store: &KubeStore, args: &AdmissionArgs) -> Result<Option<TlsSource>> {
    if !args.self_signed_tls {
        return Ok(args.tls());
    }

    let material = ensure_tls_secret(
        store,
        &args.admission_namespace,
        &args.tls_secret_name,
        &args.service_name,
    )
    .await?;

    match register_ca_bundle(store, &args.webhook_config_name, &material.ca_pem).await {
        Ok(updated) => info!(
            config = %args.webhook_config_name,
            updated,
            "Registered webhook CA bundle"
        ),
        Err(e) => warn!(
            config = %args.webhook_config_name,
            error = %e,
            "Failed to register webhook CA bundle"
        ),
    }

    Ok(Some(TlsSource::Pem {
        cert: material.cert_pem.into_bytes(),
        key: material.key_pem.into_bytes(),
    }))
}

/// Run the webhook until shutdown.
///
/// # Errors
///
/// Returns an error if the cluster client cannot be built, the TLS material
/// cannot be obtained, or the listener fails.
pub async fn run_admission(args: AdmissionArgs) -> Result<()> {
    debug!("Initializing Kubernetes client");
    let client = Client::try_default().await?;
    let store = KubeStore::new(client);

    let tls = resolve_tls(&store, &args).await?;

    let state = Arc::new(AdmissionState::new(
        store,
        PolicyResolver::new(args.policy_settings()),
        args.lookup_failure_policy,
        args.timeout(),
    ));

    info!(
        addr = %args.listen_addr,
        tls = tls.is_some(),
        self_signed = args.self_signed_tls,
        lookup_failure_policy = ?args.lookup_failure_policy,
        timeout_ms = args.admission_timeout_ms,
        "Starting admission webhook"
    );
    serve(router(state), args.listen_addr, tls).await
}
