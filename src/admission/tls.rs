// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Self-signed TLS bootstrap for the webhook.
//!
//! With `--self-signed-tls` the webhook keeps its own CA and serving
//! certificate in a `kubernetes.io/tls` Secret. The material is generated on
//! the first start and reused afterwards, so every replica serves the same
//! certificate. The CA is then written into the `caBundle` of the mutating and
//! validating webhook configurations so the API server trusts the listener.

use crate::constants::{
    ADMISSION_CA_COMMON_NAME, ADMISSION_CERT_BACKDATE_HOURS, ADMISSION_CERT_VALIDITY_DAYS,
};
use crate::labels::{K8S_PART_OF, PART_OF_KUBEOP};
use crate::store::{ObjectKey, ObjectStore, StoreError};
use k8s_openapi::api::admissionregistration::v1::{
    MutatingWebhookConfiguration, ValidatingWebhookConfiguration, WebhookClientConfig,
};
use k8s_openapi::api::core::v1::Secret;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use k8s_openapi::ByteString;
use rcgen::{
    BasicConstraints, CertificateParams, DistinguishedName, DnType, DnValue,
    ExtendedKeyUsagePurpose, IsCa, Issuer, KeyPair, KeyUsagePurpose,
};
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

/// Secret data key of the CA certificate
pub const CA_CERT_KEY: &str = "ca.crt";

/// Secret data key of the serving certificate
pub const TLS_CERT_KEY: &str = "tls.crt";

/// Secret data key of the serving private key
pub const TLS_PRIVATE_KEY_KEY: &str = "tls.key";

const SECRET_TYPE_TLS: &str = "kubernetes.io/tls";

#[derive(Debug, thiserror::Error)]
pub enum TlsError {
    #[error("certificate generation failed: {0}")]
    Generate(#[from] rcgen::Error),

    #[error("secret {0} lacks ca.crt, tls.crt or tls.key")]
    IncompleteSecret(ObjectKey),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// PEM encoded CA, serving certificate and serving key.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TlsMaterial {
    pub ca_pem: String,
    pub cert_pem: String,
    pub key_pem: String,
}

/// In-cluster DNS names of `service` in `namespace`.
#[must_use]
pub fn service_dns_names(service: &str, namespace: &str) -> Vec<String> {
    vec![
        service.to_string(),
        format!("{service}.{namespace}"),
        format!("{service}.{namespace}.svc"),
    ]
}

fn common_name(value: &str) -> DistinguishedName {
    let mut dn = DistinguishedName::new();
    dn.push(DnType::CommonName, DnValue::Utf8String(value.to_string()));
    dn
}

fn stamp_validity(params: &mut CertificateParams) {
    let now = time::OffsetDateTime::now_utc();
    params.not_before = now - time::Duration::hours(ADMISSION_CERT_BACKDATE_HOURS);
    params.not_after = now + time::Duration::days(ADMISSION_CERT_VALIDITY_DAYS);
}

/// Generate a fresh CA and a serving certificate for `service` signed by it.
///
/// # Errors
///
/// Returns [`TlsError::Generate`] when key generation or signing fails.
pub fn generate_material(service: &str, namespace: &str) -> Result<TlsMaterial, TlsError> {
    let mut ca_params = CertificateParams::default();
    ca_params.distinguished_name = common_name(ADMISSION_CA_COMMON_NAME);
    ca_params.is_ca = IsCa::Ca(BasicConstraints::Unconstrained);
    ca_params.key_usages = vec![
        KeyUsagePurpose::KeyCertSign,
        KeyUsagePurpose::DigitalSignature,
    ];
    stamp_validity(&mut ca_params);

    let ca_key = KeyPair::generate()?;
    let ca_cert = ca_params.self_signed(&ca_key)?;
    let issuer = Issuer::new(ca_params, ca_key);

    let names = service_dns_names(service, namespace);
    let mut params = CertificateParams::new(names)?;
    params.distinguished_name = common_name(&format!("{service}.{namespace}.svc"));
    params.is_ca = IsCa::NoCa;
    params.key_usages = vec![
        KeyUsagePurpose::DigitalSignature,
        KeyUsagePurpose::KeyEncipherment,
    ];
    params.extended_key_usages = vec![ExtendedKeyUsagePurpose::ServerAuth];
    stamp_validity(&mut params);

    let key = KeyPair::generate()?;
    let cert = params.signed_by(&key, &issuer)?;

    Ok(TlsMaterial {
        ca_pem: ca_cert.pem(),
        cert_pem: cert.pem(),
        key_pem: key.serialize_pem(),
    })
}

/// TLS Secret carrying `material`.
#[must_use]
pub fn build_tls_secret(material: &TlsMaterial, namespace: &str, name: &str) -> Secret {
    let bytes = |pem: &str| ByteString(pem.as_bytes().to_vec());
    Secret {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some(namespace.to_string()),
            labels: Some(BTreeMap::from([(
                K8S_PART_OF.to_string(),
                PART_OF_KUBEOP.to_string(),
            )])),
            ..Default::default()
        },
        type_: Some(SECRET_TYPE_TLS.to_string()),
        data: Some(BTreeMap::from([
            (CA_CERT_KEY.to_string(), bytes(&material.ca_pem)),
            (TLS_CERT_KEY.to_string(), bytes(&material.cert_pem)),
            (TLS_PRIVATE_KEY_KEY.to_string(), bytes(&material.key_pem)),
        ])),
        ..Default::default()
    }
}

/// Material stored in `secret`; `None` when any of the three keys is missing
/// or not UTF-8.
#[must_use]
pub fn material_from_secret(secret: &Secret) -> Option<TlsMaterial> {
    let data = secret.data.as_ref()?;
    let pem = |key: &str| {
        data.get(key)
            .and_then(|b| String::from_utf8(b.0.clone()).ok())
            .filter(|s| !s.trim().is_empty())
    };
    Some(TlsMaterial {
        ca_pem: pem(CA_CERT_KEY)?,
        cert_pem: pem(TLS_CERT_KEY)?,
        key_pem: pem(TLS_PRIVATE_KEY_KEY)?,
    })
}

/// Load the TLS Secret, creating it with fresh material when absent.
///
/// A concurrent create by another replica is tolerated; its material wins.
///
/// # Errors
///
/// Returns a store error, a generation error, or
/// [`TlsError::IncompleteSecret`] when the existing Secret is unusable.
pub async fn ensure_tls_secret<S: ObjectStore>(
    store: &S,
    namespace: &str,
    name: &str,
    service: &str,
) -> Result<TlsMaterial, TlsError> {
    let key = ObjectKey::namespaced(namespace, name);
    if let Some(secret) = store.get::<Secret>(&key).await? {
        info!(secret = %key, "Using existing webhook TLS secret");
        return material_from_secret(&secret).ok_or(TlsError::IncompleteSecret(key));
    }

    let material = generate_material(service, namespace)?;
    match store.create(&build_tls_secret(&material, namespace, name)).await {
        Ok(_) => {
            info!(secret = %key, service, "Created self-signed webhook TLS secret");
            Ok(material)
        }
        Err(e) if e.is_already_exists() => {
            debug!(secret = %key, "TLS secret created concurrently, loading it");
            store
                .get::<Secret>(&key)
                .await?
                .as_ref()
                .and_then(material_from_secret)
                .ok_or(TlsError::IncompleteSecret(key))
        }
        Err(e) => Err(e.into()),
    }
}

/// Point every client config at `bundle`; `true` when anything changed.
fn set_ca_bundle<'a>(
    configs: impl Iterator<Item = &'a mut WebhookClientConfig>,
    bundle: &ByteString,
) -> bool {
    let mut changed = false;
    for config in configs {
        if config.ca_bundle.as_ref() != Some(bundle) {
            config.ca_bundle = Some(bundle.clone());
            changed = true;
        }
    }
    changed
}

/// Write `ca_pem` into the `caBundle` of the mutating and validating webhook
/// configurations named `name`.
///
/// A missing configuration is skipped. Returns how many were updated.
///
/// # Errors
///
/// Returns the first store error.
pub async fn register_ca_bundle<S: ObjectStore>(
    store: &S,
    name: &str,
    ca_pem: &str,
) -> Result<usize, StoreError> {
    let key = ObjectKey::cluster(name);
    let bundle = ByteString(ca_pem.as_bytes().to_vec());
    let mut updated = 0;

    match store.get::<MutatingWebhookConfiguration>(&key).await? {
        Some(mut config) => {
            let webhooks = config.webhooks.iter_mut().flatten();
            if set_ca_bundle(webhooks.map(|w| &mut w.client_config), &bundle) {
                store.replace(&config).await?;
                updated += 1;
            }
        }
        None => warn!(name, "MutatingWebhookConfiguration not found, caBundle not registered"),
    }

    match store.get::<ValidatingWebhookConfiguration>(&key).await? {
        Some(mut config) => {
            let webhooks = config.webhooks.iter_mut().flatten();
            if set_ca_bundle(webhooks.map(|w| &mut w.client_config), &bundle) {
                store.replace(&config).await?;
                updated += 1;
            }
        }
        None => warn!(name, "ValidatingWebhookConfiguration not found, caBundle not registered"),
    }

    Ok(updated)
}

#[cfg(test)]
#[path = "tls_tests.rs"]
mod tls_tests;
