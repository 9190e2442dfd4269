// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `tls.rs`

use super::*;
use crate::store::memory::{MemoryStore, Op};
use k8s_openapi::api::admissionregistration::v1::{MutatingWebhook, ValidatingWebhook};

const NS: &str = "kubeop-system";
const SECRET: &str = "kubeop-admission-tls";
const CONFIG: &str = "kubeop-admission-webhook";

fn client_config() -> WebhookClientConfig {
    WebhookClientConfig {
        url: Some("https://kubeop-admission.kubeop-system.svc:443".to_string()),
        ..Default::default()
    }
}

fn mutating_config() -> MutatingWebhookConfiguration {
    MutatingWebhookConfiguration {
        metadata: ObjectMeta {
            name: Some(CONFIG.to_string()),
            ..Default::default()
        },
        webhooks: Some(vec![MutatingWebhook {
            name: "apps.paas.kubeop.io".to_string(),
            admission_review_versions: vec!["v1".to_string()],
            side_effects: "None".to_string(),
            client_config: client_config(),
            ..Default::default()
        }]),
    }
}

fn validating_config() -> ValidatingWebhookConfiguration {
    let webhook = |name: &str| ValidatingWebhook {
        name: name.to_string(),
        admission_review_versions: vec!["v1".to_string()],
        side_effects: "None".to_string(),
        client_config: client_config(),
        ..Default::default()
    };
    ValidatingWebhookConfiguration {
        metadata: ObjectMeta {
            name: Some(CONFIG.to_string()),
            ..Default::default()
        },
        webhooks: Some(vec![
            webhook("apps.paas.kubeop.io"),
            webhook("quotas.paas.kubeop.io"),
        ]),
    }
}

#[test]
fn test_service_dns_names() {
    assert_eq!(
        service_dns_names("kubeop-admission", "kubeop-system"),
        vec![
            "kubeop-admission",
            "kubeop-admission.kubeop-system",
            "kubeop-admission.kubeop-system.svc",
        ]
    );
}

#[test]
fn test_generated_material_is_pem() {
    let material = generate_material("kubeop-admission", NS).unwrap();
    assert!(material.ca_pem.starts_with("-----BEGIN CERTIFICATE-----"));
    assert!(material.cert_pem.starts_with("-----BEGIN CERTIFICATE-----"));
    assert!(material.key_pem.contains("PRIVATE KEY-----"));
    assert_ne!(material.ca_pem, material.cert_pem);
}

#[test]
fn test_secret_missing_key_is_unusable() {
    let material = generate_material("kubeop-admission", NS).unwrap();
    let mut secret = build_tls_secret(&material, NS, SECRET);
    assert_eq!(secret.type_.as_deref(), Some("kubernetes.io/tls"));
    assert_eq!(material_from_secret(&secret), Some(material));

    secret.data.as_mut().unwrap().remove(CA_CERT_KEY);
    assert_eq!(material_from_secret(&secret), None);
}

#[tokio::test]
async fn test_first_start_creates_secret() {
    let store = MemoryStore::new();
    let material = ensure_tls_secret(&store, NS, SECRET, "kubeop-admission")
        .await
        .unwrap();

    assert_eq!(store.writes_of(Op::Create, "Secret"), 1);
    let stored: Secret = store.object(&ObjectKey::namespaced(NS, SECRET)).unwrap();
    assert_eq!(material_from_secret(&stored), Some(material));
}

#[tokio::test]
async fn test_restart_reuses_secret() {
    let store = MemoryStore::new();
    let first = ensure_tls_secret(&store, NS, SECRET, "kubeop-admission")
        .await
        .unwrap();
    store.clear_writes();

    let second = ensure_tls_secret(&store, NS, SECRET, "kubeop-admission")
        .await
        .unwrap();
    assert_eq!(first, second);
    assert!(store.writes().is_empty());
}

#[tokio::test]
async fn test_incomplete_secret_is_error() {
    let store = MemoryStore::new();
    store.insert(Secret {
        metadata: ObjectMeta {
            name: Some(SECRET.to_string()),
            namespace: Some(NS.to_string()),
            ..Default::default()
        },
        ..Default::default()
    });

    let err = ensure_tls_secret(&store, NS, SECRET, "kubeop-admission")
        .await
        .unwrap_err();
    assert!(matches!(err, TlsError::IncompleteSecret(_)));
    assert!(store.writes().is_empty());
}

#[tokio::test]
async fn test_ca_bundle_registered_on_both_configurations() {
    let store = MemoryStore::new();
    store.insert(mutating_config());
    store.insert(validating_config());

    let updated = register_ca_bundle(&store, CONFIG, "CA PEM").await.unwrap();
    assert_eq!(updated, 2);

    let expected = Some(ByteString(b"CA PEM".to_vec()));
    let mutating: MutatingWebhookConfiguration =
        store.object(&ObjectKey::cluster(CONFIG)).unwrap();
    for webhook in mutating.webhooks.unwrap() {
        assert_eq!(webhook.client_config.ca_bundle, expected);
    }
    let validating: ValidatingWebhookConfiguration =
        store.object(&ObjectKey::cluster(CONFIG)).unwrap();
    let webhooks = validating.webhooks.unwrap();
    assert_eq!(webhooks.len(), 2);
    for webhook in webhooks {
        assert_eq!(webhook.client_config.ca_bundle, expected);
    }
}

#[tokio::test]
async fn test_ca_bundle_unchanged_writes_nothing() {
    let store = MemoryStore::new();
    store.insert(mutating_config());
    store.insert(validating_config());
    register_ca_bundle(&store, CONFIG, "CA PEM").await.unwrap();
    store.clear_writes();

    let updated = register_ca_bundle(&store, CONFIG, "CA PEM").await.unwrap();
    assert_eq!(updated, 0);
    assert!(store.writes().is_empty());
}

#[tokio::test]
async fn test_missing_configurations_are_skipped() {
    let store = MemoryStore::new();
    assert_eq!(register_ca_bundle(&store, CONFIG, "CA PEM").await.unwrap(), 0);
}
