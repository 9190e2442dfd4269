// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Command line and environment configuration.
//!
//! Every flag can also be set through the environment variable named in its
//! help text. Values are parsed once in `main` and handed to the subsystems as
//! plain settings structs.

use crate::admission::{LookupFailurePolicy, PolicySettings};
use crate::constants::{
    ADMISSION_NAMESPACE, ADMISSION_SERVICE_NAME, ADMISSION_TLS_SECRET_NAME,
    ADMISSION_WEBHOOK_CONFIG_NAME, DEFAULT_ADMISSION_ADDR, DEFAULT_ADMISSION_TIMEOUT_MS, DEFAULT_OPERATOR_HEALTH_ADDR,
    DEFAULT_RECONCILE_TIMEOUT_SECS,
};
use crate::context::ReconcileSettings;
use crate::http::TlsSource;
use crate::notify::NotifyPolicy;
use clap::{Args, Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

#[derive(Debug, Parser)]
#[command(name = "kubeop", version, about = "Multi-tenant control plane for Kubernetes")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the Tenant, Project, App, DNSRecord and Certificate controllers
    Operator(OperatorArgs),
    /// Run the mutating and validating admission webhook
    Admission(AdmissionArgs),
}

#[derive(Debug, Clone, Args)]
pub struct OperatorArgs {
    /// Base URL of the DNS provisioner
    #[arg(long, env = "DNS_MOCK_URL")]
    pub dns_endpoint: Option<Url>,

    /// Base URL of the certificate provisioner
    #[arg(long, env = "ACME_MOCK_URL")]
    pub acme_endpoint: Option<Url>,

    /// Whether a failed provisioner notification blocks readiness
    #[arg(long, env = "KUBEOP_NOTIFY_POLICY", value_enum, default_value_t = NotifyPolicy::BestEffort)]
    pub notify_policy: NotifyPolicy,

    /// Synthetic delay at the top of every App reconcile, in milliseconds (0 disables)
    #[arg(long, env = "KUBEOP_APP_RECONCILE_DELAY_MS", default_value_t = 0)]
    pub app_reconcile_delay_ms: u64,

    /// Deadline of a single reconcile, in seconds
    #[arg(long, env = "KUBEOP_RECONCILE_TIMEOUT_SECS", default_value_t = DEFAULT_RECONCILE_TIMEOUT_SECS)]
    pub reconcile_timeout_secs: u64,

    #[arg(long, env = "KUBEOP_TENANT_WORKERS", default_value_t = 1)]
    pub tenant_workers: u16,

    #[arg(long, env = "KUBEOP_PROJECT_WORKERS", default_value_t = 1)]
    pub project_workers: u16,

    #[arg(long, env = "KUBEOP_APP_WORKERS", default_value_t = 2)]
    pub app_workers: u16,

    #[arg(long, env = "KUBEOP_DNS_WORKERS", default_value_t = 1)]
    pub dns_workers: u16,

    #[arg(long, env = "KUBEOP_CERT_WORKERS", default_value_t = 1)]
    pub cert_workers: u16,

    /// Listen address of the health and metrics endpoints
    #[arg(long, env = "KUBEOP_HEALTH_ADDR", default_value = DEFAULT_OPERATOR_HEALTH_ADDR)]
    pub health_addr: SocketAddr,
}

impl OperatorArgs {
    #[must_use]
    pub fn reconcile_settings(&self) -> ReconcileSettings {
        ReconcileSettings {
            app_reconcile_delay: (self.app_reconcile_delay_ms > 0)
                .then(|| Duration::from_millis(self.app_reconcile_delay_ms)),
            reconcile_timeout: Duration::from_secs(self.reconcile_timeout_secs),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Args)]
pub struct AdmissionArgs {
    /// Listen address of the webhook
    #[arg(long, env = "KUBEOP_ADMISSION_ADDR", default_value = DEFAULT_ADMISSION_ADDR)]
    pub listen_addr: SocketAddr,

    /// PEM certificate chain; serves plain HTTP when unset
    #[arg(long, env = "KUBEOP_TLS_CERT", requires = "tls_key")]
    pub tls_cert: Option<PathBuf>,

    /// PEM private key
    #[arg(long, env = "KUBEOP_TLS_KEY", requires = "tls_cert")]
    pub tls_key: Option<PathBuf>,

    /// Keep a self-signed CA and serving certificate in a Secret and register
    /// the CA on the webhook configurations
    #[arg(long, env = "KUBEOP_SELF_SIGNED_TLS", conflicts_with = "tls_cert")]
    pub self_signed_tls: bool,

    /// Namespace of the webhook Service and TLS Secret
    #[arg(long, env = "KUBEOP_ADMISSION_NAMESPACE", default_value = ADMISSION_NAMESPACE)]
    pub admission_namespace: String,

    /// Webhook Service name covered by the self-signed certificate
    #[arg(long, env = "KUBEOP_ADMISSION_SERVICE", default_value = ADMISSION_SERVICE_NAME)]
    pub service_name: String,

    /// Secret holding the self-signed TLS material
    #[arg(long, env = "KUBEOP_TLS_SECRET", default_value = ADMISSION_TLS_SECRET_NAME)]
    pub tls_secret_name: String,

    /// Mutating and validating webhook configuration to register the CA on
    #[arg(long, env = "KUBEOP_WEBHOOK_CONFIG", default_value = ADMISSION_WEBHOOK_CONFIG_NAME)]
    pub webhook_config_name: String,

    /// Comma separated registry hosts allowed in App images
    #[arg(long, env = "KUBEOP_IMAGE_ALLOWLIST")]
    pub image_allowlist: Option<String>,

    /// Comma separated CIDRs egress ipBlocks must fall inside
    #[arg(long, env = "KUBEOP_EGRESS_BASELINE")]
    pub egress_baseline: Option<String>,

    /// Maximum `requests.cpu` of a ResourceQuota
    #[arg(long, env = "KUBEOP_QUOTA_MAX_REQUESTS_CPU")]
    pub quota_max_requests_cpu: Option<String>,

    /// Maximum `requests.memory` of a ResourceQuota
    #[arg(long, env = "KUBEOP_QUOTA_MAX_REQUESTS_MEMORY")]
    pub quota_max_requests_memory: Option<String>,

    /// Outcome of a namespace check whose lookup fails
    #[arg(long, env = "KUBEOP_LOOKUP_FAILURE_POLICY", value_enum, default_value_t = LookupFailurePolicy::FailOpen)]
    pub lookup_failure_policy: LookupFailurePolicy,

    /// Deadline of one validating review, in milliseconds
    #[arg(long, env = "KUBEOP_ADMISSION_TIMEOUT_MS", default_value_t = DEFAULT_ADMISSION_TIMEOUT_MS)]
    pub admission_timeout_ms: u64,
}

impl AdmissionArgs {
    #[must_use]
    pub fn policy_settings(&self) -> PolicySettings {
        PolicySettings {
            image_allowlist: self.image_allowlist.clone(),
            egress_baseline: self.egress_baseline.clone(),
            quota_max_requests_cpu: self.quota_max_requests_cpu.clone(),
            quota_max_requests_memory: self.quota_max_requests_memory.clone(),
        }
    }

    /// Certificate and key files when TLS is configured from disk.
    #[must_use]
    pub fn tls(&self) -> Option<TlsSource> {
        self.tls_cert
            .clone()
            .zip(self.tls_key.clone())
            .map(|(cert, key)| TlsSource::Files { cert, key })
    }

    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.admission_timeout_ms)
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod config_tests;
