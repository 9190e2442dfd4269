// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Read/write seam over the authoritative cluster store.
//!
//! Reconcilers and the admission gate never talk to the API server directly;
//! they go through [`ObjectStore`], which has exactly the operations they need:
//!
//! - `get` - a missing object is `Ok(None)`, never an error
//! - `create` - an existing object is [`StoreError::AlreadyExists`]
//! - `replace` / `replace_status` - version-checked; a stale `resourceVersion`
//!   is [`StoreError::Conflict`] and must be retried, never merged locally
//!
//! [`KubeStore`] is the production implementation. Unit tests use an
//! in-memory double with the same conflict semantics.

mod cluster;
#[cfg(test)]
pub mod memory;

pub use cluster::KubeStore;

use crate::crd::{App, Certificate, DNSRecord, Policy, Project, Registry, Tenant};
use kube::{Api, Client, Resource, ResourceExt};
use async_trait::async_trait;
use k8s_openapi::api::admissionregistration::v1::{
    MutatingWebhookConfiguration, ValidatingWebhookConfiguration,
};
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::{ConfigMap, LimitRange, Namespace, ResourceQuota, Secret};
use k8s_openapi::api::networking::v1::NetworkPolicy;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;

/// Identity of one stored object.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectKey {
    /// `None` for cluster-scoped objects.
    pub namespace: Option<String>,
    pub name: String,
}

impl ObjectKey {
    #[must_use]
    pub fn cluster(name: impl Into<String>) -> Self {
        Self {
            namespace: None,
            name: name.into(),
        }
    }

    #[must_use]
    pub fn namespaced(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: Some(namespace.into()),
            name: name.into(),
        }
    }

    /// Key of an existing object, taken from its metadata.
    #[must_use]
    pub fn of<K: Resource>(obj: &K) -> Self {
        Self {
            namespace: obj.namespace(),
            name: obj.name_any(),
        }
    }
}

impl fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.namespace {
            Some(ns) => write!(f, "{ns}/{}", self.name),
            None => f.write_str(&self.name),
        }
    }
}

/// Errors returned by an [`ObjectStore`].
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// `create` targeted an object that already exists
    #[error("{kind} {key} already exists")]
    AlreadyExists { kind: String, key: ObjectKey },

    /// A version-checked write lost to a concurrent writer
    #[error("conflict writing {kind} {key}: the object has been modified")]
    Conflict { kind: String, key: ObjectKey },

    /// A write targeted an object that does not exist
    #[error("{kind} {key} not found")]
    NotFound { kind: String, key: ObjectKey },

    /// Any other API server failure
    #[error("kubernetes API error: {0}")]
    Kube(#[from] kube::Error),

    /// The object could not be encoded or decoded
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The store could not be reached
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    #[must_use]
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }

    #[must_use]
    pub fn is_already_exists(&self) -> bool {
        matches!(self, Self::AlreadyExists { .. })
    }
}

/// A kind the store can read and write.
pub trait StoreResource:
    Resource<DynamicType = ()> + Clone + fmt::Debug + Serialize + DeserializeOwned + Send + Sync + 'static
{
    /// Typed API handle for this kind.
    ///
    /// `namespace` is ignored for cluster-scoped kinds; namespaced kinds fall
    /// back to the client's default namespace when it is `None`.
    fn api(client: &Client, namespace: Option<&str>) -> Api<Self>;
}

macro_rules! cluster_resources {
    ($($kind:ty),* $(,)?) => {
        $(
            impl StoreResource for $kind {
                fn api(client: &Client, _namespace: Option<&str>) -> Api<Self> {
                    Api::all(client.clone())
                }
            }
        )*
    };
}

macro_rules! namespaced_resources {
    ($($kind:ty),* $(,)?) => {
        $(
            impl StoreResource for $kind {
                fn api(client: &Client, namespace: Option<&str>) -> Api<Self> {
                    match namespace {
                        Some(ns) => Api::namespaced(client.clone(), ns),
                        None => Api::default_namespaced(client.clone()),
                    }
                }
            }
        )*
    };
}

cluster_resources!(
    Tenant,
    Project,
    Policy,
    Namespace,
    MutatingWebhookConfiguration,
    ValidatingWebhookConfiguration,
);
namespaced_resources!(
    App,
    DNSRecord,
    Certificate,
    Registry,
    Deployment,
    LimitRange,
    ResourceQuota,
    NetworkPolicy,
    ConfigMap,
    Secret,
);

/// Authoritative, optimistically concurrent object store.
#[async_trait]
pub trait ObjectStore: Send + Sync + 'static {
    /// Read one object; `Ok(None)` when it does not exist.
    async fn get<K: StoreResource>(&self, key: &ObjectKey) -> Result<Option<K>, StoreError>;

    /// Create a new object.
    async fn create<K: StoreResource>(&self, obj: &K) -> Result<K, StoreError>;

    /// Replace an object's spec and metadata, checked against its `resourceVersion`.
    async fn replace<K: StoreResource>(&self, obj: &K) -> Result<K, StoreError>;

    /// Replace an object's status sub-resource, checked against its `resourceVersion`.
    async fn replace_status<K: StoreResource>(&self, obj: &K) -> Result<K, StoreError>;
}
