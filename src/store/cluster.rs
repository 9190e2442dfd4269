// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! [`ObjectStore`] backed by the Kubernetes API server.

use super::{ObjectKey, ObjectStore, StoreError, StoreResource};
use async_trait::async_trait;
use kube::api::PostParams;
use kube::{Client, ResourceExt};
use tracing::debug;

/// HTTP status the API server returns for create and version conflicts
const HTTP_CONFLICT: u16 = 409;

/// Store handle over one shared [`Client`].
///
/// Built once at process start and cloned into every controller and handler.
#[derive(Clone)]
pub struct KubeStore {
    client: Client,
}

impl KubeStore {
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    #[must_use]
    pub fn client(&self) -> &Client {
        &self.client
    }
}

fn kind_of<K: StoreResource>() -> String {
    K::kind(&()).to_string()
}

fn is_conflict(err: &kube::Error) -> bool {
    matches!(err, kube::Error::Api(response) if response.code == HTTP_CONFLICT)
}

#[async_trait]
impl ObjectStore for KubeStore {
    async fn get<K: StoreResource>(&self, key: &ObjectKey) -> Result<Option<K>, StoreError> {
        let api = K::api(&self.client, key.namespace.as_deref());
        let obj = api.get_opt(&key.name).await?;
        if obj.is_none() {
            debug!(kind = %kind_of::<K>(), key = %key, "Object not found");
        }
        Ok(obj)
    }

    async fn create<K: StoreResource>(&self, obj: &K) -> Result<K, StoreError> {
        let key = ObjectKey::of(obj);
        let api = K::api(&self.client, key.namespace.as_deref());
        debug!(kind = %kind_of::<K>(), key = %key, "Creating object");
        api.create(&PostParams::default(), obj)
            .await
            .map_err(|e| {
                if is_conflict(&e) {
                    StoreError::AlreadyExists {
                        kind: kind_of::<K>(),
                        key,
                    }
                } else {
                    StoreError::Kube(e)
                }
            })
    }

    async fn replace<K: StoreResource>(&self, obj: &K) -> Result<K, StoreError> {
        let key = ObjectKey::of(obj);
        let api = K::api(&self.client, key.namespace.as_deref());
        debug!(
            kind = %kind_of::<K>(),
            key = %key,
            resource_version = ?obj.resource_version(),
            "Replacing object"
        );
        api.replace(&obj.name_any(), &PostParams::default(), obj)
            .await
            .map_err(|e| {
                if is_conflict(&e) {
                    StoreError::Conflict {
                        kind: kind_of::<K>(),
                        key,
                    }
                } else {
                    StoreError::Kube(e)
                }
            })
    }

    async fn replace_status<K: StoreResource>(&self, obj: &K) -> Result<K, StoreError> {
        let key = ObjectKey::of(obj);
        let api = K::api(&self.client, key.namespace.as_deref());
        debug!(
            kind = %kind_of::<K>(),
            key = %key,
            resource_version = ?obj.resource_version(),
            "Replacing status"
        );
        api.replace_status(&obj.name_any(), &PostParams::default(), obj)
            .await
            .map_err(|e| {
                if is_conflict(&e) {
                    StoreError::Conflict {
                        kind: kind_of::<K>(),
                        key,
                    }
                } else {
                    StoreError::Kube(e)
                }
            })
    }
}
