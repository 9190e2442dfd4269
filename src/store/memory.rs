// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! In-memory [`ObjectStore`] for unit tests.
//!
//! Mirrors the API server semantics the reconcilers depend on: resource
//! versions bump on every write, stale versions conflict, `replace` leaves the
//! status untouched and `replace_status` touches nothing else. Every write is
//! logged so tests can assert idempotence, and one-shot failures can be
//! injected per operation and kind.

use super::{ObjectKey, ObjectStore, StoreError, StoreResource};
use async_trait::async_trait;
use kube::ResourceExt;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

/// Store operation, used for the write log and failure injection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Op {
    Get,
    Create,
    Replace,
    ReplaceStatus,
}

/// One write accepted by the store.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WriteRecord {
    pub op: Op,
    pub kind: String,
    pub key: ObjectKey,
}

/// Error returned by an injected failure.
#[derive(Clone, Debug)]
pub enum Failure {
    Unavailable(String),
    Conflict,
    AlreadyExists,
}

struct Injected {
    op: Op,
    kind: String,
    failure: Failure,
}

#[derive(Default)]
struct State {
    objects: BTreeMap<(String, ObjectKey), Value>,
    version: u64,
    writes: Vec<WriteRecord>,
    failures: Vec<Injected>,
}

impl State {
    fn next_version(&mut self) -> String {
        self.version += 1;
        self.version.to_string()
    }

    fn take_failure(&mut self, op: Op, kind: &str, key: &ObjectKey) -> Option<StoreError> {
        let index = self
            .failures
            .iter()
            .position(|f| f.op == op && f.kind == kind)?;
        let injected = self.failures.remove(index);
        let kind = kind.to_string();
        let key = key.clone();
        Some(match injected.failure {
            Failure::Unavailable(message) => StoreError::Unavailable(message),
            Failure::Conflict => StoreError::Conflict { kind, key },
            Failure::AlreadyExists => StoreError::AlreadyExists { kind, key },
        })
    }
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<State>>,
}

fn kind_of<K: StoreResource>() -> String {
    K::kind(&()).to_string()
}

fn stored_version(value: &Value) -> Option<&str> {
    value
        .pointer("/metadata/resourceVersion")
        .and_then(Value::as_str)
}

fn set_version(value: &mut Value, version: &str) {
    if let Some(meta) = value.get_mut("metadata").and_then(Value::as_object_mut) {
        meta.insert("resourceVersion".into(), Value::String(version.into()));
    }
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an object without recording a write.
    pub fn insert<K: StoreResource>(&self, obj: K) -> K {
        let mut state = self.state.lock().unwrap();
        let key = ObjectKey::of(&obj);
        let mut value = serde_json::to_value(&obj).unwrap();
        let version = state.next_version();
        set_version(&mut value, &version);
        state.objects.insert((kind_of::<K>(), key), value.clone());
        serde_json::from_value(value).unwrap()
    }

    /// Current stored copy of an object.
    #[must_use]
    pub fn object<K: StoreResource>(&self, key: &ObjectKey) -> Option<K> {
        let state = self.state.lock().unwrap();
        state
            .objects
            .get(&(kind_of::<K>(), key.clone()))
            .map(|v| serde_json::from_value(v.clone()).unwrap())
    }

    /// Mutate a stored object in place, as an external actor would, without
    /// recording a write. Bumps the resource version.
    pub fn modify<K: StoreResource>(&self, key: &ObjectKey, f: impl FnOnce(&mut K)) {
        let mut state = self.state.lock().unwrap();
        let slot = (kind_of::<K>(), key.clone());
        let mut obj: K = serde_json::from_value(state.objects[&slot].clone()).unwrap();
        f(&mut obj);
        let mut value = serde_json::to_value(&obj).unwrap();
        let version = state.next_version();
        set_version(&mut value, &version);
        state.objects.insert(slot, value);
    }

    /// Remove an object without recording a write.
    pub fn remove<K: StoreResource>(&self, key: &ObjectKey) {
        let mut state = self.state.lock().unwrap();
        state.objects.remove(&(kind_of::<K>(), key.clone()));
    }

    /// Fail the next `op` on `kind`.
    pub fn fail_next(&self, op: Op, kind: &str, failure: Failure) {
        let mut state = self.state.lock().unwrap();
        state.failures.push(Injected {
            op,
            kind: kind.to_string(),
            failure,
        });
    }

    #[must_use]
    pub fn writes(&self) -> Vec<WriteRecord> {
        self.state.lock().unwrap().writes.clone()
    }

    #[must_use]
    pub fn writes_of(&self, op: Op, kind: &str) -> usize {
        self.state
            .lock()
            .unwrap()
            .writes
            .iter()
            .filter(|w| w.op == op && w.kind == kind)
            .count()
    }

    pub fn clear_writes(&self) {
        self.state.lock().unwrap().writes.clear();
    }

    fn write<K: StoreResource>(&self, op: Op, obj: &K) -> Result<K, StoreError> {
        let mut state = self.state.lock().unwrap();
        let kind = kind_of::<K>();
        let key = ObjectKey::of(obj);
        if let Some(err) = state.take_failure(op, &kind, &key) {
            return Err(err);
        }
        let slot = (kind.clone(), key.clone());
        let incoming = serde_json::to_value(obj)?;

        let mut value = match (op, state.objects.get(&slot)) {
            (Op::Create, Some(_)) => return Err(StoreError::AlreadyExists { kind, key }),
            (Op::Create, None) => incoming,
            (_, None) => return Err(StoreError::NotFound { kind, key }),
            (_, Some(current)) => {
                if let Some(version) = obj.resource_version() {
                    if stored_version(current) != Some(version.as_str()) {
                        return Err(StoreError::Conflict { kind, key });
                    }
                }
                let mut merged = current.clone();
                if op == Op::ReplaceStatus {
                    match incoming.get("status") {
                        Some(status) => merged["status"] = status.clone(),
                        None => {
                            if let Some(map) = merged.as_object_mut() {
                                map.remove("status");
                            }
                        }
                    }
                } else {
                    let status = current.get("status").cloned();
                    merged = incoming;
                    if let (Some(map), Some(status)) = (merged.as_object_mut(), status) {
                        map.insert("status".into(), status);
                    }
                }
                merged
            }
        };

        let version = state.next_version();
        set_version(&mut value, &version);
        state.objects.insert(slot, value.clone());
        state.writes.push(WriteRecord { op, kind, key });
        Ok(serde_json::from_value(value)?)
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn get<K: StoreResource>(&self, key: &ObjectKey) -> Result<Option<K>, StoreError> {
        let mut state = self.state.lock().unwrap();
        let kind = kind_of::<K>();
        if let Some(err) = state.take_failure(Op::Get, &kind, key) {
            return Err(err);
        }
        state
            .objects
            .get(&(kind, key.clone()))
            .map(|v| serde_json::from_value(v.clone()))
            .transpose()
            .map_err(StoreError::from)
    }

    async fn create<K: StoreResource>(&self, obj: &K) -> Result<K, StoreError> {
        self.write(Op::Create, obj)
    }

    async fn replace<K: StoreResource>(&self, obj: &K) -> Result<K, StoreError> {
        self.write(Op::Replace, obj)
    }

    async fn replace_status<K: StoreResource>(&self, obj: &K) -> Result<K, StoreError> {
        self.write(Op::ReplaceStatus, obj)
    }
}

#[cfg(test)]
#[path = "memory_tests.rs"]
mod memory_tests;
