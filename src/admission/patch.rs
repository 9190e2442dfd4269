// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! RFC 6902 patch construction.
//!
//! Paths are given as unescaped tokens; escaping of `/` and `~` is left to
//! [`PointerBuf`], so a label key like `app.kubeop.io/managed-by` lands in the
//! path as `app.kubeop.io~1managed-by`.

use json_patch::{AddOperation, Patch, PatchOperation};
use jsonptr::PointerBuf;
use serde_json::Value;

/// Accumulates patch operations in order.
#[derive(Debug, Default, Clone)]
pub struct PatchBuilder {
    ops: Vec<PatchOperation>,
}

fn pointer(tokens: &[&str]) -> PointerBuf {
    PointerBuf::from_tokens(tokens.iter().copied())
}

impl PatchBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn add(mut self, path: &[&str], value: Value) -> Self {
        self.ops.push(PatchOperation::Add(AddOperation {
            path: pointer(path),
            value,
        }));
        self
    }

    /// The finished patch, or `None` when no operation was added.
    #[must_use]
    pub fn build(self) -> Option<Patch> {
        if self.ops.is_empty() {
            None
        } else {
            Some(Patch(self.ops))
        }
    }
}

#[cfg(test)]
#[path = "patch_tests.rs"]
mod patch_tests;
