// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Image reference helpers for the registry allow-list.

use crate::constants::DEFAULT_REGISTRY_HOST;

/// Registry host of an image reference.
///
/// The host is everything before the first `/`; a reference without a slash
/// is served by the default registry. An empty reference has no host.
///
/// # Example
///
/// ```rust
/// use kubeop::admission::image::image_host;
///
/// assert_eq!(image_host("nginx:1.25"), Some("docker.io"));
/// assert_eq!(image_host("ghcr.io/acme/web:2"), Some("ghcr.io"));
/// assert_eq!(image_host(""), None);
/// ```
#[must_use]
pub fn image_host(image: &str) -> Option<&str> {
    if image.is_empty() {
        return None;
    }
    match image.split_once('/') {
        Some((host, _)) => Some(host),
        None => Some(DEFAULT_REGISTRY_HOST),
    }
}

/// Returns `true` when `host` is on the allow-list. An empty allow-list
/// allows every registry.
#[must_use]
pub fn registry_allowed(host: &str, allowlist: &[String]) -> bool {
    allowlist.is_empty()
        || allowlist
            .iter()
            .any(|allowed| allowed.trim().eq_ignore_ascii_case(host))
}

#[cfg(test)]
#[path = "image_tests.rs"]
mod image_tests;
