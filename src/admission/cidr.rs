// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! CIDR containment checks for egress rules.

use ipnet::IpNet;
use tracing::debug;

/// Parse a comma separated CIDR list, skipping blank and invalid entries.
#[must_use]
pub fn parse_cidrs(csv: &str) -> Vec<IpNet> {
    csv.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .filter_map(|s| match s.parse::<IpNet>() {
            Ok(net) => Some(net),
            Err(e) => {
                debug!(cidr = s, error = %e, "Ignoring invalid baseline CIDR");
                None
            }
        })
        .collect()
}

/// Returns `true` when `parent` contains both the network and the last
/// address of `child`.
#[must_use]
pub fn cidr_within(child: &IpNet, parent: &IpNet) -> bool {
    parent.contains(&child.network()) && parent.contains(&child.broadcast())
}

/// Returns `true` when `cidr` lies entirely inside one of `allowed`.
/// An unparseable `cidr` is never allowed.
#[must_use]
pub fn cidr_allowed(cidr: &str, allowed: &[IpNet]) -> bool {
    let Ok(candidate) = cidr.trim().parse::<IpNet>() else {
        return false;
    };
    allowed.iter().any(|parent| cidr_within(&candidate, parent))
}

#[cfg(test)]
#[path = "cidr_tests.rs"]
mod cidr_tests;
