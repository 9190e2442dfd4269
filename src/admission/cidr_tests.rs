// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `cidr.rs`

use super::*;

#[test]
fn test_baseline_containment() {
    let baseline = parse_cidrs("10.0.0.0/8");
    assert!(cidr_allowed("10.1.0.0/16", &baseline));
    assert!(cidr_allowed("10.0.0.0/8", &baseline));
    assert!(!cidr_allowed("0.0.0.0/0", &baseline));
    assert!(!cidr_allowed("192.168.0.0/16", &baseline));
}

#[test]
fn test_partial_overlap_is_rejected() {
    // 10.0.0.0/7 starts inside 10.0.0.0/8 but ends outside it
    let baseline = parse_cidrs("10.0.0.0/8");
    assert!(!cidr_allowed("10.0.0.0/7", &baseline));
}

#[test]
fn test_host_bits_are_normalized() {
    let baseline = parse_cidrs("10.0.0.0/8");
    assert!(cidr_allowed("10.1.2.3/16", &baseline));
}

#[test]
fn test_any_allowed_block_matches() {
    let baseline = parse_cidrs("10.0.0.0/8, 172.16.0.0/12");
    assert!(cidr_allowed("172.20.0.0/16", &baseline));
}

#[test]
fn test_ipv6_blocks() {
    let baseline = parse_cidrs("fd00::/8");
    assert!(cidr_allowed("fd12:3456::/32", &baseline));
    assert!(!cidr_allowed("::/0", &baseline));
    assert!(!cidr_allowed("10.0.0.0/8", &baseline));
}

#[test]
fn test_invalid_entries_are_ignored() {
    let baseline = parse_cidrs("not-a-cidr, ,10.0.0.0/8,300.0.0.0/8");
    assert_eq!(baseline.len(), 1);
}

#[test]
fn test_invalid_candidate_is_denied() {
    let baseline = parse_cidrs("10.0.0.0/8");
    assert!(!cidr_allowed("garbage", &baseline));
}

#[test]
fn test_empty_baseline_denies_everything() {
    assert!(!cidr_allowed("10.0.0.0/8", &[]));
}
