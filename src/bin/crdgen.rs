// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! CRD YAML Generator
//!
//! Writes the `paas.kubeop.io` CRD manifests derived from src/crd.rs into
//! deploy/crds/.
//!
//! Usage:
//!   cargo run --bin crdgen [output-dir]

use kube::CustomResourceExt;
use kubeop::crd::{App, Certificate, DNSRecord, Policy, Project, Registry, Tenant};
use std::fs;
use std::path::{Path, PathBuf};

const COPYRIGHT_HEADER: &str = "# Copyright (c) 2025 Erick Bourgeois, firestoned
# SPDX-License-Identifier: MIT
#
# This file is AUTO-GENERATED from src/crd.rs
# DO NOT EDIT MANUALLY - Run `cargo run --bin crdgen` to regenerate
#
";

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let output_dir = std::env::args()
        .nth(1)
        .map_or_else(|| PathBuf::from("deploy/crds"), PathBuf::from);

    fs::create_dir_all(&output_dir)?;

    println!("Generating CRD YAML files into {}...", output_dir.display());

    generate_crd::<Tenant>("tenants.crd.yaml", &output_dir)?;
    generate_crd::<Project>("projects.crd.yaml", &output_dir)?;
    generate_crd::<App>("apps.crd.yaml", &output_dir)?;
    generate_crd::<DNSRecord>("dnsrecords.crd.yaml", &output_dir)?;
    generate_crd::<Certificate>("certificates.crd.yaml", &output_dir)?;
    generate_crd::<Policy>("policies.crd.yaml", &output_dir)?;
    generate_crd::<Registry>("registries.crd.yaml", &output_dir)?;

    println!("✓ Generated 7 CRDs");
    println!("  Deploy with: kubectl apply -f {}", output_dir.display());

    Ok(())
}

fn generate_crd<T>(filename: &str, output_dir: &Path) -> Result<(), Box<dyn std::error::Error>>
where
    T: CustomResourceExt,
{
    let yaml = serde_yaml::to_string(&T::crd())?;
    let output_path = output_dir.join(filename);
    fs::write(&output_path, format!("{COPYRIGHT_HEADER}{yaml}"))?;

    println!("  ✓ Generated {filename}");

    Ok(())
}
