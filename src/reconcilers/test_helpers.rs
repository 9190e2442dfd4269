// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Fixtures shared by the reconciler tests.

use crate::context::{Context, ReconcileSettings};
use crate::crd::{App, AppSpec, Project, ProjectSpec, Tenant, TenantSpec};
use crate::store::memory::MemoryStore;

pub const TEST_NAMESPACE: &str = "kubeop-acme-web";

pub fn test_context() -> Context<MemoryStore> {
    Context::new(MemoryStore::new(), ReconcileSettings::default())
}

pub fn create_test_tenant(name: &str) -> Tenant {
    Tenant::new(
        name,
        TenantSpec {
            name: name.to_string(),
        },
    )
}

pub fn create_test_project(tenant: &str, name: &str) -> Project {
    Project::new(
        &format!("{tenant}-{name}"),
        ProjectSpec {
            tenant_ref: tenant.to_string(),
            name: name.to_string(),
        },
    )
}

pub fn create_test_app(name: &str, app_type: &str, image: &str) -> App {
    let mut app = App::new(
        name,
        AppSpec {
            r#type: app_type.to_string(),
            image: image.to_string(),
            host: String::new(),
        },
    );
    app.metadata.namespace = Some(TEST_NAMESPACE.to_string());
    app
}
