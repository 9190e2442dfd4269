// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `workload.rs`

#[cfg(test)]
mod tests {
    use crate::reconcilers::test_helpers::{create_test_app, TEST_NAMESPACE};
    use crate::reconcilers::workload::{
        apply_to_existing, available_replicas, build_deployment, hardened_container_security,
    };
    use k8s_openapi::api::apps::v1::DeploymentStatus;
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::OwnerReference;

    #[test]
    fn test_deployment_shape() {
        let app = create_test_app("web", "Image", "nginx:1.25");
        let deployment = build_deployment(&app, "0123456789ab");

        assert_eq!(deployment.metadata.name.as_deref(), Some("app-web"));
        assert_eq!(deployment.metadata.namespace.as_deref(), Some(TEST_NAMESPACE));
        assert_eq!(
            deployment.metadata.annotations.as_ref().unwrap()["app.kubeop.io/revision"],
            "0123456789ab"
        );

        let spec = deployment.spec.unwrap();
        assert_eq!(spec.replicas, Some(1));
        let selector = spec.selector.match_labels.unwrap();
        assert_eq!(selector["app.kubeop.io/app"], "web");
        assert_eq!(
            spec.template.metadata.unwrap().labels.unwrap()["app.kubeop.io/app"],
            "web"
        );

        let pod = spec.template.spec.unwrap();
        assert_eq!(pod.containers.len(), 1);
        let container = &pod.containers[0];
        assert_eq!(container.name, "app");
        assert_eq!(container.image.as_deref(), Some("nginx:1.25"));
        assert_eq!(container.ports.as_ref().unwrap()[0].container_port, 80);
    }

    #[test]
    fn test_security_profile_is_hardened() {
        let app = create_test_app("web", "Image", "nginx:1.25");
        let pod = build_deployment(&app, "r").spec.unwrap().template.spec.unwrap();

        let pod_sc = pod.security_context.unwrap();
        assert_eq!(pod_sc.run_as_non_root, Some(true));
        assert_eq!(pod_sc.seccomp_profile.unwrap().type_, "RuntimeDefault");

        let sc = pod.containers[0].security_context.clone().unwrap();
        assert_eq!(sc.run_as_non_root, Some(true));
        assert_eq!(sc.allow_privilege_escalation, Some(false));
        assert_eq!(sc.read_only_root_filesystem, Some(true));
        assert_eq!(
            sc.capabilities.unwrap().drop,
            Some(vec!["ALL".to_string()])
        );
        assert_eq!(sc.seccomp_profile.unwrap().type_, "RuntimeDefault");
    }

    #[test]
    fn test_owner_reference_requires_uid() {
        let mut app = create_test_app("web", "Image", "nginx:1.25");
        assert!(build_deployment(&app, "r").metadata.owner_references.is_none());

        app.metadata.uid = Some("6c1f4e52-0000-4000-8000-000000000001".into());
        let owners: Vec<OwnerReference> = build_deployment(&app, "r")
            .metadata
            .owner_references
            .unwrap();
        assert_eq!(owners.len(), 1);
        assert_eq!(owners[0].kind, "App");
        assert_eq!(owners[0].name, "web");
        assert_eq!(owners[0].controller, Some(true));
    }

    #[test]
    fn test_update_touches_only_image_revision_and_security() {
        let app = create_test_app("web", "Image", "nginx:1.25");
        let mut existing = build_deployment(&app, "old");
        {
            let spec = existing.spec.as_mut().unwrap();
            spec.replicas = Some(3);
            let pod = spec.template.spec.as_mut().unwrap();
            pod.service_account_name = Some("custom".into());
            let container = &mut pod.containers[0];
            container.security_context.as_mut().unwrap().allow_privilege_escalation = Some(true);
            container.args = Some(vec!["--verbose".into()]);
        }

        let updated = apply_to_existing(&existing, "nginx:1.26", "new");
        assert_eq!(
            updated.metadata.annotations.as_ref().unwrap()["app.kubeop.io/revision"],
            "new"
        );
        let spec = updated.spec.unwrap();
        assert_eq!(spec.replicas, Some(3));
        let pod = spec.template.spec.unwrap();
        assert_eq!(pod.service_account_name.as_deref(), Some("custom"));
        let container = &pod.containers[0];
        assert_eq!(container.image.as_deref(), Some("nginx:1.26"));
        assert_eq!(container.args, Some(vec!["--verbose".to_string()]));
        assert_eq!(
            container.security_context,
            Some(hardened_container_security())
        );
    }

    #[test]
    fn test_update_of_converged_workload_is_identity() {
        let app = create_test_app("web", "Image", "nginx:1.25");
        let existing = build_deployment(&app, "rev");
        assert_eq!(apply_to_existing(&existing, "nginx:1.25", "rev"), existing);
    }

    #[test]
    fn test_update_adds_missing_container() {
        let app = create_test_app("web", "Image", "nginx:1.25");
        let mut existing = build_deployment(&app, "rev");
        existing
            .spec
            .as_mut()
            .unwrap()
            .template
            .spec
            .as_mut()
            .unwrap()
            .containers
            .clear();

        let updated = apply_to_existing(&existing, "nginx:1.25", "rev");
        let pod = updated.spec.unwrap().template.spec.unwrap();
        assert_eq!(pod.containers.len(), 1);
        assert_eq!(pod.containers[0].name, "app");
    }

    #[test]
    fn test_available_replicas() {
        let app = create_test_app("web", "Image", "nginx:1.25");
        let mut deployment = build_deployment(&app, "rev");
        assert_eq!(available_replicas(&deployment), 0);

        deployment.status = Some(DeploymentStatus {
            available_replicas: Some(2),
            ..Default::default()
        });
        assert_eq!(available_replicas(&deployment), 2);
    }
}
