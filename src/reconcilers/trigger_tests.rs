// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `trigger.rs`

#[cfg(test)]
mod tests {
    use crate::crd::{CustomLabel, CustomLabelSpec};
    use crate::reconcilers::trigger::customlabels_to_retrigger;
    use k8s_openapi::api::core::v1::Namespace;
    use kube::core::ObjectMeta;
    use std::collections::BTreeMap;

    fn labels(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    fn create_namespace(name: &str, ns_labels: Option<BTreeMap<String, String>>) -> Namespace {
        Namespace {
            metadata: ObjectMeta {
                name: Some(name.to_string()),
                labels: ns_labels,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    fn create_customlabel(
        name: &str,
        namespace: &str,
        desired: BTreeMap<String, String>,
    ) -> CustomLabel {
        CustomLabel {
            metadata: ObjectMeta {
                name: Some(name.to_string()),
                namespace: Some(namespace.to_string()),
                ..Default::default()
            },
            spec: CustomLabelSpec {
                custom_labels: desired,
            },
            status: None,
        }
    }

    #[test]
    fn test_retrigger_on_missing_label() {
        // Arrange: the namespace lost a label this object wants
        let namespace = create_namespace("payments", Some(labels(&[("env", "prod")])));
        let customlabel = create_customlabel("team-labels", "payments", labels(&[("team", "payments")]));

        // Act
        let refs = customlabels_to_retrigger(&namespace, [&customlabel]);

        // Assert
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].name, "team-labels");
        assert_eq!(refs[0].namespace.as_deref(), Some("payments"));
    }

    #[test]
    fn test_retrigger_on_reverted_value() {
        let namespace = create_namespace("payments", Some(labels(&[("team", "platform")])));
        let customlabel = create_customlabel("team-labels", "payments", labels(&[("team", "payments")]));

        let refs = customlabels_to_retrigger(&namespace, [&customlabel]);

        assert_eq!(refs.len(), 1);
    }

    #[test]
    fn test_no_retrigger_when_converged() {
        // All desired keys are live with the desired values.
        let namespace = create_namespace(
            "payments",
            Some(labels(&[("team", "payments"), ("env", "prod")])),
        );
        let customlabel = create_customlabel("team-labels", "payments", labels(&[("team", "payments")]));

        let refs = customlabels_to_retrigger(&namespace, [&customlabel]);

        assert!(refs.is_empty());
    }

    #[test]
    fn test_other_namespaces_ignored() {
        let namespace = create_namespace("payments", None);
        let customlabel = create_customlabel("team-labels", "platform", labels(&[("team", "x")]));

        let refs = customlabels_to_retrigger(&namespace, [&customlabel]);

        assert!(refs.is_empty());
    }

    #[test]
    fn test_empty_spec_never_retriggers() {
        let namespace = create_namespace("payments", None);
        let customlabel = create_customlabel("empty", "payments", BTreeMap::new());

        let refs = customlabels_to_retrigger(&namespace, [&customlabel]);

        assert!(refs.is_empty());
    }

    #[test]
    fn test_only_drifted_objects_selected() {
        // Arrange: two objects in the namespace, one converged, one drifted
        let namespace = create_namespace("payments", Some(labels(&[("team", "payments")])));
        let converged = create_customlabel("converged", "payments", labels(&[("team", "payments")]));
        let drifted = create_customlabel("drifted", "payments", labels(&[("env", "prod")]));

        // Act
        let refs = customlabels_to_retrigger(&namespace, [&converged, &drifted]);

        // Assert
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].name, "drifted");
    }
}
