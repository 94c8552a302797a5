// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `status.rs`

#[cfg(test)]
mod tests {
    use crate::crd::{CustomLabel, CustomLabelSpec, CustomLabelStatus, LabelStatus};
    use crate::diff::ApplyOutcome;
    use crate::reconcilers::status::{build_status, error_status};
    use kube::core::ObjectMeta;
    use std::collections::BTreeMap;

    fn statuses(entries: &[(&str, bool, &str)]) -> BTreeMap<String, LabelStatus> {
        entries
            .iter()
            .map(|(k, applied, v)| {
                (
                    (*k).to_string(),
                    LabelStatus {
                        applied: *applied,
                        value: (*v).to_string(),
                    },
                )
            })
            .collect()
    }

    #[test]
    fn test_build_status_after_writes() {
        let outcome = ApplyOutcome {
            statuses: statuses(&[("team", true, "payments")]),
            added: 1,
            removed: 0,
        };

        let status = build_status(&outcome);

        assert_eq!(status.message, "labels applied");
        assert_eq!(status.per_label_status, outcome.statuses);
    }

    #[test]
    fn test_build_status_when_converged() {
        let outcome = ApplyOutcome {
            statuses: statuses(&[("team", true, "payments")]),
            added: 0,
            removed: 0,
        };

        let status = build_status(&outcome);

        assert_eq!(status.message, "no new labels to add");
    }

    #[test]
    fn test_build_status_rejections_still_reported() {
        // Rejected keys appear in the map with applied == false even though
        // nothing was written.
        let outcome = ApplyOutcome {
            statuses: statuses(&[("team", false, "payments")]),
            added: 0,
            removed: 0,
        };

        let status = build_status(&outcome);

        assert_eq!(status.message, "no new labels to add");
        assert!(!status.per_label_status["team"].applied);
    }

    #[test]
    fn test_error_status_preserves_per_label_map() {
        let customlabel = CustomLabel {
            metadata: ObjectMeta {
                name: Some("team-labels".to_string()),
                namespace: Some("payments".to_string()),
                ..Default::default()
            },
            spec: CustomLabelSpec {
                custom_labels: BTreeMap::new(),
            },
            status: Some(CustomLabelStatus {
                message: "labels applied".to_string(),
                per_label_status: statuses(&[("team", true, "payments")]),
            }),
        };

        let status = error_status(&customlabel, "error adding labels to namespace");

        assert_eq!(status.message, "error adding labels to namespace");
        assert_eq!(
            status.per_label_status,
            statuses(&[("team", true, "payments")])
        );
    }

    #[test]
    fn test_error_status_during_cleanup_keeps_applied_record() {
        // A failed deletion cleanup reports its error in the message while
        // the applied record survives, so a later pass can still retract.
        let customlabel = CustomLabel {
            metadata: ObjectMeta {
                name: Some("team-labels".to_string()),
                namespace: Some("payments".to_string()),
                ..Default::default()
            },
            spec: CustomLabelSpec {
                custom_labels: BTreeMap::new(),
            },
            status: Some(CustomLabelStatus {
                message: "labels applied".to_string(),
                per_label_status: statuses(&[("team", true, "payments")]),
            }),
        };

        let status = error_status(
            &customlabel,
            "error removing labels from namespace: conflict",
        );

        assert_eq!(
            status.message,
            "error removing labels from namespace: conflict"
        );
        assert!(status.per_label_status["team"].applied);
    }

    #[test]
    fn test_error_status_with_no_prior_status() {
        let customlabel = CustomLabel {
            metadata: ObjectMeta::default(),
            spec: CustomLabelSpec {
                custom_labels: BTreeMap::new(),
            },
            status: None,
        };

        let status = error_status(&customlabel, "unable to fetch namespace: not found");

        assert_eq!(status.message, "unable to fetch namespace: not found");
        assert!(status.per_label_status.is_empty());
    }
}
