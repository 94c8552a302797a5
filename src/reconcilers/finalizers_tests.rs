// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `finalizers.rs`

#[cfg(test)]
mod tests {
    use crate::crd::{CustomLabel, CustomLabelSpec};
    use crate::reconcilers::finalizers::{finalizer_state, FinalizerState};
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::{ObjectMeta, Time};
    use k8s_openapi::jiff::Timestamp;
    use std::collections::BTreeMap;

    const TEST_FINALIZER: &str = "labely.firestoned.io/delete-labels";
    const TEST_NAMESPACE: &str = "test-namespace";
    const TEST_NAME: &str = "test-labels";

    /// Helper to create a test CustomLabel
    fn create_test_customlabel(
        finalizers: Option<Vec<String>>,
        deleting: bool,
    ) -> CustomLabel {
        CustomLabel {
            metadata: ObjectMeta {
                name: Some(TEST_NAME.to_string()),
                namespace: Some(TEST_NAMESPACE.to_string()),
                finalizers,
                deletion_timestamp: deleting.then(|| Time(Timestamp::now())),
                generation: Some(1),
                ..Default::default()
            },
            spec: CustomLabelSpec {
                custom_labels: BTreeMap::new(),
            },
            status: None,
        }
    }

    #[test]
    fn test_state_no_finalizer() {
        let customlabel = create_test_customlabel(None, false);

        assert_eq!(
            finalizer_state(&customlabel, TEST_FINALIZER),
            FinalizerState::NoFinalizer
        );
    }

    #[test]
    fn test_state_foreign_finalizer_only() {
        // A different controller's finalizer does not count as ours.
        let customlabel =
            create_test_customlabel(Some(vec!["other.io/finalizer".to_string()]), false);

        assert_eq!(
            finalizer_state(&customlabel, TEST_FINALIZER),
            FinalizerState::NoFinalizer
        );
    }

    #[test]
    fn test_state_attached() {
        let customlabel = create_test_customlabel(Some(vec![TEST_FINALIZER.to_string()]), false);

        assert_eq!(
            finalizer_state(&customlabel, TEST_FINALIZER),
            FinalizerState::Attached
        );
    }

    #[test]
    fn test_state_attached_among_others() {
        let customlabel = create_test_customlabel(
            Some(vec![
                "other.io/finalizer".to_string(),
                TEST_FINALIZER.to_string(),
            ]),
            false,
        );

        assert_eq!(
            finalizer_state(&customlabel, TEST_FINALIZER),
            FinalizerState::Attached
        );
    }

    #[test]
    fn test_state_cleaning() {
        let customlabel = create_test_customlabel(Some(vec![TEST_FINALIZER.to_string()]), true);

        assert_eq!(
            finalizer_state(&customlabel, TEST_FINALIZER),
            FinalizerState::Cleaning
        );
    }

    #[test]
    fn test_state_removed() {
        let customlabel = create_test_customlabel(None, true);

        assert_eq!(
            finalizer_state(&customlabel, TEST_FINALIZER),
            FinalizerState::Removed
        );
    }
}
