// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Custom Resource Definitions (CRDs) for namespace label management.
//!
//! This module defines the `CustomLabel` resource, the declarative record of
//! labels one owner wants applied to the namespace the resource lives in.
//! Multiple `CustomLabel` objects may target the same namespace; the
//! reconciler keeps them from clobbering each other via per-label status
//! tracking (see [`crate::diff`]).
//!
//! # Example
//!
//! ```yaml
//! apiVersion: labely.firestoned.io/v1alpha1
//! kind: CustomLabel
//! metadata:
//!   name: team-labels
//!   namespace: payments
//! spec:
//!   customLabels:
//!     team: payments
//!     cost-center: cc-1042
//! ```

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Per-label application record.
///
/// `value` is the last value the controller believes is live in the namespace
/// under that key; `applied` is whether the write succeeded. A live namespace
/// value equal to `value` with `applied == true` marks the label as owned by
/// this `CustomLabel` for retraction purposes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct LabelStatus {
    /// Whether the label was successfully written to the namespace.
    pub applied: bool,

    /// The desired value at the time of the last reconciliation.
    pub value: String,
}

/// Observed state of a `CustomLabel`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Default, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CustomLabelStatus {
    /// Human-readable summary of the last reconciliation, or the error text
    /// of the last failure.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub message: String,

    /// Application state for each label currently in the spec. Keys removed
    /// from the spec are dropped from this map once retracted.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub per_label_status: BTreeMap<String, LabelStatus>,
}

/// `CustomLabel` declares labels to be applied to the namespace it lives in.
///
/// The controller adds each `spec.customLabels` entry to the namespace unless
/// the key contains a protected prefix or is already owned by another actor,
/// records the per-key outcome in `status.perLabelStatus`, and removes its
/// own labels again when the resource is deleted (finalizer-gated).
///
/// # Example
///
/// ```yaml
/// apiVersion: labely.firestoned.io/v1alpha1
/// kind: CustomLabel
/// metadata:
///   name: team-labels
///   namespace: payments
/// spec:
///   customLabels:
///     team: payments
/// ```
#[derive(CustomResource, Clone, Debug, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "labely.firestoned.io",
    version = "v1alpha1",
    kind = "CustomLabel",
    namespaced,
    doc = "CustomLabel declares key/value labels to be kept in sync on the namespace the resource lives in, with per-label application status and finalizer-gated cleanup."
)]
#[kube(status = "CustomLabelStatus")]
#[kube(printcolumn = r#"{"name":"Message","type":"string","jsonPath":".status.message"}"#)]
#[serde(rename_all = "camelCase")]
pub struct CustomLabelSpec {
    /// Labels to apply to the namespace. Owned by the author of this object;
    /// the controller only reads it.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub custom_labels: BTreeMap<String, String>,
}

impl CustomLabel {
    /// The previously recorded per-label status map, empty on first
    /// reconciliation.
    #[must_use]
    pub fn per_label_status(&self) -> BTreeMap<String, LabelStatus> {
        self.status
            .as_ref()
            .map(|s| s.per_label_status.clone())
            .unwrap_or_default()
    }
}
