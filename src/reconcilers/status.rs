// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Status building and patching for `CustomLabel` resources.
//!
//! [`build_status`] is a pure fold of one pass's per-key outcomes into the
//! next status subresource; [`patch_status`] performs the durable write, and
//! skips it when nothing changed so status updates do not re-trigger the
//! controller in a tight loop.

use crate::constants::{MSG_LABELS_APPLIED, MSG_NO_NEW_LABELS};
use crate::crd::{CustomLabel, CustomLabelStatus};
use crate::diff::ApplyOutcome;
use anyhow::Result;
use kube::api::{Patch, PatchParams};
use kube::{Api, Client, ResourceExt};
use serde_json::json;
use tracing::debug;

/// Fold the outcome of one reconciliation pass into the next status.
///
/// The status map keys are exactly the keys currently in the spec; retracted
/// keys are gone. The message is `"labels applied"` when anything was
/// written, `"no new labels to add"` otherwise.
#[must_use]
pub fn build_status(outcome: &ApplyOutcome) -> CustomLabelStatus {
    let message = if outcome.added > 0 {
        MSG_LABELS_APPLIED
    } else {
        MSG_NO_NEW_LABELS
    };

    CustomLabelStatus {
        message: message.to_string(),
        per_label_status: outcome.statuses.clone(),
    }
}

/// A status carrying an error message, with the per-label map preserved from
/// the last successful pass.
#[must_use]
pub fn error_status(customlabel: &CustomLabel, error: &str) -> CustomLabelStatus {
    CustomLabelStatus {
        message: error.to_string(),
        per_label_status: customlabel.per_label_status(),
    }
}

/// Patch the status subresource if it differs from the recorded one.
///
/// A 404 here means the object was purged between the trigger and the write;
/// that is benign (already deleted) and swallowed.
///
/// # Errors
///
/// Returns an error if the status patch fails for any other reason.
pub async fn patch_status(
    client: &Client,
    customlabel: &CustomLabel,
    status: &CustomLabelStatus,
) -> Result<()> {
    let namespace = customlabel.namespace().unwrap_or_default();
    let name = customlabel.name_any();

    if customlabel.status.as_ref() == Some(status) {
        debug!(
            "CustomLabel {}/{} status unchanged, skipping update",
            namespace, name
        );
        return Ok(());
    }

    let api: Api<CustomLabel> = Api::namespaced(client.clone(), &namespace);
    let patch = json!({ "status": status });

    match api
        .patch_status(&name, &PatchParams::default(), &Patch::Merge(&patch))
        .await
    {
        Ok(_) => Ok(()),
        Err(kube::Error::Api(e)) if e.code == 404 => {
            debug!(
                "CustomLabel {}/{} gone before status update, ignoring",
                namespace, name
            );
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}
