// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! `CustomLabel` reconciliation logic.
//!
//! One pass converges the target namespace's label map toward a single
//! `CustomLabel`'s spec: the diff algorithm ([`crate::diff`]) decides per key
//! whether to add, skip, or reject; the namespace is written with optimistic
//! concurrency (full replace, so a concurrent modification fails with 409 and
//! the pass is retried from a fresh read); the per-label outcome is persisted
//! to the status subresource. Deletion retracts previously applied labels
//! before the finalizer comes off.
//!
//! There is no mutual exclusion between `CustomLabel` objects targeting the
//! same namespace. A race on a previously unclaimed key leaves one winner;
//! the loser observes the key on its retry and converges to a rejected
//! status. The system is level-triggered and self-correcting, not
//! exactly-once.

use crate::constants::DELETE_LABELS_FINALIZER;
use crate::context::Context;
use crate::crd::CustomLabel;
use crate::diff::{apply_diff, compute_diff, retract_applied, LabelOutcome, ValueEquality};
use crate::metrics;
use crate::reconcilers::finalizers::{
    ensure_finalizer, finalizer_state, handle_deletion, FinalizerCleanup, FinalizerState,
};
use crate::reconcilers::status::{build_status, error_status, patch_status};
use anyhow::{anyhow, Context as _, Result};
use k8s_openapi::api::core::v1::Namespace;
use kube::api::PostParams;
use kube::{Api, Client, ResourceExt};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Reconcile one `CustomLabel`.
///
/// Sequencing follows the finalizer lifecycle:
///
/// - no finalizer yet: attach it and end the pass; label application runs on
///   the update event the attach produces
/// - finalizer attached: diff, write namespace labels, write status
/// - being deleted: retract applied labels, then detach the finalizer
/// - finalizer already gone on a deleted object: no-op
///
/// All durable-write failures propagate to the controller for retry; nothing
/// is retried in here.
///
/// # Errors
///
/// Returns an error if the namespace cannot be read, or a namespace or
/// status write fails.
pub async fn reconcile_customlabel(ctx: Arc<Context>, customlabel: CustomLabel) -> Result<()> {
    let namespace_name = customlabel
        .namespace()
        .ok_or_else(|| anyhow!("CustomLabel has no namespace"))?;
    let name = customlabel.name_any();

    info!("Reconciling CustomLabel: {}/{}", namespace_name, name);

    match finalizer_state(&customlabel, DELETE_LABELS_FINALIZER) {
        FinalizerState::NoFinalizer => {
            // Separate durable write from label application: if this pass
            // applied labels and the finalizer write failed, the labels
            // would have no cleanup hook.
            ensure_finalizer(&ctx.client, &customlabel, DELETE_LABELS_FINALIZER).await?;
            debug!(
                "Finalizer attached to {}/{}, label application runs on the next event",
                namespace_name, name
            );
            Ok(())
        }
        FinalizerState::Attached => {
            apply_labels(&ctx, &customlabel, &namespace_name).await
        }
        FinalizerState::Cleaning => {
            info!("CustomLabel {}/{} is being deleted", namespace_name, name);
            if let Err(e) =
                handle_deletion(&ctx.client, &customlabel, DELETE_LABELS_FINALIZER).await
            {
                // The finalizer stays on until a later pass succeeds; record
                // the error so the author sees why deletion is stuck.
                warn!(
                    "Cleanup failed for CustomLabel {}/{}: {}",
                    namespace_name, name, e
                );
                let status = error_status(
                    &customlabel,
                    &format!("error removing labels from namespace: {e}"),
                );
                if let Err(status_err) = patch_status(&ctx.client, &customlabel, &status).await {
                    warn!("Unable to update CustomLabel status: {}", status_err);
                }
                return Err(e);
            }
            Ok(())
        }
        FinalizerState::Removed => {
            debug!(
                "CustomLabel {}/{} already finalized, nothing to do",
                namespace_name, name
            );
            Ok(())
        }
    }
}

/// The normal (non-deleting) reconciliation pass.
async fn apply_labels(ctx: &Context, customlabel: &CustomLabel, namespace_name: &str) -> Result<()> {
    let client = &ctx.client;
    let namespaces: Api<Namespace> = Api::all(client.clone());

    let namespace = match namespaces.get(namespace_name).await {
        Ok(ns) => ns,
        Err(e) => {
            // Fatal for this pass; record the error text where the author
            // can see it, then surface the error for retry.
            warn!("Unable to fetch namespace {}: {}", namespace_name, e);
            let status = error_status(customlabel, &format!("unable to fetch namespace: {e}"));
            if let Err(status_err) = patch_status(client, customlabel, &status).await {
                warn!("Unable to update CustomLabel status: {}", status_err);
            }
            return Err(e).context(format!("fetching namespace {namespace_name}"));
        }
    };

    let desired = &customlabel.spec.custom_labels;
    let previous = customlabel.per_label_status();
    let mut labels = namespace.metadata.labels.clone().unwrap_or_default();
    let policy = ValueEquality;

    let diff = compute_diff(
        desired,
        &previous,
        &labels,
        &ctx.protected_prefixes,
        &policy,
    );
    let outcome = apply_diff(
        &diff,
        desired,
        &previous,
        &mut labels,
        &ctx.protected_prefixes,
        &policy,
    );

    record_rejections(&diff.outcomes, &outcome.statuses);

    if outcome.namespace_changed() {
        if let Err(e) = write_namespace_labels(client, &namespace, labels).await {
            warn!(
                "Error writing labels to namespace {}: {}",
                namespace_name, e
            );
            let status = error_status(customlabel, "error adding labels to namespace");
            if let Err(status_err) = patch_status(client, customlabel, &status).await {
                warn!("Unable to update CustomLabel status: {}", status_err);
            }
            return Err(e);
        }
        info!(
            "Namespace {} updated: {} label(s) added, {} removed",
            namespace_name, outcome.added, outcome.removed
        );
        metrics::record_label_writes(outcome.added, outcome.removed);
    } else {
        debug!("Namespace {} labels already converged", namespace_name);
    }

    patch_status(client, customlabel, &build_status(&outcome)).await
}

/// Replace the namespace with an updated label map.
///
/// A full replace carries the `resourceVersion` from the read, so a write
/// conflicting with a concurrent modification fails visibly (409) instead of
/// being merged blindly; the controller retries the whole pass from a fresh
/// read.
async fn write_namespace_labels(
    client: &Client,
    namespace: &Namespace,
    labels: BTreeMap<String, String>,
) -> Result<()> {
    let api: Api<Namespace> = Api::all(client.clone());
    let name = namespace.name_any();

    let mut updated = namespace.clone();
    updated.metadata.labels = if labels.is_empty() { None } else { Some(labels) };
    updated.metadata.managed_fields = None;

    api.replace(&name, &PostParams::default(), &updated)
        .await
        .context(format!("replacing namespace {name}"))?;
    Ok(())
}

/// Count rejected keys for metrics, distinguishing diff-time reasons from
/// write-time conflicts.
fn record_rejections(
    decisions: &BTreeMap<String, LabelOutcome>,
    statuses: &BTreeMap<String, crate::crd::LabelStatus>,
) {
    for (key, decision) in decisions {
        match decision {
            LabelOutcome::RejectedProtected => metrics::record_label_rejection("protected"),
            LabelOutcome::RejectedConflict => metrics::record_label_rejection("conflict"),
            LabelOutcome::Add => {
                // An Add that landed as applied == false lost a write-time
                // re-validation to a concurrent claim.
                if statuses.get(key).is_some_and(|s| !s.applied) {
                    metrics::record_label_rejection("conflict");
                }
            }
            LabelOutcome::Converged => {}
        }
    }
}

#[async_trait::async_trait]
impl FinalizerCleanup for CustomLabel {
    /// Retract every label this object applied before its finalizer comes
    /// off. A namespace that no longer exists means there is nothing left to
    /// clean.
    async fn cleanup(&self, client: &Client) -> Result<()> {
        let namespace_name = self
            .namespace()
            .ok_or_else(|| anyhow!("CustomLabel has no namespace"))?;
        let namespaces: Api<Namespace> = Api::all(client.clone());

        let namespace = match namespaces.get(&namespace_name).await {
            Ok(ns) => ns,
            Err(kube::Error::Api(e)) if e.code == 404 => {
                debug!(
                    "Namespace {} gone, no labels left to retract",
                    namespace_name
                );
                return Ok(());
            }
            Err(e) => return Err(e).context(format!("fetching namespace {namespace_name}")),
        };

        let mut labels = namespace.metadata.labels.clone().unwrap_or_default();
        let removed = retract_applied(&self.per_label_status(), &mut labels, &ValueEquality);

        if removed > 0 {
            write_namespace_labels(client, &namespace, labels).await?;
            metrics::record_label_writes(0, removed);
            info!(
                "Deleted {} label(s) from namespace {}",
                removed, namespace_name
            );
        }

        Ok(())
    }
}
