// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Finalizer lifecycle for `CustomLabel` resources.
//!
//! Deletion is a cooperative two-phase protocol: the finalizer marks the
//! object as needing cleanup, the deletion request soft-deletes it
//! (`deletionTimestamp` set, object retained), cleanup runs, and only then is
//! the finalizer removed so the store can purge the object. The phase is an
//! explicit state machine ([`FinalizerState`]) rather than inline branching,
//! so cleanup-before-unblock ordering is enforced by structure.
//!
//! Finalizer attachment and label application are separate durable writes:
//! the reconciler attaches the finalizer and returns without applying labels
//! in the same pass (the resulting update event re-triggers it). Applying
//! labels on an object whose finalizer write failed would leak labels with no
//! cleanup hook.

use anyhow::Result;
use kube::api::{Patch, PatchParams};
use kube::core::NamespaceResourceScope;
use kube::{Api, Client, Resource, ResourceExt};
use serde_json::json;
use tracing::info;

/// Where a resource stands in the finalizer-gated lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FinalizerState {
    /// Not marked for deletion, finalizer absent: attach it and return.
    NoFinalizer,
    /// Not marked for deletion, finalizer present: normal reconciliation.
    Attached,
    /// Marked for deletion, finalizer present: run cleanup, then detach.
    Cleaning,
    /// Marked for deletion, finalizer absent: terminal, nothing to do.
    Removed,
}

/// Classify a resource's lifecycle state from its metadata.
#[must_use]
pub fn finalizer_state<T>(resource: &T, finalizer: &str) -> FinalizerState
where
    T: Resource + ResourceExt,
{
    let has_finalizer = resource
        .meta()
        .finalizers
        .as_ref()
        .is_some_and(|f| f.iter().any(|x| x == finalizer));
    let deleting = resource.meta().deletion_timestamp.is_some();

    match (deleting, has_finalizer) {
        (false, false) => FinalizerState::NoFinalizer,
        (false, true) => FinalizerState::Attached,
        (true, true) => FinalizerState::Cleaning,
        (true, false) => FinalizerState::Removed,
    }
}

/// Cleanup to run before a finalizer comes off a deleted resource.
#[async_trait::async_trait]
pub trait FinalizerCleanup: Resource + ResourceExt + Clone {
    /// Undo this resource's side effects. Called while the deletion
    /// timestamp is set and the finalizer is still present; an error here
    /// keeps the finalizer in place and blocks deletion until a later pass
    /// succeeds.
    async fn cleanup(&self, client: &Client) -> Result<()>;
}

/// Attach `finalizer` to a resource if absent.
///
/// Returns `true` if a write happened, in which case the caller should end
/// the pass and let the update event re-trigger reconciliation.
///
/// # Errors
///
/// Returns an error if the metadata patch fails.
pub async fn ensure_finalizer<T>(client: &Client, resource: &T, finalizer: &str) -> Result<bool>
where
    T: Resource<DynamicType = (), Scope = NamespaceResourceScope>
        + ResourceExt
        + Clone
        + std::fmt::Debug
        + serde::Serialize
        + for<'de> serde::Deserialize<'de>,
{
    if resource
        .meta()
        .finalizers
        .as_ref()
        .is_some_and(|f| f.iter().any(|x| x == finalizer))
    {
        return Ok(false);
    }

    let namespace = resource.namespace().unwrap_or_default();
    let name = resource.name_any();
    info!(
        "Adding finalizer {} to {}/{} {}",
        finalizer,
        namespace,
        name,
        T::kind(&())
    );

    let mut finalizers = resource.meta().finalizers.clone().unwrap_or_default();
    finalizers.push(finalizer.to_string());

    let api: Api<T> = Api::namespaced(client.clone(), &namespace);
    let patch = json!({ "metadata": { "finalizers": finalizers } });
    api.patch(&name, &PatchParams::default(), &Patch::Merge(&patch))
        .await?;

    Ok(true)
}

/// Remove `finalizer` from a resource if present. Idempotent.
///
/// # Errors
///
/// Returns an error if the metadata patch fails.
pub async fn remove_finalizer<T>(client: &Client, resource: &T, finalizer: &str) -> Result<()>
where
    T: Resource<DynamicType = (), Scope = NamespaceResourceScope>
        + ResourceExt
        + Clone
        + std::fmt::Debug
        + serde::Serialize
        + for<'de> serde::Deserialize<'de>,
{
    if resource
        .meta()
        .finalizers
        .as_ref()
        .is_none_or(|f| !f.iter().any(|x| x == finalizer))
    {
        return Ok(());
    }

    let namespace = resource.namespace().unwrap_or_default();
    let name = resource.name_any();
    info!(
        "Removing finalizer {} from {}/{} {}",
        finalizer,
        namespace,
        name,
        T::kind(&())
    );

    let mut finalizers = resource.meta().finalizers.clone().unwrap_or_default();
    finalizers.retain(|f| f != finalizer);

    let api: Api<T> = Api::namespaced(client.clone(), &namespace);
    let patch = json!({ "metadata": { "finalizers": finalizers } });
    api.patch(&name, &PatchParams::default(), &Patch::Merge(&patch))
        .await?;

    Ok(())
}

/// Run the [`FinalizerState::Cleaning`] transition: cleanup, then detach.
///
/// Called when the deletion timestamp is set and the finalizer is present.
/// If cleanup fails the finalizer stays on and the error propagates for the
/// trigger substrate to retry.
///
/// # Errors
///
/// Returns an error if cleanup or the finalizer removal fails.
pub async fn handle_deletion<T>(client: &Client, resource: &T, finalizer: &str) -> Result<()>
where
    T: Resource<DynamicType = (), Scope = NamespaceResourceScope>
        + ResourceExt
        + FinalizerCleanup
        + Clone
        + std::fmt::Debug
        + serde::Serialize
        + for<'de> serde::Deserialize<'de>,
{
    let namespace = resource.namespace().unwrap_or_default();
    let name = resource.name_any();
    info!(
        "Running cleanup for {} {}/{}",
        T::kind(&()),
        namespace,
        name
    );

    resource.cleanup(client).await?;
    remove_finalizer(client, resource, finalizer).await?;

    Ok(())
}

#[cfg(test)]
#[path = "finalizers_tests.rs"]
mod finalizers_tests;
