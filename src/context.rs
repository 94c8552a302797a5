// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Shared context for the controller.
//!
//! The reconciler and the namespace watch mapper receive an `Arc<Context>`
//! holding the Kubernetes client, the operator configuration, and a reflector
//! store of all `CustomLabel` objects. The store is populated by a dedicated
//! reflector task and enables in-memory lookups in the watch mapper without
//! API queries.

use crate::crd::CustomLabel;
use kube::runtime::reflector::Store;
use kube::Client;

/// Shared context passed to the controller and watch mappers.
#[derive(Clone)]
pub struct Context {
    /// Kubernetes client for API operations
    pub client: Client,

    /// Reflector store of all `CustomLabel` objects, for namespace fan-out
    pub customlabels: Store<CustomLabel>,

    /// Substrings that make a label key unmanageable when contained in it
    pub protected_prefixes: Vec<String>,
}

/// Parse the comma-separated protected-prefix list from the CLI flag.
///
/// Entries are trimmed and empty entries dropped, so `"kubernetes.io, "` and
/// `"kubernetes.io"` are equivalent. An empty result disables prefix
/// protection entirely; the CLI flag defaults to
/// [`crate::constants::DEFAULT_PROTECTED_PREFIXES`] so that takes an
/// explicit opt-out.
#[must_use]
pub fn parse_protected_prefixes(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect()
}
