// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Kubernetes reconciliation logic for `CustomLabel` resources.
//!
//! Labely follows the standard Kubernetes controller pattern:
//!
//! 1. **Watch** - Monitor `CustomLabel` and namespace changes via the API
//! 2. **Reconcile** - Diff desired labels against the live namespace map
//! 3. **Update** - Write namespace labels and the status subresource
//! 4. **Finalize** - Retract applied labels before a deleted object is purged
//!
//! # Modules
//!
//! - [`customlabel`] - The reconciler itself
//! - [`finalizers`] - Finalizer lifecycle state machine and helpers
//! - [`status`] - Status builder and change-detected status patching
//! - [`trigger`] - Pure namespace-drift fan-out for the namespace watch

pub mod customlabel;
pub mod finalizers;
pub mod status;
pub mod trigger;

#[cfg(test)]
mod status_tests;
#[cfg(test)]
mod trigger_tests;

pub use customlabel::reconcile_customlabel;
pub use trigger::customlabels_to_retrigger;
