// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Global constants for the Labely operator.
//!
//! This module contains all numeric and string constants used throughout the codebase.
//! Constants are organized by category for easy maintenance.

// ============================================================================
// API Constants
// ============================================================================

/// API group for Labely CRDs
pub const API_GROUP: &str = "labely.firestoned.io";

/// API version for Labely CRDs
pub const API_VERSION: &str = "v1alpha1";

/// Fully qualified API version (group/version)
pub const API_GROUP_VERSION: &str = "labely.firestoned.io/v1alpha1";

/// Kind name for the `CustomLabel` resource
pub const KIND_CUSTOM_LABEL: &str = "CustomLabel";

// ============================================================================
// Finalizers
// ============================================================================

/// Finalizer for `CustomLabel` resources. While present, deletion of the
/// object is blocked until its labels are retracted from the namespace.
pub const DELETE_LABELS_FINALIZER: &str = "labely.firestoned.io/delete-labels";

// ============================================================================
// Operator Defaults
// ============================================================================

/// Default protected-prefix list; any label key containing one of these
/// substrings is never managed.
pub const DEFAULT_PROTECTED_PREFIXES: &str = "kubernetes.io";

/// Requeue interval after a successful reconciliation (periodic resync)
pub const RESYNC_INTERVAL_SECS: u64 = 300;

/// Requeue interval after a failed reconciliation
pub const ERROR_REQUEUE_SECS: u64 = 30;

// ============================================================================
// Status Messages
// ============================================================================

/// Status message when at least one label was written this pass
pub const MSG_LABELS_APPLIED: &str = "labels applied";

/// Status message when the pass converged with nothing to write
pub const MSG_NO_NEW_LABELS: &str = "no new labels to add";
