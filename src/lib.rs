// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! # Labely - Namespace Label Operator for Kubernetes
//!
//! Labely is a Kubernetes operator written in Rust that keeps key/value
//! labels on namespaces synchronized with declarative `CustomLabel` custom
//! resources.
//!
//! ## Overview
//!
//! Multiple `CustomLabel` objects may target the same namespace. The
//! reconciliation engine applies each object's labels without one clobbering
//! another's, tracks per-label application state so it removes only labels
//! it previously applied, and guarantees cleanup on deletion through a
//! finalizer - even across controller restarts.
//!
//! ## Modules
//!
//! - [`crd`] - The `CustomLabel` Custom Resource Definition
//! - [`diff`] - The pure label diff/conflict algorithm and ownership policy
//! - [`reconcilers`] - Reconciliation, finalizer lifecycle, status, fan-out
//! - [`context`] - Shared context and the `CustomLabel` reflector store
//! - [`metrics`] - Prometheus metrics
//!
//! ## Example
//!
//! ```rust
//! use labely::crd::CustomLabelSpec;
//! use std::collections::BTreeMap;
//!
//! let mut labels = BTreeMap::new();
//! labels.insert("team".to_string(), "payments".to_string());
//!
//! let spec = CustomLabelSpec {
//!     custom_labels: labels,
//! };
//! ```

pub mod constants;
pub mod context;
pub mod crd;
pub mod diff;
pub mod metrics;
pub mod reconcilers;

#[cfg(test)]
mod context_tests;
