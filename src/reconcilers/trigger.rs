// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Namespace-drift fan-out.
//!
//! When a watched namespace changes, only the `CustomLabel` objects in that
//! namespace whose desired keys differ from the live label map need another
//! pass; an externally reverted or removed label is noticed here and
//! re-applied on the resulting reconciliation. The mapping is a pure
//! function of the namespace object and the known `CustomLabel`s, so the
//! policy is independent of the delivery mechanism (the controller's watch
//! stream feeds it from a reflector store).

use crate::crd::CustomLabel;
use k8s_openapi::api::core::v1::Namespace;
use kube::runtime::reflector::ObjectRef;
use kube::ResourceExt;
use std::collections::BTreeMap;

/// Map an updated namespace to the `CustomLabel`s to re-trigger.
///
/// A `CustomLabel` is re-triggered when it lives in the changed namespace
/// and at least one of its desired keys is missing from the live label map
/// or carries a different value.
pub fn customlabels_to_retrigger<'a>(
    namespace: &Namespace,
    customlabels: impl IntoIterator<Item = &'a CustomLabel>,
) -> Vec<ObjectRef<CustomLabel>> {
    let namespace_name = namespace.name_any();
    let live = namespace.metadata.labels.as_ref();

    customlabels
        .into_iter()
        .filter(|cl| cl.namespace().as_deref() == Some(namespace_name.as_str()))
        .filter(|cl| has_drift(&cl.spec.custom_labels, live))
        .map(ObjectRef::from_obj)
        .collect()
}

/// Whether any desired key differs from the live namespace labels.
fn has_drift(desired: &BTreeMap<String, String>, live: Option<&BTreeMap<String, String>>) -> bool {
    desired
        .iter()
        .any(|(key, value)| live.and_then(|l| l.get(key)) != Some(value))
}
