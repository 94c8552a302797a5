// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Label diff and conflict algorithm.
//!
//! Pure functions that compute, for one `CustomLabel`, which labels to add to
//! its namespace, which to remove, and which to reject, given the desired
//! label map, the previously recorded per-label status, and the live
//! namespace labels. No I/O happens here; the reconciler owns the reads and
//! writes.
//!
//! Ownership of a live label is inferred, not asserted: a namespace key whose
//! value equals a `CustomLabel`'s recorded status value (with `applied ==
//! true`) is considered owned by that `CustomLabel`. Two objects desiring the
//! same key and value can therefore shadow each other; the rule is isolated
//! behind [`OwnershipPolicy`] so a stricter scheme (e.g. explicit owner tags)
//! can replace it without touching the rest of the engine.

use crate::crd::LabelStatus;
use std::collections::BTreeMap;

/// Decides whether a live namespace value was put there by the holder of a
/// recorded [`LabelStatus`].
///
/// Consulted everywhere ownership matters: the conflict check, the write-time
/// re-validation, the retraction sweep, and deletion cleanup.
pub trait OwnershipPolicy {
    /// `true` if `live_value` under some key is considered written by the
    /// owner of `recorded`.
    fn owns(&self, recorded: &LabelStatus, live_value: &str) -> bool;
}

/// Default ownership rule: the recorded apply succeeded and the live value
/// still equals the recorded one.
#[derive(Clone, Copy, Debug, Default)]
pub struct ValueEquality;

impl OwnershipPolicy for ValueEquality {
    fn owns(&self, recorded: &LabelStatus, live_value: &str) -> bool {
        recorded.applied && recorded.value == live_value
    }
}

/// Per-key decision for a desired label.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LabelOutcome {
    /// Applied earlier and still live with the desired value; no write.
    Converged,
    /// Candidate for (re-)application this pass.
    Add,
    /// Key contains a protected prefix; never managed.
    RejectedProtected,
    /// Key is live in the namespace but owned by another actor.
    RejectedConflict,
}

/// Result of one diff pass over a `CustomLabel`'s desired labels.
#[derive(Clone, Debug, Default)]
pub struct LabelDiff {
    /// Desired keys (with values) to write to the namespace.
    pub to_add: BTreeMap<String, String>,
    /// Previously applied keys, dropped from the spec, still live with our
    /// value; to delete from the namespace.
    pub to_remove: Vec<String>,
    /// The decision for every key currently in the spec.
    pub outcomes: BTreeMap<String, LabelOutcome>,
}

/// Whether a label key contains any protected substring.
#[must_use]
pub fn is_protected(key: &str, protected_prefixes: &[String]) -> bool {
    protected_prefixes.iter().any(|p| key.contains(p.as_str()))
}

/// Compute the label delta for one `CustomLabel`.
///
/// Per desired key `k` with value `v`:
///
/// 1. `k` contains a protected prefix → [`LabelOutcome::RejectedProtected`].
/// 2. `k` is live in the namespace and this object did not previously apply
///    it → [`LabelOutcome::RejectedConflict`].
/// 3. Previously applied with the same value and still live unchanged →
///    [`LabelOutcome::Converged`], no write.
/// 4. Previously applied but the value was edited, or the live value drifted
///    (removed or reverted externally) → [`LabelOutcome::Add`].
/// 5. Otherwise (new key, or previously rejected) → [`LabelOutcome::Add`].
///
/// Keys recorded as applied but no longer in the spec are swept into
/// `to_remove` when the live value is still ours; retraction is not gated by
/// protected-prefix checks, since a label once legitimately applied may
/// always be retracted by its owner.
#[must_use]
pub fn compute_diff(
    desired: &BTreeMap<String, String>,
    previous: &BTreeMap<String, LabelStatus>,
    namespace_labels: &BTreeMap<String, String>,
    protected_prefixes: &[String],
    policy: &impl OwnershipPolicy,
) -> LabelDiff {
    let mut diff = LabelDiff::default();

    for (key, value) in desired {
        let recorded = previous.get(key);
        let previously_applied = recorded.is_some_and(|s| s.applied);

        let outcome = if is_protected(key, protected_prefixes) {
            LabelOutcome::RejectedProtected
        } else if let Some(live) = namespace_labels.get(key) {
            if !previously_applied {
                LabelOutcome::RejectedConflict
            } else if live == value && recorded.is_some_and(|s| &s.value == value) {
                LabelOutcome::Converged
            } else {
                // Value edited in the spec, or live value drifted.
                LabelOutcome::Add
            }
        } else {
            LabelOutcome::Add
        };

        if outcome == LabelOutcome::Add {
            diff.to_add.insert(key.clone(), value.clone());
        }
        diff.outcomes.insert(key.clone(), outcome);
    }

    // Retraction sweep: applied keys the author removed from the spec.
    for (key, recorded) in previous {
        if recorded.applied && !desired.contains_key(key) {
            if let Some(live) = namespace_labels.get(key) {
                if policy.owns(recorded, live) {
                    diff.to_remove.push(key.clone());
                }
            }
        }
    }

    diff
}

/// Outcome of applying a [`LabelDiff`] to an in-memory namespace label map.
#[derive(Clone, Debug, Default)]
pub struct ApplyOutcome {
    /// The next `perLabelStatus` map: exactly the keys currently in the spec.
    pub statuses: BTreeMap<String, LabelStatus>,
    /// Number of labels written this pass.
    pub added: usize,
    /// Number of labels retracted this pass.
    pub removed: usize,
}

impl ApplyOutcome {
    /// Whether the namespace label map was mutated and needs a durable write.
    #[must_use]
    pub fn namespace_changed(&self) -> bool {
        self.added > 0 || self.removed > 0
    }
}

/// Apply a computed diff to `namespace_labels`, re-validating each key.
///
/// The protected-prefix and ownership checks run again per key before the
/// write: a concurrent actor may have claimed the key since the diff was
/// computed. A write-time rejection records `{applied: false}` for the key
/// instead of failing the pass. Processing order does not affect the fixed
/// point; checks are per-key and idempotent.
#[must_use]
pub fn apply_diff(
    diff: &LabelDiff,
    desired: &BTreeMap<String, String>,
    previous: &BTreeMap<String, LabelStatus>,
    namespace_labels: &mut BTreeMap<String, String>,
    protected_prefixes: &[String],
    policy: &impl OwnershipPolicy,
) -> ApplyOutcome {
    let mut outcome = ApplyOutcome::default();

    for key in &diff.to_remove {
        let owned = previous
            .get(key)
            .zip(namespace_labels.get(key))
            .is_some_and(|(recorded, live)| policy.owns(recorded, live));
        if owned && namespace_labels.remove(key).is_some() {
            outcome.removed += 1;
        }
    }

    for (key, decision) in &diff.outcomes {
        let Some(value) = desired.get(key) else {
            continue;
        };

        let status = match decision {
            LabelOutcome::Converged => previous.get(key).cloned().unwrap_or(LabelStatus {
                applied: true,
                value: value.clone(),
            }),
            LabelOutcome::RejectedProtected | LabelOutcome::RejectedConflict => LabelStatus {
                applied: false,
                value: value.clone(),
            },
            LabelOutcome::Add => {
                if write_allowed(key, previous, namespace_labels, protected_prefixes, policy) {
                    namespace_labels.insert(key.clone(), value.clone());
                    outcome.added += 1;
                    LabelStatus {
                        applied: true,
                        value: value.clone(),
                    }
                } else {
                    LabelStatus {
                        applied: false,
                        value: value.clone(),
                    }
                }
            }
        };

        outcome.statuses.insert(key.clone(), status);
    }

    outcome
}

/// Write-time re-validation for a single key.
fn write_allowed(
    key: &str,
    previous: &BTreeMap<String, LabelStatus>,
    namespace_labels: &BTreeMap<String, String>,
    protected_prefixes: &[String],
    policy: &impl OwnershipPolicy,
) -> bool {
    if is_protected(key, protected_prefixes) {
        return false;
    }
    match namespace_labels.get(key) {
        // Unclaimed key: free to take.
        None => true,
        // Claimed key: only overwrite what we own.
        Some(live) => previous
            .get(key)
            .is_some_and(|recorded| policy.owns(recorded, live)),
    }
}

/// Remove every previously applied label this object still owns.
///
/// Used by the deletion path: on a deletion request, all keys recorded with
/// `applied == true` are retracted from the namespace before the finalizer
/// comes off. Returns the number of labels removed.
pub fn retract_applied(
    previous: &BTreeMap<String, LabelStatus>,
    namespace_labels: &mut BTreeMap<String, String>,
    policy: &impl OwnershipPolicy,
) -> usize {
    let mut removed = 0;
    for (key, recorded) in previous {
        if !recorded.applied {
            continue;
        }
        let owned = namespace_labels
            .get(key)
            .is_some_and(|live| policy.owns(recorded, live));
        if owned && namespace_labels.remove(key).is_some() {
            removed += 1;
        }
    }
    removed
}
