// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Prometheus metrics for the Labely operator.
//!
//! All metrics use the namespace prefix `labely_firestoned_io_`
//! (prometheus-safe version of "labely.firestoned.io") and are registered in
//! [`METRICS_REGISTRY`], exposed via the `/metrics` endpoint.

use prometheus::{
    CounterVec, Encoder, Histogram, HistogramOpts, IntCounter, Opts, Registry, TextEncoder,
};
use std::sync::LazyLock;
use std::time::Duration;

/// Namespace prefix for all Labely metrics (prometheus-safe)
const METRICS_NAMESPACE: &str = "labely_firestoned_io";

/// Global Prometheus metrics registry
pub static METRICS_REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

/// Total number of reconciliations by status (`success` | `error`)
pub static RECONCILIATION_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_reconciliations_total"),
        "Total number of CustomLabel reconciliations by status",
    );
    let counter = CounterVec::new(opts, &["status"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(counter.clone()))
        .unwrap();
    counter
});

/// Duration of reconciliations in seconds
pub static RECONCILIATION_DURATION_SECONDS: LazyLock<Histogram> = LazyLock::new(|| {
    let opts = HistogramOpts::new(
        format!("{METRICS_NAMESPACE}_reconciliation_duration_seconds"),
        "Duration of CustomLabel reconciliations in seconds",
    )
    .buckets(vec![0.001, 0.01, 0.1, 0.5, 1.0, 2.0, 5.0, 10.0]);
    let histogram = Histogram::with_opts(opts).unwrap();
    METRICS_REGISTRY
        .register(Box::new(histogram.clone()))
        .unwrap();
    histogram
});

/// Total number of labels written to namespaces
pub static LABELS_APPLIED_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    let counter = IntCounter::new(
        format!("{METRICS_NAMESPACE}_labels_applied_total"),
        "Total number of labels written to namespaces",
    )
    .unwrap();
    METRICS_REGISTRY
        .register(Box::new(counter.clone()))
        .unwrap();
    counter
});

/// Total number of labels retracted from namespaces
pub static LABELS_REMOVED_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    let counter = IntCounter::new(
        format!("{METRICS_NAMESPACE}_labels_removed_total"),
        "Total number of labels retracted from namespaces",
    )
    .unwrap();
    METRICS_REGISTRY
        .register(Box::new(counter.clone()))
        .unwrap();
    counter
});

/// Total number of label keys rejected (protected prefix or foreign owner)
pub static LABEL_REJECTIONS_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_label_rejections_total"),
        "Total number of rejected label keys by reason",
    );
    let counter = CounterVec::new(opts, &["reason"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(counter.clone()))
        .unwrap();
    counter
});

/// Record a successful reconciliation and its duration.
pub fn record_reconciliation_success(duration: Duration) {
    RECONCILIATION_TOTAL.with_label_values(&["success"]).inc();
    RECONCILIATION_DURATION_SECONDS.observe(duration.as_secs_f64());
}

/// Record a failed reconciliation and its duration.
pub fn record_reconciliation_error(duration: Duration) {
    RECONCILIATION_TOTAL.with_label_values(&["error"]).inc();
    RECONCILIATION_DURATION_SECONDS.observe(duration.as_secs_f64());
}

/// Record the label writes and retractions of one pass.
pub fn record_label_writes(added: usize, removed: usize) {
    #[allow(clippy::cast_possible_truncation)]
    {
        LABELS_APPLIED_TOTAL.inc_by(added as u64);
        LABELS_REMOVED_TOTAL.inc_by(removed as u64);
    }
}

/// Record a rejected label key.
pub fn record_label_rejection(reason: &str) {
    LABEL_REJECTIONS_TOTAL.with_label_values(&[reason]).inc();
}

/// Render all registered metrics in the Prometheus text exposition format.
///
/// # Errors
///
/// Returns an error if encoding fails or the buffer is not valid UTF-8.
pub fn render() -> anyhow::Result<String> {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    encoder.encode(&METRICS_REGISTRY.gather(), &mut buffer)?;
    Ok(String::from_utf8(buffer)?)
}
