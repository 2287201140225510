//! # Metrics
//!
//! Prometheus metrics for monitoring the provisioner.
//!
//! ## Metrics Exposed
//!
//! - `postgres_provisioner_reconciliations_total` - Total number of reconciliations
//! - `postgres_provisioner_reconciliation_errors_total` - Reconciliation errors by reason
//! - `postgres_provisioner_reconciliation_duration_seconds` - Duration of reconciliations
//! - `postgres_provisioner_objects_applied_total` - Applied objects by kind and action
//! - `postgres_provisioner_outcomes_total` - Successful reconciliations by outcome

use anyhow::{Context, Result};
use prometheus::{Encoder, Histogram, IntCounter, IntCounterVec, Registry, TextEncoder};
use std::sync::LazyLock;

pub(crate) static REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

static RECONCILIATIONS_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "postgres_provisioner_reconciliations_total",
        "Total number of reconciliations",
    )
    .expect("Failed to create RECONCILIATIONS_TOTAL metric - this should never happen")
});

pub(crate) static RECONCILIATION_ERRORS_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new(
            "postgres_provisioner_reconciliation_errors_total",
            "Total number of reconciliation errors by reason",
        ),
        &["reason"],
    )
    .expect("Failed to create RECONCILIATION_ERRORS_TOTAL metric - this should never happen")
});

static RECONCILIATION_DURATION: LazyLock<Histogram> = LazyLock::new(|| {
    Histogram::with_opts(
        prometheus::HistogramOpts::new(
            "postgres_provisioner_reconciliation_duration_seconds",
            "Duration of reconciliation in seconds",
        )
        .buckets(vec![0.05, 0.1, 0.5, 1.0, 2.0, 5.0, 10.0]),
    )
    .expect("Failed to create RECONCILIATION_DURATION metric - this should never happen")
});

pub(crate) static OBJECTS_APPLIED_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new(
            "postgres_provisioner_objects_applied_total",
            "Total number of managed objects applied by kind and action",
        ),
        &["kind", "action"],
    )
    .expect("Failed to create OBJECTS_APPLIED_TOTAL metric - this should never happen")
});

pub(crate) static OUTCOMES_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new(
            "postgres_provisioner_outcomes_total",
            "Total number of completed reconciliations by outcome (ready, pending)",
        ),
        &["outcome"],
    )
    .expect("Failed to create OUTCOMES_TOTAL metric - this should never happen")
});

/// Register all provisioner metrics with the registry
///
/// Call once at startup; a second call fails with an already-registered error.
#[allow(
    clippy::missing_errors_doc,
    reason = "Error documentation is provided in doc comments"
)]
pub fn register_metrics() -> Result<()> {
    REGISTRY.register(Box::new(RECONCILIATIONS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(RECONCILIATION_ERRORS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(RECONCILIATION_DURATION.clone()))?;
    REGISTRY.register(Box::new(OBJECTS_APPLIED_TOTAL.clone()))?;
    REGISTRY.register(Box::new(OUTCOMES_TOTAL.clone()))?;

    Ok(())
}

/// Render registered metrics in the Prometheus text format
#[allow(
    clippy::missing_errors_doc,
    reason = "Error documentation is provided in doc comments"
)]
pub fn gather_metrics() -> Result<String> {
    let mut buffer = Vec::new();
    TextEncoder::new()
        .encode(&REGISTRY.gather(), &mut buffer)
        .context("Failed to encode metrics")?;
    String::from_utf8(buffer).context("Metrics output is not valid UTF-8")
}

pub fn increment_reconciliations() {
    RECONCILIATIONS_TOTAL.inc();
}

pub fn increment_reconciliation_errors(reason: &str) {
    RECONCILIATION_ERRORS_TOTAL
        .with_label_values(&[reason])
        .inc();
}

pub fn observe_reconciliation_duration(duration: f64) {
    RECONCILIATION_DURATION.observe(duration);
}

pub fn record_object_applied(kind: &str, action: &str) {
    OBJECTS_APPLIED_TOTAL
        .with_label_values(&[kind, action])
        .inc();
}

pub fn record_outcome(outcome: &str) {
    OUTCOMES_TOTAL.with_label_values(&[outcome]).inc();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gather_includes_registered_metrics() {
        // Other tests in the binary may have registered already
        let _ = register_metrics();
        record_object_applied("Secret", "created");
        increment_reconciliation_errors("config_malformed");

        let output = gather_metrics().unwrap();
        assert!(output.contains("postgres_provisioner_objects_applied_total"));
        assert!(output.contains("kind=\"Secret\""));
        assert!(output.contains("reason=\"config_malformed\""));
    }

    #[test]
    fn test_labelled_counters_track_separately() {
        let before = OBJECTS_APPLIED_TOTAL
            .with_label_values(&["Service", "updated"])
            .get();
        record_object_applied("Service", "updated");
        record_object_applied("Service", "unchanged");
        assert_eq!(
            OBJECTS_APPLIED_TOTAL
                .with_label_values(&["Service", "updated"])
                .get(),
            before + 1
        );
    }
}
