//! Prometheus metrics collection for classgate.
//!
//! Tracks authorization decisions by outcome, admin-mutation operations,
//! and operation latency. Exposed on the HTTP `/metrics` endpoint.

use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder,
};
use std::sync::OnceLock;

/// Global Prometheus registry for all metrics.
pub static REGISTRY: OnceLock<Registry> = OnceLock::new();

pub fn registry() -> &'static Registry {
    REGISTRY.get_or_init(Registry::new)
}

/// Authorization decisions by outcome ("allow" or the deny reason code).
pub static DECISIONS: OnceLock<IntCounterVec> = OnceLock::new();

/// Admin-mutation operations by operation and outcome.
pub static MUTATIONS: OnceLock<IntCounterVec> = OnceLock::new();

/// Operation processing latency by operation.
pub static OPERATION_LATENCY: OnceLock<HistogramVec> = OnceLock::new();

/// Initialize the Prometheus metrics registry.
///
/// Must be called once at startup before any metrics are recorded;
/// recording before init is a silent no-op.
pub fn init() {
    let r = registry();

    // Helper macro to register metric
    macro_rules! register {
        ($metric:ident, $init:expr) => {
            let m = $init.expect(concat!(stringify!($metric), " creation failed"));
            if let Err(e) = r.register(Box::new(m.clone())) {
                tracing::warn!(error = %e, concat!("Failed to register metric ", stringify!($metric)));
            }
            let _ = $metric.set(m);
        };
    }

    register!(
        DECISIONS,
        IntCounterVec::new(
            Opts::new(
                "classgate_authz_decisions_total",
                "Authorization decisions by outcome"
            ),
            &["outcome"]
        )
    );
    register!(
        MUTATIONS,
        IntCounterVec::new(
            Opts::new(
                "classgate_admin_mutations_total",
                "Admin-mutation operations by operation and outcome"
            ),
            &["operation", "outcome"]
        )
    );
    register!(
        OPERATION_LATENCY,
        HistogramVec::new(
            HistogramOpts::new(
                "classgate_operation_duration_seconds",
                "Operation latency by operation"
            )
            .buckets(vec![0.0001, 0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0]),
            &["operation"]
        )
    );
}

/// Record one authorization decision.
pub fn record_decision(outcome: &str) {
    if let Some(counter) = DECISIONS.get() {
        counter.with_label_values(&[outcome]).inc();
    }
}

/// Record one admin-mutation operation.
pub fn record_mutation(operation: &str, outcome: &str) {
    if let Some(counter) = MUTATIONS.get() {
        counter.with_label_values(&[operation, outcome]).inc();
    }
}

/// Record operation latency.
pub fn record_operation(operation: &str, duration_secs: f64) {
    if let Some(histogram) = OPERATION_LATENCY.get() {
        histogram
            .with_label_values(&[operation])
            .observe(duration_secs);
    }
}

/// Gather all metrics and encode them in Prometheus text format.
pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = registry().gather();
    let mut buffer = vec![];
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!(error = %e, "Failed to encode Prometheus metrics");
        return String::new();
    }
    match String::from_utf8(buffer) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!(error = %e, "Prometheus metrics were not valid UTF-8");
            String::new()
        }
    }
}
