//! Prometheus metrics for invoice-service.

use once_cell::sync::Lazy;
use prometheus::{
    CounterVec, HistogramVec, IntCounter, TextEncoder, register_counter_vec,
    register_histogram_vec, register_int_counter,
};

/// Invoice counter by status at creation or cancellation.
pub static INVOICES_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "invoice_invoices_total",
        "Total number of invoices by status",
        &["status"] // pending, paid, cancelled, overdue
    )
    .expect("Failed to register invoices_total")
});

/// Status transition counter by old and new status.
pub static STATUS_TRANSITIONS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "invoice_status_transitions_total",
        "Total number of recorded status transitions",
        &["from", "to"]
    )
    .expect("Failed to register status_transitions_total")
});

/// Restore counter.
pub static RESTORES_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "invoice_restores_total",
        "Total number of restored transitions"
    )
    .expect("Failed to register restores_total")
});

/// Database query duration histogram.
pub static DB_QUERY_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "invoice_db_query_duration_seconds",
        "Database query duration in seconds",
        &["operation"],
        vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0]
    )
    .expect("Failed to register db_query_duration")
});

/// Initialize all metrics (forces lazy initialization).
pub fn init_metrics() {
    Lazy::force(&INVOICES_TOTAL);
    Lazy::force(&STATUS_TRANSITIONS_TOTAL);
    Lazy::force(&RESTORES_TOTAL);
    Lazy::force(&DB_QUERY_DURATION);
}

/// Get metrics in Prometheus text format.
pub fn get_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    encoder
        .encode_to_string(&metric_families)
        .unwrap_or_default()
}
