use once_cell::sync::Lazy;
use prometheus::{
    register_histogram, register_int_counter_vec, Encoder, Histogram, IntCounterVec, TextEncoder,
};

// Prometheus metrics (default registry)
pub static OPERATIONS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "kv_gateway_operations_total",
        "Bucket and token operations by outcome",
        &["operation", "outcome"]
    )
    .expect("register operations_total")
});

pub static BACKUPS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "kv_gateway_backups_total",
        "Backup snapshot runs by outcome",
        &["outcome"]
    )
    .expect("register backups_total")
});

pub static BACKUP_DURATION: Lazy<Histogram> = Lazy::new(|| {
    register_histogram!(
        "kv_gateway_backup_duration_seconds",
        "Backup snapshot duration in seconds",
        vec![0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0, 30.0]
    )
    .expect("register backup_duration")
});

pub fn record_operation(operation: &str, outcome: &str) {
    OPERATIONS_TOTAL.with_label_values(&[operation, outcome]).inc();
}

pub fn record_backup(ok: bool, seconds: f64) {
    let outcome = if ok { "ok" } else { "error" };
    BACKUPS_TOTAL.with_label_values(&[outcome]).inc();
    BACKUP_DURATION.observe(seconds);
}

pub fn encode_metrics() -> (axum::http::StatusCode, String) {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        return (
            axum::http::StatusCode::INTERNAL_SERVER_ERROR,
            format!("metrics encode error: {e}"),
        );
    }
    (
        axum::http::StatusCode::OK,
        String::from_utf8(buffer).unwrap_or_default(),
    )
}
