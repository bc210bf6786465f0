//! Prometheus metrics endpoint
//!
//! Exposes application metrics in Prometheus format for monitoring.

use axum::response::IntoResponse;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::Lazy;

use crate::provider::Provider;

/// Global Prometheus handle for metrics export
static PROMETHEUS_HANDLE: Lazy<PrometheusHandle> = Lazy::new(|| {
    PrometheusBuilder::new()
        .install_recorder()
        .expect("Failed to install Prometheus recorder")
});

/// Initialize metrics (call once at startup)
pub fn init_metrics() {
    // Force initialization of the lazy static
    let _ = &*PROMETHEUS_HANDLE;

    register_metrics();
}

fn register_metrics() {
    metrics::describe_counter!(
        "promptrelay_requests_total",
        "Total number of generation requests by provider and outcome"
    );
    metrics::describe_histogram!(
        "promptrelay_request_duration_seconds",
        "Generation request duration in seconds"
    );
    metrics::describe_histogram!(
        "promptrelay_upload_bytes",
        "Size of uploaded files in bytes"
    );
}

/// Prometheus metrics endpoint handler
///
/// Returns metrics in Prometheus text format for scraping.
pub async fn prometheus_metrics() -> impl IntoResponse {
    PROMETHEUS_HANDLE.render()
}

/// Record a finished generation request
pub fn record_request(provider: Provider, outcome: &str, duration_secs: f64) {
    metrics::counter!(
        "promptrelay_requests_total",
        "provider" => provider.as_str(),
        "outcome" => outcome.to_string()
    )
    .increment(1);
    metrics::histogram!(
        "promptrelay_request_duration_seconds",
        "provider" => provider.as_str()
    )
    .record(duration_secs);
}

/// Record the size of an accepted upload
pub fn record_upload(provider: Provider, size: usize) {
    metrics::histogram!("promptrelay_upload_bytes", "provider" => provider.as_str())
        .record(size as f64);
}
