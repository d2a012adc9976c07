//! Prometheus metrics.

use lazy_static::lazy_static;
use prometheus::{
    register_histogram_vec, register_int_counter_vec, HistogramVec, IntCounterVec,
};

lazy_static! {
    /// Total HTTP requests by method, path, and status.
    pub static ref HTTP_REQUESTS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "pons_http_requests_total",
        "Total number of HTTP requests",
        &["method", "path", "status"]
    )
    .expect("Failed to register HTTP_REQUESTS_TOTAL");

    /// HTTP request duration in seconds.
    pub static ref HTTP_REQUEST_DURATION_SECONDS: HistogramVec = register_histogram_vec!(
        "pons_http_request_duration_seconds",
        "HTTP request duration in seconds",
        &["method", "path"],
        vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]
    )
    .expect("Failed to register HTTP_REQUEST_DURATION_SECONDS");

    /// Calls to the upstream FHIR server by verb, resource type, and outcome.
    pub static ref FHIR_GATEWAY_REQUESTS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "pons_fhir_gateway_requests_total",
        "Total number of upstream FHIR requests",
        &["method", "resource_type", "outcome"]
    )
    .expect("Failed to register FHIR_GATEWAY_REQUESTS_TOTAL");

    /// Medication auto-complete job runs and per-resource transitions.
    pub static ref AUTO_COMPLETE_TOTAL: IntCounterVec = register_int_counter_vec!(
        "pons_auto_complete_total",
        "Medication auto-complete job outcomes",
        &["outcome"]
    )
    .expect("Failed to register AUTO_COMPLETE_TOTAL");
}

/// Collapse request paths with trailing identifiers into one label so metric
/// cardinality stays bounded.
pub fn sanitize_path(path: &str) -> String {
    let known_prefixes = [
        "/fhir/procedures",
        "/fhir/consent-form-status",
        "/fhir/consent-form",
        "/fhir/medications/active",
        "/fhir/medications/update-dose",
    ];
    for prefix in known_prefixes {
        if let Some(rest) = path.strip_prefix(prefix) {
            if rest.starts_with('/') && rest.len() > 1 {
                return format!("{prefix}/{{uhid}}");
            }
        }
    }
    path.to_string()
}
