// Prometheus metrics definitions for the rugby coach backend.

use lazy_static::lazy_static;
use prometheus::{
    Encoder, Histogram, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder,
};
use std::sync::Once;

lazy_static! {
    pub static ref REGISTRY: Registry = Registry::new();

    // ── Counters ─────────────────────────────────────────────────────

    /// Total API requests, by method/endpoint/status.
    pub static ref API_REQUESTS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("rugby_api_requests_total", "Total API requests"),
        &["method", "endpoint", "status"],
    )
    .unwrap();

    /// Player submissions, by outcome (analyzed, fallback, rejected).
    pub static ref PLAYER_SUBMISSIONS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("rugby_player_submissions_total", "Player submissions by outcome"),
        &["outcome"],
    )
    .unwrap();

    /// Completion calls that failed, by failure kind.
    pub static ref COMPLETION_FAILURES_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("rugby_completion_failures_total", "Failed completion calls"),
        &["kind"],
    )
    .unwrap();

    // ── Histograms ───────────────────────────────────────────────────

    /// API request duration in seconds, by endpoint.
    pub static ref API_REQUEST_DURATION_SECONDS: HistogramVec = HistogramVec::new(
        HistogramOpts::new(
            "rugby_api_request_duration_seconds",
            "API request duration in seconds",
        )
        .buckets(vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 5.0, 30.0]),
        &["endpoint"],
    )
    .unwrap();

    /// Wall time of completion calls that reached the network.
    pub static ref COMPLETION_DURATION_SECONDS: Histogram = Histogram::with_opts(
        HistogramOpts::new(
            "rugby_completion_duration_seconds",
            "Completion call duration in seconds",
        )
        .buckets(vec![0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 20.0, 30.0, 60.0]),
    )
    .unwrap();
}

static REGISTER: Once = Once::new();

/// Register all metrics with the custom registry. Safe to call more than once.
pub fn register_metrics() {
    REGISTER.call_once(|| {
        let collectors: Vec<Box<dyn prometheus::core::Collector>> = vec![
            Box::new(API_REQUESTS_TOTAL.clone()),
            Box::new(PLAYER_SUBMISSIONS_TOTAL.clone()),
            Box::new(COMPLETION_FAILURES_TOTAL.clone()),
            Box::new(API_REQUEST_DURATION_SECONDS.clone()),
            Box::new(COMPLETION_DURATION_SECONDS.clone()),
        ];

        for c in collectors {
            if let Err(e) = REGISTRY.register(c) {
                tracing::error!("Failed to register metric: {e}");
            }
        }
    });
}

/// Serialize all registered metrics to the Prometheus text exposition format.
pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!("Failed to encode metrics: {e}");
        return String::new();
    }
    String::from_utf8_lossy(&buffer).into_owned()
}
