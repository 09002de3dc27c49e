//! Prometheus metrics for monitoring the relay server.
//!
//! Metrics are registered in the default prometheus registry exactly once and
//! exposed by the `/metrics` endpoint.

use prometheus::{
    register_gauge_vec, register_histogram_vec, register_int_counter_vec, register_int_gauge,
    GaugeVec, HistogramVec, IntCounterVec, IntGauge,
};
use std::sync::OnceLock;

/// Container for all application metrics.
pub struct Metrics {
    /// Total number of requests by method, endpoint and status
    pub request_count: IntCounterVec,

    /// Request duration histogram in seconds (time to response headers)
    pub request_duration: HistogramVec,

    /// Number of currently active requests by endpoint
    pub active_requests: GaugeVec,

    /// Number of sessions held in memory
    pub sessions: IntGauge,

    /// Finished relays by outcome (completed, failed, cancelled, rejected)
    pub relay_outcomes: IntCounterVec,

    /// Provider failures by stage (start_chat, send, stream)
    pub provider_errors: IntCounterVec,

    /// Text fragments forwarded to callers
    pub fragments: IntCounterVec,

    /// Time from sending a message to receiving its first fragment
    pub time_to_first_fragment: HistogramVec,

    /// Full duration of a relayed stream
    pub stream_duration: HistogramVec,
}

static METRICS: OnceLock<Metrics> = OnceLock::new();

/// Initialize the metrics registry.
///
/// Safe to call repeatedly; later calls return the instance created first.
pub fn init_metrics() -> &'static Metrics {
    METRICS.get_or_init(|| {
        let request_count = register_int_counter_vec!(
            "gemini_relay_requests_total",
            "Total number of requests",
            &["method", "endpoint", "status_code"]
        )
        .expect("Failed to register request_count metric");

        let request_duration = register_histogram_vec!(
            "gemini_relay_request_duration_seconds",
            "Request duration in seconds",
            &["method", "endpoint"],
            vec![0.1, 0.5, 1.0, 2.0, 5.0, 10.0, 30.0, 60.0, 120.0]
        )
        .expect("Failed to register request_duration metric");

        let active_requests = register_gauge_vec!(
            "gemini_relay_active_requests",
            "Number of active requests",
            &["endpoint"]
        )
        .expect("Failed to register active_requests metric");

        let sessions = register_int_gauge!(
            "gemini_relay_sessions",
            "Number of chat sessions held in memory"
        )
        .expect("Failed to register sessions metric");

        let relay_outcomes = register_int_counter_vec!(
            "gemini_relay_outcomes_total",
            "Finished relays by outcome",
            &["outcome"]
        )
        .expect("Failed to register relay_outcomes metric");

        let provider_errors = register_int_counter_vec!(
            "gemini_relay_provider_errors_total",
            "Provider failures by stage",
            &["stage"]
        )
        .expect("Failed to register provider_errors metric");

        let fragments = register_int_counter_vec!(
            "gemini_relay_fragments_total",
            "Text fragments forwarded to callers",
            &["model"]
        )
        .expect("Failed to register fragments metric");

        let time_to_first_fragment = register_histogram_vec!(
            "gemini_relay_time_to_first_fragment_seconds",
            "Time from sending a message to its first fragment",
            &["model"],
            vec![0.05, 0.1, 0.2, 0.5, 1.0, 2.0, 5.0, 10.0]
        )
        .expect("Failed to register time_to_first_fragment metric");

        let stream_duration = register_histogram_vec!(
            "gemini_relay_stream_duration_seconds",
            "Duration of relayed streams",
            &["model", "outcome"],
            vec![0.5, 1.0, 2.0, 5.0, 10.0, 30.0, 60.0, 120.0]
        )
        .expect("Failed to register stream_duration metric");

        Metrics {
            request_count,
            request_duration,
            active_requests,
            sessions,
            relay_outcomes,
            provider_errors,
            fragments,
            time_to_first_fragment,
            stream_duration,
        }
    })
}

/// Get the global metrics instance.
///
/// # Panics
///
/// Panics if metrics have not been initialized via [`init_metrics`].
pub fn get_metrics() -> &'static Metrics {
    METRICS.get().expect("Metrics not initialized")
}
