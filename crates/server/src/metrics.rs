//! Prometheus metrics for observability.
//!
//! This module provides metrics for monitoring the rinkwatch server:
//! - HTTP request metrics (latency, counts, in-flight)
//! - Orchestrator and store status (collected dynamically)
//! - Core job, ingestion and feed metrics (registered from the core crate)

use once_cell::sync::Lazy;
use prometheus::{
    self, Encoder, HistogramOpts, HistogramVec, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};

/// Global metrics registry.
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    register_metrics(&registry);
    registry
});

// =============================================================================
// HTTP Request Metrics
// =============================================================================

/// HTTP request duration in seconds.
pub static HTTP_REQUEST_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "rinkwatch_http_request_duration_seconds",
            "HTTP request duration in seconds",
        )
        .buckets(vec![
            0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
        ]),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests total count.
pub static HTTP_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("rinkwatch_http_requests_total", "Total HTTP requests"),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests currently in flight.
pub static HTTP_REQUESTS_IN_FLIGHT: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "rinkwatch_http_requests_in_flight",
        "Number of HTTP requests currently being processed",
    )
    .unwrap()
});

// =============================================================================
// Orchestrator / Store Metrics
// =============================================================================

/// Whether the orchestrator is running (1 = running, 0 = stopped).
pub static ORCHESTRATOR_RUNNING: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "rinkwatch_orchestrator_running",
        "Whether the feed orchestrator is running",
    )
    .unwrap()
});

/// Games currently stored.
pub static GAMES_STORED: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new("rinkwatch_games_stored", "Number of games in the store").unwrap()
});

// =============================================================================
// Registration
// =============================================================================

fn register_metrics(registry: &Registry) {
    // HTTP
    registry
        .register(Box::new(HTTP_REQUEST_DURATION.clone()))
        .unwrap();
    registry
        .register(Box::new(HTTP_REQUESTS_TOTAL.clone()))
        .unwrap();
    registry
        .register(Box::new(HTTP_REQUESTS_IN_FLIGHT.clone()))
        .unwrap();

    // Orchestrator
    registry
        .register(Box::new(ORCHESTRATOR_RUNNING.clone()))
        .unwrap();
    registry.register(Box::new(GAMES_STORED.clone())).unwrap();

    // Core metrics (jobs, ingestion, feed)
    for metric in rinkwatch_core::metrics::all_metrics() {
        registry.register(metric).unwrap();
    }
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!("Failed to encode metrics: {}", e);
    }
    String::from_utf8_lossy(&buffer).into_owned()
}

/// Collect dynamic metrics from current application state.
///
/// Called before encoding so gauges reflect the orchestrator and store as
/// they are now.
pub fn collect_dynamic_metrics(state: &crate::state::AppState) {
    let status = state.orchestrator().status();
    ORCHESTRATOR_RUNNING.set(if status.running { 1 } else { 0 });

    if let Ok(games) = state.game_store().query_games(None) {
        GAMES_STORED.set(games.len() as i64);
    }
}

/// Normalize a path for metric labels (replace numeric ids with placeholders).
pub fn normalize_path(path: &str) -> String {
    static NUMERIC: Lazy<regex_lite::Regex> =
        Lazy::new(|| regex_lite::Regex::new(r"/\d+(/|$)").unwrap());

    // Applied twice: adjacent ids share a slash, so one pass skips every other one
    let result = NUMERIC.replace_all(path, "/{id}$1");
    let result = NUMERIC.replace_all(&result, "/{id}$1");
    result.to_string()
}
