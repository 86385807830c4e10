//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Job registry (ticks, skipped ticks, active ingestion jobs)
//! - Schedule monitor (game transitions)
//! - Ingestion and reloads (participations written, one-shot outcomes)
//! - Upstream feed (request counts and latency)

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts};

// =============================================================================
// Job Registry
// =============================================================================

/// Completed job ticks by job and result.
pub static JOB_TICKS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("rinkwatch_job_ticks_total", "Total job ticks"),
        &["job", "result"], // job: "monitor", "ingest"; result: "ok", "feed_fetch", "mapping", "persistence", "panic"
    )
    .unwrap()
});

/// Ticks skipped because the previous tick of the same job was still running.
pub static JOB_TICKS_SKIPPED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "rinkwatch_job_ticks_skipped_total",
            "Ticks skipped while the previous tick was in flight",
        ),
        &["job"],
    )
    .unwrap()
});

/// Tick duration in seconds.
pub static JOB_TICK_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new("rinkwatch_job_tick_duration_seconds", "Duration of job ticks")
            .buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]),
        &["job"],
    )
    .unwrap()
});

/// Registered ingestion jobs.
pub static ACTIVE_INGEST_JOBS: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "rinkwatch_active_ingest_jobs",
        "Number of registered ingestion jobs",
    )
    .unwrap()
});

// =============================================================================
// Schedule Monitor
// =============================================================================

/// Game transitions observed by the monitor.
pub static GAME_TRANSITIONS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "rinkwatch_game_transitions_total",
            "Games started or finished as seen by the schedule monitor",
        ),
        &["transition"], // "started", "finished"
    )
    .unwrap()
});

/// Monitor cycles completed successfully.
pub static MONITOR_CYCLES: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "rinkwatch_monitor_cycles_total",
        "Successful schedule monitor cycles",
    )
    .unwrap()
});

// =============================================================================
// Ingestion
// =============================================================================

/// Participation rows written.
pub static PARTICIPATIONS_UPSERTED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "rinkwatch_participations_upserted_total",
        "Participation rows upserted",
    )
    .unwrap()
});

/// One-shot ingestions by result.
pub static ONE_SHOT_INGESTIONS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "rinkwatch_one_shot_ingestions_total",
            "Reload-triggered ingestions",
        ),
        &["result"], // "ok", "failed"
    )
    .unwrap()
});

/// Season reloads by result.
pub static SEASON_RELOADS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("rinkwatch_season_reloads_total", "Season reloads"),
        &["result"], // "completed", "failed"
    )
    .unwrap()
});

// =============================================================================
// Upstream feed
// =============================================================================

/// Feed request duration in seconds.
pub static FEED_REQUEST_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "rinkwatch_feed_request_duration_seconds",
            "Duration of upstream feed requests",
        )
        .buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]),
        &["operation"], // "schedule", "boxscore", "seasons"
    )
    .unwrap()
});

/// Feed requests by operation and status.
pub static FEED_REQUESTS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("rinkwatch_feed_requests_total", "Total upstream feed requests"),
        &["operation", "status"], // status: "success", "error"
    )
    .unwrap()
});

/// Get all core metrics for registration.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        // Jobs
        Box::new(JOB_TICKS.clone()),
        Box::new(JOB_TICKS_SKIPPED.clone()),
        Box::new(JOB_TICK_DURATION.clone()),
        Box::new(ACTIVE_INGEST_JOBS.clone()),
        // Monitor
        Box::new(GAME_TRANSITIONS.clone()),
        Box::new(MONITOR_CYCLES.clone()),
        // Ingestion
        Box::new(PARTICIPATIONS_UPSERTED.clone()),
        Box::new(ONE_SHOT_INGESTIONS.clone()),
        Box::new(SEASON_RELOADS.clone()),
        // Feed
        Box::new(FEED_REQUEST_DURATION.clone()),
        Box::new(FEED_REQUESTS.clone()),
    ]
}
