//! Feed orchestrator.
//!
//! Keeps the local store in step with the stats feed:
//! - **Job registry**: named recurring jobs with contained, non-overlapping ticks
//! - **Schedule monitor**: samples the schedule and starts/stops per-game ingestion
//! - **Game ingestor**: pulls a boxscore and upserts players and participations
//! - **Season reloader**: backfills a season with one-shot ingestions

mod config;
mod ingestor;
mod monitor;
mod registry;
mod reloader;
mod runner;
mod types;

pub use config::OrchestratorConfig;
pub use ingestor::{extract_participations, ExtractedRoster, GameIngestor};
pub use monitor::{flatten_schedule, ScheduleMonitor};
pub use registry::{job_action, JobAction, JobFuture, JobRegistry};
pub use reloader::SeasonReloader;
pub use runner::FeedOrchestrator;
pub use types::{
    CycleReport, IngestReport, JobInfo, JobKind, MappingError, OrchestratorStatus, ReloadReport,
    TickError,
};
