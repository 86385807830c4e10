//! Types for the feed orchestrator.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::audit::AuditEvent;
use crate::feed::FeedError;
use crate::store::StoreError;

/// A feed payload that parsed but cannot be normalized.
#[derive(Debug, Error)]
pub enum MappingError {
    /// Document did not match the expected shape.
    #[error("unexpected payload: {0}")]
    Payload(String),

    /// Season metadata came back without any season.
    #[error("season {0} not found in feed response")]
    SeasonNotFound(String),

    /// Jersey number text that is not an integer.
    #[error("invalid jersey number {value:?} for player {player_id}")]
    InvalidJerseyNumber { player_id: i64, value: String },
}

/// Outcome of a failed tick (monitor cycle, ingestion run or reload).
#[derive(Debug, Error)]
pub enum TickError {
    /// Network failure, non-success status or timeout.
    #[error("feed fetch failed: {0}")]
    FeedFetch(FeedError),

    /// Unexpected or missing shape in a feed payload.
    #[error("mapping failed: {0}")]
    Mapping(#[from] MappingError),

    /// Store upsert or query failure.
    #[error("persistence failed: {0}")]
    Persistence(#[from] StoreError),
}

impl TickError {
    /// Short label used in logs, metrics and audit events.
    pub fn kind(&self) -> &'static str {
        match self {
            TickError::FeedFetch(_) => "feed_fetch",
            TickError::Mapping(_) => "mapping",
            TickError::Persistence(_) => "persistence",
        }
    }
}

impl From<FeedError> for TickError {
    fn from(e: FeedError) -> Self {
        match e {
            FeedError::ParseError(msg) => TickError::Mapping(MappingError::Payload(msg)),
            other => TickError::FeedFetch(other),
        }
    }
}

/// Identity of a registered job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum JobKind {
    /// The schedule monitor.
    Monitor,
    /// Recurring boxscore ingestion for one live game.
    Ingest { game_id: i64 },
}

impl JobKind {
    pub fn ingest(game_id: i64) -> Self {
        JobKind::Ingest { game_id }
    }

    /// Metric label.
    pub fn label(&self) -> &'static str {
        match self {
            JobKind::Monitor => "monitor",
            JobKind::Ingest { .. } => "ingest",
        }
    }

    /// Audit event for a failed tick of this job.
    pub fn failure_event(&self, error: &TickError) -> AuditEvent {
        match self {
            JobKind::Monitor => AuditEvent::MonitorCycleFailed {
                error_kind: error.kind().to_string(),
                error: error.to_string(),
            },
            JobKind::Ingest { game_id } => AuditEvent::IngestionFailed {
                game_id: *game_id,
                error_kind: error.kind().to_string(),
                error: error.to_string(),
                one_shot: false,
            },
        }
    }
}

impl fmt::Display for JobKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobKind::Monitor => f.write_str("monitor-schedule"),
            JobKind::Ingest { game_id } => write!(f, "ingest-{}", game_id),
        }
    }
}

/// Snapshot of one registered job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobInfo {
    pub name: String,
    #[serde(flatten)]
    pub kind: JobKind,
    pub running: bool,
    pub interval_ms: u64,
    /// `None` while the job is stopped.
    pub next_fire_time: Option<DateTime<Utc>>,
}

/// What one monitor cycle did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub games_seen: usize,
    /// Games whose ingestion job was created this cycle.
    pub started: Vec<i64>,
    /// Games whose ingestion job was removed this cycle.
    pub finished: Vec<i64>,
}

/// What one ingestion run wrote.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestReport {
    pub game_id: i64,
    pub players: usize,
    pub participations: usize,
    /// Roster entries dropped as non-participants.
    pub skipped: usize,
}

/// Result of a season reload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReloadReport {
    pub season_id: String,
    pub games: usize,
    pub ingested: usize,
    pub failed: usize,
}

/// Current status of the orchestrator.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrchestratorStatus {
    pub running: bool,
    /// Games with a registered ingestion job.
    pub live_games: Vec<i64>,
}
