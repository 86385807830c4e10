use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Audit event types
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AuditEvent {
    // System events
    ServiceStarted {
        version: String,
        config_hash: String,
    },
    ServiceStopped {
        reason: String,
    },

    // Game lifecycle, as observed by the schedule monitor
    GameStarted {
        game_id: i64,
    },
    GameFinished {
        game_id: i64,
    },

    // Tick failures
    MonitorCycleFailed {
        /// One of "feed_fetch", "mapping", "persistence"
        error_kind: String,
        error: String,
    },
    IngestionFailed {
        game_id: i64,
        error_kind: String,
        error: String,
        /// True for reload-triggered runs, false for the recurring job
        one_shot: bool,
    },

    // Reloads
    SeasonReloadStarted {
        season_id: String,
    },
    SeasonReloadCompleted {
        season_id: String,
        games: usize,
        ingestion_failures: usize,
    },
    SeasonReloadFailed {
        season_id: String,
        error_kind: String,
        error: String,
    },
    GameReloadRequested {
        game_id: i64,
    },
}

impl AuditEvent {
    /// Stable name stored in the `event_type` column.
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::ServiceStarted { .. } => "service_started",
            Self::ServiceStopped { .. } => "service_stopped",
            Self::GameStarted { .. } => "game_started",
            Self::GameFinished { .. } => "game_finished",
            Self::MonitorCycleFailed { .. } => "monitor_cycle_failed",
            Self::IngestionFailed { .. } => "ingestion_failed",
            Self::SeasonReloadStarted { .. } => "season_reload_started",
            Self::SeasonReloadCompleted { .. } => "season_reload_completed",
            Self::SeasonReloadFailed { .. } => "season_reload_failed",
            Self::GameReloadRequested { .. } => "game_reload_requested",
        }
    }

    /// Game this event is about, if any.
    pub fn game_id(&self) -> Option<i64> {
        match self {
            Self::GameStarted { game_id }
            | Self::GameFinished { game_id }
            | Self::IngestionFailed { game_id, .. }
            | Self::GameReloadRequested { game_id } => Some(*game_id),
            _ => None,
        }
    }

    /// Human-readable line for the log sink.
    pub fn message(&self) -> String {
        match self {
            Self::ServiceStarted { version, .. } => format!("Service started (v{})", version),
            Self::ServiceStopped { reason } => format!("Service stopped: {}", reason),
            Self::GameStarted { game_id } => format!("Game {} has started", game_id),
            Self::GameFinished { game_id } => format!("Game {} has finished", game_id),
            Self::MonitorCycleFailed { error, .. } => {
                format!("Monitoring schedule failed: {}", error)
            }
            Self::IngestionFailed { game_id, error, .. } => {
                format!("Ingesting game-{} failed: {}", game_id, error)
            }
            Self::SeasonReloadStarted { season_id } => {
                format!("Reloading season-{} started", season_id)
            }
            Self::SeasonReloadCompleted {
                season_id,
                games,
                ingestion_failures,
            } => format!(
                "Reloading season-{} finished: {} games, {} ingestion failures",
                season_id, games, ingestion_failures
            ),
            Self::SeasonReloadFailed {
                season_id, error, ..
            } => format!("Reloading season-{} failed: {}", season_id, error),
            Self::GameReloadRequested { game_id } => {
                format!("Reloading game-{} requested", game_id)
            }
        }
    }
}

/// A persisted audit event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditRecord {
    pub id: i64,
    pub timestamp: DateTime<Utc>,
    pub event_type: String,
    pub game_id: Option<i64>,
    pub message: String,
    pub data: AuditEvent,
}
