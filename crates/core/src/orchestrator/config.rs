//! Orchestrator configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Configuration for the schedule monitor and ingestion jobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    /// Start the monitor when the server boots.
    /// When disabled, only manual reloads run.
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// How often to sample the schedule (milliseconds).
    #[serde(default = "default_monitor_interval")]
    pub monitor_interval_ms: u64,

    /// How often each live game's boxscore is pulled (milliseconds).
    #[serde(default = "default_ingest_interval")]
    pub ingest_interval_ms: u64,

    /// Maximum one-shot ingestions in flight during a season reload.
    #[serde(default = "default_reload_concurrency")]
    pub reload_concurrency: usize,

    /// Position code the feed uses for rostered players who did not play.
    #[serde(default = "default_non_participant_code")]
    pub non_participant_code: String,
}

fn default_enabled() -> bool {
    true
}

fn default_monitor_interval() -> u64 {
    2000 // 2 seconds
}

fn default_ingest_interval() -> u64 {
    5000 // 5 seconds
}

fn default_reload_concurrency() -> usize {
    4
}

fn default_non_participant_code() -> String {
    "N/A".to_string()
}

impl OrchestratorConfig {
    pub fn monitor_interval(&self) -> Duration {
        Duration::from_millis(self.monitor_interval_ms)
    }

    pub fn ingest_interval(&self) -> Duration {
        Duration::from_millis(self.ingest_interval_ms)
    }
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            monitor_interval_ms: default_monitor_interval(),
            ingest_interval_ms: default_ingest_interval(),
            reload_concurrency: default_reload_concurrency(),
            non_participant_code: default_non_participant_code(),
        }
    }
}
