//! Feed orchestrator implementation.
//!
//! Wires the job registry, schedule monitor, game ingestor and season
//! reloader together:
//! - Monitor: one recurring job, registered at construction
//! - Ingestion: one recurring job per live game, owned by the monitor
//! - Reloads: fire-and-forget tasks, outside the registry

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::audit::{emit_opt, AuditEvent, AuditHandle};
use crate::feed::FeedClient;
use crate::store::GameStore;

use super::config::OrchestratorConfig;
use super::ingestor::GameIngestor;
use super::monitor::ScheduleMonitor;
use super::registry::JobRegistry;
use super::reloader::SeasonReloader;
use super::types::{JobInfo, JobKind, OrchestratorStatus};

/// The feed orchestrator.
pub struct FeedOrchestrator {
    config: OrchestratorConfig,
    registry: Arc<JobRegistry>,
    monitor: Arc<ScheduleMonitor>,
    ingestor: Arc<GameIngestor>,
    reloader: Arc<SeasonReloader>,
    audit: Option<AuditHandle>,
    running: AtomicBool,
}

impl FeedOrchestrator {
    /// Create a new orchestrator. The monitor job is registered but not
    /// started.
    pub fn new(
        config: OrchestratorConfig,
        feed: Arc<dyn FeedClient>,
        store: Arc<dyn GameStore>,
        audit: Option<AuditHandle>,
    ) -> Self {
        let registry = Arc::new(JobRegistry::new(audit.clone()));
        let ingestor = Arc::new(GameIngestor::new(
            Arc::clone(&feed),
            Arc::clone(&store),
            config.non_participant_code.clone(),
            audit.clone(),
        ));
        let monitor = Arc::new(ScheduleMonitor::new(
            Arc::clone(&feed),
            Arc::clone(&store),
            Arc::clone(&registry),
            Arc::clone(&ingestor),
            config.ingest_interval(),
            audit.clone(),
        ));
        let reloader = Arc::new(SeasonReloader::new(
            feed,
            store,
            Arc::clone(&ingestor),
            config.reload_concurrency,
            audit.clone(),
        ));

        registry.add_job(JobKind::Monitor, config.monitor_interval(), monitor.job_action());

        Self {
            config,
            registry,
            monitor,
            ingestor,
            reloader,
            audit,
            running: AtomicBool::new(false),
        }
    }

    /// Start every registered job.
    pub fn start(&self) {
        if self.running.swap(true, Ordering::SeqCst) {
            warn!("Orchestrator already running");
            return;
        }

        info!(
            monitor_interval_ms = self.config.monitor_interval_ms,
            ingest_interval_ms = self.config.ingest_interval_ms,
            "Starting feed orchestrator"
        );
        self.registry.start();
    }

    /// Stop every job. Jobs stay registered; in-flight ticks finish on
    /// their own.
    pub fn stop(&self) {
        if !self.running.swap(false, Ordering::SeqCst) {
            warn!("Orchestrator not running");
            return;
        }

        info!("Stopping feed orchestrator");
        self.registry.stop();
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub fn list_jobs(&self) -> Vec<JobInfo> {
        self.registry.list_jobs()
    }

    pub fn status(&self) -> OrchestratorStatus {
        OrchestratorStatus {
            running: self.is_running(),
            live_games: self.registry.ingest_game_ids(),
        }
    }

    /// Reload a whole season in the background.
    pub fn reload_season(&self, season_id: impl Into<String>) -> JoinHandle<()> {
        let season_id = season_id.into();
        let reloader = Arc::clone(&self.reloader);
        info!("Reloading season {}", season_id);

        tokio::spawn(async move {
            reloader.run(&season_id).await;
        })
    }

    /// Ingest a single game once in the background.
    pub fn reload_game(&self, game_id: i64) -> JoinHandle<()> {
        let ingestor = Arc::clone(&self.ingestor);
        let audit = self.audit.clone();
        info!(game_id, "Reloading game {}", game_id);

        tokio::spawn(async move {
            emit_opt(&audit, AuditEvent::GameReloadRequested { game_id }).await;
            if let Err(e) = ingestor.ingest_once(game_id).await {
                debug!(game_id, error_kind = e.kind(), "Game reload ended without data");
            }
        })
    }

    pub fn monitor(&self) -> &Arc<ScheduleMonitor> {
        &self.monitor
    }

    pub fn registry(&self) -> &Arc<JobRegistry> {
        &self.registry
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }
}
