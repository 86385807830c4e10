use std::sync::Arc;

use rinkwatch_core::{AuditStore, Config, FeedOrchestrator, GameStore};

/// Shared application state
pub struct AppState {
    config: Config,
    audit_store: Arc<dyn AuditStore>,
    game_store: Arc<dyn GameStore>,
    orchestrator: Arc<FeedOrchestrator>,
}

impl AppState {
    pub fn new(
        config: Config,
        audit_store: Arc<dyn AuditStore>,
        game_store: Arc<dyn GameStore>,
        orchestrator: Arc<FeedOrchestrator>,
    ) -> Self {
        Self {
            config,
            audit_store,
            game_store,
            orchestrator,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn audit_store(&self) -> &dyn AuditStore {
        self.audit_store.as_ref()
    }

    pub fn game_store(&self) -> &dyn GameStore {
        self.game_store.as_ref()
    }

    pub fn orchestrator(&self) -> &Arc<FeedOrchestrator> {
        &self.orchestrator
    }
}
