pub mod audit;
pub mod config;
pub mod feed;
pub mod metrics;
pub mod orchestrator;
pub mod store;
pub mod testing;

pub use audit::{
    create_audit_system, AuditError, AuditEvent, AuditFilter, AuditHandle, AuditRecord,
    AuditStore, AuditWriter, SqliteAuditStore,
};
pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, DatabaseConfig,
    FeedConfig, ServerConfig,
};
pub use feed::{DateRange, FeedClient, FeedError, StatsApiClient};
pub use orchestrator::{
    FeedOrchestrator, JobInfo, JobKind, OrchestratorConfig, OrchestratorStatus, TickError,
};
pub use store::{GameState, GameStore, SqliteGameStore, StoreError};
