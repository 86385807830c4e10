use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use rinkwatch_core::{
    create_audit_system, load_config, validate_config, AuditEvent, AuditStore, FeedClient,
    FeedOrchestrator, GameStore, SqliteAuditStore, SqliteGameStore, StatsApiClient,
};
use rinkwatch_server::api::create_router;
use rinkwatch_server::state::AppState;

/// Application version
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Buffer size for audit event channel
const AUDIT_BUFFER_SIZE: usize = 1000;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Determine config path
    let config_path = std::env::var("RINKWATCH_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    info!("Loading configuration from {:?}", config_path);
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;

    validate_config(&config).context("Configuration validation failed")?;

    info!("Configuration loaded successfully");
    info!("Database path: {:?}", config.database.path);

    // Compute config hash for audit
    let config_json = serde_json::to_string(&config).unwrap_or_default();
    let config_hash = format!("{:x}", Sha256::digest(config_json.as_bytes()));
    let config_hash_short = &config_hash[..16];

    let audit_store: Arc<dyn AuditStore> = Arc::new(
        SqliteAuditStore::new(&config.database.path).context("Failed to create audit store")?,
    );
    info!("Audit store initialized");

    let game_store: Arc<dyn GameStore> = Arc::new(
        SqliteGameStore::new(&config.database.path).context("Failed to create game store")?,
    );
    info!("Game store initialized");

    let (audit_handle, audit_writer) =
        create_audit_system(Arc::clone(&audit_store), AUDIT_BUFFER_SIZE);
    let writer_handle = tokio::spawn(audit_writer.run());

    audit_handle
        .emit(AuditEvent::ServiceStarted {
            version: VERSION.to_string(),
            config_hash: config_hash_short.to_string(),
        })
        .await;

    let feed: Arc<dyn FeedClient> = Arc::new(
        StatsApiClient::new(config.feed.clone()).context("Failed to create stats feed client")?,
    );
    info!("Stats feed client targeting {}", config.feed.schedule_url);

    let orchestrator = Arc::new(FeedOrchestrator::new(
        config.orchestrator.clone(),
        feed,
        Arc::clone(&game_store),
        Some(audit_handle.clone()),
    ));

    if config.orchestrator.enabled {
        orchestrator.start();
        info!("Feed orchestrator started");
    } else {
        warn!("Orchestrator disabled in config; reloads are still served");
    }

    let state = Arc::new(AppState::new(
        config.clone(),
        audit_store,
        game_store,
        Arc::clone(&orchestrator),
    ));

    let app = create_router(state);

    let addr = SocketAddr::new(config.server.host, config.server.port);
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    if orchestrator.is_running() {
        info!("Stopping orchestrator...");
        orchestrator.stop();
        info!("Orchestrator stopped");
    }

    info!("Server shutting down...");
    audit_handle
        .emit(AuditEvent::ServiceStopped {
            reason: "graceful_shutdown".to_string(),
        })
        .await;

    // The writer exits once every AuditHandle clone is gone. The router
    // (and its AppState) was consumed by serve; the orchestrator and its
    // jobs hold the rest.
    drop(orchestrator);
    drop(audit_handle);

    let _ = writer_handle.await;
    info!("Audit writer stopped");

    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
