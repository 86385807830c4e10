use axum::{
    extract::State,
    http::{header, StatusCode},
    middleware,
    response::IntoResponse,
    routing::get,
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use super::{audit, games, handlers, jobs, middleware::metrics_middleware, players};
use crate::metrics::{collect_dynamic_metrics, encode_metrics};
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    // API routes
    let api_routes = Router::new()
        // Health and config
        .route("/health", get(handlers::health))
        .route("/config", get(handlers::get_config))
        // Audit
        .route("/audit", get(audit::query_audit))
        // Games
        .route("/games", get(games::list_games))
        .route("/games/{id}", get(games::get_game))
        .route("/games/{id}/players/{player_id}", get(games::get_game_player))
        // Players
        .route("/players/{id}/games", get(players::get_player_games))
        .route("/players/{id}/games/{game_id}", get(players::get_player_game))
        // Jobs and reloads
        .route("/jobs", get(jobs::list_jobs))
        .route("/orchestrator/status", get(jobs::get_status))
        .route(
            "/reload/season/{season_id}",
            get(jobs::reload_season).post(jobs::reload_season),
        )
        .route(
            "/reload/game/{game_id}",
            get(jobs::reload_game).post(jobs::reload_game),
        )
        .layer(middleware::from_fn(metrics_middleware))
        .with_state(Arc::clone(&state));

    Router::new()
        .nest("/api/v1", api_routes)
        .route("/metrics", get(metrics).with_state(state))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Prometheus text exposition
async fn metrics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    collect_dynamic_metrics(&state);
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        encode_metrics(),
    )
}
