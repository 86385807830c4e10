//! Job and reload API handlers.

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;
use std::sync::Arc;

use rinkwatch_core::{JobInfo, OrchestratorStatus};

use crate::state::AppState;

/// Simple message response
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    fn reloading_started() -> Self {
        Self {
            message: "Reloading started".to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ListJobsResponse {
    pub jobs: Vec<JobInfo>,
}

/// List registered jobs with their next fire time
pub async fn list_jobs(State(state): State<Arc<AppState>>) -> Json<ListJobsResponse> {
    Json(ListJobsResponse {
        jobs: state.orchestrator().list_jobs(),
    })
}

/// Get orchestrator status
pub async fn get_status(State(state): State<Arc<AppState>>) -> Json<OrchestratorStatus> {
    Json(state.orchestrator().status())
}

/// Reload a season in the background
pub async fn reload_season(
    State(state): State<Arc<AppState>>,
    Path(season_id): Path<String>,
) -> Json<MessageResponse> {
    // Detached; the outcome lands in the audit log
    drop(state.orchestrator().reload_season(season_id));
    Json(MessageResponse::reloading_started())
}

/// Ingest one game once in the background
pub async fn reload_game(
    State(state): State<Arc<AppState>>,
    Path(game_id): Path<i64>,
) -> Json<MessageResponse> {
    drop(state.orchestrator().reload_game(game_id));
    Json(MessageResponse::reloading_started())
}
