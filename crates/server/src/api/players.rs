//! Player read API handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use rinkwatch_core::store::{ParticipationDetail, PlayerGames};

use super::games::participation;
use super::handlers::{api_error, ApiError};
use crate::state::AppState;

/// Get a player with every game they appeared in
pub async fn get_player_games(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<PlayerGames>, ApiError> {
    match state.game_store().get_player_games(id) {
        Ok(Some(player)) => Ok(Json(player)),
        Ok(None) => Err(api_error(
            StatusCode::NOT_FOUND,
            format!("Player not found: {}", id),
        )),
        Err(e) => Err(api_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Failed to get player: {}", e),
        )),
    }
}

/// Get a player's participation in one game
pub async fn get_player_game(
    State(state): State<Arc<AppState>>,
    Path((player_id, game_id)): Path<(i64, i64)>,
) -> Result<Json<ParticipationDetail>, ApiError> {
    participation(&state, game_id, player_id)
}
