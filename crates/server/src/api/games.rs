//! Game read API handlers.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use rinkwatch_core::store::{Game, GameDetail, ParticipationDetail};

use super::handlers::{api_error, ApiError};
use crate::state::AppState;

/// Query parameters for listing games
#[derive(Debug, Deserialize)]
pub struct ListGamesParams {
    /// Comma-separated game ids; all games when absent
    pub ids: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ListGamesResponse {
    pub games: Vec<Game>,
}

/// List stored games
pub async fn list_games(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListGamesParams>,
) -> Result<Json<ListGamesResponse>, ApiError> {
    let ids = match params.ids.as_deref() {
        Some(raw) => Some(parse_ids(raw)?),
        None => None,
    };

    let games = state
        .game_store()
        .query_games(ids.as_deref())
        .map_err(|e| {
            api_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to query games: {}", e),
            )
        })?;

    Ok(Json(ListGamesResponse { games }))
}

/// Get one game with its participations
pub async fn get_game(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<GameDetail>, ApiError> {
    match state.game_store().get_game_detail(id) {
        Ok(Some(detail)) => Ok(Json(detail)),
        Ok(None) => Err(api_error(
            StatusCode::NOT_FOUND,
            format!("Game not found: {}", id),
        )),
        Err(e) => Err(api_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Failed to get game: {}", e),
        )),
    }
}

/// Get one player's participation in a game
pub async fn get_game_player(
    State(state): State<Arc<AppState>>,
    Path((game_id, player_id)): Path<(i64, i64)>,
) -> Result<Json<ParticipationDetail>, ApiError> {
    participation(&state, game_id, player_id)
}

pub(super) fn participation(
    state: &AppState,
    game_id: i64,
    player_id: i64,
) -> Result<Json<ParticipationDetail>, ApiError> {
    match state.game_store().get_participation(game_id, player_id) {
        Ok(Some(detail)) => Ok(Json(detail)),
        Ok(None) => Err(api_error(
            StatusCode::NOT_FOUND,
            format!("Player {} did not play in game {}", player_id, game_id),
        )),
        Err(e) => Err(api_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Failed to get participation: {}", e),
        )),
    }
}

fn parse_ids(raw: &str) -> Result<Vec<i64>, ApiError> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<i64>().map_err(|_| {
                api_error(StatusCode::BAD_REQUEST, format!("Invalid game id: {}", s))
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ids() {
        assert_eq!(parse_ids("1, 2,3").unwrap(), vec![1, 2, 3]);
        assert!(parse_ids("").unwrap().is_empty());
        assert_eq!(parse_ids("1,abc").unwrap_err().0, StatusCode::BAD_REQUEST);
    }
}
