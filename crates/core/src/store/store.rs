//! Storage trait for games, players and participations.

use thiserror::Error;

use super::{Game, GameDetail, GameParticipation, ParticipationDetail, Player, PlayerGames};

/// Errors raised by a [`GameStore`].
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Upsert/query contract for durable game state.
///
/// Every upsert is idempotent on its key (game id, player id, or
/// `(game_id, player_id)`) and must be safe for concurrent writers
/// targeting the same key.
pub trait GameStore: Send + Sync {
    /// Insert or update games keyed by id.
    fn upsert_games(&self, games: &[Game]) -> Result<(), StoreError>;

    /// Insert or update players keyed by id.
    fn upsert_players(&self, players: &[Player]) -> Result<(), StoreError>;

    /// Insert or update participation rows keyed by `(game_id, player_id)`.
    fn upsert_participations(&self, records: &[GameParticipation]) -> Result<(), StoreError>;

    /// Fetch games by id, or every game when `ids` is `None`.
    fn query_games(&self, ids: Option<&[i64]>) -> Result<Vec<Game>, StoreError>;

    /// Fetch one game with its participations and their players.
    fn get_game_detail(&self, id: i64) -> Result<Option<GameDetail>, StoreError>;

    /// Fetch one player with every game they appeared in.
    fn get_player_games(&self, id: i64) -> Result<Option<PlayerGames>, StoreError>;

    /// Fetch a single participation row.
    fn get_participation(
        &self,
        game_id: i64,
        player_id: i64,
    ) -> Result<Option<ParticipationDetail>, StoreError>;
}
