//! Durable storage for games, players and per-game participation rows.

mod sqlite;
mod store;
mod types;

pub use sqlite::SqliteGameStore;
pub use store::{GameStore, StoreError};
pub use types::{
    Game, GameDetail, GameParticipation, GameState, ParticipationDetail, ParticipationWithGame,
    ParticipationWithPlayer, Player, PlayerGames,
};
