//! Game, player and participation records.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Coarse lifecycle label reported by the feed for a game.
///
/// Labels the feed adds beyond the three known ones are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum GameState {
    Preview,
    Live,
    Final,
    Other(String),
}

impl GameState {
    pub fn as_str(&self) -> &str {
        match self {
            GameState::Preview => "Preview",
            GameState::Live => "Live",
            GameState::Final => "Final",
            GameState::Other(label) => label,
        }
    }

    pub fn is_live(&self) -> bool {
        matches!(self, GameState::Live)
    }

    pub fn is_final(&self) -> bool {
        matches!(self, GameState::Final)
    }
}

impl From<String> for GameState {
    fn from(label: String) -> Self {
        match label.as_str() {
            "Preview" => GameState::Preview,
            "Live" => GameState::Live,
            "Final" => GameState::Final,
            _ => GameState::Other(label),
        }
    }
}

impl From<&str> for GameState {
    fn from(label: &str) -> Self {
        GameState::from(label.to_string())
    }
}

impl From<GameState> for String {
    fn from(state: GameState) -> Self {
        match state {
            GameState::Other(label) => label,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for GameState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A scheduled game and its last observed state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Game {
    pub id: i64,
    pub date: DateTime<Utc>,
    pub state: GameState,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub id: i64,
    pub name: String,
}

/// One player's line in one game, keyed by `(game_id, player_id)`.
///
/// Stat fields stay `None` when the feed omits them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameParticipation {
    pub game_id: i64,
    pub player_id: i64,
    pub team_id: i64,
    pub team_name: String,
    pub player_age: Option<u32>,
    pub player_number: Option<i32>,
    pub player_position: String,
    pub assists: Option<u32>,
    pub goals: Option<u32>,
    pub points: Option<u32>,
    pub penalty_minutes: Option<u32>,
}

/// A participation row joined with its player.
#[derive(Debug, Clone, Serialize)]
pub struct ParticipationWithPlayer {
    #[serde(flatten)]
    pub participation: GameParticipation,
    pub player: Player,
}

/// A game with every stored participation row.
#[derive(Debug, Clone, Serialize)]
pub struct GameDetail {
    #[serde(flatten)]
    pub game: Game,
    pub participations: Vec<ParticipationWithPlayer>,
}

/// A participation row joined with its game.
///
/// `game` is `None` when the row was ingested for a game the schedule
/// has not reported yet (e.g. a manual single-game reload).
#[derive(Debug, Clone, Serialize)]
pub struct ParticipationWithGame {
    #[serde(flatten)]
    pub participation: GameParticipation,
    pub game: Option<Game>,
}

/// A player with every game they appeared in.
#[derive(Debug, Clone, Serialize)]
pub struct PlayerGames {
    #[serde(flatten)]
    pub player: Player,
    pub games: Vec<ParticipationWithGame>,
}

/// A single participation row with both sides of the relation.
#[derive(Debug, Clone, Serialize)]
pub struct ParticipationDetail {
    #[serde(flatten)]
    pub participation: GameParticipation,
    pub game: Option<Game>,
    pub player: Player,
}
