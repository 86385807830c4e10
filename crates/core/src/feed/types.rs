//! Feed document shapes.
//!
//! These mirror the stats API JSON closely; normalization into store
//! records happens in the ingestion path.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScheduleResponse {
    #[serde(default)]
    pub dates: Vec<ScheduleDate>,
}

/// One calendar day of the schedule.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScheduleDate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub games: Vec<ScheduledGame>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledGame {
    pub game_pk: i64,
    pub game_date: DateTime<Utc>,
    pub status: GameStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameStatus {
    pub abstract_game_state: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoxscoreResponse {
    pub teams: BoxscoreTeams,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoxscoreTeams {
    pub away: TeamBoxscore,
    pub home: TeamBoxscore,
}

/// One side of a boxscore. Players are keyed by the feed as `"ID<player id>"`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamBoxscore {
    pub team: TeamRef,
    #[serde(default)]
    pub players: BTreeMap<String, RosterEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamRef {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RosterEntry {
    pub person: Person,
    #[serde(default)]
    pub jersey_number: Option<String>,
    pub position: Position,
    #[serde(default)]
    pub stats: Option<PlayerStats>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Person {
    pub id: i64,
    pub full_name: String,
    #[serde(default)]
    pub current_age: Option<u32>,
    #[serde(default)]
    pub current_team: Option<TeamRef>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Position {
    pub code: String,
    pub name: String,
}

/// Per-player stats block. Empty (`{}`) for players who did not dress.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerStats {
    #[serde(default)]
    pub skater_stats: Option<SkaterStats>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkaterStats {
    #[serde(default)]
    pub assists: Option<u32>,
    #[serde(default)]
    pub goals: Option<u32>,
    #[serde(default)]
    pub points: Option<u32>,
    #[serde(default)]
    pub penalty_minutes: Option<u32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SeasonsResponse {
    #[serde(default)]
    pub seasons: Vec<Season>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Season {
    #[serde(default)]
    pub season_id: Option<String>,
    pub regular_season_start_date: NaiveDate,
    #[serde(default)]
    pub regular_season_end_date: Option<NaiveDate>,
    pub season_end_date: NaiveDate,
}
