//! Testing utilities and mock implementations.
//!
//! This module provides mock implementations of the feed and store traits,
//! allowing the monitor, ingestor and reloader to be exercised without a
//! network or a database.
//!
//! # Example
//!
//! ```rust,ignore
//! use rinkwatch_core::testing::{fixtures, MockFeedClient, MockGameStore};
//!
//! let feed = MockFeedClient::new();
//! let store = MockGameStore::new();
//!
//! // Configure mock responses
//! feed.set_schedule(fixtures::schedule(vec![fixtures::scheduled_game(1, "Live")])).await;
//!
//! // Use in FeedOrchestrator::new(...)
//! ```

mod mock_feed;
mod mock_store;

pub use mock_feed::{MockFeedClient, RecordedFeedCall};
pub use mock_store::MockGameStore;

/// Test fixtures and helper functions.
pub mod fixtures {
    use chrono::{NaiveDate, TimeZone, Utc};

    use crate::feed::{
        BoxscoreResponse, BoxscoreTeams, GameStatus, Person, PlayerStats, Position, RosterEntry,
        ScheduleDate, ScheduleResponse, ScheduledGame, Season, SeasonsResponse, SkaterStats,
        TeamBoxscore, TeamRef,
    };

    /// A scheduled game on 2023-01-15 in the given abstract state.
    pub fn scheduled_game(game_pk: i64, state: &str) -> ScheduledGame {
        ScheduledGame {
            game_pk,
            game_date: Utc.with_ymd_and_hms(2023, 1, 15, 19, 0, 0).unwrap(),
            status: GameStatus {
                abstract_game_state: state.to_string(),
            },
        }
    }

    /// A schedule with all games under a single date.
    pub fn schedule(games: Vec<ScheduledGame>) -> ScheduleResponse {
        ScheduleResponse {
            dates: vec![ScheduleDate {
                date: NaiveDate::from_ymd_opt(2023, 1, 15),
                games,
            }],
        }
    }

    /// A dressed skater with jersey number "27" and a full stat line.
    pub fn roster_entry(player_id: i64, name: &str, position_code: &str, position_name: &str) -> RosterEntry {
        RosterEntry {
            person: Person {
                id: player_id,
                full_name: name.to_string(),
                current_age: Some(27),
                current_team: None,
            },
            jersey_number: Some("27".to_string()),
            position: Position {
                code: position_code.to_string(),
                name: position_name.to_string(),
            },
            stats: Some(PlayerStats {
                skater_stats: Some(SkaterStats {
                    assists: Some(1),
                    goals: Some(1),
                    points: Some(2),
                    penalty_minutes: Some(0),
                }),
            }),
        }
    }

    /// One side of a boxscore, with players keyed the way the feed keys them.
    pub fn team_boxscore(team_id: i64, team_name: &str, entries: Vec<RosterEntry>) -> TeamBoxscore {
        TeamBoxscore {
            team: TeamRef {
                id: team_id,
                name: team_name.to_string(),
            },
            players: entries
                .into_iter()
                .map(|entry| (format!("ID{}", entry.person.id), entry))
                .collect(),
        }
    }

    pub fn boxscore(away: TeamBoxscore, home: TeamBoxscore) -> BoxscoreResponse {
        BoxscoreResponse {
            teams: BoxscoreTeams { away, home },
        }
    }

    pub fn season(start: NaiveDate, end: NaiveDate) -> SeasonsResponse {
        SeasonsResponse {
            seasons: vec![Season {
                season_id: None,
                regular_season_start_date: start,
                regular_season_end_date: None,
                season_end_date: end,
            }],
        }
    }
}
