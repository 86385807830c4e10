//! SQLite-backed game store.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};

use super::{
    Game, GameDetail, GameParticipation, GameState, GameStore, ParticipationDetail,
    ParticipationWithGame, ParticipationWithPlayer, Player, PlayerGames, StoreError,
};

const PARTICIPATION_COLUMNS: &str = "gp.game_id, gp.player_id, gp.team_id, gp.team_name, \
     gp.player_age, gp.player_number, gp.player_position, gp.assists, gp.goals, gp.points, \
     gp.penalty_minutes";

/// Number of columns in [`PARTICIPATION_COLUMNS`].
const PARTICIPATION_WIDTH: usize = 11;

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// SQLite-backed game store.
pub struct SqliteGameStore {
    conn: Mutex<Connection>,
}

impl SqliteGameStore {
    /// Create a new SQLite game store, creating the database file and tables if needed.
    pub fn new(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path).map_err(db_err)?;
        // Audit and game tables share the file
        conn.busy_timeout(BUSY_TIMEOUT).map_err(db_err)?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory SQLite game store (useful for testing).
    pub fn in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory().map_err(db_err)?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn initialize_schema(conn: &Connection) -> Result<(), StoreError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS games (
                id INTEGER PRIMARY KEY,
                date TEXT NOT NULL,
                state TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS players (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS game_players (
                game_id INTEGER NOT NULL,
                player_id INTEGER NOT NULL,
                team_id INTEGER NOT NULL,
                team_name TEXT NOT NULL,
                player_age INTEGER,
                player_number INTEGER,
                player_position TEXT NOT NULL,
                assists INTEGER,
                goals INTEGER,
                points INTEGER,
                penalty_minutes INTEGER,
                updated_at TEXT NOT NULL,
                PRIMARY KEY (game_id, player_id)
            );

            CREATE INDEX IF NOT EXISTS idx_games_date ON games(date);
            CREATE INDEX IF NOT EXISTS idx_game_players_player_id ON game_players(player_id);
            "#,
        )
        .map_err(db_err)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn
            .lock()
            .map_err(|_| StoreError::Database("connection mutex poisoned".to_string()))
    }

    fn row_to_game(row: &Row, offset: usize) -> rusqlite::Result<Game> {
        let id: i64 = row.get(offset)?;
        let date_str: String = row.get(offset + 1)?;
        let state: String = row.get(offset + 2)?;

        Ok(Game {
            id,
            date: parse_timestamp(&date_str, offset + 1)?,
            state: GameState::from(state),
        })
    }

    /// Read a game from LEFT JOINed columns, which are all NULL when unmatched.
    fn row_to_optional_game(row: &Row, offset: usize) -> rusqlite::Result<Option<Game>> {
        let id: Option<i64> = row.get(offset)?;
        match id {
            Some(_) => Self::row_to_game(row, offset).map(Some),
            None => Ok(None),
        }
    }

    fn row_to_player(row: &Row, offset: usize) -> rusqlite::Result<Player> {
        Ok(Player {
            id: row.get(offset)?,
            name: row.get(offset + 1)?,
        })
    }

    fn row_to_participation(row: &Row) -> rusqlite::Result<GameParticipation> {
        Ok(GameParticipation {
            game_id: row.get(0)?,
            player_id: row.get(1)?,
            team_id: row.get(2)?,
            team_name: row.get(3)?,
            player_age: row.get(4)?,
            player_number: row.get(5)?,
            player_position: row.get(6)?,
            assists: row.get(7)?,
            goals: row.get(8)?,
            points: row.get(9)?,
            penalty_minutes: row.get(10)?,
        })
    }
}

impl GameStore for SqliteGameStore {
    fn upsert_games(&self, games: &[Game]) -> Result<(), StoreError> {
        if games.is_empty() {
            return Ok(());
        }

        let mut conn = self.lock()?;
        let now = Utc::now().to_rfc3339();
        let tx = conn.transaction().map_err(db_err)?;
        {
            let mut stmt = tx
                .prepare(
                    "INSERT INTO games (id, date, state, updated_at) VALUES (?1, ?2, ?3, ?4)
                     ON CONFLICT(id) DO UPDATE SET
                        date = excluded.date,
                        state = excluded.state,
                        updated_at = excluded.updated_at",
                )
                .map_err(db_err)?;

            for game in games {
                stmt.execute(params![
                    game.id,
                    game.date.to_rfc3339(),
                    game.state.as_str(),
                    now
                ])
                .map_err(db_err)?;
            }
        }
        tx.commit().map_err(db_err)
    }

    fn upsert_players(&self, players: &[Player]) -> Result<(), StoreError> {
        if players.is_empty() {
            return Ok(());
        }

        let mut conn = self.lock()?;
        let now = Utc::now().to_rfc3339();
        let tx = conn.transaction().map_err(db_err)?;
        {
            let mut stmt = tx
                .prepare(
                    "INSERT INTO players (id, name, updated_at) VALUES (?1, ?2, ?3)
                     ON CONFLICT(id) DO UPDATE SET
                        name = excluded.name,
                        updated_at = excluded.updated_at",
                )
                .map_err(db_err)?;

            for player in players {
                stmt.execute(params![player.id, player.name, now])
                    .map_err(db_err)?;
            }
        }
        tx.commit().map_err(db_err)
    }

    fn upsert_participations(&self, records: &[GameParticipation]) -> Result<(), StoreError> {
        if records.is_empty() {
            return Ok(());
        }

        let mut conn = self.lock()?;
        let now = Utc::now().to_rfc3339();
        let tx = conn.transaction().map_err(db_err)?;
        {
            let mut stmt = tx
                .prepare(
                    "INSERT INTO game_players (game_id, player_id, team_id, team_name, player_age,
                        player_number, player_position, assists, goals, points, penalty_minutes,
                        updated_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
                     ON CONFLICT(game_id, player_id) DO UPDATE SET
                        team_id = excluded.team_id,
                        team_name = excluded.team_name,
                        player_age = excluded.player_age,
                        player_number = excluded.player_number,
                        player_position = excluded.player_position,
                        assists = excluded.assists,
                        goals = excluded.goals,
                        points = excluded.points,
                        penalty_minutes = excluded.penalty_minutes,
                        updated_at = excluded.updated_at",
                )
                .map_err(db_err)?;

            for record in records {
                stmt.execute(params![
                    record.game_id,
                    record.player_id,
                    record.team_id,
                    record.team_name,
                    record.player_age,
                    record.player_number,
                    record.player_position,
                    record.assists,
                    record.goals,
                    record.points,
                    record.penalty_minutes,
                    now,
                ])
                .map_err(db_err)?;
            }
        }
        tx.commit().map_err(db_err)
    }

    fn query_games(&self, ids: Option<&[i64]>) -> Result<Vec<Game>, StoreError> {
        let conn = self.lock()?;

        let (sql, values): (String, Vec<i64>) = match ids {
            Some([]) => return Ok(Vec::new()),
            Some(ids) => {
                let placeholders = vec!["?"; ids.len()].join(", ");
                (
                    format!(
                        "SELECT id, date, state FROM games WHERE id IN ({}) ORDER BY date, id",
                        placeholders
                    ),
                    ids.to_vec(),
                )
            }
            None => (
                "SELECT id, date, state FROM games ORDER BY date, id".to_string(),
                Vec::new(),
            ),
        };

        let mut stmt = conn.prepare(&sql).map_err(db_err)?;
        let games = stmt
            .query_map(params_from_iter(values.iter()), |row| {
                Self::row_to_game(row, 0)
            })
            .map_err(db_err)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(db_err)?;

        Ok(games)
    }

    fn get_game_detail(&self, id: i64) -> Result<Option<GameDetail>, StoreError> {
        let conn = self.lock()?;

        let game = conn
            .query_row(
                "SELECT id, date, state FROM games WHERE id = ?",
                params![id],
                |row| Self::row_to_game(row, 0),
            )
            .optional()
            .map_err(db_err)?;

        let Some(game) = game else {
            return Ok(None);
        };

        let sql = format!(
            "SELECT {}, p.id, p.name FROM game_players gp
             JOIN players p ON p.id = gp.player_id
             WHERE gp.game_id = ?
             ORDER BY gp.team_id, gp.player_id",
            PARTICIPATION_COLUMNS
        );
        let mut stmt = conn.prepare(&sql).map_err(db_err)?;
        let participations = stmt
            .query_map(params![id], |row| {
                Ok(ParticipationWithPlayer {
                    participation: Self::row_to_participation(row)?,
                    player: Self::row_to_player(row, PARTICIPATION_WIDTH)?,
                })
            })
            .map_err(db_err)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(db_err)?;

        Ok(Some(GameDetail {
            game,
            participations,
        }))
    }

    fn get_player_games(&self, id: i64) -> Result<Option<PlayerGames>, StoreError> {
        let conn = self.lock()?;

        let player = conn
            .query_row(
                "SELECT id, name FROM players WHERE id = ?",
                params![id],
                |row| Self::row_to_player(row, 0),
            )
            .optional()
            .map_err(db_err)?;

        let Some(player) = player else {
            return Ok(None);
        };

        let sql = format!(
            "SELECT {}, g.id, g.date, g.state FROM game_players gp
             LEFT JOIN games g ON g.id = gp.game_id
             WHERE gp.player_id = ?
             ORDER BY g.date, gp.game_id",
            PARTICIPATION_COLUMNS
        );
        let mut stmt = conn.prepare(&sql).map_err(db_err)?;
        let games = stmt
            .query_map(params![id], |row| {
                Ok(ParticipationWithGame {
                    participation: Self::row_to_participation(row)?,
                    game: Self::row_to_optional_game(row, PARTICIPATION_WIDTH)?,
                })
            })
            .map_err(db_err)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(db_err)?;

        Ok(Some(PlayerGames { player, games }))
    }

    fn get_participation(
        &self,
        game_id: i64,
        player_id: i64,
    ) -> Result<Option<ParticipationDetail>, StoreError> {
        let conn = self.lock()?;

        let sql = format!(
            "SELECT {}, p.id, p.name, g.id, g.date, g.state FROM game_players gp
             JOIN players p ON p.id = gp.player_id
             LEFT JOIN games g ON g.id = gp.game_id
             WHERE gp.game_id = ? AND gp.player_id = ?",
            PARTICIPATION_COLUMNS
        );

        let detail = conn
            .query_row(&sql, params![game_id, player_id], |row| {
                Ok(ParticipationDetail {
                    participation: Self::row_to_participation(row)?,
                    player: Self::row_to_player(row, PARTICIPATION_WIDTH)?,
                    game: Self::row_to_optional_game(row, PARTICIPATION_WIDTH + 2)?,
                })
            })
            .optional()
            .map_err(db_err)?;

        Ok(detail)
    }
}

fn db_err(e: rusqlite::Error) -> StoreError {
    StoreError::Database(e.to_string())
}

fn parse_timestamp(value: &str, column: usize) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(column, Type::Text, Box::new(e)))
}
