//! In-memory game store for testing.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

use crate::store::{
    Game, GameDetail, GameParticipation, GameStore, ParticipationDetail, ParticipationWithGame,
    ParticipationWithPlayer, Player, PlayerGames, StoreError,
};

#[derive(Debug, Default)]
struct State {
    games: BTreeMap<i64, Game>,
    players: BTreeMap<i64, Player>,
    participations: BTreeMap<(i64, i64), GameParticipation>,
    /// Table name of every successful upsert, in order.
    write_log: Vec<&'static str>,
}

/// Mock implementation of the GameStore trait.
///
/// Keeps everything in ordered maps and records the order of writes.
/// Reads and writes can be made to fail independently.
#[derive(Debug, Default)]
pub struct MockGameStore {
    state: Mutex<State>,
    fail_writes: AtomicBool,
    fail_reads: AtomicBool,
}

impl MockGameStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every upsert fail until reset.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Make every query fail until reset.
    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn game(&self, id: i64) -> Option<Game> {
        self.state().games.get(&id).cloned()
    }

    pub fn player(&self, id: i64) -> Option<Player> {
        self.state().players.get(&id).cloned()
    }

    pub fn participation(&self, game_id: i64, player_id: i64) -> Option<GameParticipation> {
        self.state()
            .participations
            .get(&(game_id, player_id))
            .cloned()
    }

    pub fn game_count(&self) -> usize {
        self.state().games.len()
    }

    pub fn player_count(&self) -> usize {
        self.state().players.len()
    }

    pub fn participation_count(&self) -> usize {
        self.state().participations.len()
    }

    /// Number of successful `upsert_games` calls.
    pub fn game_upserts(&self) -> usize {
        self.state()
            .write_log
            .iter()
            .filter(|table| **table == "games")
            .count()
    }

    pub fn write_log(&self) -> Vec<&'static str> {
        self.state().write_log.clone()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn check_write(&self) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Database("simulated write failure".to_string()));
        }
        Ok(())
    }

    fn check_read(&self) -> Result<(), StoreError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StoreError::Database("simulated read failure".to_string()));
        }
        Ok(())
    }
}

impl GameStore for MockGameStore {
    fn upsert_games(&self, games: &[Game]) -> Result<(), StoreError> {
        self.check_write()?;
        let mut state = self.state();
        for game in games {
            state.games.insert(game.id, game.clone());
        }
        state.write_log.push("games");
        Ok(())
    }

    fn upsert_players(&self, players: &[Player]) -> Result<(), StoreError> {
        self.check_write()?;
        let mut state = self.state();
        for player in players {
            state.players.insert(player.id, player.clone());
        }
        state.write_log.push("players");
        Ok(())
    }

    fn upsert_participations(&self, records: &[GameParticipation]) -> Result<(), StoreError> {
        self.check_write()?;
        let mut state = self.state();
        for record in records {
            state
                .participations
                .insert((record.game_id, record.player_id), record.clone());
        }
        state.write_log.push("participations");
        Ok(())
    }

    fn query_games(&self, ids: Option<&[i64]>) -> Result<Vec<Game>, StoreError> {
        self.check_read()?;
        let state = self.state();
        let games = match ids {
            Some(ids) => ids
                .iter()
                .filter_map(|id| state.games.get(id).cloned())
                .collect(),
            None => state.games.values().cloned().collect(),
        };
        Ok(games)
    }

    fn get_game_detail(&self, id: i64) -> Result<Option<GameDetail>, StoreError> {
        self.check_read()?;
        let state = self.state();
        let Some(game) = state.games.get(&id).cloned() else {
            return Ok(None);
        };

        let participations = state
            .participations
            .range((id, i64::MIN)..=(id, i64::MAX))
            .filter_map(|(_, participation)| {
                state
                    .players
                    .get(&participation.player_id)
                    .map(|player| ParticipationWithPlayer {
                        participation: participation.clone(),
                        player: player.clone(),
                    })
            })
            .collect();

        Ok(Some(GameDetail {
            game,
            participations,
        }))
    }

    fn get_player_games(&self, id: i64) -> Result<Option<PlayerGames>, StoreError> {
        self.check_read()?;
        let state = self.state();
        let Some(player) = state.players.get(&id).cloned() else {
            return Ok(None);
        };

        let games = state
            .participations
            .values()
            .filter(|p| p.player_id == id)
            .map(|p| ParticipationWithGame {
                participation: p.clone(),
                game: state.games.get(&p.game_id).cloned(),
            })
            .collect();

        Ok(Some(PlayerGames { player, games }))
    }

    fn get_participation(
        &self,
        game_id: i64,
        player_id: i64,
    ) -> Result<Option<ParticipationDetail>, StoreError> {
        self.check_read()?;
        let state = self.state();
        let Some(participation) = state.participations.get(&(game_id, player_id)).cloned() else {
            return Ok(None);
        };
        let Some(player) = state.players.get(&player_id).cloned() else {
            return Ok(None);
        };

        Ok(Some(ParticipationDetail {
            participation,
            game: state.games.get(&game_id).cloned(),
            player,
        }))
    }
}
