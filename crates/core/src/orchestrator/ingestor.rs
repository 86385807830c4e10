//! Boxscore ingestion for a single game.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::audit::{emit_opt, AuditEvent, AuditHandle};
use crate::feed::{BoxscoreResponse, FeedClient, RosterEntry, TeamRef};
use crate::metrics;
use crate::store::{GameParticipation, GameStore, Player};

use super::registry::{job_action, JobAction};
use super::types::{IngestReport, MappingError, TickError};

/// Players and participation rows normalized from one boxscore.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractedRoster {
    pub players: Vec<Player>,
    pub participations: Vec<GameParticipation>,
    /// Entries dropped because their position code marks a non-participant.
    pub skipped: usize,
}

/// Normalize both rosters of a boxscore into players and participations.
///
/// Away entries come first, then home. A player listed on both rosters
/// keeps a single record, the home one.
pub fn extract_participations(
    game_id: i64,
    boxscore: &BoxscoreResponse,
    non_participant_code: &str,
) -> Result<ExtractedRoster, MappingError> {
    let mut roster = ExtractedRoster::default();
    let mut seen: HashMap<i64, usize> = HashMap::new();

    for side in [&boxscore.teams.away, &boxscore.teams.home] {
        for entry in side.players.values() {
            if entry.position.code == non_participant_code {
                roster.skipped += 1;
                continue;
            }

            let player = Player {
                id: entry.person.id,
                name: entry.person.full_name.clone(),
            };
            let participation = to_participation(game_id, &side.team, entry)?;

            match seen.get(&player.id) {
                Some(&index) => {
                    roster.players[index] = player;
                    roster.participations[index] = participation;
                }
                None => {
                    seen.insert(player.id, roster.players.len());
                    roster.players.push(player);
                    roster.participations.push(participation);
                }
            }
        }
    }

    Ok(roster)
}

fn to_participation(
    game_id: i64,
    team: &TeamRef,
    entry: &RosterEntry,
) -> Result<GameParticipation, MappingError> {
    let skater = entry
        .stats
        .as_ref()
        .and_then(|stats| stats.skater_stats.as_ref());

    Ok(GameParticipation {
        game_id,
        player_id: entry.person.id,
        team_id: team.id,
        team_name: team.name.clone(),
        player_age: entry.person.current_age,
        player_number: parse_jersey_number(entry.person.id, entry.jersey_number.as_deref())?,
        player_position: entry.position.name.clone(),
        assists: skater.and_then(|s| s.assists),
        goals: skater.and_then(|s| s.goals),
        points: skater.and_then(|s| s.points),
        penalty_minutes: skater.and_then(|s| s.penalty_minutes),
    })
}

fn parse_jersey_number(player_id: i64, raw: Option<&str>) -> Result<Option<i32>, MappingError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(text) => text
            .parse()
            .map(Some)
            .map_err(|_| MappingError::InvalidJerseyNumber {
                player_id,
                value: text.to_string(),
            }),
    }
}

/// Pulls a game's boxscore and writes its players and participations.
pub struct GameIngestor {
    feed: Arc<dyn FeedClient>,
    store: Arc<dyn GameStore>,
    non_participant_code: String,
    audit: Option<AuditHandle>,
}

impl GameIngestor {
    pub fn new(
        feed: Arc<dyn FeedClient>,
        store: Arc<dyn GameStore>,
        non_participant_code: impl Into<String>,
        audit: Option<AuditHandle>,
    ) -> Self {
        Self {
            feed,
            store,
            non_participant_code: non_participant_code.into(),
            audit,
        }
    }

    /// Run one ingestion. Players are written before participations.
    pub async fn ingest(&self, game_id: i64) -> Result<IngestReport, TickError> {
        let boxscore = self.feed.get_boxscore(game_id).await?;
        let roster = extract_participations(game_id, &boxscore, &self.non_participant_code)?;

        self.store.upsert_players(&roster.players)?;
        self.store.upsert_participations(&roster.participations)?;

        metrics::PARTICIPATIONS_UPSERTED.inc_by(roster.participations.len() as u64);
        debug!(
            game_id,
            participations = roster.participations.len(),
            skipped = roster.skipped,
            "Ingested game"
        );

        Ok(IngestReport {
            game_id,
            players: roster.players.len(),
            participations: roster.participations.len(),
            skipped: roster.skipped,
        })
    }

    /// Run one ingestion outside the job registry.
    ///
    /// Failures are logged and audited here; the error is still returned so
    /// callers can count it.
    pub async fn ingest_once(&self, game_id: i64) -> Result<IngestReport, TickError> {
        match self.ingest(game_id).await {
            Ok(report) => {
                metrics::ONE_SHOT_INGESTIONS.with_label_values(&["ok"]).inc();
                Ok(report)
            }
            Err(e) => {
                warn!(game_id, error_kind = e.kind(), "Ingesting game-{} failed: {}", game_id, e);
                metrics::ONE_SHOT_INGESTIONS.with_label_values(&["failed"]).inc();
                emit_opt(
                    &self.audit,
                    AuditEvent::IngestionFailed {
                        game_id,
                        error_kind: e.kind().to_string(),
                        error: e.to_string(),
                        one_shot: true,
                    },
                )
                .await;
                Err(e)
            }
        }
    }

    /// Recurring job action for a live game.
    pub fn job_action(self: &Arc<Self>, game_id: i64) -> JobAction {
        let ingestor = Arc::clone(self);
        job_action(move || {
            let ingestor = Arc::clone(&ingestor);
            async move { ingestor.ingest(game_id).await.map(|_| ()) }
        })
    }
}
