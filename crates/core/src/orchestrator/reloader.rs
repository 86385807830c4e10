//! Season backfill.

use std::collections::HashSet;
use std::sync::Arc;

use futures::stream::{self, StreamExt};
use tracing::{error, info, warn};

use crate::audit::{emit_opt, AuditEvent, AuditHandle};
use crate::feed::{DateRange, FeedClient};
use crate::metrics;
use crate::store::GameStore;

use super::ingestor::GameIngestor;
use super::monitor::flatten_schedule;
use super::types::{MappingError, ReloadReport, TickError};

/// Re-fetches a whole season's schedule and ingests every game once.
pub struct SeasonReloader {
    feed: Arc<dyn FeedClient>,
    store: Arc<dyn GameStore>,
    ingestor: Arc<GameIngestor>,
    concurrency: usize,
    audit: Option<AuditHandle>,
}

impl SeasonReloader {
    pub fn new(
        feed: Arc<dyn FeedClient>,
        store: Arc<dyn GameStore>,
        ingestor: Arc<GameIngestor>,
        concurrency: usize,
        audit: Option<AuditHandle>,
    ) -> Self {
        Self {
            feed,
            store,
            ingestor,
            concurrency: concurrency.max(1),
            audit,
        }
    }

    /// Reload a season: resolve its date range, fetch the schedule for it,
    /// trigger a one-shot ingestion for every game and upsert all games.
    ///
    /// Ingestions are dispatched before the games are written, and each one
    /// is its own failure boundary. A failure to resolve the season or fetch
    /// its schedule aborts before anything is written.
    pub async fn reload(&self, season_id: &str) -> Result<ReloadReport, TickError> {
        let seasons = self.feed.get_seasons(season_id).await?;
        let season = seasons
            .seasons
            .first()
            .ok_or_else(|| MappingError::SeasonNotFound(season_id.to_string()))?;

        let range = DateRange::new(season.regular_season_start_date, season.season_end_date);
        info!(
            "Reloading season {} ({} to {})",
            season_id, range.start, range.end
        );

        let schedule = self.feed.get_schedule(Some(range)).await?;
        let games = flatten_schedule(&schedule);

        let mut seen = HashSet::new();
        let game_ids: Vec<i64> = games
            .iter()
            .map(|g| g.id)
            .filter(|id| seen.insert(*id))
            .collect();

        let batch = tokio::spawn(ingest_all(
            Arc::clone(&self.ingestor),
            game_ids.clone(),
            self.concurrency,
        ));

        self.store.upsert_games(&games)?;

        let failed = match batch.await {
            Ok(failed) => failed,
            Err(e) => {
                error!("Reload ingestion batch for season {} aborted: {}", season_id, e);
                game_ids.len()
            }
        };

        Ok(ReloadReport {
            season_id: season_id.to_string(),
            games: game_ids.len(),
            ingested: game_ids.len() - failed,
            failed,
        })
    }

    /// Run a reload as a fire-and-forget unit: outcome is logged and audited,
    /// never returned.
    pub async fn run(&self, season_id: &str) {
        emit_opt(
            &self.audit,
            AuditEvent::SeasonReloadStarted {
                season_id: season_id.to_string(),
            },
        )
        .await;

        match self.reload(season_id).await {
            Ok(report) => {
                info!(
                    "Reloaded season {}: {} games, {} ingestion failures",
                    season_id, report.games, report.failed
                );
                metrics::SEASON_RELOADS.with_label_values(&["completed"]).inc();
                emit_opt(
                    &self.audit,
                    AuditEvent::SeasonReloadCompleted {
                        season_id: report.season_id,
                        games: report.games,
                        ingestion_failures: report.failed,
                    },
                )
                .await;
            }
            Err(e) => {
                warn!(error_kind = e.kind(), "Reloading season-{} failed: {}", season_id, e);
                metrics::SEASON_RELOADS.with_label_values(&["failed"]).inc();
                emit_opt(
                    &self.audit,
                    AuditEvent::SeasonReloadFailed {
                        season_id: season_id.to_string(),
                        error_kind: e.kind().to_string(),
                        error: e.to_string(),
                    },
                )
                .await;
            }
        }
    }
}

/// Ingest every game once with bounded concurrency. Returns the number of
/// failed ingestions.
async fn ingest_all(ingestor: Arc<GameIngestor>, game_ids: Vec<i64>, concurrency: usize) -> usize {
    stream::iter(game_ids)
        .map(|game_id| {
            let ingestor = Arc::clone(&ingestor);
            async move { ingestor.ingest_once(game_id).await.is_err() }
        })
        .buffer_unordered(concurrency)
        .filter(|failed| futures::future::ready(*failed))
        .count()
        .await
}
