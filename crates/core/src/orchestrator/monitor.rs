//! Schedule monitor.
//!
//! Each cycle compares the feed's schedule against the stored games and
//! starts or stops per-game ingestion jobs on state transitions.

use std::collections::HashMap;
use std::sync::{Arc, Weak};
use std::time::Duration;

use tracing::{debug, info};

use crate::audit::{emit_opt, AuditEvent, AuditHandle};
use crate::feed::{DateRange, FeedClient, ScheduleResponse};
use crate::metrics;
use crate::store::{Game, GameState, GameStore};

use super::ingestor::GameIngestor;
use super::registry::{job_action, JobAction, JobRegistry};
use super::types::{CycleReport, JobKind, TickError};

/// Flatten every date bucket of a schedule into games.
pub fn flatten_schedule(schedule: &ScheduleResponse) -> Vec<Game> {
    schedule
        .dates
        .iter()
        .flat_map(|date| date.games.iter())
        .map(|game| Game {
            id: game.game_pk,
            date: game.game_date,
            state: GameState::from(game.status.abstract_game_state.as_str()),
        })
        .collect()
}

pub struct ScheduleMonitor {
    feed: Arc<dyn FeedClient>,
    store: Arc<dyn GameStore>,
    registry: Arc<JobRegistry>,
    ingestor: Arc<GameIngestor>,
    ingest_interval: Duration,
    audit: Option<AuditHandle>,
}

impl ScheduleMonitor {
    pub fn new(
        feed: Arc<dyn FeedClient>,
        store: Arc<dyn GameStore>,
        registry: Arc<JobRegistry>,
        ingestor: Arc<GameIngestor>,
        ingest_interval: Duration,
        audit: Option<AuditHandle>,
    ) -> Self {
        Self {
            feed,
            store,
            registry,
            ingestor,
            ingest_interval,
            audit,
        }
    }

    /// Run one cycle against the feed's default (current day) schedule.
    pub async fn run_cycle(&self) -> Result<CycleReport, TickError> {
        self.run_cycle_for(None).await
    }

    /// Run one cycle against the schedule for `range`.
    ///
    /// For each game in the schedule:
    /// - Live with no ingestion job: create and start one.
    /// - Final with a job: remove the job, whatever the stored state. A
    ///   season reload may have stored Final already.
    /// - Anything else: no registry change.
    ///
    /// All games are upserted at the end. A fetch failure aborts the cycle
    /// before any job or store change.
    pub async fn run_cycle_for(&self, range: Option<DateRange>) -> Result<CycleReport, TickError> {
        let schedule = self.feed.get_schedule(range).await?;
        let games = flatten_schedule(&schedule);

        let ids: Vec<i64> = games.iter().map(|g| g.id).collect();
        let previous: HashMap<i64, GameState> = self
            .store
            .query_games(Some(ids.as_slice()))?
            .into_iter()
            .map(|g| (g.id, g.state))
            .collect();

        let mut report = CycleReport {
            games_seen: games.len(),
            ..CycleReport::default()
        };

        for game in &games {
            let kind = JobKind::ingest(game.id);

            let last = previous.get(&game.id);
            if last != Some(&game.state) {
                debug!(
                    game_id = game.id,
                    from = last.map(GameState::as_str).unwrap_or("unseen"),
                    to = game.state.as_str(),
                    "Game state changed"
                );
            }

            if game.state.is_live() {
                let created = self
                    .registry
                    .ensure_running(kind, self.ingest_interval, || self.ingestor.job_action(game.id));
                if created {
                    info!(game_id = game.id, "Game {} has started", game.id);
                    metrics::GAME_TRANSITIONS.with_label_values(&["started"]).inc();
                    emit_opt(&self.audit, AuditEvent::GameStarted { game_id: game.id }).await;
                    report.started.push(game.id);
                }
            } else if game.state.is_final() && self.registry.remove_job(&kind) {
                info!(game_id = game.id, "Game {} has finished", game.id);
                metrics::GAME_TRANSITIONS.with_label_values(&["finished"]).inc();
                emit_opt(&self.audit, AuditEvent::GameFinished { game_id: game.id }).await;
                report.finished.push(game.id);
            }
        }

        self.store.upsert_games(&games)?;

        metrics::MONITOR_CYCLES.inc();
        debug!(
            games = report.games_seen,
            started = report.started.len(),
            finished = report.finished.len(),
            "Monitor cycle complete"
        );

        Ok(report)
    }

    /// Recurring job action. Holds a weak reference so the registry does
    /// not keep the monitor alive.
    pub fn job_action(self: &Arc<Self>) -> JobAction {
        let monitor: Weak<Self> = Arc::downgrade(self);
        job_action(move || {
            let monitor = monitor.clone();
            async move {
                match monitor.upgrade() {
                    Some(monitor) => monitor.run_cycle().await.map(|_| ()),
                    None => Ok(()),
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fixtures::{schedule, scheduled_game};
    use crate::testing::{MockFeedClient, MockGameStore};

    struct Harness {
        feed: Arc<MockFeedClient>,
        store: Arc<MockGameStore>,
        registry: Arc<JobRegistry>,
        monitor: Arc<ScheduleMonitor>,
    }

    fn harness() -> Harness {
        harness_with_audit(None)
    }

    fn harness_with_audit(audit: Option<AuditHandle>) -> Harness {
        let feed = Arc::new(MockFeedClient::new());
        let store = Arc::new(MockGameStore::new());
        let registry = Arc::new(JobRegistry::new(None));
        let ingestor = Arc::new(GameIngestor::new(feed.clone(), store.clone(), "N/A", None));
        let monitor = Arc::new(ScheduleMonitor::new(
            feed.clone(),
            store.clone(),
            Arc::clone(&registry),
            ingestor,
            Duration::from_secs(3600),
            audit,
        ));
        Harness {
            feed,
            store,
            registry,
            monitor,
        }
    }

    #[test]
    fn test_flatten_schedule_across_dates() {
        let mut response = schedule(vec![scheduled_game(1, "Preview")]);
        response
            .dates
            .extend(schedule(vec![scheduled_game(2, "Live"), scheduled_game(3, "Final")]).dates);

        let games = flatten_schedule(&response);

        assert_eq!(games.len(), 3);
        assert_eq!(games[0].state, GameState::Preview);
        assert_eq!(games[1].state, GameState::Live);
        assert_eq!(games[2].state, GameState::Final);
    }

    #[test]
    fn test_flatten_empty_schedule() {
        assert!(flatten_schedule(&ScheduleResponse::default()).is_empty());
    }

    #[tokio::test]
    async fn test_live_game_starts_job() {
        let h = harness();
        h.feed.set_schedule(schedule(vec![scheduled_game(1, "Live")])).await;

        let report = h.monitor.run_cycle().await.unwrap();

        assert_eq!(report.started, vec![1]);
        assert!(h.registry.contains(&JobKind::ingest(1)));
        assert_eq!(h.store.game(1).unwrap().state, GameState::Live);
    }

    #[tokio::test]
    async fn test_repeated_live_cycles_keep_one_job() {
        let h = harness();
        h.feed.set_schedule(schedule(vec![scheduled_game(1, "Live")])).await;

        h.monitor.run_cycle().await.unwrap();
        let report = h.monitor.run_cycle().await.unwrap();

        assert!(report.started.is_empty());
        assert_eq!(h.registry.ingest_game_ids(), vec![1]);
    }

    #[tokio::test]
    async fn test_final_removes_job() {
        let h = harness();
        h.feed.set_schedule(schedule(vec![scheduled_game(1, "Live")])).await;
        h.monitor.run_cycle().await.unwrap();

        h.feed.set_schedule(schedule(vec![scheduled_game(1, "Final")])).await;
        let report = h.monitor.run_cycle().await.unwrap();

        assert_eq!(report.finished, vec![1]);
        assert!(!h.registry.contains(&JobKind::ingest(1)));
        assert_eq!(h.store.game(1).unwrap().state, GameState::Final);
    }

    #[tokio::test]
    async fn test_final_without_job_is_silent() {
        let h = harness();
        h.feed.set_schedule(schedule(vec![scheduled_game(1, "Preview")])).await;
        h.monitor.run_cycle().await.unwrap();

        h.feed.set_schedule(schedule(vec![scheduled_game(1, "Final")])).await;
        let report = h.monitor.run_cycle().await.unwrap();

        assert!(report.finished.is_empty());
        assert!(h.registry.list_jobs().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_state_is_persisted_without_job() {
        let h = harness();
        h.feed
            .set_schedule(schedule(vec![scheduled_game(1, "Postponed")]))
            .await;

        let report = h.monitor.run_cycle().await.unwrap();

        assert!(report.started.is_empty());
        assert_eq!(
            h.store.game(1).unwrap().state,
            GameState::Other("Postponed".to_string())
        );
    }

    #[tokio::test]
    async fn test_fetch_failure_changes_nothing() {
        let h = harness();
        h.feed.set_schedule(schedule(vec![scheduled_game(1, "Live")])).await;
        h.monitor.run_cycle().await.unwrap();

        h.feed.fail_next_call("upstream down").await;
        let err = h.monitor.run_cycle().await.unwrap_err();

        assert_eq!(err.kind(), "feed_fetch");
        assert_eq!(h.registry.ingest_game_ids(), vec![1]);
        assert_eq!(h.store.game_upserts(), 1);
    }

    #[tokio::test]
    async fn test_final_removes_job_when_stored_state_is_already_final() {
        let h = harness();
        h.feed.set_schedule(schedule(vec![scheduled_game(1, "Live")])).await;
        h.monitor.run_cycle().await.unwrap();

        // Another writer (a season reload) records Final before the monitor sees it
        h.store
            .upsert_games(&[Game {
                id: 1,
                date: scheduled_game(1, "Final").game_date,
                state: GameState::Final,
            }])
            .unwrap();

        h.feed.set_schedule(schedule(vec![scheduled_game(1, "Final")])).await;
        let report = h.monitor.run_cycle().await.unwrap();

        assert_eq!(report.finished, vec![1]);
        assert!(!h.registry.contains(&JobKind::ingest(1)));

        let report = h.monitor.run_cycle().await.unwrap();
        assert!(report.finished.is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_concurrent_cycles_create_one_job() {
        let h = harness();
        h.feed.set_schedule(schedule(vec![scheduled_game(1, "Live")])).await;
        // Both cycles are in flight at the same time
        h.feed.set_delay(Duration::from_millis(20)).await;

        let first = tokio::spawn({
            let monitor = Arc::clone(&h.monitor);
            async move { monitor.run_cycle().await }
        });
        let second = tokio::spawn({
            let monitor = Arc::clone(&h.monitor);
            async move { monitor.run_cycle().await }
        });

        let first = first.await.unwrap().unwrap();
        let second = second.await.unwrap().unwrap();

        assert_eq!(first.started.len() + second.started.len(), 1);
        assert_eq!(h.registry.ingest_game_ids(), vec![1]);
    }

    #[tokio::test]
    async fn test_start_and_finish_are_audited() {
        let (tx, mut rx) = tokio::sync::mpsc::channel(16);
        let h = harness_with_audit(Some(AuditHandle::new(tx)));

        h.feed.set_schedule(schedule(vec![scheduled_game(1, "Live")])).await;
        h.monitor.run_cycle().await.unwrap();

        let started = rx.recv().await.unwrap().event;
        assert_eq!(started, AuditEvent::GameStarted { game_id: 1 });
        assert_eq!(started.message(), "Game 1 has started");

        // A repeated Live observation is not audited again
        h.monitor.run_cycle().await.unwrap();
        assert!(rx.try_recv().is_err());

        h.feed.set_schedule(schedule(vec![scheduled_game(1, "Final")])).await;
        h.monitor.run_cycle().await.unwrap();

        let finished = rx.recv().await.unwrap().event;
        assert_eq!(finished, AuditEvent::GameFinished { game_id: 1 });
        assert_eq!(finished.message(), "Game 1 has finished");
    }

    #[tokio::test]
    async fn test_store_write_failure_ends_cycle() {
        let h = harness();
        h.feed.set_schedule(schedule(vec![scheduled_game(1, "Preview")])).await;
        h.store.set_fail_writes(true);

        let err = h.monitor.run_cycle().await.unwrap_err();

        assert_eq!(err.kind(), "persistence");
        assert!(matches!(err, TickError::Persistence(_)));
        assert_eq!(h.store.game_upserts(), 0);
        assert!(h.store.game(1).is_none());
    }

    #[tokio::test]
    async fn test_empty_schedule_is_noop() {
        let h = harness();
        let report = h.monitor.run_cycle().await.unwrap();

        assert_eq!(report, CycleReport::default());
        assert!(h.registry.list_jobs().is_empty());
    }
}
