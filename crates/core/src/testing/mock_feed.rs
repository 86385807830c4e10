//! Mock stats feed for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::feed::{
    BoxscoreResponse, DateRange, FeedClient, FeedError, ScheduleResponse, SeasonsResponse,
};

/// A recorded feed call for test assertions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordedFeedCall {
    Schedule(Option<DateRange>),
    Boxscore(i64),
    Seasons(String),
}

/// Mock implementation of the FeedClient trait.
///
/// Provides controllable behavior for testing:
/// - Configurable schedule, boxscores and seasons
/// - Records every call for assertions
/// - Simulates one-off failures and slow responses
///
/// Unconfigured boxscores and seasons answer with [`FeedError::NotFound`].
/// Ranged schedule requests answer from a separate slot so a test can give
/// the monitor and a season reload different slates.
#[derive(Debug, Default)]
pub struct MockFeedClient {
    /// Schedule returned when no range is given.
    schedule: Arc<RwLock<ScheduleResponse>>,
    /// Schedule returned for any ranged request.
    range_schedule: Arc<RwLock<ScheduleResponse>>,
    boxscores: Arc<RwLock<HashMap<i64, BoxscoreResponse>>>,
    seasons: Arc<RwLock<HashMap<String, SeasonsResponse>>>,
    calls: Arc<RwLock<Vec<RecordedFeedCall>>>,
    /// If set, the next call fails with this error.
    next_error: Arc<RwLock<Option<FeedError>>>,
    /// Delay applied to every call.
    delay: Arc<RwLock<Option<Duration>>>,
}

impl MockFeedClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set_schedule(&self, schedule: ScheduleResponse) {
        *self.schedule.write().await = schedule;
    }

    pub async fn set_range_schedule(&self, schedule: ScheduleResponse) {
        *self.range_schedule.write().await = schedule;
    }

    pub async fn set_boxscore(&self, game_id: i64, boxscore: BoxscoreResponse) {
        self.boxscores.write().await.insert(game_id, boxscore);
    }

    pub async fn remove_boxscore(&self, game_id: i64) {
        self.boxscores.write().await.remove(&game_id);
    }

    pub async fn set_season(&self, season_id: &str, seasons: SeasonsResponse) {
        self.seasons
            .write()
            .await
            .insert(season_id.to_string(), seasons);
    }

    /// Make the next call fail with the given error.
    pub async fn set_next_error(&self, error: FeedError) {
        *self.next_error.write().await = Some(error);
    }

    /// Make the next call fail with a 503.
    pub async fn fail_next_call(&self, message: &str) {
        self.set_next_error(FeedError::ApiError {
            status: 503,
            message: message.to_string(),
        })
        .await;
    }

    /// Delay every call by `delay`.
    pub async fn set_delay(&self, delay: Duration) {
        *self.delay.write().await = Some(delay);
    }

    pub async fn recorded_calls(&self) -> Vec<RecordedFeedCall> {
        self.calls.read().await.clone()
    }

    /// Ranges of every schedule request, in call order.
    pub async fn schedule_ranges(&self) -> Vec<Option<DateRange>> {
        self.calls
            .read()
            .await
            .iter()
            .filter_map(|call| match call {
                RecordedFeedCall::Schedule(range) => Some(*range),
                _ => None,
            })
            .collect()
    }

    /// Number of boxscore requests made for `game_id`.
    pub async fn boxscore_calls(&self, game_id: i64) -> usize {
        self.calls
            .read()
            .await
            .iter()
            .filter(|call| **call == RecordedFeedCall::Boxscore(game_id))
            .count()
    }

    pub async fn clear_calls(&self) {
        self.calls.write().await.clear();
    }

    async fn begin(&self, call: RecordedFeedCall) -> Result<(), FeedError> {
        self.calls.write().await.push(call);

        let delay = *self.delay.read().await;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        match self.next_error.write().await.take() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl FeedClient for MockFeedClient {
    async fn get_schedule(&self, range: Option<DateRange>) -> Result<ScheduleResponse, FeedError> {
        self.begin(RecordedFeedCall::Schedule(range)).await?;

        let schedule = match range {
            Some(_) => self.range_schedule.read().await.clone(),
            None => self.schedule.read().await.clone(),
        };
        Ok(schedule)
    }

    async fn get_boxscore(&self, game_id: i64) -> Result<BoxscoreResponse, FeedError> {
        self.begin(RecordedFeedCall::Boxscore(game_id)).await?;

        self.boxscores
            .read()
            .await
            .get(&game_id)
            .cloned()
            .ok_or_else(|| FeedError::NotFound(format!("boxscore for game {}", game_id)))
    }

    async fn get_seasons(&self, season_id: &str) -> Result<SeasonsResponse, FeedError> {
        self.begin(RecordedFeedCall::Seasons(season_id.to_string()))
            .await?;

        self.seasons
            .read()
            .await
            .get(season_id)
            .cloned()
            .ok_or_else(|| FeedError::NotFound(format!("season {}", season_id)))
    }
}
