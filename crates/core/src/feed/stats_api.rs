//! HTTP client for the public stats API.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::config::{FeedConfig, GAME_ID_PLACEHOLDER};
use crate::metrics;

use super::{BoxscoreResponse, DateRange, FeedClient, FeedError, ScheduleResponse, SeasonsResponse};

/// Stats API client.
///
/// Every request carries the configured timeout; an expired timeout is
/// reported as [`FeedError::Timeout`].
pub struct StatsApiClient {
    client: Client,
    config: FeedConfig,
}

impl StatsApiClient {
    /// Create a new stats API client.
    pub fn new(config: FeedConfig) -> Result<Self, FeedError> {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { client, config })
    }

    fn boxscore_url(&self, game_id: i64) -> String {
        self.config
            .game_url_template
            .replace(GAME_ID_PLACEHOLDER, &game_id.to_string())
    }

    fn seasons_url(&self, season_id: &str) -> String {
        format!(
            "{}/{}",
            self.config.seasons_url.trim_end_matches('/'),
            season_id
        )
    }

    /// Send a request and decode the JSON body into `T`, recording metrics
    /// under `operation`.
    async fn fetch<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        request: RequestBuilder,
        what: &str,
    ) -> Result<T, FeedError> {
        let started = Instant::now();
        let result = self.send(request, what).await;

        metrics::FEED_REQUEST_DURATION
            .with_label_values(&[operation])
            .observe(started.elapsed().as_secs_f64());
        let status = if result.is_ok() { "success" } else { "error" };
        metrics::FEED_REQUESTS
            .with_label_values(&[operation, status])
            .inc();

        result
    }

    async fn send<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        what: &str,
    ) -> Result<T, FeedError> {
        let response = request.send().await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(FeedError::NotFound(what.to_string()));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FeedError::ApiError {
                status: status.as_u16(),
                message: body,
            });
        }

        response.json::<T>().await.map_err(|e| match FeedError::from(e) {
            FeedError::ParseError(msg) => {
                FeedError::ParseError(format!("Failed to parse {}: {}", what, msg))
            }
            other => other,
        })
    }
}

#[async_trait]
impl FeedClient for StatsApiClient {
    async fn get_schedule(&self, range: Option<DateRange>) -> Result<ScheduleResponse, FeedError> {
        let mut request = self.client.get(&self.config.schedule_url);
        if let Some(range) = range {
            debug!("Fetching schedule from {} to {}", range.start, range.end);
            request = request.query(&[
                ("startDate", range.start.to_string()),
                ("endDate", range.end.to_string()),
            ]);
        } else {
            debug!("Fetching today's schedule");
        }

        self.fetch("schedule", request, "schedule").await
    }

    async fn get_boxscore(&self, game_id: i64) -> Result<BoxscoreResponse, FeedError> {
        let url = self.boxscore_url(game_id);
        debug!(game_id, "Fetching boxscore");

        self.fetch("boxscore", self.client.get(&url), &format!("boxscore for game {}", game_id))
            .await
    }

    async fn get_seasons(&self, season_id: &str) -> Result<SeasonsResponse, FeedError> {
        let url = self.seasons_url(season_id);
        debug!("Fetching season {}", season_id);

        self.fetch("seasons", self.client.get(&url), &format!("season {}", season_id))
            .await
    }
}
