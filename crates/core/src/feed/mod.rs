//! Stats feed client.
//!
//! The feed exposes three documents the core consumes: the schedule for a
//! date range (today's slate when no range is given), a single game's
//! boxscore, and season metadata.

mod stats_api;
mod types;

pub use stats_api::StatsApiClient;
pub use types::*;

use async_trait::async_trait;
use chrono::NaiveDate;
use thiserror::Error;

/// Errors that can occur when talking to the stats feed.
#[derive(Debug, Error)]
pub enum FeedError {
    /// Transport-level failure (connection refused, TLS, reset, ...).
    #[error("HTTP request failed: {0}")]
    HttpError(reqwest::Error),

    /// The request did not complete within the configured timeout.
    #[error("Request timed out: {0}")]
    Timeout(String),

    /// Resource not found (404).
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Feed returned a non-success status.
    #[error("API error: {status} - {message}")]
    ApiError { status: u16, message: String },

    /// Response body did not match the expected document shape.
    #[error("Failed to parse response: {0}")]
    ParseError(String),
}

impl From<reqwest::Error> for FeedError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            FeedError::Timeout(e.to_string())
        } else if e.is_decode() {
            FeedError::ParseError(e.to_string())
        } else {
            FeedError::HttpError(e)
        }
    }
}

/// Inclusive date range for schedule queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }
}

/// Read-only access to the stats feed.
#[async_trait]
pub trait FeedClient: Send + Sync {
    /// Fetch the schedule for `range`, or today's slate when `None`.
    async fn get_schedule(&self, range: Option<DateRange>) -> Result<ScheduleResponse, FeedError>;

    /// Fetch the boxscore for one game.
    async fn get_boxscore(&self, game_id: i64) -> Result<BoxscoreResponse, FeedError>;

    /// Fetch season metadata.
    async fn get_seasons(&self, season_id: &str) -> Result<SeasonsResponse, FeedError>;
}
