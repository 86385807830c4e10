use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;

use crate::orchestrator::OrchestratorConfig;

/// Placeholder substituted with the game id in [`FeedConfig::game_url_template`].
pub const GAME_ID_PLACEHOLDER: &str = "{id}";

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub feed: FeedConfig,
    #[serde(default)]
    pub orchestrator: OrchestratorConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::UNSPECIFIED)
}

fn default_port() -> u16 {
    3000
}

/// Database configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("rinkwatch.db")
}

/// Stats feed endpoints and HTTP settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FeedConfig {
    /// Schedule endpoint. Without query parameters it returns today's slate.
    #[serde(default = "default_schedule_url")]
    pub schedule_url: String,
    /// Boxscore endpoint; `{id}` is replaced with the game id.
    #[serde(default = "default_game_url_template")]
    pub game_url_template: String,
    /// Season metadata endpoint; the season id is appended as a path segment.
    #[serde(default = "default_seasons_url")]
    pub seasons_url: String,
    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            schedule_url: default_schedule_url(),
            game_url_template: default_game_url_template(),
            seasons_url: default_seasons_url(),
            timeout_secs: default_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

fn default_schedule_url() -> String {
    "https://statsapi.web.nhl.com/api/v1/schedule".to_string()
}

fn default_game_url_template() -> String {
    "https://statsapi.web.nhl.com/api/v1/game/{id}/boxscore".to_string()
}

fn default_seasons_url() -> String {
    "https://statsapi.web.nhl.com/api/v1/seasons".to_string()
}

fn default_timeout() -> u64 {
    10
}

fn default_user_agent() -> String {
    format!("rinkwatch/{}", env!("CARGO_PKG_VERSION"))
}
