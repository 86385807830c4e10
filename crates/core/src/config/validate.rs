use super::{types::Config, ConfigError, GAME_ID_PLACEHOLDER};

/// Validate configuration.
///
/// Rejects values that would make the scheduler spin or the feed
/// client unusable: zero ports, zero intervals, zero timeouts and a
/// boxscore URL template without the game id placeholder.
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    if config.feed.timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "feed.timeout_secs cannot be 0".to_string(),
        ));
    }

    if !config.feed.game_url_template.contains(GAME_ID_PLACEHOLDER) {
        return Err(ConfigError::ValidationError(format!(
            "feed.game_url_template must contain {}",
            GAME_ID_PLACEHOLDER
        )));
    }

    let orchestrator = &config.orchestrator;
    if orchestrator.monitor_interval_ms == 0 || orchestrator.ingest_interval_ms == 0 {
        return Err(ConfigError::ValidationError(
            "orchestrator intervals cannot be 0".to_string(),
        ));
    }

    if orchestrator.reload_concurrency == 0 {
        return Err(ConfigError::ValidationError(
            "orchestrator.reload_concurrency cannot be 0".to_string(),
        ));
    }

    Ok(())
}
