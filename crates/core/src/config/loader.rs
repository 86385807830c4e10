use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use std::path::Path;

use super::{types::Config, ConfigError};

/// Load configuration from file with environment variable overrides.
///
/// Nested keys are separated by a double underscore, e.g.
/// `RINKWATCH_ORCHESTRATOR__MONITOR_INTERVAL_MS=1000`.
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::FileNotFound(path.display().to_string()));
    }

    let config: Config = Figment::new()
        .merge(Toml::file(path))
        .merge(Env::prefixed("RINKWATCH_").split("__"))
        .extract()
        .map_err(|e| ConfigError::ParseError(e.to_string()))?;

    Ok(config)
}

/// Load configuration from TOML string (useful for testing)
pub fn load_config_from_str(toml_str: &str) -> Result<Config, ConfigError> {
    toml::from_str(toml_str).map_err(|e| ConfigError::ParseError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_config_from_str_empty_uses_defaults() {
        let config = load_config_from_str("").unwrap();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.orchestrator.monitor_interval_ms, 2000);
        assert_eq!(config.orchestrator.ingest_interval_ms, 5000);
    }

    #[test]
    fn test_load_config_from_str_invalid_type() {
        let toml = r#"
[server]
port = "not a number"
"#;
        let result = load_config_from_str(toml);
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_load_config_file_not_found() {
        let result = load_config(Path::new("/nonexistent/rinkwatch.toml"));
        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }

    #[test]
    fn test_load_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(
            temp_file,
            r#"
[server]
host = "127.0.0.1"
port = 4000

[feed]
timeout_secs = 3

[orchestrator]
monitor_interval_ms = 1500
"#
        )
        .unwrap();

        let config = load_config(temp_file.path()).unwrap();
        assert_eq!(config.server.port, 4000);
        assert_eq!(config.server.host.to_string(), "127.0.0.1");
        assert_eq!(config.feed.timeout_secs, 3);
        assert_eq!(config.orchestrator.monitor_interval_ms, 1500);
        assert_eq!(config.orchestrator.ingest_interval_ms, 5000);
    }
}
