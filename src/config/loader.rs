//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::GateConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<GateConfig, ConfigError> {
    let config = read_config(path)?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Read and parse a TOML file without validating it. Callers that layer
/// further values on top must validate the result themselves.
pub fn read_config(path: &Path) -> Result<GateConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}

/// Parse and validate configuration from TOML text.
pub fn parse_config(content: &str) -> Result<GateConfig, ConfigError> {
    let config: GateConfig = toml::from_str(content)?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::LogLevel;

    #[test]
    fn test_parse_full_config() {
        let config = parse_config(
            r#"
            [listener]
            bind_address = "127.0.0.1:5000"
            max_connections = 8

            [channel]
            max_frame_length = 1024

            [observability]
            log_level = "high"
            "#,
        )
        .unwrap();

        assert_eq!(config.listener.bind_address, "127.0.0.1:5000");
        assert_eq!(config.listener.max_connections, 8);
        assert_eq!(config.channel.max_frame_length, 1024);
        assert_eq!(config.observability.log_level, LogLevel::High);
    }

    #[test]
    fn test_unknown_log_level_is_parse_error() {
        let err = parse_config("[observability]\nlog_level = \"chatty\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_validation_errors_are_joined() {
        let err = parse_config("[listener]\nmax_connections = 0\n[channel]\nmax_frame_length = 0\n")
            .unwrap_err();
        let message = err.to_string();
        assert!(message.starts_with("Validation failed: "));
        assert!(message.contains("max_connections"));
        assert!(message.contains(", "));
    }

    #[test]
    fn test_read_defers_validation() {
        let path = std::env::temp_dir().join(format!(
            "connection-gate-unvalidated-{}.toml",
            std::process::id()
        ));
        fs::write(&path, "[listener]\nmax_connections = 0\n").unwrap();

        let read = read_config(&path);
        let loaded = load_config(&path);
        fs::remove_file(&path).unwrap();

        assert_eq!(read.unwrap().listener.max_connections, 0);
        assert!(matches!(loaded, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = load_config(Path::new("/nonexistent/gate.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
