//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::Config;
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
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = fs::read_to_string(path)?;
    parse_config(&content)
}

/// Parse and validate configuration from TOML text.
pub fn parse_config(content: &str) -> Result<Config, ConfigError> {
    let config: Config = toml::from_str(content)?;
    validated(config)
}

/// Run semantic validation, e.g. again after command-line overrides.
pub fn validated(config: Config) -> Result<Config, ConfigError> {
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn minimal_config_uses_defaults() {
        let config = parse_config("[server]\nbind_address = \"127.0.0.1:0\"\n").unwrap();
        assert_eq!(config.server.bind_address, "127.0.0.1:0");
        assert_eq!(config.server.request_timeout_secs, 30);
        assert!(config.client.follow_redirects);
        assert_eq!(config.observability.log_format, "pretty");
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[client]\nbase_url = \"http://localhost:8080\"\ninsecure = true\n\n[observability]\nmetrics_enabled = false"
        )
        .unwrap();

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.client.base_url.as_deref(), Some("http://localhost:8080"));
        assert!(config.client.insecure);
        assert!(!config.observability.metrics_enabled);
    }

    #[test]
    fn invalid_values_fail_validation() {
        let err = parse_config("[server]\nbody_limit_bytes = 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Validation(ref errors) if errors.len() == 1));
        assert!(err.to_string().contains("server.body_limit_bytes"));
    }

    #[test]
    fn overrides_are_validated_after_loading() {
        let mut config = parse_config("[server]\nbind_address = \"127.0.0.1:0\"\n").unwrap();
        config.server.bind_address = "localhost-ish".to_string();
        let err = validated(config).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(ref errors) if errors.len() == 1));
        assert!(err.to_string().contains("server.bind_address"));
    }

    #[test]
    fn syntax_errors_are_parse_errors() {
        assert!(matches!(parse_config("[server"), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn missing_files_are_io_errors() {
        let err = load_config(Path::new("/does/not/exist.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
