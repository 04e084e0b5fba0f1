//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, body limit > 0)
//! - Check that referenced files exist and addresses parse
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: Config → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;
use std::path::Path;

use thiserror::Error;
use url::Url;

use crate::config::schema::{Config, TlsConfig};

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

const LOG_FORMATS: [&str; 2] = ["pretty", "json"];

/// Validate a parsed configuration, collecting every error.
pub fn validate_config(config: &Config) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let server = &config.server;
    if server.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "server.bind_address",
            format!("'{}' is not a socket address", server.bind_address),
        ));
    }
    if server.request_timeout_secs == 0 {
        errors.push(ValidationError::new(
            "server.request_timeout_secs",
            "must be greater than 0",
        ));
    }
    if server.body_limit_bytes == 0 {
        errors.push(ValidationError::new(
            "server.body_limit_bytes",
            "must be greater than 0",
        ));
    }
    if let Some(tls) = &server.tls {
        check_pem_pair("server.tls", tls, &mut errors);
    }

    let client = &config.client;
    if let Some(base) = &client.base_url {
        if Url::parse(base).is_err() {
            errors.push(ValidationError::new(
                "client.base_url",
                format!("'{base}' is not a valid URL"),
            ));
        }
    }
    if client.timeout_secs == 0 {
        errors.push(ValidationError::new(
            "client.timeout_secs",
            "must be greater than 0",
        ));
    }
    if let Some(trust) = &client.trust_store {
        check_file("client.trust_store", trust, &mut errors);
    }
    if let Some(identity) = &client.identity {
        check_pem_pair("client.identity", identity, &mut errors);
    }

    let observability = &config.observability;
    if !LOG_FORMATS.contains(&observability.log_format.as_str()) {
        errors.push(ValidationError::new(
            "observability.log_format",
            format!("unknown format '{}'", observability.log_format),
        ));
    }
    if observability.metrics_enabled
        && observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("'{}' is not a socket address", observability.metrics_address),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_pem_pair(field: &str, tls: &TlsConfig, errors: &mut Vec<ValidationError>) {
    check_file(&format!("{field}.cert_path"), &tls.cert_path, errors);
    check_file(&format!("{field}.key_path"), &tls.key_path, errors);
}

fn check_file(field: &str, path: &str, errors: &mut Vec<ValidationError>) {
    if !Path::new(path).is_file() {
        errors.push(ValidationError::new(field, format!("file '{path}' not found")));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(validate_config(&Config::default()).is_ok());
    }

    #[test]
    fn reports_every_error() {
        let mut config = Config::default();
        config.server.bind_address = "nowhere".into();
        config.server.request_timeout_secs = 0;
        config.client.base_url = Some("not a url".into());
        config.observability.log_format = "xml".into();

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(
            fields,
            [
                "server.bind_address",
                "server.request_timeout_secs",
                "client.base_url",
                "observability.log_format",
            ]
        );
    }

    #[test]
    fn missing_tls_files_are_reported() {
        let mut config = Config::default();
        config.server.tls = Some(TlsConfig {
            cert_path: "/does/not/exist.pem".into(),
            key_path: "/does/not/exist.key".into(),
        });
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].field, "server.tls.cert_path");
    }

    #[test]
    fn metrics_address_only_checked_when_enabled() {
        let mut config = Config::default();
        config.observability.metrics_address = "bogus".into();
        assert!(validate_config(&config).is_err());

        config.observability.metrics_enabled = false;
        assert!(validate_config(&config).is_ok());
    }
}
