//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the toolkit.
//! All types derive Serde traits for deserialization from config files.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct Config {
    /// Server port settings (bind address, TLS, limits).
    pub server: ServerConfig,

    /// Client port settings (base URL, TLS trust, redirects).
    pub client: ClientConfig,

    /// Logging and metrics settings.
    pub observability: ObservabilityConfig,
}

/// Server port configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address (e.g., "0.0.0.0:8080"). Port 0 picks a free port.
    pub bind_address: String,

    /// Optional TLS configuration.
    pub tls: Option<TlsConfig>,

    /// Request timeout (whole exchange) in seconds.
    pub request_timeout_secs: u64,

    /// Maximum accepted request body size.
    pub body_limit_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            tls: None,
            request_timeout_secs: 30,
            body_limit_bytes: 1024 * 1024,
        }
    }
}

impl ServerConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// PEM certificate chain and private key.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct TlsConfig {
    /// Path to certificate file (PEM).
    pub cert_path: String,

    /// Path to private key file (PEM).
    pub key_path: String,
}

/// Client port configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Prepended to every request path (e.g., "https://localhost:8443/api").
    pub base_url: Option<String>,

    /// Accept any server certificate.
    pub insecure: bool,

    /// PEM file with additional trusted CA certificates.
    pub trust_store: Option<String>,

    /// Client certificate for mutual TLS.
    pub identity: Option<TlsConfig>,

    /// Follow redirects (up to 10) instead of returning them.
    pub follow_redirects: bool,

    /// Keep cookies between calls.
    pub use_cookies: bool,

    /// Total request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            insecure: false,
            trust_store: None,
            identity: None,
            follow_redirects: true,
            use_cookies: true,
            timeout_secs: 30,
        }
    }
}

impl ClientConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error). `RUST_LOG` wins when set.
    pub log_level: String,

    /// Log output: "pretty" or "json".
    pub log_format: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
            metrics_enabled: true,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
