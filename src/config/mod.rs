//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → Config (validated, immutable)
//!     → ServerConfig to the server port, ClientConfig to the client port
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, validated, ConfigError};
pub use schema::{ClientConfig, Config, ObservabilityConfig, ServerConfig, TlsConfig};
pub use validation::{validate_config, ValidationError};
