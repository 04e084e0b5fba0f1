//! Switchyard: predicate-matched HTTP handler pipeline.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ─────────────▶ ┌─────────────┐    ┌──────────┐    ┌───────────────────────────────┐
//!                    │ server port │───▶│ exchange │───▶│ routing                       │
//!                    │ (axum)      │    │ Call     │    │ HandlerChain::dispatch        │
//!                    └─────────────┘    └──────────┘    │ before → action → status      │
//!                           ▲                           │ → after, error resolution     │
//!     Client Response       │                           └──────────────┬────────────────┘
//!     ◀─────────────────────┴──────── coerce (Reply → status + body) ◀─┘
//!
//!     HttpClient (cookies) → client port (reqwest) → remote server
//!
//!     Cross-cutting: config, observability (logging, metrics), lifecycle, error kinds
//! ```

// Core
pub mod error;
pub mod exchange;
pub mod http;
pub mod routing;

// Transports
pub mod capability;
pub mod client;
pub mod server;

// Cross-cutting concerns
pub mod config;
pub mod lifecycle;
pub mod observability;

pub use capability::Capability;
pub use client::{ClientError, ClientPort, HttpClient, ReqwestClient};
pub use config::Config;
pub use error::{ErrorKind, HandlerError};
pub use exchange::{coerce, Call, Reply};
pub use routing::{Flow, HandlerChain, Outcome, Router, RouterError};
pub use server::{AxumServer, Server, ServerError, ServerPort};
