//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (binary):
//!     Load config → Validate → Init logging/metrics → Build chain → Start server port
//!
//! Shutdown (signals.rs):
//!     SIGINT → Server::stop → stop accepting → drain in-flight exchanges → exit
//! ```
//!
//! # Design Decisions
//! - Ordered startup: config first, then observability, then listeners
//! - Graceful stop is bounded by the server port's drain timeout

pub mod signals;

pub use signals::shutdown_signal;
