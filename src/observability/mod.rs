//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Dispatch and transports produce:
//!     → logging.rs (structured log events, request_id on every dispatch event)
//!     → metrics.rs (counters, histograms)
//!
//! Consumers:
//!     → Log aggregation (stdout, pretty or JSON)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Structured logging (JSON) for machine parsing
//! - Exchange id flows through all dispatch events
//! - Metrics are cheap (atomic increments)

pub mod logging;
pub mod metrics;
