//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Build time:
//!     Router (handlers + nested routers, declaration order)
//!     → flatten, prefix nested patterns
//!     → compile patterns (pattern.rs), validate error predicates
//!     → freeze as immutable HandlerChain
//!
//! Per request:
//!     Call (method, path)
//!     → router.rs resolve (predicate.rs + pattern.rs)
//!     → dispatch.rs phase machine (before, action, status, after)
//!     → Outcome
//! ```
//!
//! # Design Decisions
//! - Handlers compiled at startup, immutable at runtime
//! - No regex in the hot path (segment matching only)
//! - Deterministic: same input always resolves the same handlers
//! - First match wins (declaration order, not specificity)

pub mod dispatch;
pub mod handler;
pub mod pattern;
pub mod predicate;
pub mod router;

pub use dispatch::Outcome;
pub use handler::{Callback, Flow, Handler, HandlerKind};
pub use pattern::{PathParams, PathPattern, PatternError};
pub use predicate::Predicate;
pub use router::{HandlerChain, Resolved, Router, RouterError};
