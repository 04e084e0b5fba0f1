//! HTTP model shared by the dispatch core and both transport ports.
//!
//! # Data Flow
//! ```text
//! Server port:  wire request → Request → Call → Response → wire response
//! Client port:  Request → wire request → wire response → Response
//! ```
//!
//! # Design Decisions
//! - One model for both directions so adapters convert exactly once
//! - Method, status and header types come from the `http` crate

pub mod body;
pub mod cookie;
pub mod request;
pub mod response;

pub use body::{Body, BodyFormat, JsonFormat};
pub use cookie::Cookie;
pub use request::Request;
pub use response::Response;

pub use http::{HeaderMap, Method, StatusCode};
