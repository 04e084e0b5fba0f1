//! Per-request exchange state and reply coercion.
//!
//! # Data Flow
//! ```text
//! Transport builds Request
//!     → Call::with_id (exchange id from x-request-id)
//!     → handlers mutate call.response, or return a Reply
//!     → reply::coerce (status + body)
//!     → Call::into_response → transport encodes
//! ```

pub mod call;
pub mod reply;

pub use call::Call;
pub use reply::{coerce, Reply};
