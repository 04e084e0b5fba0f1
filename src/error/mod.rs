//! Error subsystem.
//!
//! # Data Flow
//! ```text
//! Handler body fails
//!     → HandlerError { kind, message, source }
//!     → routing::dispatch (error resolution by kind.is_a())
//!     → matching error handler, or fatal outcome at the transport
//! ```
//!
//! # Design Decisions
//! - Error kinds form a small static tree; matching walks parent links
//! - Applications extend the tree with their own `static` kinds
//! - The handler error carries its kind by reference, never by type id

pub mod kind;

pub use kind::{
    ErrorKind, ANY, ILLEGAL_ARGUMENT, ILLEGAL_STATE, IO, RUNTIME, SERIALIZATION, TIMEOUT,
    TRANSPORT, UNSUPPORTED_OPERATION,
};

use std::borrow::Cow;

/// Boxed source error carried by a [`HandlerError`].
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Failure raised by a handler body.
///
/// The `kind` decides which error handler recovers it; the message is only
/// exposed on the wire when an error handler chooses to copy it there.
#[derive(Debug, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct HandlerError {
    kind: &'static ErrorKind,
    message: Cow<'static, str>,
    #[source]
    source: Option<BoxError>,
}

impl HandlerError {
    /// Create an error of the given kind.
    pub fn new(kind: &'static ErrorKind, message: impl Into<Cow<'static, str>>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    /// Attach the underlying cause.
    pub fn with_source(mut self, source: impl Into<BoxError>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn illegal_argument(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(&ILLEGAL_ARGUMENT, message)
    }

    pub fn illegal_state(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(&ILLEGAL_STATE, message)
    }

    pub fn unsupported(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(&UNSUPPORTED_OPERATION, message)
    }

    pub fn kind(&self) -> &'static ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// True if this error's kind is `kind` or one of its descendants.
    pub fn is(&self, kind: &ErrorKind) -> bool {
        self.kind.is_a(kind)
    }
}

impl From<std::io::Error> for HandlerError {
    fn from(err: std::io::Error) -> Self {
        let kind = if err.kind() == std::io::ErrorKind::TimedOut {
            &TIMEOUT
        } else {
            &IO
        };
        Self::new(kind, err.to_string()).with_source(err)
    }
}

impl From<serde_json::Error> for HandlerError {
    fn from(err: serde_json::Error) -> Self {
        Self::new(&SERIALIZATION, err.to_string()).with_source(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    static CUSTOM: ErrorKind = ErrorKind::child("custom", &ILLEGAL_ARGUMENT);

    #[test]
    fn handler_error_reports_kind_and_message() {
        let err = HandlerError::illegal_argument("bad id");
        assert_eq!(err.kind(), &ILLEGAL_ARGUMENT);
        assert_eq!(err.message(), "bad id");
        assert_eq!(err.to_string(), "illegal_argument: bad id");
    }

    #[test]
    fn handler_error_matches_ancestors() {
        let err = HandlerError::new(&CUSTOM, "boom");
        assert!(err.is(&CUSTOM));
        assert!(err.is(&ILLEGAL_ARGUMENT));
        assert!(err.is(&RUNTIME));
        assert!(err.is(&ANY));
        assert!(!err.is(&IO));
    }

    #[test]
    fn io_errors_map_to_io_kinds() {
        let err: HandlerError = std::io::Error::new(std::io::ErrorKind::TimedOut, "slow").into();
        assert!(err.is(&TIMEOUT));
        assert!(err.is(&IO));

        let err: HandlerError = std::io::Error::other("disk").into();
        assert_eq!(err.kind(), &IO);
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn serde_errors_map_to_serialization() {
        let err: HandlerError = serde_json::from_str::<u32>("nope").unwrap_err().into();
        assert!(err.is(&SERIALIZATION));
        assert!(err.is(&RUNTIME));
    }
}
