//! Handler selection conditions.
//!
//! # Design Decisions
//! - Empty method set and empty pattern are wildcards
//! - Conditions combine with AND semantics
//! - Exception and status conditions only apply to error handlers

use http::{Method, StatusCode};

use crate::error::{ErrorKind, HandlerError};
use crate::routing::pattern::join_prefix;

/// Condition deciding whether a handler applies to an exchange.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Predicate {
    pub methods: Vec<Method>,
    pub pattern: String,
    pub exception: Option<&'static ErrorKind>,
    pub status: Option<StatusCode>,
}

impl Predicate {
    /// Matches every method and path.
    pub fn any() -> Self {
        Self::default()
    }

    pub fn path(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            ..Self::default()
        }
    }

    pub fn with_methods(mut self, methods: impl IntoIterator<Item = Method>) -> Self {
        self.methods = methods.into_iter().collect();
        self
    }

    pub fn with_exception(mut self, kind: &'static ErrorKind) -> Self {
        self.exception = Some(kind);
        self
    }

    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = Some(status);
        self
    }

    /// Copy with `prefix` prepended to the pattern.
    pub fn with_prefix(&self, prefix: &str) -> Self {
        Self {
            pattern: join_prefix(prefix, &self.pattern),
            ..self.clone()
        }
    }

    pub fn matches_method(&self, method: &Method) -> bool {
        self.methods.is_empty() || self.methods.contains(method)
    }

    pub fn matches_exception(&self, error: &HandlerError) -> bool {
        self.exception.map_or(true, |kind| error.is(kind))
    }

    pub fn matches_status(&self, status: StatusCode) -> bool {
        self.status.map_or(true, |expected| expected == status)
    }

    /// Error handlers need exactly one of exception or status.
    pub fn is_valid_for_error(&self) -> bool {
        self.exception.is_some() != self.status.is_some()
    }
}
