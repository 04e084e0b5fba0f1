//! Handlers: a kind, a predicate and a callback.

use std::fmt;
use std::sync::Arc;

use http::Method;

use crate::error::HandlerError;
use crate::exchange::Call;
use crate::routing::pattern::{PathParams, PathPattern, PatternError};
use crate::routing::predicate::Predicate;

/// Phase a handler participates in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandlerKind {
    Before,
    After,
    Action,
    Error,
}

impl fmt::Display for HandlerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            HandlerKind::Before => "before",
            HandlerKind::After => "after",
            HandlerKind::Action => "action",
            HandlerKind::Error => "error",
        };
        f.write_str(name)
    }
}

/// Control value returned by every callback.
///
/// `Next` continues the current phase (for actions: pass to the next
/// matching action); `Done` completes it.
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Next,
    Done,
}

/// Handler body. Runs synchronously on the blocking pool.
pub type Callback = Arc<dyn Fn(&mut Call) -> Result<Flow, HandlerError> + Send + Sync>;

/// A compiled handler, immutable once built.
#[derive(Clone)]
pub struct Handler {
    kind: HandlerKind,
    predicate: Predicate,
    matcher: Option<PathPattern>,
    callback: Callback,
}

impl Handler {
    /// Compile the predicate's pattern. An empty pattern matches every path.
    pub fn new(
        kind: HandlerKind,
        predicate: Predicate,
        callback: Callback,
    ) -> Result<Self, PatternError> {
        let matcher = if predicate.pattern.is_empty() {
            None
        } else {
            Some(PathPattern::compile(&predicate.pattern)?)
        };
        Ok(Self {
            kind,
            predicate,
            matcher,
            callback,
        })
    }

    pub fn kind(&self) -> HandlerKind {
        self.kind
    }

    pub fn predicate(&self) -> &Predicate {
        &self.predicate
    }

    /// Method and path check, returning the bindings on success.
    pub fn matches(&self, method: &Method, path: &str) -> Option<PathParams> {
        if !self.predicate.matches_method(method) {
            return None;
        }
        match &self.matcher {
            Some(pattern) => pattern.matches(path),
            None => Some(PathParams::default()),
        }
    }

    pub fn call(&self, call: &mut Call) -> Result<Flow, HandlerError> {
        (self.callback)(call)
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handler")
            .field("kind", &self.kind)
            .field("predicate", &self.predicate)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop() -> Callback {
        Arc::new(|_call: &mut Call| Ok(Flow::Next))
    }

    #[test]
    fn empty_pattern_matches_any_path() {
        let handler = Handler::new(HandlerKind::Before, Predicate::any(), noop()).unwrap();
        assert!(handler.matches(&Method::GET, "/anything/at/all").is_some());
    }

    #[test]
    fn method_is_checked_before_path() {
        let predicate = Predicate::path("/a/{id}").with_methods([Method::PUT]);
        let handler = Handler::new(HandlerKind::Action, predicate, noop()).unwrap();
        assert!(handler.matches(&Method::GET, "/a/1").is_none());
        assert_eq!(
            handler.matches(&Method::PUT, "/a/1").unwrap().get("id"),
            Some("1")
        );
    }

    #[test]
    fn invalid_patterns_fail_compilation() {
        assert!(Handler::new(HandlerKind::Action, Predicate::path("/{"), noop()).is_err());
    }
}
