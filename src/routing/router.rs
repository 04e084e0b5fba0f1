//! Router builder and the compiled handler chain.
//!
//! # Responsibilities
//! - Collect handlers and nested routers in declaration order
//! - Flatten nesting once, prefixing nested patterns
//! - Resolve the handlers that apply to an exchange
//!
//! # Design Decisions
//! - `Router` is build-time only; `HandlerChain` is immutable and shared via `Arc`
//! - Declaration order decides precedence (first match wins)
//! - Invalid patterns and error predicates fail at build time, never per request

use std::sync::Arc;

use http::{Method, StatusCode};
use thiserror::Error;

use crate::error::{ErrorKind, HandlerError};
use crate::exchange::{Call, Reply};
use crate::routing::handler::{Callback, Flow, Handler, HandlerKind};
use crate::routing::pattern::{join_prefix, PathParams, PatternError};
use crate::routing::predicate::Predicate;

/// Errors raised by [`Router::build`].
#[derive(Debug, Error)]
pub enum RouterError {
    #[error("invalid path pattern: {0}")]
    Pattern(#[from] PatternError),

    #[error("error handler for '{pattern}' needs exactly one of exception or status")]
    InvalidErrorHandler { pattern: String },
}

enum Entry {
    Handler {
        kind: HandlerKind,
        predicate: Predicate,
        callback: Callback,
    },
    Nested {
        prefix: String,
        router: Router,
    },
}

/// Declarative handler registration.
///
/// ```ignore
/// let chain = Router::new()
///     .before("/protected/*", |call| Ok(call.halt(StatusCode::UNAUTHORIZED, "forbidden")))
///     .get("/hello/{name}", |call| Ok(format!("Hello {}", call.param("name").unwrap_or(""))))
///     .error(&ILLEGAL_ARGUMENT, |call| Ok((400u16, "bad request")))
///     .build()?;
/// ```
#[derive(Default)]
pub struct Router {
    entries: Vec<Entry>,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a raw handler.
    pub fn handler(mut self, kind: HandlerKind, predicate: Predicate, callback: Callback) -> Self {
        self.entries.push(Entry::Handler {
            kind,
            predicate,
            callback,
        });
        self
    }

    /// Filter run before the action; `Flow::Done` halts the exchange.
    pub fn before<F>(self, pattern: &str, filter: F) -> Self
    where
        F: Fn(&mut Call) -> Result<Flow, HandlerError> + Send + Sync + 'static,
    {
        self.handler(HandlerKind::Before, Predicate::path(pattern), Arc::new(filter))
    }

    /// Filter run after the action, whether or not the action completed.
    pub fn after<F>(self, pattern: &str, filter: F) -> Self
    where
        F: Fn(&mut Call) -> Result<Flow, HandlerError> + Send + Sync + 'static,
    {
        self.handler(HandlerKind::After, Predicate::path(pattern), Arc::new(filter))
    }

    /// Action for the given methods (empty = any method).
    pub fn on<I, F, R>(self, methods: I, pattern: &str, action: F) -> Self
    where
        I: IntoIterator<Item = Method>,
        F: Fn(&mut Call) -> Result<R, HandlerError> + Send + Sync + 'static,
        R: Into<Reply>,
    {
        let predicate = Predicate::path(pattern).with_methods(methods);
        self.handler(HandlerKind::Action, predicate, replying(action))
    }

    pub fn any<F, R>(self, pattern: &str, action: F) -> Self
    where
        F: Fn(&mut Call) -> Result<R, HandlerError> + Send + Sync + 'static,
        R: Into<Reply>,
    {
        self.on(Vec::new(), pattern, action)
    }

    pub fn get<F, R>(self, pattern: &str, action: F) -> Self
    where
        F: Fn(&mut Call) -> Result<R, HandlerError> + Send + Sync + 'static,
        R: Into<Reply>,
    {
        self.on([Method::GET], pattern, action)
    }

    pub fn post<F, R>(self, pattern: &str, action: F) -> Self
    where
        F: Fn(&mut Call) -> Result<R, HandlerError> + Send + Sync + 'static,
        R: Into<Reply>,
    {
        self.on([Method::POST], pattern, action)
    }

    pub fn put<F, R>(self, pattern: &str, action: F) -> Self
    where
        F: Fn(&mut Call) -> Result<R, HandlerError> + Send + Sync + 'static,
        R: Into<Reply>,
    {
        self.on([Method::PUT], pattern, action)
    }

    pub fn patch<F, R>(self, pattern: &str, action: F) -> Self
    where
        F: Fn(&mut Call) -> Result<R, HandlerError> + Send + Sync + 'static,
        R: Into<Reply>,
    {
        self.on([Method::PATCH], pattern, action)
    }

    pub fn delete<F, R>(self, pattern: &str, action: F) -> Self
    where
        F: Fn(&mut Call) -> Result<R, HandlerError> + Send + Sync + 'static,
        R: Into<Reply>,
    {
        self.on([Method::DELETE], pattern, action)
    }

    pub fn head<F, R>(self, pattern: &str, action: F) -> Self
    where
        F: Fn(&mut Call) -> Result<R, HandlerError> + Send + Sync + 'static,
        R: Into<Reply>,
    {
        self.on([Method::HEAD], pattern, action)
    }

    pub fn options<F, R>(self, pattern: &str, action: F) -> Self
    where
        F: Fn(&mut Call) -> Result<R, HandlerError> + Send + Sync + 'static,
        R: Into<Reply>,
    {
        self.on([Method::OPTIONS], pattern, action)
    }

    pub fn trace<F, R>(self, pattern: &str, action: F) -> Self
    where
        F: Fn(&mut Call) -> Result<R, HandlerError> + Send + Sync + 'static,
        R: Into<Reply>,
    {
        self.on([Method::TRACE], pattern, action)
    }

    /// Error handler for `kind` and its descendants.
    pub fn error<F, R>(self, kind: &'static ErrorKind, handler: F) -> Self
    where
        F: Fn(&mut Call) -> Result<R, HandlerError> + Send + Sync + 'static,
        R: Into<Reply>,
    {
        let predicate = Predicate::any().with_exception(kind);
        self.handler(HandlerKind::Error, predicate, replying(handler))
    }

    /// Error handler for a response status (e.g. a custom 404 page).
    pub fn error_status<F, R>(self, status: StatusCode, handler: F) -> Self
    where
        F: Fn(&mut Call) -> Result<R, HandlerError> + Send + Sync + 'static,
        R: Into<Reply>,
    {
        let predicate = Predicate::any().with_status(status);
        self.handler(HandlerKind::Error, predicate, replying(handler))
    }

    /// Mount `router` under `prefix`.
    pub fn path(mut self, prefix: &str, router: Router) -> Self {
        self.entries.push(Entry::Nested {
            prefix: prefix.to_string(),
            router,
        });
        self
    }

    /// Flatten and compile into an immutable chain.
    pub fn build(self) -> Result<HandlerChain, RouterError> {
        let mut handlers = Vec::new();
        self.flatten("", &mut handlers)?;
        tracing::debug!(handlers = handlers.len(), "Handler chain built");
        Ok(HandlerChain { handlers })
    }

    fn flatten(self, prefix: &str, out: &mut Vec<Handler>) -> Result<(), RouterError> {
        for entry in self.entries {
            match entry {
                Entry::Handler {
                    kind,
                    predicate,
                    callback,
                } => {
                    let predicate = predicate.with_prefix(prefix);
                    if kind == HandlerKind::Error && !predicate.is_valid_for_error() {
                        return Err(RouterError::InvalidErrorHandler {
                            pattern: predicate.pattern,
                        });
                    }
                    out.push(Handler::new(kind, predicate, callback)?);
                }
                Entry::Nested {
                    prefix: nested,
                    router,
                } => {
                    let full = join_prefix(prefix, &nested);
                    router.flatten(&full, out)?;
                }
            }
        }
        Ok(())
    }
}

/// Wrap an action body so its return value is coerced into the response.
fn replying<F, R>(body: F) -> Callback
where
    F: Fn(&mut Call) -> Result<R, HandlerError> + Send + Sync + 'static,
    R: Into<Reply>,
{
    Arc::new(move |call: &mut Call| {
        let reply = body(call)?;
        Ok(call.reply(reply))
    })
}

/// A handler selected for an exchange, with its path bindings.
#[derive(Debug)]
pub struct Resolved<'a> {
    pub handler: &'a Handler,
    pub params: PathParams,
}

/// Flattened, immutable handler list.
#[derive(Debug, Clone, Default)]
pub struct HandlerChain {
    handlers: Vec<Handler>,
}

impl HandlerChain {
    pub fn handlers(&self) -> &[Handler] {
        &self.handlers
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Non-error handlers matching the exchange's method and path, in order.
    pub fn resolve(&self, call: &Call) -> Vec<Resolved<'_>> {
        self.handlers
            .iter()
            .filter(|handler| handler.kind() != HandlerKind::Error)
            .filter_map(|handler| {
                handler
                    .matches(&call.request.method, &call.request.path)
                    .map(|params| Resolved { handler, params })
            })
            .collect()
    }

    /// Best error handler for `error`: by kind first, then by current status.
    pub fn resolve_error(&self, call: &Call, error: &HandlerError) -> Option<Resolved<'_>> {
        self.find_error(call, |predicate| {
            predicate.exception.is_some() && predicate.matches_exception(error)
        })
        .or_else(|| self.resolve_status(call))
    }

    /// First error handler registered for the exchange's current status.
    pub fn resolve_status(&self, call: &Call) -> Option<Resolved<'_>> {
        let status = call.response.status;
        self.find_error(call, |predicate| {
            predicate.status.is_some() && predicate.matches_status(status)
        })
    }

    fn find_error(
        &self,
        call: &Call,
        accept: impl Fn(&Predicate) -> bool,
    ) -> Option<Resolved<'_>> {
        self.handlers
            .iter()
            .filter(|handler| handler.kind() == HandlerKind::Error)
            .filter(|handler| accept(handler.predicate()))
            .find_map(|handler| {
                handler
                    .matches(&call.request.method, &call.request.path)
                    .map(|params| Resolved { handler, params })
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ILLEGAL_ARGUMENT, RUNTIME};
    use crate::http::Request;

    fn call(method: Method, path: &str) -> Call {
        Call::new(Request::new(method, path))
    }

    fn kinds(resolved: &[Resolved<'_>]) -> Vec<HandlerKind> {
        resolved.iter().map(|r| r.handler.kind()).collect()
    }

    #[test]
    fn resolves_in_declaration_order() {
        let chain = Router::new()
            .after("", |_| Ok(Flow::Next))
            .get("/a", |_| Ok("a"))
            .before("/a", |_| Ok(Flow::Next))
            .post("/a", |_| Ok("post"))
            .build()
            .unwrap();

        let resolved = chain.resolve(&call(Method::GET, "/a"));
        assert_eq!(
            kinds(&resolved),
            vec![HandlerKind::After, HandlerKind::Action, HandlerKind::Before]
        );
    }

    #[test]
    fn nested_routers_are_prefixed() {
        let chain = Router::new()
            .path(
                "/api",
                Router::new()
                    .get("/users/{id}", |_| Ok("user"))
                    .path("/v2", Router::new().get("/items", |_| Ok("items"))),
            )
            .build()
            .unwrap();

        let patterns: Vec<_> = chain
            .handlers()
            .iter()
            .map(|h| h.predicate().pattern.clone())
            .collect();
        assert_eq!(patterns, vec!["/api/users/{id}", "/api/v2/items"]);

        let resolved = chain.resolve(&call(Method::GET, "/api/users/7"));
        assert_eq!(resolved[0].params.get("id"), Some("7"));
        assert!(chain.resolve(&call(Method::GET, "/users/7")).is_empty());
    }

    #[test]
    fn nested_filters_without_pattern_cover_the_subtree() {
        let chain = Router::new()
            .path("/admin", Router::new().before("", |_| Ok(Flow::Next)))
            .build()
            .unwrap();
        assert_eq!(chain.resolve(&call(Method::GET, "/admin/a/b")).len(), 1);
        assert!(chain.resolve(&call(Method::GET, "/public")).is_empty());
    }

    #[test]
    fn error_handlers_resolve_by_kind_before_status() {
        let chain = Router::new()
            .error_status(StatusCode::INTERNAL_SERVER_ERROR, |_| Ok("status"))
            .error(&RUNTIME, |_| Ok("runtime"))
            .build()
            .unwrap();

        let mut exchange = call(Method::GET, "/");
        exchange.response.status = StatusCode::INTERNAL_SERVER_ERROR;

        let resolved = chain
            .resolve_error(&exchange, &HandlerError::illegal_argument("x"))
            .unwrap();
        assert_eq!(resolved.handler.predicate().exception, Some(&RUNTIME));

        let io = HandlerError::new(&crate::error::IO, "disk");
        let resolved = chain.resolve_error(&exchange, &io).unwrap();
        assert_eq!(
            resolved.handler.predicate().status,
            Some(StatusCode::INTERNAL_SERVER_ERROR)
        );
    }

    #[test]
    fn error_handlers_are_not_resolved_as_actions() {
        let chain = Router::new()
            .error(&ILLEGAL_ARGUMENT, |_| Ok("x"))
            .build()
            .unwrap();
        assert!(chain.resolve(&call(Method::GET, "/")).is_empty());
    }

    #[test]
    fn build_rejects_invalid_handlers() {
        let err = Router::new().get("/a/{x}/{x}", |_| Ok("")).build().unwrap_err();
        assert!(matches!(err, RouterError::Pattern(_)));

        let err = Router::new()
            .handler(
                HandlerKind::Error,
                Predicate::any(),
                Arc::new(|_: &mut Call| Ok(Flow::Done)),
            )
            .build()
            .unwrap_err();
        assert!(matches!(err, RouterError::InvalidErrorHandler { .. }));
    }
}
