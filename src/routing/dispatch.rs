//! Phase state machine driving one exchange through the handler chain.
//!
//! # Data Flow
//! ```text
//! Call
//!     → Before   (filters in order; Done halts, Err → recover → After)
//!     → Action   (first completing action wins; Pass falls through; none → 404)
//!     → Status   (status error handler, only when no error is pending)
//!     → After    (filters in order; always attempted)
//!     → Outcome::Completed | Outcome::Failed
//! ```
//!
//! # Design Decisions
//! - Phases are explicit states, not nested callbacks
//! - A handler error stops its phase and is recovered at most once per raise
//! - An error handler that fails makes the exchange fatal; it is never re-dispatched
//! - A fatal error is kept even if later after-filters fail too

use http::StatusCode;

use crate::error::HandlerError;
use crate::exchange::Call;
use crate::http::Response;
use crate::routing::handler::{Flow, HandlerKind};
use crate::routing::router::{HandlerChain, Resolved};

/// Result of dispatching one exchange.
#[derive(Debug)]
pub enum Outcome {
    Completed(Call),
    /// No error handler recovered the error, or one failed itself.
    Failed { call: Call, error: HandlerError },
}

impl Outcome {
    pub fn call(&self) -> &Call {
        match self {
            Outcome::Completed(call) | Outcome::Failed { call, .. } => call,
        }
    }

    pub fn into_call(self) -> Call {
        match self {
            Outcome::Completed(call) | Outcome::Failed { call, .. } => call,
        }
    }

    pub fn is_fatal(&self) -> bool {
        matches!(self, Outcome::Failed { .. })
    }

    pub fn error(&self) -> Option<&HandlerError> {
        match self {
            Outcome::Completed(_) => None,
            Outcome::Failed { error, .. } => Some(error),
        }
    }

    /// Response as built by the handlers, fatal or not.
    pub fn into_response(self) -> Response {
        self.into_call().into_response()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Before,
    Action,
    Status,
    After,
    Finished,
}

struct Dispatch<'a> {
    chain: &'a HandlerChain,
    resolved: Vec<Resolved<'a>>,
    call: Call,
    fatal: Option<HandlerError>,
}

impl HandlerChain {
    /// Run every phase for `call` and report how the exchange ended.
    pub fn dispatch(&self, call: Call) -> Outcome {
        let resolved = self.resolve(&call);
        tracing::debug!(
            request_id = %call.id(),
            method = %call.request.method,
            path = %call.request.path,
            handlers = resolved.len(),
            "Dispatching exchange"
        );

        let mut dispatch = Dispatch {
            chain: self,
            resolved,
            call,
            fatal: None,
        };

        let mut phase = Phase::Before;
        while phase != Phase::Finished {
            phase = match phase {
                Phase::Before => dispatch.before(),
                Phase::Action => dispatch.action(),
                Phase::Status => dispatch.status(),
                Phase::After => dispatch.after(),
                Phase::Finished => Phase::Finished,
            };
        }

        let Dispatch { call, fatal, .. } = dispatch;
        match fatal {
            Some(error) => {
                tracing::error!(
                    request_id = %call.id(),
                    method = %call.request.method,
                    path = %call.request.path,
                    error = %error,
                    "Exchange failed"
                );
                Outcome::Failed { call, error }
            }
            None => {
                tracing::debug!(
                    request_id = %call.id(),
                    status = call.response.status.as_u16(),
                    "Exchange completed"
                );
                Outcome::Completed(call)
            }
        }
    }
}

impl Dispatch<'_> {
    fn before(&mut self) -> Phase {
        for index in self.indices(HandlerKind::Before) {
            match self.invoke(index) {
                Ok(Flow::Next) => continue,
                Ok(Flow::Done) => {
                    tracing::debug!(request_id = %self.call.id(), "Exchange halted by filter");
                    return Phase::Status;
                }
                Err(error) => {
                    self.recover(error);
                    return Phase::After;
                }
            }
        }
        Phase::Action
    }

    fn action(&mut self) -> Phase {
        for index in self.indices(HandlerKind::Action) {
            match self.invoke(index) {
                Ok(Flow::Next) => continue,
                Ok(Flow::Done) => return Phase::Status,
                Err(error) => {
                    self.recover(error);
                    return Phase::After;
                }
            }
        }
        tracing::debug!(
            request_id = %self.call.id(),
            path = %self.call.request.path,
            "No action completed the exchange"
        );
        self.call.not_found();
        Phase::Status
    }

    fn status(&mut self) -> Phase {
        if self.call.exception().is_some() {
            return Phase::After;
        }
        if let Some(resolved) = self.chain.resolve_status(&self.call) {
            self.call.set_path_params(resolved.params);
            if let Err(error) = resolved.handler.call(&mut self.call) {
                tracing::warn!(
                    request_id = %self.call.id(),
                    error = %error,
                    "Status handler failed"
                );
                self.fatal = Some(error);
            }
        }
        Phase::After
    }

    fn after(&mut self) -> Phase {
        for index in self.indices(HandlerKind::After) {
            match self.invoke(index) {
                Ok(Flow::Next) => continue,
                Ok(Flow::Done) => break,
                Err(error) => {
                    if self.fatal.is_some() {
                        tracing::warn!(
                            request_id = %self.call.id(),
                            error = %error,
                            "After filter failed on an already failed exchange"
                        );
                    } else {
                        self.recover(error);
                    }
                    break;
                }
            }
        }
        Phase::Finished
    }

    fn indices(&self, kind: HandlerKind) -> Vec<usize> {
        self.resolved
            .iter()
            .enumerate()
            .filter(|(_, resolved)| resolved.handler.kind() == kind)
            .map(|(index, _)| index)
            .collect()
    }

    fn invoke(&mut self, index: usize) -> Result<Flow, HandlerError> {
        let resolved = &self.resolved[index];
        self.call.set_path_params(resolved.params.clone());
        tracing::trace!(
            request_id = %self.call.id(),
            handler = %resolved.handler.kind(),
            pattern = %resolved.handler.predicate().pattern,
            "Running handler"
        );
        resolved.handler.call(&mut self.call)
    }

    /// Hand `error` to the best error handler, or make the exchange fatal.
    fn recover(&mut self, error: HandlerError) {
        if self.call.response.status.as_u16() < 400 {
            self.call.response.status = StatusCode::INTERNAL_SERVER_ERROR;
        }

        let Some(resolved) = self.chain.resolve_error(&self.call, &error) else {
            tracing::warn!(
                request_id = %self.call.id(),
                error = %error,
                "No error handler matched"
            );
            self.fatal = Some(error);
            return;
        };

        tracing::debug!(
            request_id = %self.call.id(),
            kind = %error.kind(),
            status = self.call.response.status.as_u16(),
            "Recovering handler error"
        );
        self.call.set_exception(error);
        self.call.set_path_params(resolved.params);
        if let Err(failure) = resolved.handler.call(&mut self.call) {
            tracing::warn!(
                request_id = %self.call.id(),
                error = %failure,
                "Error handler failed"
            );
            self.fatal = Some(failure);
        }
    }
}
