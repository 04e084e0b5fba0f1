//! The per-request exchange handed to every handler.
//!
//! # Responsibilities
//! - Own the request and the response under construction
//! - Expose the path bindings of the handler currently running
//! - Carry the error being handled to error handlers
//!
//! # Design Decisions
//! - One `Call` per request, owned by its dispatch; handlers get `&mut Call`
//! - Reply helpers return [`Flow`] so handler bodies can end with them

use http::header::LOCATION;
use http::StatusCode;
use uuid::Uuid;

use crate::error::HandlerError;
use crate::exchange::reply::{coerce, Reply};
use crate::http::{Body, Request, Response};
use crate::routing::{Flow, PathParams};

/// A request/response exchange.
#[derive(Debug)]
pub struct Call {
    id: String,
    pub request: Request,
    pub response: Response,
    path_params: PathParams,
    exception: Option<HandlerError>,
}

impl Call {
    /// New exchange with a generated id.
    pub fn new(request: Request) -> Self {
        Self::with_id(Uuid::new_v4().to_string(), request)
    }

    /// New exchange with an id supplied by the transport (e.g. `x-request-id`).
    pub fn with_id(id: impl Into<String>, request: Request) -> Self {
        Self {
            id: id.into(),
            request,
            response: Response::default(),
            path_params: PathParams::default(),
            exception: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Bindings of the handler currently running.
    pub fn path_params(&self) -> &PathParams {
        &self.path_params
    }

    pub fn path_param(&self, name: &str) -> Option<&str> {
        self.path_params.get(name)
    }

    /// Path parameter, falling back to the first query parameter.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.path_param(name)
            .or_else(|| self.request.query_param(name))
    }

    /// Error being handled, visible to error and after handlers.
    pub fn exception(&self) -> Option<&HandlerError> {
        self.exception.as_ref()
    }

    /// Apply a reply to the response. `Reply::Pass` yields `Flow::Next`.
    pub fn reply(&mut self, reply: impl Into<Reply>) -> Flow {
        let reply = reply.into();
        if matches!(reply, Reply::Pass) {
            return Flow::Next;
        }
        if let Some((status, body)) = coerce(reply) {
            self.response.status = status;
            self.response.body = body;
        }
        Flow::Done
    }

    pub fn send(&mut self, status: StatusCode, body: impl Into<Body>) -> Flow {
        self.reply(Reply::Full(status, body.into()))
    }

    pub fn ok(&mut self, body: impl Into<Body>) -> Flow {
        self.send(StatusCode::OK, body)
    }

    pub fn created(&mut self, body: impl Into<Body>) -> Flow {
        self.send(StatusCode::CREATED, body)
    }

    /// Finish the exchange from a filter with `status` and `body`.
    pub fn halt(&mut self, status: StatusCode, body: impl Into<Body>) -> Flow {
        self.send(status, body)
    }

    /// `302 Found` pointing at `location`.
    pub fn redirect(&mut self, location: &str) -> Result<Flow, HandlerError> {
        self.response.set_header(LOCATION.as_str(), location)?;
        Ok(self.send(StatusCode::FOUND, Body::Empty))
    }

    /// Defer to the next matching action.
    pub fn pass(&self) -> Flow {
        Flow::Next
    }

    /// Mark the exchange as unrouted: `404` and a short text body.
    pub fn not_found(&mut self) {
        self.response.status = StatusCode::NOT_FOUND;
        self.response.body = Body::Text(format!("{} not found", self.request.path));
    }

    pub fn into_response(self) -> Response {
        self.response
    }

    pub(crate) fn set_path_params(&mut self, params: PathParams) {
        self.path_params = params;
    }

    pub(crate) fn set_exception(&mut self, error: HandlerError) {
        self.exception = Some(error);
    }
}
