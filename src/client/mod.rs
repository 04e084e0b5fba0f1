//! Client port: outbound requests through a pluggable engine.
//!
//! # Data Flow
//! ```text
//! HttpClient::get/post/...
//!     → ClientPort::endpoint (target URL, when the engine knows it)
//!     → add stored cookies scoped to that target (jar.rs)
//!     → ClientPort::send (engine-specific wire exchange)
//!     → store Set-Cookie updates (by name, domain and path; expiry removes)
//!     → Response
//! ```
//!
//! # Design Decisions
//! - `HttpClient` owns the cookie store; sends take `&mut self`, so no lock
//! - Streaming capabilities default to `Unsupported` and are discovered via `supports`

pub mod jar;
pub mod reqwest_port;

pub use jar::{CookieJar, Target};
pub use reqwest_port::ReqwestClient;

use async_trait::async_trait;
use chrono::Utc;
use futures_util::stream::BoxStream;
use http::header::COOKIE;
use http::Method;
use thiserror::Error;
use url::Url;

use crate::capability::Capability;
use crate::config::ClientConfig;
use crate::error::{HandlerError, IO, TIMEOUT, TRANSPORT, UNSUPPORTED_OPERATION};
use crate::http::{Body, Cookie, Request, Response};

/// Errors raised by client ports.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("invalid URL '{0}'")]
    InvalidUrl(String),

    #[error("TLS configuration error: {0}")]
    Tls(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0} not supported by this client")]
    Unsupported(Capability),
}

impl From<ClientError> for HandlerError {
    fn from(err: ClientError) -> Self {
        let kind = match &err {
            ClientError::Timeout(_) => &TIMEOUT,
            ClientError::Unsupported(_) => &UNSUPPORTED_OPERATION,
            ClientError::Io(_) => &IO,
            _ => &TRANSPORT,
        };
        HandlerError::new(kind, err.to_string()).with_source(err)
    }
}

/// One server-sent event.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServerEvent {
    pub event: Option<String>,
    pub data: String,
    pub id: Option<String>,
    pub retry: Option<u64>,
}

pub type EventStream = BoxStream<'static, Result<ServerEvent, ClientError>>;

/// An open WebSocket session.
#[async_trait]
pub trait WsSession: Send {
    async fn send(&mut self, text: String) -> Result<(), ClientError>;

    /// Next text frame, or `None` once the peer closed.
    async fn receive(&mut self) -> Option<Result<String, ClientError>>;

    async fn close(&mut self) -> Result<(), ClientError>;
}

/// An engine able to perform one request/response exchange.
#[async_trait]
pub trait ClientPort: Send + Sync {
    async fn send(&self, request: Request) -> Result<Response, ClientError>;

    /// Absolute URL `request` would be sent to, if the engine resolves one.
    fn endpoint(&self, _request: &Request) -> Option<Url> {
        None
    }

    fn supports(&self, _capability: Capability) -> bool {
        false
    }

    async fn ws(&self, _path: &str) -> Result<Box<dyn WsSession>, ClientError> {
        Err(ClientError::Unsupported(Capability::WebSockets))
    }

    async fn sse(&self, _request: Request) -> Result<EventStream, ClientError> {
        Err(ClientError::Unsupported(Capability::ServerSentEvents))
    }
}

/// Client facade keeping cookies across sequential calls.
pub struct HttpClient {
    port: Box<dyn ClientPort>,
    cookies: CookieJar,
    use_cookies: bool,
}

impl HttpClient {
    pub fn new(port: impl ClientPort + 'static) -> Self {
        Self {
            port: Box::new(port),
            cookies: CookieJar::new(),
            use_cookies: true,
        }
    }

    /// Client over [`ReqwestClient`] configured by `config`.
    pub fn from_config(config: &ClientConfig) -> Result<Self, ClientError> {
        Ok(Self::new(ReqwestClient::new(config)?).with_cookies(config.use_cookies))
    }

    pub fn with_cookies(mut self, enabled: bool) -> Self {
        self.use_cookies = enabled;
        self
    }

    /// Cookies currently stored.
    pub fn cookies(&self) -> &CookieJar {
        &self.cookies
    }

    pub fn clear_cookies(&mut self) {
        self.cookies.clear();
    }

    pub fn supports(&self, capability: Capability) -> bool {
        self.port.supports(capability)
    }

    /// Send `request`, adding the stored cookies that apply to it.
    ///
    /// Cookies set explicitly on the request, or in its `Cookie` header, win
    /// over stored cookies of the same name.
    pub async fn send(&mut self, mut request: Request) -> Result<Response, ClientError> {
        let target = match self.port.endpoint(&request) {
            Some(url) => Target::from_url(&url),
            None => Target::path_only(&request.path),
        };

        if self.use_cookies {
            let explicit: Vec<String> = request
                .headers
                .get_all(COOKIE)
                .iter()
                .filter_map(|v| v.to_str().ok())
                .flat_map(Cookie::parse_cookie_header)
                .chain(request.cookies.iter().cloned())
                .map(|cookie| cookie.name)
                .collect();
            for stored in self.cookies.matching(&target, Utc::now()) {
                if !explicit.contains(&stored.name) {
                    request.cookies.push(stored);
                }
            }
        }

        tracing::debug!(method = %request.method, path = %request.path, "Sending request");
        let response = self.port.send(request).await?;

        if self.use_cookies {
            self.cookies.store(&target, &response.cookies, Utc::now());
        }
        Ok(response)
    }

    pub async fn get(&mut self, path: &str) -> Result<Response, ClientError> {
        self.send(Request::new(Method::GET, path)).await
    }

    pub async fn head(&mut self, path: &str) -> Result<Response, ClientError> {
        self.send(Request::new(Method::HEAD, path)).await
    }

    pub async fn options(&mut self, path: &str) -> Result<Response, ClientError> {
        self.send(Request::new(Method::OPTIONS, path)).await
    }

    pub async fn delete(&mut self, path: &str) -> Result<Response, ClientError> {
        self.send(Request::new(Method::DELETE, path)).await
    }

    pub async fn post(&mut self, path: &str, body: impl Into<Body>) -> Result<Response, ClientError> {
        self.send(Request::new(Method::POST, path).with_body(body)).await
    }

    pub async fn put(&mut self, path: &str, body: impl Into<Body>) -> Result<Response, ClientError> {
        self.send(Request::new(Method::PUT, path).with_body(body)).await
    }

    pub async fn patch(&mut self, path: &str, body: impl Into<Body>) -> Result<Response, ClientError> {
        self.send(Request::new(Method::PATCH, path).with_body(body)).await
    }

    pub async fn ws(&self, path: &str) -> Result<Box<dyn WsSession>, ClientError> {
        self.port.ws(path).await
    }

    pub async fn sse(&self, request: Request) -> Result<EventStream, ClientError> {
        self.port.sse(request).await
    }
}
