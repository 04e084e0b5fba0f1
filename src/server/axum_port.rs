//! Axum-backed server port.
//!
//! # Responsibilities
//! - Bind the listener (plain or rustls) and serve through axum-server
//! - Wire up middleware (request id, tracing, timeout)
//! - Translate wire requests into a `Call` and dispatch it on the blocking pool
//! - Translate the finished exchange back into a wire response
//! - Contain fatal outcomes and handler panics as opaque 500s
//! - Record request metrics

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use axum::{
    body::Body as AxumBody,
    extract::{ConnectInfo, Request as AxumRequest, State},
    http::{
        header::{CONTENT_TYPE, COOKIE, SET_COOKIE},
        HeaderValue, StatusCode,
    },
    response::{IntoResponse, Response as AxumResponse},
    routing::any,
    Router as AxumRouter,
};
use axum_server::Handle;
use tokio::task::JoinHandle;
use tower::ServiceBuilder;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::ServerConfig;
use crate::error::HandlerError;
use crate::exchange::Call;
use crate::http::{Body, BodyFormat, Cookie, JsonFormat, Request, Response};
use crate::observability::metrics;
use crate::routing::{HandlerChain, Outcome};
use crate::server::{tls, ServerError, ServerPort};

const REQUEST_ID_HEADER: &str = "x-request-id";
const DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Application state injected into the catch-all handler.
#[derive(Clone)]
struct AppState {
    chain: Arc<HandlerChain>,
    format: Arc<dyn BodyFormat>,
    body_limit: usize,
}

struct Running {
    handle: Handle,
    task: JoinHandle<std::io::Result<()>>,
}

/// Server port serving a handler chain through axum and axum-server.
pub struct AxumServer {
    format: Arc<dyn BodyFormat>,
    running: Option<Running>,
}

impl Default for AxumServer {
    fn default() -> Self {
        Self::new()
    }
}

impl AxumServer {
    /// Server encoding structured bodies as JSON.
    pub fn new() -> Self {
        Self::with_format(JsonFormat)
    }

    pub fn with_format(format: impl BodyFormat + 'static) -> Self {
        Self {
            format: Arc::new(format),
            running: None,
        }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(state: AppState, config: &ServerConfig) -> AxumRouter {
        AxumRouter::new()
            .route("/{*path}", any(dispatch_handler))
            .route("/", any(dispatch_handler))
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                    .layer(TraceLayer::new_for_http())
                    .layer(PropagateRequestIdLayer::x_request_id())
                    .layer(TimeoutLayer::new(config.request_timeout())),
            )
    }
}

#[async_trait]
impl ServerPort for AxumServer {
    async fn start(
        &mut self,
        chain: Arc<HandlerChain>,
        config: &ServerConfig,
    ) -> Result<SocketAddr, ServerError> {
        if self.is_running() {
            return Err(ServerError::AlreadyRunning);
        }

        let addr: SocketAddr = config
            .bind_address
            .parse()
            .map_err(|_| ServerError::InvalidAddress(config.bind_address.clone()))?;

        let listener = std::net::TcpListener::bind(addr).map_err(ServerError::Bind)?;
        listener.set_nonblocking(true).map_err(ServerError::Bind)?;
        let local_addr = listener.local_addr().map_err(ServerError::Bind)?;

        let state = AppState {
            chain,
            format: self.format.clone(),
            body_limit: config.body_limit_bytes,
        };
        let app = Self::build_router(state, config)
            .into_make_service_with_connect_info::<SocketAddr>();

        let handle = Handle::new();
        let task = match &config.tls {
            Some(tls_config) => {
                let rustls = tls::load_tls_config(tls_config)?;
                let server = axum_server::from_tcp_rustls(listener, rustls).handle(handle.clone());
                tokio::spawn(server.serve(app))
            }
            None => {
                let server = axum_server::from_tcp(listener).handle(handle.clone());
                tokio::spawn(server.serve(app))
            }
        };

        tracing::info!(
            address = %local_addr,
            tls = config.tls.is_some(),
            "HTTP server starting"
        );
        self.running = Some(Running { handle, task });
        Ok(local_addr)
    }

    async fn stop(&mut self) -> Result<(), ServerError> {
        let Some(running) = self.running.take() else {
            return Ok(());
        };

        running.handle.graceful_shutdown(Some(DRAIN_TIMEOUT));
        match running.task.await {
            Ok(Ok(())) => {
                tracing::info!("HTTP server stopped");
                Ok(())
            }
            Ok(Err(e)) => Err(ServerError::Task(e.to_string())),
            Err(e) => Err(ServerError::Task(e.to_string())),
        }
    }

    fn is_running(&self) -> bool {
        self.running
            .as_ref()
            .is_some_and(|running| !running.task.is_finished())
    }
}

/// Catch-all handler: every route goes through the handler chain.
async fn dispatch_handler(
    State(state): State<AppState>,
    ConnectInfo(remote): ConnectInfo<SocketAddr>,
    request: AxumRequest,
) -> AxumResponse {
    let start = Instant::now();
    let method = request.method().clone();
    let request_id = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let call = match into_call(request, remote, &state).await {
        Ok(request) => match request_id {
            Some(id) => Call::with_id(id, request),
            None => Call::new(request),
        },
        Err(response) => {
            metrics::record_request(method.as_str(), response.status().as_u16(), start);
            return response;
        }
    };
    let id = call.id().to_string();

    let chain = state.chain.clone();
    let outcome = tokio::task::spawn_blocking(move || chain.dispatch(call)).await;

    let response = match outcome {
        Ok(Outcome::Completed(call)) => {
            encode(call.into_response(), state.format.as_ref()).unwrap_or_else(|e| {
                tracing::error!(request_id = %id, error = %e, "Failed to encode response");
                metrics::record_fatal(method.as_str());
                internal_error()
            })
        }
        Ok(Outcome::Failed { error, .. }) => {
            tracing::error!(request_id = %id, error = %error, "Unrecovered handler error");
            metrics::record_fatal(method.as_str());
            internal_error()
        }
        Err(e) => {
            tracing::error!(request_id = %id, error = %e, "Handler task panicked");
            metrics::record_fatal(method.as_str());
            internal_error()
        }
    };

    metrics::record_request(method.as_str(), response.status().as_u16(), start);
    response
}

async fn into_call(
    request: AxumRequest,
    remote: SocketAddr,
    state: &AppState,
) -> Result<Request, AxumResponse> {
    let (parts, body) = request.into_parts();

    let bytes = axum::body::to_bytes(body, state.body_limit)
        .await
        .map_err(|e| {
            tracing::warn!(error = %e, limit = state.body_limit, "Rejected request body");
            (StatusCode::PAYLOAD_TOO_LARGE, "Request body too large").into_response()
        })?;

    let query = parts
        .uri
        .query()
        .map(|q| url::form_urlencoded::parse(q.as_bytes()).into_owned().collect())
        .unwrap_or_default();

    let cookies = parts
        .headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(Cookie::parse_cookie_header)
        .collect();

    let content_type = parts
        .headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let body = Body::from_wire(bytes.to_vec(), content_type.as_deref(), state.format.as_ref());

    Ok(Request {
        method: parts.method,
        path: parts.uri.path().to_string(),
        query,
        headers: parts.headers,
        cookies,
        body,
        content_type,
        remote: Some(remote),
    })
}

fn encode(response: Response, format: &dyn BodyFormat) -> Result<AxumResponse, HandlerError> {
    let content_type = response
        .content_type
        .clone()
        .or_else(|| {
            if response.headers.contains_key(CONTENT_TYPE) {
                None
            } else {
                response.body.default_content_type(format).map(str::to_string)
            }
        });

    let mut headers = response.headers;
    for cookie in &response.cookies {
        let value = HeaderValue::from_str(&cookie.to_set_cookie()).map_err(|e| {
            HandlerError::illegal_argument(format!("invalid cookie '{}'", cookie.name))
                .with_source(e)
        })?;
        headers.append(SET_COOKIE, value);
    }
    if let Some(content_type) = content_type {
        let value = HeaderValue::from_str(&content_type).map_err(|e| {
            HandlerError::illegal_argument("invalid content type").with_source(e)
        })?;
        headers.insert(CONTENT_TYPE, value);
    }

    let bytes = response.body.into_bytes(format)?;
    let mut wire = AxumResponse::new(AxumBody::from(bytes));
    *wire.status_mut() = response.status;
    *wire.headers_mut() = headers;
    Ok(wire)
}

fn internal_error() -> AxumResponse {
    (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
}
