//! Switchyard demo server.
//!
//! Loads a TOML configuration, initializes logging and metrics, and serves a
//! small handler chain through the axum server port until Ctrl+C.

use std::path::PathBuf;

use clap::Parser;
use serde_json::json;

use switchyard::config::{load_config, validated, Config};
use switchyard::error::{ILLEGAL_ARGUMENT, UNSUPPORTED_OPERATION};
use switchyard::http::{Cookie, StatusCode};
use switchyard::observability::{logging, metrics};
use switchyard::{AxumServer, Flow, HandlerChain, HandlerError, Router, RouterError, Server};

#[derive(Parser)]
#[command(name = "switchyard")]
#[command(about = "Demo server for the switchyard handler pipeline", long_about = None)]
struct Cli {
    /// TOML configuration file; defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the configured bind address.
    #[arg(short, long)]
    bind: Option<String>,
}

fn demo_chain() -> Result<HandlerChain, RouterError> {
    Router::new()
        .before("/protected/*", |call| {
            if call.request.header("authorization").is_some() {
                Ok(Flow::Next)
            } else {
                Ok(call.halt(StatusCode::UNAUTHORIZED, "forbidden"))
            }
        })
        .get("/hello/{name}", |call| {
            Ok(format!("Hello {}", call.param("name").unwrap_or("world")))
        })
        .get("/protected/hi", |_| Ok("hi!"))
        .post("/echo", |call| {
            let body = call.request.body.clone();
            Ok((StatusCode::OK, body))
        })
        .get("/session", |call| {
            let id = call.id().to_string();
            call.response.add_cookie(Cookie::new("session", id.clone()));
            Ok(json!({ "id": id }))
        })
        .get("/redirect", |call| call.redirect("/hello/redirected"))
        .get("/fail", |_| -> Result<(), HandlerError> {
            Err(HandlerError::illegal_argument("demo failure"))
        })
        .get("/unsupported", |_| -> Result<(), HandlerError> {
            Err(HandlerError::unsupported("not implemented yet"))
        })
        .path(
            "/api",
            Router::new()
                .get("/tags", |_| Ok(vec!["alpha", "beta"]))
                .get("/status/{code}", |call| {
                    let code: u16 = call
                        .param("code")
                        .and_then(|c| c.parse().ok())
                        .ok_or_else(|| HandlerError::illegal_argument("status code expected"))?;
                    Ok(code)
                }),
        )
        .after("", |call| {
            call.response.set_header("x-served-by", "switchyard")?;
            Ok(Flow::Next)
        })
        .error(&ILLEGAL_ARGUMENT, |call| {
            let message = call
                .exception()
                .map(|e| e.message().to_string())
                .unwrap_or_default();
            Ok((StatusCode::BAD_REQUEST, message))
        })
        .error(&UNSUPPORTED_OPERATION, |_| Ok(StatusCode::NOT_IMPLEMENTED))
        .error_status(StatusCode::NOT_FOUND, |call| {
            Ok((StatusCode::NOT_FOUND, format!("nothing at {}", call.request.path)))
        })
        .build()
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => Config::default(),
    };
    if let Some(bind) = cli.bind {
        config.server.bind_address = bind;
    }
    let config = validated(config)?;

    logging::init_logging(&config.observability);
    tracing::info!("switchyard v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.server.bind_address,
        request_timeout_secs = config.server.request_timeout_secs,
        body_limit_bytes = config.server.body_limit_bytes,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => {
                if let Err(e) = metrics::init_metrics(addr) {
                    tracing::error!(error = %e, "Failed to install metrics exporter");
                }
            }
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let chain = demo_chain()?;
    let server = Server::new(AxumServer::new(), chain, config.server);
    server.run().await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
