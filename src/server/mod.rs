//! Server port: the boundary between the dispatch core and a listening engine.
//!
//! # Data Flow
//! ```text
//! Server::start
//!     → ServerPort::start(chain, config) (bind, TLS, spawn)
//!     → engine receives request → Call → HandlerChain::dispatch → wire response
//! Server::stop
//!     → ServerPort::stop (graceful drain)
//! ```
//!
//! # Design Decisions
//! - The chain is built before the port starts and shared read-only via `Arc`
//! - Engines are swappable behind `ServerPort`; `AxumServer` is the bundled one
//! - Optional capabilities are discovered through `supports`, never assumed

pub mod axum_port;
pub mod tls;

pub use axum_port::AxumServer;

use std::net::SocketAddr;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::capability::Capability;
use crate::config::ServerConfig;
use crate::lifecycle::shutdown_signal;
use crate::routing::HandlerChain;

/// Errors raised while starting or stopping a server port.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("invalid bind address '{0}'")]
    InvalidAddress(String),

    #[error("failed to bind listener: {0}")]
    Bind(#[source] std::io::Error),

    #[error("TLS configuration error: {0}")]
    Tls(String),

    #[error("server already running")]
    AlreadyRunning,

    #[error("server task failed: {0}")]
    Task(String),
}

/// A listening engine able to serve a handler chain.
#[async_trait]
pub trait ServerPort: Send + Sync {
    /// Bind and start serving; returns the bound address.
    async fn start(
        &mut self,
        chain: Arc<HandlerChain>,
        config: &ServerConfig,
    ) -> Result<SocketAddr, ServerError>;

    /// Stop accepting and drain in-flight exchanges. Stopping twice is a no-op.
    async fn stop(&mut self) -> Result<(), ServerError>;

    fn is_running(&self) -> bool;

    fn supports(&self, _capability: Capability) -> bool {
        false
    }
}

/// Couples a handler chain, a configuration and a server port.
pub struct Server {
    port: Box<dyn ServerPort>,
    chain: Arc<HandlerChain>,
    config: ServerConfig,
    local_addr: Option<SocketAddr>,
}

impl Server {
    pub fn new(port: impl ServerPort + 'static, chain: HandlerChain, config: ServerConfig) -> Self {
        Self {
            port: Box::new(port),
            chain: Arc::new(chain),
            config,
            local_addr: None,
        }
    }

    pub async fn start(&mut self) -> Result<SocketAddr, ServerError> {
        let addr = self.port.start(self.chain.clone(), &self.config).await?;
        self.local_addr = Some(addr);
        tracing::info!(
            address = %addr,
            handlers = self.chain.len(),
            tls = self.config.tls.is_some(),
            "Server started"
        );
        Ok(addr)
    }

    pub async fn stop(&mut self) -> Result<(), ServerError> {
        self.port.stop().await?;
        self.local_addr = None;
        tracing::info!("Server stopped");
        Ok(())
    }

    pub fn is_running(&self) -> bool {
        self.port.is_running()
    }

    /// Bound address while running.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr
    }

    pub fn supports(&self, capability: Capability) -> bool {
        self.port.supports(capability)
    }

    /// Start, wait for Ctrl+C, then stop gracefully.
    pub async fn run(mut self) -> Result<(), ServerError> {
        self.start().await?;
        shutdown_signal().await;
        self.stop().await
    }
}
