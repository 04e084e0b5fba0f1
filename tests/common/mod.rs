//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::io::Write;
use std::net::SocketAddr;

use switchyard::config::{ClientConfig, ServerConfig, TlsConfig};
use switchyard::{AxumServer, HandlerChain, HttpClient, Server};
use tempfile::NamedTempFile;

/// Server config bound to a free loopback port.
pub fn loopback_config() -> ServerConfig {
    ServerConfig {
        bind_address: "127.0.0.1:0".to_string(),
        ..ServerConfig::default()
    }
}

/// Start `chain` on a free loopback port.
pub async fn start_server(chain: HandlerChain) -> (Server, SocketAddr) {
    start_server_with(chain, loopback_config()).await
}

pub async fn start_server_with(chain: HandlerChain, config: ServerConfig) -> (Server, SocketAddr) {
    let mut server = Server::new(AxumServer::new(), chain, config);
    let addr = server.start().await.unwrap();
    (server, addr)
}

/// Self-signed certificate for `localhost`, written as PEM files.
pub struct SelfSigned {
    pub cert: NamedTempFile,
    pub key: NamedTempFile,
}

impl SelfSigned {
    pub fn generate() -> Self {
        let certified = rcgen::generate_simple_self_signed(vec!["localhost".to_string()]).unwrap();
        let mut cert = NamedTempFile::new().unwrap();
        cert.write_all(certified.cert.pem().as_bytes()).unwrap();
        let mut key = NamedTempFile::new().unwrap();
        key.write_all(certified.key_pair.serialize_pem().as_bytes())
            .unwrap();
        Self { cert, key }
    }

    pub fn tls_config(&self) -> TlsConfig {
        TlsConfig {
            cert_path: self.cert.path().display().to_string(),
            key_path: self.key.path().display().to_string(),
        }
    }
}

/// Start `chain` over TLS with a fresh self-signed certificate.
pub async fn start_tls_server(chain: HandlerChain) -> (Server, SocketAddr, SelfSigned) {
    let pem = SelfSigned::generate();
    let config = ServerConfig {
        tls: Some(pem.tls_config()),
        ..loopback_config()
    };
    let (server, addr) = start_server_with(chain, config).await;
    (server, addr, pem)
}

/// Client config pointing at `base`.
pub fn client_config(base: String) -> ClientConfig {
    ClientConfig {
        base_url: Some(base),
        ..ClientConfig::default()
    }
}

/// Toolkit client pointing at a plain HTTP server.
pub fn client_for(addr: SocketAddr) -> HttpClient {
    HttpClient::from_config(&client_config(format!("http://{addr}"))).unwrap()
}
