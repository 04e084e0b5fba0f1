//! TLS configuration and certificate loading.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;

use axum_server::tls_rustls::RustlsConfig;
use rustls::pki_types::{CertificateDer, PrivateKeyDer};

use crate::config::TlsConfig;
use crate::server::ServerError;

/// Load TLS configuration from certificate and key files.
///
/// The ring provider is selected explicitly so the process never depends on a
/// globally installed default.
pub fn load_tls_config(tls: &TlsConfig) -> Result<RustlsConfig, ServerError> {
    let cert_path = Path::new(&tls.cert_path);
    let key_path = Path::new(&tls.key_path);

    if !cert_path.exists() {
        return Err(ServerError::Tls(format!(
            "Certificate file not found: {}",
            cert_path.display()
        )));
    }
    if !key_path.exists() {
        return Err(ServerError::Tls(format!(
            "Private key file not found: {}",
            key_path.display()
        )));
    }

    let certs = load_certs(cert_path)?;
    let key = load_key(key_path)?;

    let provider = Arc::new(rustls::crypto::ring::default_provider());
    let mut config = rustls::ServerConfig::builder_with_provider(provider)
        .with_safe_default_protocol_versions()
        .map_err(|e| ServerError::Tls(e.to_string()))?
        .with_no_client_auth()
        .with_single_cert(certs, key)
        .map_err(|e| ServerError::Tls(e.to_string()))?;
    config.alpn_protocols = vec![b"h2".to_vec(), b"http/1.1".to_vec()];

    Ok(RustlsConfig::from_config(Arc::new(config)))
}

fn load_certs(path: &Path) -> Result<Vec<CertificateDer<'static>>, ServerError> {
    let mut reader = BufReader::new(open(path)?);
    let certs = rustls_pemfile::certs(&mut reader)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| ServerError::Tls(format!("{}: {e}", path.display())))?;
    if certs.is_empty() {
        return Err(ServerError::Tls(format!(
            "No certificates found in {}",
            path.display()
        )));
    }
    Ok(certs)
}

fn load_key(path: &Path) -> Result<PrivateKeyDer<'static>, ServerError> {
    let mut reader = BufReader::new(open(path)?);
    rustls_pemfile::private_key(&mut reader)
        .map_err(|e| ServerError::Tls(format!("{}: {e}", path.display())))?
        .ok_or_else(|| ServerError::Tls(format!("No private key found in {}", path.display())))
}

fn open(path: &Path) -> Result<File, ServerError> {
    File::open(path).map_err(|e| ServerError::Tls(format!("{}: {e}", path.display())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn pem_pair() -> (tempfile::NamedTempFile, tempfile::NamedTempFile) {
        let cert = rcgen::generate_simple_self_signed(vec!["localhost".to_string()]).unwrap();
        let mut cert_file = tempfile::NamedTempFile::new().unwrap();
        cert_file.write_all(cert.cert.pem().as_bytes()).unwrap();
        let mut key_file = tempfile::NamedTempFile::new().unwrap();
        key_file
            .write_all(cert.key_pair.serialize_pem().as_bytes())
            .unwrap();
        (cert_file, key_file)
    }

    fn config(cert: &Path, key: &Path) -> TlsConfig {
        TlsConfig {
            cert_path: cert.display().to_string(),
            key_path: key.display().to_string(),
        }
    }

    #[test]
    fn loads_self_signed_pair() {
        let (cert, key) = pem_pair();
        assert!(load_tls_config(&config(cert.path(), key.path())).is_ok());
    }

    #[test]
    fn missing_files_are_reported() {
        let (cert, _key) = pem_pair();
        let err = load_tls_config(&config(cert.path(), Path::new("/does/not/exist")))
            .unwrap_err();
        assert!(err.to_string().contains("Private key file not found"));
    }

    #[test]
    fn key_file_without_key_is_rejected() {
        let (cert, _key) = pem_pair();
        let err = load_tls_config(&config(cert.path(), cert.path())).unwrap_err();
        assert!(err.to_string().contains("No private key"));
    }
}
