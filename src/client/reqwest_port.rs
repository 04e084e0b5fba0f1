//! Reqwest-backed client port.
//!
//! # Responsibilities
//! - Build the reqwest client from `ClientConfig` (TLS trust, identity, redirects, timeout)
//! - Resolve request paths against the base URL
//! - Translate between the toolkit model and reqwest requests/responses

use std::error::Error as _;
use std::fs;
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE, COOKIE, SET_COOKIE};
use reqwest::redirect::Policy;
use reqwest::{Certificate, Identity};
use url::Url;

use crate::client::{ClientError, ClientPort};
use crate::config::ClientConfig;
use crate::http::{Body, BodyFormat, Cookie, JsonFormat, Request, Response};

const MAX_REDIRECTS: usize = 10;

/// Client port over `reqwest` with rustls.
#[derive(Clone)]
pub struct ReqwestClient {
    client: reqwest::Client,
    base_url: Option<String>,
    format: Arc<dyn BodyFormat>,
}

impl ReqwestClient {
    pub fn new(config: &ClientConfig) -> Result<Self, ClientError> {
        Self::with_format(config, JsonFormat)
    }

    pub fn with_format(
        config: &ClientConfig,
        format: impl BodyFormat + 'static,
    ) -> Result<Self, ClientError> {
        if let Some(base) = &config.base_url {
            Url::parse(base).map_err(|_| ClientError::InvalidUrl(base.clone()))?;
        }

        let redirects = if config.follow_redirects {
            Policy::limited(MAX_REDIRECTS)
        } else {
            Policy::none()
        };

        let mut builder = reqwest::Client::builder()
            .use_rustls_tls()
            .timeout(config.timeout())
            .redirect(redirects)
            .danger_accept_invalid_certs(config.insecure);

        if let Some(path) = &config.trust_store {
            let pem = fs::read(path)?;
            let certs = Certificate::from_pem_bundle(&pem)
                .map_err(|e| ClientError::Tls(format!("{path}: {e}")))?;
            for cert in certs {
                builder = builder.add_root_certificate(cert);
            }
        }

        if let Some(identity) = &config.identity {
            let mut pem = fs::read(&identity.cert_path)?;
            pem.push(b'\n');
            pem.extend(fs::read(&identity.key_path)?);
            let identity = Identity::from_pem(&pem).map_err(|e| ClientError::Tls(e.to_string()))?;
            builder = builder.identity(identity);
        }

        let client = builder
            .build()
            .map_err(|e| ClientError::Tls(e.to_string()))?;

        tracing::debug!(
            base_url = config.base_url.as_deref().unwrap_or(""),
            insecure = config.insecure,
            follow_redirects = config.follow_redirects,
            "HTTP client built"
        );

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            format: Arc::new(format),
        })
    }

    /// Absolute URL for `request`: base URL + path, then query parameters.
    fn url(&self, request: &Request) -> Result<Url, ClientError> {
        let raw = match &self.base_url {
            Some(base) => {
                let base = base.trim_end_matches('/');
                if request.path.starts_with('/') {
                    format!("{base}{}", request.path)
                } else {
                    format!("{base}/{}", request.path)
                }
            }
            None => request.path.clone(),
        };

        let mut url = Url::parse(&raw).map_err(|_| ClientError::InvalidUrl(raw.clone()))?;
        if !request.query.is_empty() {
            url.query_pairs_mut().extend_pairs(&request.query);
        }
        Ok(url)
    }
}

fn map_error(err: reqwest::Error) -> ClientError {
    if err.is_timeout() {
        ClientError::Timeout(err.to_string())
    } else if err.is_builder() {
        ClientError::InvalidUrl(err.url().map(Url::to_string).unwrap_or_default())
    } else {
        let mut message = err.to_string();
        let mut source = err.source();
        while let Some(cause) = source {
            message.push_str(": ");
            message.push_str(&cause.to_string());
            source = cause.source();
        }
        ClientError::Transport(message)
    }
}

#[async_trait]
impl ClientPort for ReqwestClient {
    async fn send(&self, request: Request) -> Result<Response, ClientError> {
        let url = self.url(&request)?;
        let format = self.format.as_ref();

        let content_type = request
            .content_type()
            .map(str::to_string)
            .or_else(|| request.body.default_content_type(format).map(str::to_string));

        let mut headers = request.headers.clone();
        if let Some(cookies) = cookie_header(&headers, &request.cookies)? {
            headers.insert(COOKIE, cookies);
        }

        let mut builder = self
            .client
            .request(request.method.clone(), url)
            .headers(headers);
        if let Some(content_type) = content_type {
            if !request.headers.contains_key(CONTENT_TYPE) {
                builder = builder.header(CONTENT_TYPE, content_type);
            }
        }
        if !request.body.is_empty() {
            let bytes = request
                .body
                .into_bytes(format)
                .map_err(|e| ClientError::Transport(e.to_string()))?;
            builder = builder.body(bytes);
        }

        let response = builder.send().await.map_err(map_error)?;

        let status = response.status();
        let headers = response.headers().clone();
        let cookies = headers
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .filter_map(Cookie::parse_set_cookie)
            .collect();
        let content_type = headers
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let bytes = response.bytes().await.map_err(map_error)?;
        let body = Body::from_wire(bytes.to_vec(), content_type.as_deref(), format);

        Ok(Response {
            status,
            headers,
            cookies,
            body,
            content_type,
        })
    }

    fn endpoint(&self, request: &Request) -> Option<Url> {
        self.url(request).ok()
    }
}

/// Single `Cookie` header value: any caller-set header followed by `cookies`.
fn cookie_header(headers: &HeaderMap, cookies: &[Cookie]) -> Result<Option<HeaderValue>, ClientError> {
    if cookies.is_empty() {
        return Ok(None);
    }
    let mut parts: Vec<String> = headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .map(str::to_string)
        .collect();
    parts.push(Cookie::to_cookie_header(cookies));

    HeaderValue::from_str(&parts.join("; "))
        .map(Some)
        .map_err(|e| ClientError::Transport(format!("invalid cookie header: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base: Option<&str>) -> ReqwestClient {
        let config = ClientConfig {
            base_url: base.map(str::to_string),
            ..ClientConfig::default()
        };
        ReqwestClient::new(&config).unwrap()
    }

    #[test]
    fn base_url_is_prefixed_to_paths() {
        let client = client(Some("http://localhost:8080/api/"));
        let url = client.url(&Request::get("/users")).unwrap();
        assert_eq!(url.as_str(), "http://localhost:8080/api/users");

        let url = client.url(&Request::get("users")).unwrap();
        assert_eq!(url.as_str(), "http://localhost:8080/api/users");
    }

    #[test]
    fn cookies_merge_into_one_header() {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_static("theme=dark"));

        let merged = cookie_header(&headers, &[Cookie::new("session", "s-1")])
            .unwrap()
            .unwrap();
        assert_eq!(merged, "theme=dark; session=s-1");

        headers.insert(COOKIE, merged);
        assert_eq!(headers.get_all(COOKIE).iter().count(), 1);
        assert!(cookie_header(&headers, &[]).unwrap().is_none());
    }

    #[test]
    fn endpoints_resolve_against_the_base_url() {
        let client = client(Some("https://example.com/api"));
        let url = client.endpoint(&Request::get("/users")).unwrap();
        assert_eq!(url.as_str(), "https://example.com/api/users");
    }

    #[test]
    fn query_parameters_are_encoded() {
        let client = client(Some("http://localhost:8080"));
        let request = Request::get("/search").with_query("q", "a b").with_query("q", "c");
        let url = client.url(&request).unwrap();
        assert_eq!(url.as_str(), "http://localhost:8080/search?q=a+b&q=c");
    }

    #[test]
    fn paths_without_base_must_be_absolute() {
        let client = client(None);
        assert!(matches!(
            client.url(&Request::get("/relative")),
            Err(ClientError::InvalidUrl(_))
        ));
        assert!(client.url(&Request::get("http://example.com/x")).is_ok());
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        let config = ClientConfig {
            base_url: Some("not a url".into()),
            ..ClientConfig::default()
        };
        assert!(matches!(
            ReqwestClient::new(&config),
            Err(ClientError::InvalidUrl(_))
        ));
    }

    #[test]
    fn missing_trust_store_is_an_io_error() {
        let config = ClientConfig {
            trust_store: Some("/does/not/exist.pem".into()),
            ..ClientConfig::default()
        };
        assert!(matches!(ReqwestClient::new(&config), Err(ClientError::Io(_))));
    }
}
