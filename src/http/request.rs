//! Inbound (server) and outbound (client) request model.
//!
//! # Responsibilities
//! - Carry method, path, ordered query parameters, headers, cookies and body
//! - Offer lookup helpers used by handler bodies
//!
//! # Design Decisions
//! - Headers use `http::HeaderMap` (case-insensitive, multi-valued)
//! - Query parameters keep arrival order and duplicates
//! - The path is stored raw; decoding is done per parameter by the matcher

use std::net::SocketAddr;

use http::header::{HeaderName, HeaderValue, CONTENT_TYPE};
use http::{HeaderMap, Method};

use crate::error::HandlerError;
use crate::http::{Body, Cookie};

/// HTTP request as seen by the dispatch core and the client port.
#[derive(Debug, Clone)]
pub struct Request {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub headers: HeaderMap,
    pub cookies: Vec<Cookie>,
    pub body: Body,
    pub content_type: Option<String>,
    /// Peer address, when the transport knows it.
    pub remote: Option<SocketAddr>,
}

impl Request {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            headers: HeaderMap::new(),
            cookies: Vec::new(),
            body: Body::Empty,
            content_type: None,
            remote: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn with_query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((name.into(), value.into()));
        self
    }

    pub fn with_cookie(mut self, cookie: Cookie) -> Self {
        self.cookies.push(cookie);
        self
    }

    pub fn with_body(mut self, body: impl Into<Body>) -> Self {
        self.body = body.into();
        self
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Append a header, rejecting invalid names or values.
    pub fn with_header(mut self, name: &str, value: &str) -> Result<Self, HandlerError> {
        let (name, value) = parse_header(name, value)?;
        self.headers.append(name, value);
        Ok(self)
    }

    /// First value of a query parameter.
    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// All values of a query parameter, in arrival order.
    pub fn query_params<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.query
            .iter()
            .filter(move |(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// First value of a header; names are case-insensitive.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|value| value.to_str().ok())
    }

    pub fn cookie(&self, name: &str) -> Option<&Cookie> {
        self.cookies.iter().find(|cookie| cookie.name == name)
    }

    /// Declared content type, falling back to the `Content-Type` header.
    pub fn content_type(&self) -> Option<&str> {
        self.content_type
            .as_deref()
            .or_else(|| self.headers.get(CONTENT_TYPE).and_then(|v| v.to_str().ok()))
    }

    pub fn body_text(&self) -> String {
        self.body.to_text()
    }
}

pub(crate) fn parse_header(
    name: &str,
    value: &str,
) -> Result<(HeaderName, HeaderValue), HandlerError> {
    let header_name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| {
        HandlerError::illegal_argument(format!("invalid header name '{name}'")).with_source(e)
    })?;
    let header_value = HeaderValue::from_str(value).map_err(|e| {
        HandlerError::illegal_argument(format!("invalid value for header '{name}'")).with_source(e)
    })?;
    Ok((header_name, header_value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_parameters_keep_order_and_duplicates() {
        let request = Request::get("/search")
            .with_query("tag", "a")
            .with_query("page", "2")
            .with_query("tag", "b");
        assert_eq!(request.query_param("tag"), Some("a"));
        assert_eq!(request.query_params("tag").collect::<Vec<_>>(), ["a", "b"]);
        assert_eq!(request.query_param("missing"), None);
    }

    #[test]
    fn headers_are_case_insensitive() {
        let request = Request::get("/")
            .with_header("X-Trace", "abc")
            .unwrap();
        assert_eq!(request.header("x-trace"), Some("abc"));
    }

    #[test]
    fn invalid_headers_are_illegal_arguments() {
        let err = Request::get("/").with_header("bad header", "x").unwrap_err();
        assert!(err.is(&crate::error::ILLEGAL_ARGUMENT));
    }

    #[test]
    fn content_type_falls_back_to_header() {
        let request = Request::post("/")
            .with_header("content-type", "text/csv")
            .unwrap();
        assert_eq!(request.content_type(), Some("text/csv"));

        let request = request.with_content_type("application/json");
        assert_eq!(request.content_type(), Some("application/json"));
    }
}
