//! Response model shared by the dispatch core and the client port.
//!
//! # Responsibilities
//! - Hold status, headers, cookies, content type and body
//! - Provide mutation helpers for handler bodies
//!
//! # Design Decisions
//! - A fresh response is `200 OK` with an empty body; the dispatcher turns it
//!   into `404` when no action completes
//! - Header helpers return `HandlerError` so handlers can use `?`

use http::header::CONTENT_TYPE;
use http::{HeaderMap, StatusCode};

use crate::error::HandlerError;
use crate::http::request::parse_header;
use crate::http::{Body, Cookie};

/// HTTP response being built by handlers or received by a client.
#[derive(Debug, Clone)]
pub struct Response {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub cookies: Vec<Cookie>,
    pub body: Body,
    pub content_type: Option<String>,
}

impl Default for Response {
    fn default() -> Self {
        Self {
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            cookies: Vec::new(),
            body: Body::Empty,
            content_type: None,
        }
    }
}

impl Response {
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            ..Self::default()
        }
    }

    /// Append a header value, keeping earlier values.
    pub fn add_header(&mut self, name: &str, value: &str) -> Result<(), HandlerError> {
        let (name, value) = parse_header(name, value)?;
        self.headers.append(name, value);
        Ok(())
    }

    /// Replace all values of a header.
    pub fn set_header(&mut self, name: &str, value: &str) -> Result<(), HandlerError> {
        let (name, value) = parse_header(name, value)?;
        self.headers.insert(name, value);
        Ok(())
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|value| value.to_str().ok())
    }

    pub fn add_cookie(&mut self, cookie: Cookie) {
        self.cookies.push(cookie);
    }

    pub fn cookie(&self, name: &str) -> Option<&Cookie> {
        self.cookies.iter().find(|cookie| cookie.name == name)
    }

    pub fn content_type(&self) -> Option<&str> {
        self.content_type
            .as_deref()
            .or_else(|| self.headers.get(CONTENT_TYPE).and_then(|v| v.to_str().ok()))
    }

    pub fn body_text(&self) -> String {
        self.body.to_text()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_ok_and_empty() {
        let response = Response::default();
        assert_eq!(response.status, StatusCode::OK);
        assert!(response.body.is_empty());
        assert!(response.content_type().is_none());
    }

    #[test]
    fn add_header_appends_and_set_header_replaces() {
        let mut response = Response::default();
        response.add_header("x-tag", "a").unwrap();
        response.add_header("x-tag", "b").unwrap();
        assert_eq!(response.headers.get_all("x-tag").iter().count(), 2);

        response.set_header("X-Tag", "c").unwrap();
        assert_eq!(response.headers.get_all("x-tag").iter().count(), 1);
        assert_eq!(response.header("x-tag"), Some("c"));
    }

    #[test]
    fn cookies_are_found_by_name() {
        let mut response = Response::default();
        response.add_cookie(Cookie::new("a", "1"));
        assert_eq!(response.cookie("a").map(|c| c.value.as_str()), Some("1"));
        assert!(response.cookie("b").is_none());
    }
}
