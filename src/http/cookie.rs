//! Cookies as carried by requests, responses and the client cookie store.

use std::fmt;

use chrono::{DateTime, NaiveDateTime, Utc};

const EXPIRES_FORMAT: &str = "%a, %d %b %Y %H:%M:%S GMT";

/// Accepted `Expires` layouts: RFC 1123, the dashed Netscape form and RFC 850.
const EXPIRES_LAYOUTS: [&str; 3] = [
    EXPIRES_FORMAT,
    "%a, %d-%b-%Y %H:%M:%S GMT",
    "%A, %d-%b-%y %H:%M:%S GMT",
];

/// An HTTP cookie with the attributes the toolkit understands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cookie {
    pub name: String,
    pub value: String,
    /// `None` for session cookies; `Some(0)` deletes the cookie.
    pub max_age: Option<i64>,
    /// Absolute expiry. `max_age` takes precedence when both are set.
    pub expires: Option<DateTime<Utc>>,
    pub secure: bool,
    pub http_only: bool,
    /// Empty when a received `Set-Cookie` carried no `Path`.
    pub path: String,
    pub domain: Option<String>,
}

impl Cookie {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            max_age: None,
            expires: None,
            secure: false,
            http_only: true,
            path: "/".to_string(),
            domain: None,
        }
    }

    pub fn with_max_age(mut self, seconds: i64) -> Self {
        self.max_age = Some(seconds);
        self
    }

    pub fn with_expires(mut self, expires: DateTime<Utc>) -> Self {
        self.expires = Some(expires);
        self
    }

    pub fn with_secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    pub fn with_http_only(mut self, http_only: bool) -> Self {
        self.http_only = http_only;
        self
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    /// True when the cookie asks the peer to drop it.
    pub fn is_deleted(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    /// True when the cookie is no longer valid at `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        match (self.max_age, self.expires) {
            (Some(age), _) => age <= 0,
            (None, Some(expires)) => expires <= now,
            (None, None) => false,
        }
    }

    /// Render as a `Set-Cookie` header value.
    pub fn to_set_cookie(&self) -> String {
        let mut header = format!("{}={}", self.name, self.value);
        if let Some(age) = self.max_age {
            header.push_str(&format!("; Max-Age={age}"));
        }
        if let Some(expires) = self.expires {
            header.push_str(&format!("; Expires={}", expires.format(EXPIRES_FORMAT)));
        }
        if !self.path.is_empty() {
            header.push_str(&format!("; Path={}", self.path));
        }
        if let Some(domain) = &self.domain {
            header.push_str(&format!("; Domain={domain}"));
        }
        if self.secure {
            header.push_str("; Secure");
        }
        if self.http_only {
            header.push_str("; HttpOnly");
        }
        header
    }

    /// Parse a `Set-Cookie` header value. Unknown attributes are ignored.
    pub fn parse_set_cookie(header: &str) -> Option<Self> {
        let mut parts = header.split(';');
        let (name, value) = parts.next()?.split_once('=')?;
        let name = name.trim();
        if name.is_empty() {
            return None;
        }

        let mut cookie = Cookie::new(name, value.trim().trim_matches('"'));
        cookie.http_only = false;
        cookie.path = String::new();
        for attribute in parts {
            let (key, val) = match attribute.split_once('=') {
                Some((key, val)) => (key.trim(), Some(val.trim())),
                None => (attribute.trim(), None),
            };
            match (key.to_ascii_lowercase().as_str(), val) {
                ("max-age", Some(val)) => cookie.max_age = val.parse().ok(),
                ("expires", Some(val)) => cookie.expires = parse_expires(val),
                ("path", Some(val)) => cookie.path = val.to_string(),
                ("domain", Some(val)) => {
                    cookie.domain = Some(val.trim_start_matches('.').to_string())
                }
                ("secure", _) => cookie.secure = true,
                ("httponly", _) => cookie.http_only = true,
                _ => {}
            }
        }
        Some(cookie)
    }

    /// Parse a request `Cookie` header (`a=1; b=2`).
    pub fn parse_cookie_header(header: &str) -> Vec<Self> {
        header
            .split(';')
            .filter_map(|pair| {
                let (name, value) = pair.split_once('=')?;
                let name = name.trim();
                (!name.is_empty()).then(|| Cookie::new(name, value.trim()))
            })
            .collect()
    }

    /// Render cookies as a request `Cookie` header value.
    pub fn to_cookie_header(cookies: &[Cookie]) -> String {
        cookies
            .iter()
            .map(|c| format!("{}={}", c.name, c.value))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

fn parse_expires(value: &str) -> Option<DateTime<Utc>> {
    EXPIRES_LAYOUTS
        .iter()
        .find_map(|layout| NaiveDateTime::parse_from_str(value, layout).ok())
        .map(|naive| naive.and_utc())
}

impl fmt::Display for Cookie {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_set_cookie())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_cookie_renders_attributes() {
        let cookie = Cookie::new("session", "abc")
            .with_max_age(60)
            .with_secure(true)
            .with_domain("example.com");
        assert_eq!(
            cookie.to_set_cookie(),
            "session=abc; Max-Age=60; Path=/; Domain=example.com; Secure; HttpOnly"
        );
    }

    #[test]
    fn set_cookie_parses_attributes() {
        let cookie =
            Cookie::parse_set_cookie("id=42; Max-Age=0; Path=/api; Domain=.example.com; Secure")
                .unwrap();
        assert_eq!(cookie.name, "id");
        assert_eq!(cookie.value, "42");
        assert_eq!(cookie.max_age, Some(0));
        assert_eq!(cookie.path, "/api");
        assert_eq!(cookie.domain.as_deref(), Some("example.com"));
        assert!(cookie.secure);
        assert!(!cookie.http_only);
        assert!(cookie.is_deleted());
    }

    #[test]
    fn expires_dates_are_parsed_and_rendered() {
        let gone = Cookie::parse_set_cookie("gone=x; Expires=Thu, 01 Jan 1970 00:00:00 GMT").unwrap();
        assert_eq!(gone.expires.map(|e| e.timestamp()), Some(0));
        assert!(gone.is_deleted());

        let dashed = Cookie::parse_set_cookie("later=y; expires=Fri, 01-Jan-2100 00:00:00 GMT").unwrap();
        assert!(dashed.expires.is_some());
        assert!(!dashed.is_deleted());
        assert!(dashed.to_set_cookie().contains("Expires=Fri, 01 Jan 2100 00:00:00 GMT"));

        let garbled = Cookie::parse_set_cookie("odd=z; Expires=someday").unwrap();
        assert_eq!(garbled.expires, None);
        assert!(!garbled.is_deleted());
    }

    #[test]
    fn max_age_overrides_expires() {
        let cookie =
            Cookie::parse_set_cookie("a=1; Max-Age=60; Expires=Thu, 01 Jan 1970 00:00:00 GMT")
                .unwrap();
        assert!(!cookie.is_deleted());
    }

    #[test]
    fn missing_path_stays_unset() {
        let cookie = Cookie::parse_set_cookie("a=1").unwrap();
        assert!(cookie.path.is_empty());
        assert_eq!(Cookie::new("a", "1").path, "/");
    }

    #[test]
    fn set_cookie_without_pair_is_rejected() {
        assert!(Cookie::parse_set_cookie("garbage").is_none());
        assert!(Cookie::parse_set_cookie("=value").is_none());
    }

    #[test]
    fn cookie_header_round_trips_names_and_values() {
        let cookies = Cookie::parse_cookie_header("a=1; b=two;  ;c=");
        let names: Vec<_> = cookies.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["a", "b", "c"]);
        assert_eq!(Cookie::to_cookie_header(&cookies), "a=1; b=two; c=");
    }
}
