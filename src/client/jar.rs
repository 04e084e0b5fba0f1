//! Client-side cookie store.
//!
//! # Responsibilities
//! - Keep cookies keyed by (name, domain, path)
//! - Drop cookies once `Max-Age` or `Expires` says so
//! - Select the cookies a request may carry: domain, path prefix and `Secure`

use std::net::IpAddr;

use chrono::{DateTime, Duration, Utc};
use url::Url;

use crate::http::Cookie;

/// Where an exchange is sent, as far as cookie scoping is concerned.
///
/// Ports that cannot name a URL leave `host` unset; domain checks are then
/// skipped and `Secure` cookies are withheld.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub host: Option<String>,
    pub path: String,
    pub secure: bool,
}

impl Target {
    pub fn from_url(url: &Url) -> Self {
        Self {
            host: url.host_str().map(str::to_ascii_lowercase),
            path: url.path().to_string(),
            secure: url.scheme() == "https",
        }
    }

    pub fn path_only(path: &str) -> Self {
        Self {
            host: None,
            path: path.to_string(),
            secure: false,
        }
    }
}

#[derive(Debug, Clone)]
struct Entry {
    cookie: Cookie,
    /// `Domain` attribute, or the setting host for host-only cookies.
    domain: Option<String>,
    host_only: bool,
    path: String,
    expires_at: Option<DateTime<Utc>>,
}

impl Entry {
    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }

    fn applies_to(&self, target: &Target) -> bool {
        if self.cookie.secure && !target.secure {
            return false;
        }
        if !path_matches(&target.path, &self.path) {
            return false;
        }
        match (&target.host, &self.domain) {
            (Some(host), Some(domain)) if self.host_only => host == domain,
            (Some(host), Some(domain)) => domain_matches(host, domain),
            _ => true,
        }
    }
}

/// Cookies received by a client, replayed on later requests they apply to.
#[derive(Debug, Clone, Default)]
pub struct CookieJar {
    entries: Vec<Entry>,
}

impl CookieJar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply `Set-Cookie` updates from a response to a request sent to `target`.
    pub fn store(&mut self, target: &Target, updates: &[Cookie], now: DateTime<Utc>) {
        for cookie in updates {
            let (domain, host_only) = match (&cookie.domain, &target.host) {
                (Some(domain), Some(host)) => {
                    let domain = domain.to_ascii_lowercase();
                    if !domain_matches(host, &domain) {
                        tracing::debug!(
                            cookie = %cookie.name,
                            domain = %domain,
                            host = %host,
                            "Ignoring cookie set for a foreign domain"
                        );
                        continue;
                    }
                    (Some(domain), false)
                }
                (Some(domain), None) => (Some(domain.to_ascii_lowercase()), false),
                (None, host) => (host.clone(), true),
            };
            let path = if cookie.path.starts_with('/') {
                cookie.path.clone()
            } else {
                default_path(&target.path)
            };
            let expires_at = match cookie.max_age {
                Some(age) if age <= 0 => Some(DateTime::<Utc>::MIN_UTC),
                Some(age) => Duration::try_seconds(age).and_then(|d| now.checked_add_signed(d)),
                None => cookie.expires,
            };

            self.entries.retain(|entry| {
                !(entry.cookie.name == cookie.name && entry.domain == domain && entry.path == path)
            });

            let entry = Entry {
                cookie: cookie.clone(),
                domain,
                host_only,
                path,
                expires_at,
            };
            if !entry.is_expired(now) {
                self.entries.push(entry);
            }
        }
    }

    /// Cookies a request to `target` carries at `now`. Expired entries are purged.
    pub fn matching(&mut self, target: &Target, now: DateTime<Utc>) -> Vec<Cookie> {
        self.entries.retain(|entry| !entry.is_expired(now));
        self.entries
            .iter()
            .filter(|entry| entry.applies_to(target))
            .map(|entry| entry.cookie.clone())
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Cookie> {
        self.entries.iter().map(|entry| &entry.cookie)
    }

    /// First stored cookie named `name`, whatever its scope.
    pub fn get(&self, name: &str) -> Option<&Cookie> {
        self.iter().find(|cookie| cookie.name == name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// RFC 6265 domain matching. IP addresses only match themselves.
fn domain_matches(host: &str, domain: &str) -> bool {
    if host == domain {
        return true;
    }
    host.parse::<IpAddr>().is_err()
        && host.len() > domain.len()
        && host.ends_with(domain)
        && host[..host.len() - domain.len()].ends_with('.')
}

/// RFC 6265 path matching.
fn path_matches(request_path: &str, cookie_path: &str) -> bool {
    request_path == cookie_path
        || (request_path.starts_with(cookie_path)
            && (cookie_path.ends_with('/') || request_path[cookie_path.len()..].starts_with('/')))
}

/// Directory of the request path, used when `Set-Cookie` names no path.
fn default_path(request_path: &str) -> String {
    match request_path.rfind('/') {
        Some(0) | None => "/".to_string(),
        Some(end) => request_path[..end].to_string(),
    }
}
