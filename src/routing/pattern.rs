//! Path pattern compilation and matching.
//!
//! # Responsibilities
//! - Compile pattern strings into segment lists once, at build time
//! - Match request paths and bind named parameters in declaration order
//!
//! # Design Decisions
//! - Segment-wise matching only, no regex in the hot path
//! - Literals are compared byte-for-byte (case sensitive)
//! - `*` covers exactly one segment; a trailing `**` or `{*name}` covers the rest
//! - Parameter values are percent-decoded, falling back to the raw segment

use std::borrow::Cow;
use std::collections::HashSet;
use std::fmt;

use thiserror::Error;

/// Errors raised while compiling a pattern.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatternError {
    #[error("duplicate parameter '{name}' in pattern '{pattern}'")]
    DuplicateParameter { pattern: String, name: String },

    #[error("empty parameter name in pattern '{pattern}'")]
    EmptyName { pattern: String },

    #[error("rest segment must be the last segment of pattern '{pattern}'")]
    MisplacedRest { pattern: String },

    #[error("unbalanced brace in segment '{segment}' of pattern '{pattern}'")]
    UnbalancedBrace { pattern: String, segment: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param(String),
    /// `*`: any single segment, not bound.
    Wildcard,
    /// `**` (unbound) or `{*name}` (bound): zero or more trailing segments.
    Rest(Option<String>),
}

/// A compiled path pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPattern {
    source: String,
    segments: Vec<Segment>,
}

impl PathPattern {
    pub fn compile(pattern: &str) -> Result<Self, PatternError> {
        let parts = split_path(pattern);
        let mut segments = Vec::with_capacity(parts.len());
        let mut names = HashSet::new();

        for (index, part) in parts.iter().enumerate() {
            let segment = parse_segment(pattern, part)?;

            if matches!(segment, Segment::Rest(_)) && index + 1 != parts.len() {
                return Err(PatternError::MisplacedRest {
                    pattern: pattern.to_string(),
                });
            }

            if let Segment::Param(name) | Segment::Rest(Some(name)) = &segment {
                if !names.insert(name.clone()) {
                    return Err(PatternError::DuplicateParameter {
                        pattern: pattern.to_string(),
                        name: name.clone(),
                    });
                }
            }

            segments.push(segment);
        }

        Ok(Self {
            source: pattern.to_string(),
            segments,
        })
    }

    /// Pattern text as written.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Parameter names in declaration order.
    pub fn parameter_names(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|segment| match segment {
            Segment::Param(name) | Segment::Rest(Some(name)) => Some(name.as_str()),
            _ => None,
        })
    }

    /// Match a request path, returning the bound parameters on success.
    pub fn matches(&self, path: &str) -> Option<PathParams> {
        let parts = split_path(path);
        let mut params = PathParams::default();

        for (index, segment) in self.segments.iter().enumerate() {
            match segment {
                Segment::Rest(name) => {
                    if let Some(name) = name {
                        params.push(name.clone(), decode(&parts[index..].join("/")));
                    }
                    return Some(params);
                }
                Segment::Literal(literal) => {
                    if *parts.get(index)? != literal.as_str() {
                        return None;
                    }
                }
                Segment::Param(name) => {
                    let value = parts.get(index)?;
                    params.push(name.clone(), decode(value));
                }
                Segment::Wildcard => {
                    parts.get(index)?;
                }
            }
        }

        (parts.len() == self.segments.len()).then_some(params)
    }
}

impl fmt::Display for PathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

/// Parameters bound by a successful match, in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathParams(Vec<(String, String)>);

impl PathParams {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn push(&mut self, name: String, value: String) {
        self.0.push((name, value));
    }
}

/// Concatenate a router prefix and a handler pattern.
///
/// An empty pattern under a non-empty prefix covers the whole sub-tree.
pub fn join_prefix(prefix: &str, pattern: &str) -> String {
    let prefix = prefix.trim_end_matches('/');
    if prefix.is_empty() {
        return pattern.to_string();
    }
    if pattern.is_empty() {
        return format!("{prefix}/**");
    }
    if pattern.starts_with('/') {
        format!("{prefix}{pattern}")
    } else {
        format!("{prefix}/{pattern}")
    }
}

/// Split on `/`, ignoring one leading and one trailing empty segment.
fn split_path(path: &str) -> Vec<&str> {
    let trimmed = path.strip_prefix('/').unwrap_or(path);
    let trimmed = trimmed.strip_suffix('/').unwrap_or(trimmed);
    if trimmed.is_empty() {
        return Vec::new();
    }
    trimmed.split('/').collect()
}

fn parse_segment(pattern: &str, part: &str) -> Result<Segment, PatternError> {
    match part {
        "**" => return Ok(Segment::Rest(None)),
        "*" => return Ok(Segment::Wildcard),
        _ => {}
    }

    let unbalanced = || PatternError::UnbalancedBrace {
        pattern: pattern.to_string(),
        segment: part.to_string(),
    };

    if let Some(inner) = part.strip_prefix('{').and_then(|p| p.strip_suffix('}')) {
        if inner.contains(['{', '}']) {
            return Err(unbalanced());
        }
        let (rest, name) = match inner.strip_prefix('*') {
            Some(name) => (true, name),
            None => (false, inner),
        };
        if name.is_empty() {
            return Err(PatternError::EmptyName {
                pattern: pattern.to_string(),
            });
        }
        return Ok(if rest {
            Segment::Rest(Some(name.to_string()))
        } else {
            Segment::Param(name.to_string())
        });
    }

    if part.contains(['{', '}']) {
        return Err(unbalanced());
    }
    Ok(Segment::Literal(part.to_string()))
}

fn decode(raw: &str) -> String {
    urlencoding::decode(raw)
        .unwrap_or(Cow::Borrowed(raw))
        .into_owned()
}
