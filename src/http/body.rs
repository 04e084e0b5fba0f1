//! Message bodies and their wire encoding.
//!
//! # Responsibilities
//! - Hold a body as text, raw bytes or a structured value awaiting encoding
//! - Encode structured values through a pluggable [`BodyFormat`]
//!
//! # Design Decisions
//! - Structured values stay as `serde_json::Value` until the transport encodes
//!   them, so handlers never pick a wire format
//! - `Body::structured` is the single entry point for domain objects

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{HandlerError, SERIALIZATION};

pub const TEXT_PLAIN: &str = "text/plain; charset=utf-8";
pub const OCTET_STREAM: &str = "application/octet-stream";
pub const APPLICATION_JSON: &str = "application/json";

/// Request or response body.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Body {
    #[default]
    Empty,
    Text(String),
    Bytes(Vec<u8>),
    /// Structured value pending serialization by a [`BodyFormat`].
    Value(Value),
}

impl Body {
    /// Convert a serializable domain object into a structured body.
    pub fn structured<T: Serialize + ?Sized>(value: &T) -> Result<Self, HandlerError> {
        Ok(Body::Value(serde_json::to_value(value)?))
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Body::Empty => true,
            Body::Text(text) => text.is_empty(),
            Body::Bytes(bytes) => bytes.is_empty(),
            Body::Value(_) => false,
        }
    }

    /// Lossy text view. Structured values render as compact JSON.
    pub fn to_text(&self) -> String {
        match self {
            Body::Empty => String::new(),
            Body::Text(text) => text.clone(),
            Body::Bytes(bytes) => String::from_utf8_lossy(bytes).into_owned(),
            Body::Value(value) => value.to_string(),
        }
    }

    /// Content type implied by the body shape when the handler set none.
    pub fn default_content_type(&self, format: &dyn BodyFormat) -> Option<&'static str> {
        match self {
            Body::Empty => None,
            Body::Text(_) => Some(TEXT_PLAIN),
            Body::Bytes(_) => Some(OCTET_STREAM),
            Body::Value(_) => Some(format.content_type()),
        }
    }

    /// Build a body from received bytes.
    ///
    /// Payloads declared in the format's content type are decoded into
    /// structured values; other UTF-8 payloads become text.
    pub fn from_wire(bytes: Vec<u8>, content_type: Option<&str>, format: &dyn BodyFormat) -> Self {
        if bytes.is_empty() {
            return Body::Empty;
        }
        let structured = content_type
            .map(|ct| ct.trim().starts_with(format.content_type()))
            .unwrap_or(false);
        if structured {
            if let Ok(value) = format.decode(&bytes) {
                return Body::Value(value);
            }
        }
        match String::from_utf8(bytes) {
            Ok(text) => Body::Text(text),
            Err(err) => Body::Bytes(err.into_bytes()),
        }
    }

    /// Encode the body into wire bytes.
    pub fn into_bytes(self, format: &dyn BodyFormat) -> Result<Vec<u8>, HandlerError> {
        match self {
            Body::Empty => Ok(Vec::new()),
            Body::Text(text) => Ok(text.into_bytes()),
            Body::Bytes(bytes) => Ok(bytes),
            Body::Value(value) => format.encode(&value),
        }
    }
}

impl From<&str> for Body {
    fn from(text: &str) -> Self {
        Body::Text(text.to_string())
    }
}

impl From<String> for Body {
    fn from(text: String) -> Self {
        Body::Text(text)
    }
}

impl From<Value> for Body {
    fn from(value: Value) -> Self {
        Body::Value(value)
    }
}

impl From<Map<String, Value>> for Body {
    fn from(map: Map<String, Value>) -> Self {
        Body::Value(Value::Object(map))
    }
}

impl<T: Into<Value>> From<Vec<T>> for Body {
    fn from(items: Vec<T>) -> Self {
        Body::Value(Value::from(items))
    }
}

/// Serialization collaborator used by transports to encode structured bodies.
pub trait BodyFormat: Send + Sync {
    fn content_type(&self) -> &'static str;

    fn encode(&self, value: &Value) -> Result<Vec<u8>, HandlerError>;

    fn decode(&self, bytes: &[u8]) -> Result<Value, HandlerError>;
}

/// JSON encoding through `serde_json`.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonFormat;

impl BodyFormat for JsonFormat {
    fn content_type(&self) -> &'static str {
        APPLICATION_JSON
    }

    fn encode(&self, value: &Value) -> Result<Vec<u8>, HandlerError> {
        serde_json::to_vec(value).map_err(HandlerError::from)
    }

    fn decode(&self, bytes: &[u8]) -> Result<Value, HandlerError> {
        if bytes.is_empty() {
            return Err(HandlerError::new(&SERIALIZATION, "empty body"));
        }
        serde_json::from_slice(bytes).map_err(HandlerError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Serialize)]
    struct Tag {
        id: String,
        name: String,
    }

    #[test]
    fn structured_bodies_keep_the_value() {
        let body = Body::structured(&Tag {
            id: "1".into(),
            name: "Message".into(),
        })
        .unwrap();
        assert_eq!(body, Body::Value(json!({"id": "1", "name": "Message"})));
    }

    #[test]
    fn lists_become_structured_values() {
        let body = Body::from(vec!["alpha", "beta"]);
        assert_eq!(body, Body::Value(json!(["alpha", "beta"])));
    }

    #[test]
    fn default_content_types_follow_shape() {
        let format = JsonFormat;
        assert_eq!(Body::Empty.default_content_type(&format), None);
        assert_eq!(Body::from("hi").default_content_type(&format), Some(TEXT_PLAIN));
        assert_eq!(Body::Bytes(vec![1]).default_content_type(&format), Some(OCTET_STREAM));
        assert_eq!(Body::from(json!({})).default_content_type(&format), Some(APPLICATION_JSON));
    }

    #[test]
    fn json_format_encodes_structured_values() {
        let bytes = Body::from(json!({"alpha": 0, "beta": true}))
            .into_bytes(&JsonFormat)
            .unwrap();
        let decoded = JsonFormat.decode(&bytes).unwrap();
        assert_eq!(decoded, json!({"alpha": 0, "beta": true}));
    }

    #[test]
    fn wire_bodies_follow_content_type() {
        let json = Body::from_wire(b"{\"a\":1}".to_vec(), Some("application/json"), &JsonFormat);
        assert_eq!(json, Body::Value(json!({"a": 1})));

        let text = Body::from_wire(b"{\"a\":1}".to_vec(), Some("text/plain"), &JsonFormat);
        assert_eq!(text, Body::Text("{\"a\":1}".into()));

        let broken = Body::from_wire(b"{oops".to_vec(), Some("application/json"), &JsonFormat);
        assert_eq!(broken, Body::Text("{oops".into()));

        let binary = Body::from_wire(vec![0xff, 0xfe], None, &JsonFormat);
        assert_eq!(binary, Body::Bytes(vec![0xff, 0xfe]));

        assert_eq!(Body::from_wire(Vec::new(), None, &JsonFormat), Body::Empty);
    }

    #[test]
    fn empty_detection() {
        assert!(Body::Empty.is_empty());
        assert!(Body::Text(String::new()).is_empty());
        assert!(!Body::from(json!(null)).is_empty());
    }
}
