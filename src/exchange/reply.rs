//! Coercion of action return values into responses.
//!
//! # Design Decisions
//! - A closed set of tagged variants instead of runtime type inspection
//! - `From` impls let actions return plain values (`"text"`, `201u16`, `(404u16, "gone")`)
//! - Invalid numeric codes degrade to `500` rather than failing the exchange

use http::StatusCode;
use serde_json::{Map, Value};

use crate::http::Body;
use crate::routing::Flow;

/// What an action produced.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    /// Defer to the next matching action.
    Pass,
    /// Response already prepared on the exchange.
    Done,
    Status(StatusCode),
    Body(Body),
    Full(StatusCode, Body),
}

/// Status and body for a reply, or `None` for the control values.
pub fn coerce(reply: impl Into<Reply>) -> Option<(StatusCode, Body)> {
    match reply.into() {
        Reply::Pass | Reply::Done => None,
        Reply::Status(status) => Some((status, Body::Empty)),
        Reply::Body(body) => Some((StatusCode::OK, body)),
        Reply::Full(status, body) => Some((status, body)),
    }
}

fn status_from_code(code: u16) -> StatusCode {
    StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}

impl From<Flow> for Reply {
    fn from(flow: Flow) -> Self {
        match flow {
            Flow::Next => Reply::Pass,
            Flow::Done => Reply::Done,
        }
    }
}

impl From<()> for Reply {
    fn from(_: ()) -> Self {
        Reply::Done
    }
}

impl From<u16> for Reply {
    fn from(code: u16) -> Self {
        Reply::Status(status_from_code(code))
    }
}

impl From<StatusCode> for Reply {
    fn from(status: StatusCode) -> Self {
        Reply::Status(status)
    }
}

impl From<Body> for Reply {
    fn from(body: Body) -> Self {
        Reply::Body(body)
    }
}

impl From<&str> for Reply {
    fn from(text: &str) -> Self {
        Reply::Body(Body::from(text))
    }
}

impl From<String> for Reply {
    fn from(text: String) -> Self {
        Reply::Body(Body::from(text))
    }
}

impl From<Value> for Reply {
    fn from(value: Value) -> Self {
        Reply::Body(Body::Value(value))
    }
}

impl From<Map<String, Value>> for Reply {
    fn from(map: Map<String, Value>) -> Self {
        Reply::Body(Body::from(map))
    }
}

impl<T: Into<Value>> From<Vec<T>> for Reply {
    fn from(items: Vec<T>) -> Self {
        Reply::Body(Body::from(items))
    }
}

impl<B: Into<Body>> From<(u16, B)> for Reply {
    fn from((code, body): (u16, B)) -> Self {
        Reply::Full(status_from_code(code), body.into())
    }
}

impl<B: Into<Body>> From<(StatusCode, B)> for Reply {
    fn from((status, body): (StatusCode, B)) -> Self {
        Reply::Full(status, body.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn numbers_become_statuses_with_empty_body() {
        assert_eq!(coerce(201u16), Some((StatusCode::CREATED, Body::Empty)));
        assert_eq!(coerce(StatusCode::NO_CONTENT), Some((StatusCode::NO_CONTENT, Body::Empty)));
    }

    #[test]
    fn text_defaults_to_ok() {
        assert_eq!(coerce("body"), Some((StatusCode::OK, Body::from("body"))));
        assert_eq!(
            coerce(String::from("owned")),
            Some((StatusCode::OK, Body::from("owned")))
        );
    }

    #[test]
    fn pairs_set_status_and_body() {
        let (status, body) = coerce((202u16, "funky status")).unwrap();
        assert_eq!(status.as_u16(), 202);
        assert_eq!(body.to_text(), "funky status");
    }

    #[test]
    fn lists_and_maps_stay_structured() {
        assert_eq!(
            coerce(vec!["a", "b"]),
            Some((StatusCode::OK, Body::Value(json!(["a", "b"]))))
        );
        let mut map = Map::new();
        map.insert("alpha".into(), json!(0));
        assert_eq!(
            coerce(map),
            Some((StatusCode::OK, Body::Value(json!({"alpha": 0}))))
        );
    }

    #[test]
    fn control_values_do_not_coerce() {
        assert_eq!(coerce(Flow::Next), None);
        assert_eq!(coerce(()), None);
        assert_eq!(Reply::from(Flow::Next), Reply::Pass);
    }

    #[test]
    fn invalid_codes_degrade_to_server_error() {
        assert_eq!(
            coerce(1000u16).map(|(status, _)| status),
            Some(StatusCode::INTERNAL_SERVER_ERROR)
        );
    }
}
