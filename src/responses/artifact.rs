//! The contract every response kind fulfils.

use http::header::{HeaderName, HeaderValue, CONTENT_TYPE};
use http::{HeaderMap, StatusCode};
use serde_json::{Map, Value};

use crate::error::ResponseProgrammingError;

pub(crate) const JSON_CONTENT_TYPE: &str = "application/json";

/// Status, headers and extras for a response the formatter builds.
///
/// Only newly built responses use these; a finished response passed through
/// the formatter keeps its own status and headers.
///
/// ```
/// use heaven::ResponseOptions;
/// use http::StatusCode;
/// use serde_json::json;
///
/// let options = ResponseOptions::new(StatusCode::BAD_REQUEST)
///     .extra("errors", json!({"name": "required"}));
/// assert_eq!(options.status, StatusCode::BAD_REQUEST);
/// assert!(options.extras.contains_key("errors"));
/// ```
#[derive(Debug, Clone)]
pub struct ResponseOptions {
    /// Status of the new response
    pub status: StatusCode,
    /// Headers added to the new response
    pub headers: HeaderMap,
    /// Values handed to the conversion strategy
    pub extras: Map<String, Value>,
}

impl ResponseOptions {
    /// Options with the given status and nothing else.
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            extras: Map::new(),
        }
    }

    /// Adds a header to the new response.
    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Adds a value for the conversion strategy.
    pub fn extra(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extras.insert(key.into(), value);
        self
    }
}

impl From<StatusCode> for ResponseOptions {
    fn from(status: StatusCode) -> Self {
        Self::new(status)
    }
}

/// A response object produced by the response layer.
pub trait FinishedResponse {
    /// Name used in validation errors.
    const KIND: &'static str;

    /// Status the response carries.
    fn status(&self) -> StatusCode;

    /// Checks that the response may be returned unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`ResponseProgrammingError`] if the body does not have the
    /// shape this kind requires.
    fn validate(&self) -> Result<(), ResponseProgrammingError>;

    /// Converts into a plain `http` response.
    fn into_http(self) -> http::Response<Vec<u8>>;
}

/// A response kind that can be built directly from a converted body.
pub trait BuildResponse: FinishedResponse + Sized {
    /// Builds a new response from `body`.
    ///
    /// # Errors
    ///
    /// Returns [`ResponseProgrammingError`] if this kind cannot carry `body`.
    fn build(body: Value, options: &ResponseOptions) -> Result<Self, ResponseProgrammingError>;
}

/// Rejects informational statuses, which cannot carry a final response.
pub(crate) fn check_status(
    kind: &'static str,
    status: StatusCode,
) -> Result<(), ResponseProgrammingError> {
    if status.is_informational() {
        return Err(ResponseProgrammingError::InvalidStatus {
            kind,
            status: status.as_u16(),
        });
    }
    Ok(())
}

/// Requires `content` to decode to a JSON object.
pub(crate) fn require_mapping(
    kind: &'static str,
    content: &[u8],
) -> Result<(), ResponseProgrammingError> {
    let value: Value =
        serde_json::from_slice(content).map_err(|e| ResponseProgrammingError::UndecodableBody {
            kind,
            reason: e.to_string(),
        })?;
    require_object(kind, &value)
}

/// Requires `value` to be a JSON object.
pub(crate) fn require_object(
    kind: &'static str,
    value: &Value,
) -> Result<(), ResponseProgrammingError> {
    match value {
        Value::Object(_) => Ok(()),
        other => Err(ResponseProgrammingError::NotAMapping {
            kind,
            found: json_shape(other),
        }),
    }
}

pub(crate) fn json_shape(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(n) if n.is_f64() => "float",
        Value::Number(_) => "int",
        Value::String(_) => "str",
        Value::Array(_) => "list",
        Value::Object(_) => "dict",
    }
}

/// Assembles an `http` response. `content_type` is set unless the headers
/// already carry one.
pub(crate) fn assemble(
    status: StatusCode,
    headers: HeaderMap,
    content_type: Option<HeaderValue>,
    body: Vec<u8>,
) -> http::Response<Vec<u8>> {
    let mut response = http::Response::new(body);
    *response.status_mut() = status;
    *response.headers_mut() = headers;
    if let Some(content_type) = content_type {
        response
            .headers_mut()
            .entry(CONTENT_TYPE)
            .or_insert(content_type);
    }
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn mapping_accepts_objects_only() {
        assert!(require_mapping("JsonResponse", br#"{"a": 1}"#).is_ok());
        assert_eq!(
            require_mapping("JsonResponse", b"[1, 2, 3]"),
            Err(ResponseProgrammingError::NotAMapping {
                kind: "JsonResponse",
                found: "list"
            })
        );
        assert!(matches!(
            require_mapping("JsonResponse", b"{not json"),
            Err(ResponseProgrammingError::UndecodableBody { .. })
        ));
    }

    #[test]
    fn shapes() {
        assert_eq!(json_shape(&json!(1)), "int");
        assert_eq!(json_shape(&json!(1.5)), "float");
        assert_eq!(json_shape(&json!("x")), "str");
        assert_eq!(json_shape(&json!(null)), "null");
    }

    #[test]
    fn informational_status_rejected() {
        assert!(check_status("HttpResponse", StatusCode::CONTINUE).is_err());
        assert!(check_status("HttpResponse", StatusCode::OK).is_ok());
    }

    #[test]
    fn assemble_keeps_explicit_content_type() {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("text/plain"));
        let response = assemble(
            StatusCode::CREATED,
            headers,
            Some(HeaderValue::from_static(JSON_CONTENT_TYPE)),
            b"{}".to_vec(),
        );
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(response.headers()[CONTENT_TYPE], "text/plain");
    }
}
