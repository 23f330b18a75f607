use http::header::{HeaderName, HeaderValue};
use http::{HeaderMap, StatusCode};
use serde_json::Value;

use super::artifact::{
    assemble, check_status, require_mapping, require_object, BuildResponse, FinishedResponse,
    ResponseOptions, JSON_CONTENT_TYPE,
};
use super::Payload;
use crate::error::ResponseProgrammingError;

/// A response whose content is serialized JSON.
///
/// A *safe* response holds a top-level object. Unsafe responses (bare lists,
/// scalars) can be constructed explicitly but never pass validation.
///
/// ```
/// use heaven::{FinishedResponse, JsonResponse};
/// use serde_json::json;
///
/// let ok = JsonResponse::new(&json!({"hello": "world"})).unwrap();
/// assert!(ok.validate().is_ok());
///
/// assert!(JsonResponse::new(&json!([1, 2, 3])).is_err());
/// let list = JsonResponse::new_unsafe(&json!([1, 2, 3]));
/// assert!(list.validate().is_err());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct JsonResponse {
    content: Vec<u8>,
    status: StatusCode,
    headers: HeaderMap,
    safe: bool,
}

impl JsonResponse {
    /// Serializes `data`, which must be an object.
    ///
    /// # Errors
    ///
    /// Returns [`ResponseProgrammingError::NotAMapping`] if `data` is not an
    /// object.
    pub fn new(data: &Value) -> Result<Self, ResponseProgrammingError> {
        require_object(Self::KIND, data)?;
        Ok(Self::with_safety(data, true))
    }

    /// Serializes any JSON value and marks the response unsafe.
    pub fn new_unsafe(data: &Value) -> Self {
        Self::with_safety(data, false)
    }

    /// Wraps content serialized elsewhere. The content is not checked here.
    pub fn from_content(content: impl Into<Vec<u8>>) -> Self {
        Self {
            content: content.into(),
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            safe: true,
        }
    }

    fn with_safety(data: &Value, safe: bool) -> Self {
        Self {
            content: data.to_string().into_bytes(),
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            safe,
        }
    }

    /// Sets the status.
    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    /// Adds a header.
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Serialized content.
    pub fn content(&self) -> &[u8] {
        &self.content
    }

    /// Decodes the content.
    ///
    /// # Errors
    ///
    /// Returns [`ResponseProgrammingError::UndecodableBody`] if the content
    /// is not valid JSON.
    pub fn json(&self) -> Result<Value, ResponseProgrammingError> {
        serde_json::from_slice(&self.content).map_err(|e| {
            ResponseProgrammingError::UndecodableBody {
                kind: Self::KIND,
                reason: e.to_string(),
            }
        })
    }

    /// Whether the response was built as safe.
    pub fn is_safe(&self) -> bool {
        self.safe
    }

    /// Headers set on the response.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }
}

impl FinishedResponse for JsonResponse {
    const KIND: &'static str = "JsonResponse";

    fn status(&self) -> StatusCode {
        self.status
    }

    fn validate(&self) -> Result<(), ResponseProgrammingError> {
        if !self.safe {
            return Err(ResponseProgrammingError::UnsafeJson);
        }
        check_status(Self::KIND, self.status)?;
        require_mapping(Self::KIND, &self.content)
    }

    fn into_http(self) -> http::Response<Vec<u8>> {
        assemble(
            self.status,
            self.headers,
            Some(HeaderValue::from_static(JSON_CONTENT_TYPE)),
            self.content,
        )
    }
}

impl BuildResponse for JsonResponse {
    fn build(body: Value, options: &ResponseOptions) -> Result<Self, ResponseProgrammingError> {
        let mut response = Self::new(&body)?.with_status(options.status);
        response.headers.extend(options.headers.clone());
        Ok(response)
    }
}

impl From<JsonResponse> for Payload<JsonResponse> {
    fn from(response: JsonResponse) -> Self {
        Payload::Finished(response)
    }
}
