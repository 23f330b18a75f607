use http::header::{HeaderName, HeaderValue};
use http::{HeaderMap, StatusCode};
use serde_json::Value;

use super::artifact::{
    assemble, check_status, require_object, BuildResponse, FinishedResponse, ResponseOptions,
    JSON_CONTENT_TYPE,
};
use super::Payload;
use crate::error::ResponseProgrammingError;

/// A REST API response holding unserialized data.
///
/// The data is rendered as JSON only when the response is turned into an
/// `http` response.
#[derive(Debug, Clone, PartialEq)]
pub struct RestResponse {
    data: Value,
    status: StatusCode,
    headers: HeaderMap,
}

impl RestResponse {
    /// A response with status 200.
    pub fn new(data: impl Into<Value>) -> Self {
        Self {
            data: data.into(),
            status: StatusCode::OK,
            headers: HeaderMap::new(),
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

    /// The data to be rendered.
    pub fn data(&self) -> &Value {
        &self.data
    }

    /// Headers set on the response.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }
}

impl FinishedResponse for RestResponse {
    const KIND: &'static str = "RestResponse";

    fn status(&self) -> StatusCode {
        self.status
    }

    fn validate(&self) -> Result<(), ResponseProgrammingError> {
        check_status(Self::KIND, self.status)?;
        require_object(Self::KIND, &self.data)
    }

    fn into_http(self) -> http::Response<Vec<u8>> {
        assemble(
            self.status,
            self.headers,
            Some(HeaderValue::from_static(JSON_CONTENT_TYPE)),
            self.data.to_string().into_bytes(),
        )
    }
}

impl BuildResponse for RestResponse {
    fn build(body: Value, options: &ResponseOptions) -> Result<Self, ResponseProgrammingError> {
        let mut response = Self::new(body).with_status(options.status);
        response.headers.extend(options.headers.clone());
        Ok(response)
    }
}

impl From<RestResponse> for Payload<RestResponse> {
    fn from(response: RestResponse) -> Self {
        Payload::Finished(response)
    }
}
