use http::header::{HeaderName, HeaderValue};
use http::{HeaderMap, StatusCode};
use serde_json::Value;

use super::artifact::{
    assemble, check_status, require_mapping, BuildResponse, FinishedResponse, ResponseOptions,
    JSON_CONTENT_TYPE,
};
use super::Payload;
use crate::error::ResponseProgrammingError;

const HTML_CONTENT_TYPE: &str = "text/html; charset=utf-8";

/// A plain response with opaque content, HTML by default.
///
/// Content is only inspected when its content type says it is JSON.
///
/// ```
/// use heaven::{FinishedResponse, HttpResponse};
///
/// let page = HttpResponse::new("<i>Success</i>");
/// assert!(page.validate().is_ok());
/// assert_eq!(page.content(), b"<i>Success</i>");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    content: Vec<u8>,
    content_type: HeaderValue,
    status: StatusCode,
    headers: HeaderMap,
}

impl HttpResponse {
    /// An HTML response with status 200.
    pub fn new(content: impl Into<Vec<u8>>) -> Self {
        Self {
            content: content.into(),
            content_type: HeaderValue::from_static(HTML_CONTENT_TYPE),
            status: StatusCode::OK,
            headers: HeaderMap::new(),
        }
    }

    /// Sets the content type.
    pub fn with_content_type(mut self, content_type: HeaderValue) -> Self {
        self.content_type = content_type;
        self
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

    /// Response content.
    pub fn content(&self) -> &[u8] {
        &self.content
    }

    /// Content type.
    pub fn content_type(&self) -> &HeaderValue {
        &self.content_type
    }

    /// Headers set on the response.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    fn is_json(&self) -> bool {
        is_json_type(&self.content_type)
    }
}

fn is_json_type(content_type: &HeaderValue) -> bool {
    content_type
        .to_str()
        .map(|ct| ct.trim_start().starts_with(JSON_CONTENT_TYPE))
        .unwrap_or(false)
}

impl FinishedResponse for HttpResponse {
    const KIND: &'static str = "HttpResponse";

    fn status(&self) -> StatusCode {
        self.status
    }

    fn validate(&self) -> Result<(), ResponseProgrammingError> {
        check_status(Self::KIND, self.status)?;
        if self.is_json() {
            require_mapping(Self::KIND, &self.content)?;
        }
        Ok(())
    }

    fn into_http(self) -> http::Response<Vec<u8>> {
        assemble(self.status, self.headers, Some(self.content_type), self.content)
    }
}

impl BuildResponse for HttpResponse {
    fn build(body: Value, options: &ResponseOptions) -> Result<Self, ResponseProgrammingError> {
        let mut response = Self::new(body.to_string())
            .with_content_type(HeaderValue::from_static(JSON_CONTENT_TYPE))
            .with_status(options.status);
        response.headers.extend(options.headers.clone());
        Ok(response)
    }
}

impl From<HttpResponse> for Payload<HttpResponse> {
    fn from(response: HttpResponse) -> Self {
        Payload::Finished(response)
    }
}

/// A response whose content is produced as a sequence of chunks.
///
/// The chunks cannot be inspected without consuming the stream, so
/// validation only looks at the status.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamingHttpResponse {
    chunks: Vec<Vec<u8>>,
    content_type: HeaderValue,
    status: StatusCode,
    headers: HeaderMap,
}

impl StreamingHttpResponse {
    /// An HTML stream with status 200.
    pub fn new<I, C>(chunks: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<Vec<u8>>,
    {
        Self {
            chunks: chunks.into_iter().map(Into::into).collect(),
            content_type: HeaderValue::from_static(HTML_CONTENT_TYPE),
            status: StatusCode::OK,
            headers: HeaderMap::new(),
        }
    }

    /// Sets the content type.
    pub fn with_content_type(mut self, content_type: HeaderValue) -> Self {
        self.content_type = content_type;
        self
    }

    /// Sets the status.
    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    /// The chunks in delivery order.
    pub fn chunks(&self) -> &[Vec<u8>] {
        &self.chunks
    }
}

impl FinishedResponse for StreamingHttpResponse {
    const KIND: &'static str = "StreamingHttpResponse";

    fn status(&self) -> StatusCode {
        self.status
    }

    fn validate(&self) -> Result<(), ResponseProgrammingError> {
        check_status(Self::KIND, self.status)
    }

    fn into_http(self) -> http::Response<Vec<u8>> {
        assemble(
            self.status,
            self.headers,
            Some(self.content_type),
            self.chunks.concat(),
        )
    }
}

impl BuildResponse for StreamingHttpResponse {
    fn build(body: Value, options: &ResponseOptions) -> Result<Self, ResponseProgrammingError> {
        let mut response = Self::new([body.to_string()])
            .with_content_type(HeaderValue::from_static(JSON_CONTENT_TYPE))
            .with_status(options.status);
        response.headers.extend(options.headers.clone());
        Ok(response)
    }
}

impl From<StreamingHttpResponse> for Payload<StreamingHttpResponse> {
    fn from(response: StreamingHttpResponse) -> Self {
        Payload::Finished(response)
    }
}
