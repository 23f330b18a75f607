use http::header::{HeaderName, HeaderValue, LOCATION};
use http::{HeaderMap, StatusCode};

use super::artifact::{assemble, FinishedResponse};
use crate::error::ResponseProgrammingError;

const ALLOWED_SCHEMES: [&str; 3] = ["http", "https", "ftp"];

/// A redirect to another location.
///
/// ```
/// use heaven::{FinishedResponse, RedirectResponse};
/// use http::StatusCode;
///
/// let redirect = RedirectResponse::new("/login/");
/// assert_eq!(redirect.status(), StatusCode::FOUND);
/// assert!(redirect.validate().is_ok());
///
/// assert!(RedirectResponse::new("javascript:alert(1)").validate().is_err());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct RedirectResponse {
    location: String,
    status: StatusCode,
    headers: HeaderMap,
}

impl RedirectResponse {
    /// A temporary (302) redirect.
    pub fn new(location: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            status: StatusCode::FOUND,
            headers: HeaderMap::new(),
        }
    }

    /// A permanent (301) redirect.
    pub fn permanent(location: impl Into<String>) -> Self {
        Self::new(location).with_status(StatusCode::MOVED_PERMANENTLY)
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

    /// Where the client is sent.
    pub fn location(&self) -> &str {
        &self.location
    }

    /// Headers set on the response.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }
}

fn scheme(location: &str) -> Option<&str> {
    let (scheme, _) = location.split_once(':')?;
    let is_scheme = !scheme.is_empty()
        && scheme.starts_with(|c: char| c.is_ascii_alphabetic())
        && scheme
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));
    is_scheme.then_some(scheme)
}

impl FinishedResponse for RedirectResponse {
    const KIND: &'static str = "RedirectResponse";

    fn status(&self) -> StatusCode {
        self.status
    }

    fn validate(&self) -> Result<(), ResponseProgrammingError> {
        if self.location.trim().is_empty() {
            return Err(ResponseProgrammingError::InvalidRedirect(
                "redirect target is empty".to_string(),
            ));
        }
        if !self.status.is_redirection() {
            return Err(ResponseProgrammingError::InvalidRedirect(format!(
                "status {} is not a redirection",
                self.status.as_u16()
            )));
        }
        if let Some(scheme) = scheme(&self.location) {
            if !ALLOWED_SCHEMES
                .iter()
                .any(|allowed| scheme.eq_ignore_ascii_case(allowed))
            {
                return Err(ResponseProgrammingError::InvalidRedirect(format!(
                    "unsafe redirect to URL with protocol '{scheme}'"
                )));
            }
        }
        if HeaderValue::from_str(&self.location).is_err() {
            return Err(ResponseProgrammingError::InvalidRedirect(format!(
                "'{}' is not a valid Location header",
                self.location.escape_debug()
            )));
        }
        Ok(())
    }

    fn into_http(self) -> http::Response<Vec<u8>> {
        let mut headers = self.headers;
        // Unrepresentable targets are rejected by `validate`.
        if let Ok(location) = HeaderValue::from_str(&self.location) {
            headers.insert(LOCATION, location);
        }
        assemble(self.status, headers, None, Vec::new())
    }
}
