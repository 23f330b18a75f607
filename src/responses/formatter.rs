//! Logging response formatters.

use std::fmt;
use std::marker::PhantomData;

use http::StatusCode;
use serde_json::Value;

use super::artifact::{check_status, BuildResponse, FinishedResponse, ResponseOptions};
use super::conversion::{ConversionContext, ConversionStrategy, VerbEnvelope};
use super::payload::{Payload, RawTypes, RawValue};
use super::redirect::RedirectResponse;
use crate::error::{ConfigError, ResponseProgrammingError};
use crate::logging::{resolve_sink, LogLevel, SharedSink};
use crate::settings::ResponseSettings;

/// Logs a message and produces a response of kind `R`.
///
/// Raw data is converted with the strategy `C` and built into a new `R`.
/// A finished `R` is validated and returned unchanged. The log message is
/// written before either happens, so it is recorded even when validation
/// fails.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
///
/// use heaven::{JsonFormatter, LogLevel, RecordingSink, Settings};
/// use http::StatusCode;
/// use serde_json::json;
///
/// let sink = RecordingSink::shared();
/// let formatter = JsonFormatter::with_logger(&Settings::default().responses, sink.clone());
///
/// let response = formatter
///     .log_response_as_info("Success", "Returned success", StatusCode::OK)
///     .unwrap();
///
/// assert_eq!(response.json().unwrap(), json!({"detail": "Success"}));
/// assert_eq!(sink.messages(LogLevel::Info), vec!["Returned success"]);
/// ```
pub struct ResponseFormatter<R, C = VerbEnvelope> {
    verb: String,
    raw_types: RawTypes,
    logger: SharedSink,
    conversion: C,
    _response: PhantomData<fn() -> R>,
}

impl<R: FinishedResponse> ResponseFormatter<R, VerbEnvelope> {
    /// Builds a formatter using the logger configured in `settings`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingLogger`] if `settings` has no logger.
    pub fn new(settings: &ResponseSettings) -> Result<Self, ConfigError> {
        let logger = resolve_sink(None, settings.logger.as_ref(), "ResponseFormatter")?;
        Ok(Self::with_logger(settings, logger))
    }

    /// Builds a formatter writing to `logger`.
    pub fn with_logger(settings: &ResponseSettings, logger: SharedSink) -> Self {
        Self {
            verb: settings.default_response_verb.clone(),
            raw_types: settings.raw_types.clone(),
            logger,
            conversion: VerbEnvelope,
            _response: PhantomData,
        }
    }
}

impl<R, C> ResponseFormatter<R, C> {
    /// Replaces the conversion strategy.
    pub fn with_conversion<D: ConversionStrategy>(self, conversion: D) -> ResponseFormatter<R, D> {
        ResponseFormatter {
            verb: self.verb,
            raw_types: self.raw_types,
            logger: self.logger,
            conversion,
            _response: PhantomData,
        }
    }

    /// Envelope key passed to the conversion strategy.
    pub fn verb(&self) -> &str {
        &self.verb
    }

    /// Payload kinds that are converted.
    pub fn raw_types(&self) -> &RawTypes {
        &self.raw_types
    }

    /// The sink messages are written to.
    pub fn logger(&self) -> &SharedSink {
        &self.logger
    }
}

impl<R: FinishedResponse, C> ResponseFormatter<R, C> {
    /// Validates a finished response before it is returned unchanged.
    ///
    /// `status` is the status the caller asked for; a finished response
    /// keeps its own.
    ///
    /// # Errors
    ///
    /// Returns [`ResponseProgrammingError`] if the response fails its kind's
    /// validation.
    pub fn proxy_response_validation(
        &self,
        response: &R,
        status: StatusCode,
    ) -> Result<(), ResponseProgrammingError> {
        tracing::debug!(
            kind = R::KIND,
            requested_status = status.as_u16(),
            status = response.status().as_u16(),
            "validating finished response"
        );
        response.validate()
    }
}

impl<R: BuildResponse, C: ConversionStrategy> ResponseFormatter<R, C> {
    /// Logs `log_message` at info level, then returns a response for `data`.
    ///
    /// # Errors
    ///
    /// Returns [`ResponseProgrammingError`] if a finished response fails
    /// validation or the converted body cannot be carried by `R`. The
    /// message has been logged in either case.
    pub fn log_response_as_info(
        &self,
        data: impl Into<Payload<R>>,
        log_message: &str,
        options: impl Into<ResponseOptions>,
    ) -> Result<R, ResponseProgrammingError> {
        self.respond(LogLevel::Info, data.into(), log_message, options.into())
    }

    /// Logs `log_message` at error level, then returns a response for `data`.
    ///
    /// # Errors
    ///
    /// Same as [`ResponseFormatter::log_response_as_info`].
    pub fn log_response_as_error(
        &self,
        data: impl Into<Payload<R>>,
        log_message: &str,
        options: impl Into<ResponseOptions>,
    ) -> Result<R, ResponseProgrammingError> {
        self.respond(LogLevel::Error, data.into(), log_message, options.into())
    }

    /// Turns raw data into a response body.
    ///
    /// Kinds outside the configured raw types skip the strategy and are used
    /// as the body verbatim.
    pub fn convert(&self, data: RawValue, options: &ResponseOptions) -> Value {
        let kind = data.kind();
        if !self.raw_types.contains(kind) {
            tracing::debug!(%kind, "payload kind is not converted");
            return data.into_json();
        }
        let ctx = ConversionContext {
            verb: &self.verb,
            status: options.status,
            extras: &options.extras,
        };
        self.conversion.convert(data, &ctx)
    }

    fn respond(
        &self,
        level: LogLevel,
        data: Payload<R>,
        log_message: &str,
        options: ResponseOptions,
    ) -> Result<R, ResponseProgrammingError> {
        self.logger.log(level, log_message);
        match data {
            Payload::Raw(raw) => {
                check_status(R::KIND, options.status)?;
                let body = self.convert(raw, &options);
                tracing::debug!(kind = R::KIND, status = options.status.as_u16(), "building response");
                R::build(body, &options)
            }
            Payload::Finished(response) => {
                self.proxy_response_validation(&response, options.status)?;
                Ok(response)
            }
        }
    }
}

/// Where a redirect formatter sends the client.
#[derive(Debug, Clone, PartialEq)]
pub enum RedirectTarget {
    /// A URL or path; a new redirect is built for it
    Locator(String),
    /// A redirect built elsewhere, validated and returned unchanged
    Finished(RedirectResponse),
}

impl From<&str> for RedirectTarget {
    fn from(locator: &str) -> Self {
        RedirectTarget::Locator(locator.to_string())
    }
}

impl From<String> for RedirectTarget {
    fn from(locator: String) -> Self {
        RedirectTarget::Locator(locator)
    }
}

impl From<RedirectResponse> for RedirectTarget {
    fn from(response: RedirectResponse) -> Self {
        RedirectTarget::Finished(response)
    }
}

impl<C> ResponseFormatter<RedirectResponse, C> {
    /// Logs `log_message` at info level, then returns a redirect.
    ///
    /// No conversion happens: a locator becomes a new redirect with
    /// `status`, a finished redirect keeps its own status.
    ///
    /// # Errors
    ///
    /// Returns [`ResponseProgrammingError::InvalidRedirect`] if the redirect
    /// fails validation. The message has been logged in that case too.
    pub fn log_redirect_as_info(
        &self,
        target: impl Into<RedirectTarget>,
        log_message: &str,
        status: StatusCode,
    ) -> Result<RedirectResponse, ResponseProgrammingError> {
        self.redirect(LogLevel::Info, target.into(), log_message, status)
    }

    /// Logs `log_message` at error level, then returns a redirect.
    ///
    /// # Errors
    ///
    /// Same as [`ResponseFormatter::log_redirect_as_info`].
    pub fn log_redirect_as_error(
        &self,
        target: impl Into<RedirectTarget>,
        log_message: &str,
        status: StatusCode,
    ) -> Result<RedirectResponse, ResponseProgrammingError> {
        self.redirect(LogLevel::Error, target.into(), log_message, status)
    }

    fn redirect(
        &self,
        level: LogLevel,
        target: RedirectTarget,
        log_message: &str,
        status: StatusCode,
    ) -> Result<RedirectResponse, ResponseProgrammingError> {
        self.logger.log(level, log_message);
        match target {
            RedirectTarget::Locator(locator) => {
                let response = RedirectResponse::new(locator).with_status(status);
                response.validate()?;
                Ok(response)
            }
            RedirectTarget::Finished(response) => {
                self.proxy_response_validation(&response, status)?;
                Ok(response)
            }
        }
    }
}

impl<R, C: Clone> Clone for ResponseFormatter<R, C> {
    fn clone(&self) -> Self {
        Self {
            verb: self.verb.clone(),
            raw_types: self.raw_types.clone(),
            logger: self.logger.clone(),
            conversion: self.conversion.clone(),
            _response: PhantomData,
        }
    }
}

impl<R: FinishedResponse, C> fmt::Debug for ResponseFormatter<R, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResponseFormatter")
            .field("kind", &R::KIND)
            .field("verb", &self.verb)
            .field("raw_types", &self.raw_types)
            .field("logger", &self.logger)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::logging::RecordingSink;
    use crate::responses::{JsonResponse, RawKind, RestResponse};
    use crate::settings::Settings;
    use serde_json::json;

    fn formatter<R: FinishedResponse>() -> (ResponseFormatter<R>, Arc<RecordingSink>) {
        let sink = RecordingSink::shared();
        let formatter = ResponseFormatter::with_logger(&Settings::default().responses, sink.clone());
        (formatter, sink)
    }

    #[test]
    fn raw_list_is_wrapped_under_verb() {
        let (formatter, sink) = formatter::<JsonResponse>();
        let response = formatter
            .log_response_as_error(json!([1, 2]), "listing failed", StatusCode::BAD_REQUEST)
            .unwrap();

        assert_eq!(response.json().unwrap(), json!({"detail": [1, 2]}));
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(sink.messages(LogLevel::Error), vec!["listing failed"]);
        assert_eq!(sink.count(LogLevel::Info), 0);
    }

    #[test]
    fn finished_response_keeps_its_status() {
        let (formatter, _sink) = formatter::<RestResponse>();
        let finished = RestResponse::new(json!({"hello": "world"})).with_status(StatusCode::ACCEPTED);

        let response = formatter
            .log_response_as_info(finished.clone(), "passthrough", StatusCode::OK)
            .unwrap();
        assert_eq!(response, finished);
    }

    #[test]
    fn failed_validation_still_logs() {
        let (formatter, sink) = formatter::<JsonResponse>();
        let err = formatter
            .log_response_as_info(
                JsonResponse::new_unsafe(&json!([1])),
                "returned list",
                StatusCode::OK,
            )
            .unwrap_err();

        assert_eq!(err, ResponseProgrammingError::UnsafeJson);
        assert_eq!(sink.messages(LogLevel::Info), vec!["returned list"]);
    }

    #[test]
    fn unconfigured_kind_skips_conversion() {
        let sink = RecordingSink::shared();
        let mut settings = Settings::default().responses;
        settings.raw_types = [RawKind::Str].into_iter().collect();
        let formatter = ResponseFormatter::<RestResponse>::with_logger(&settings, sink);

        let response = formatter
            .log_response_as_info(json!({"a": 1}), "mapping", StatusCode::OK)
            .unwrap();
        assert_eq!(response.data(), &json!({"a": 1}));

        let response = formatter
            .log_response_as_info("text", "string", StatusCode::OK)
            .unwrap();
        assert_eq!(response.data(), &json!({"detail": "text"}));
    }

    #[test]
    fn custom_strategy_receives_extras() {
        let (formatter, _sink) = formatter::<RestResponse>();
        let formatter = formatter.with_conversion(|data: RawValue, ctx: &ConversionContext<'_>| {
            json!({
                "data": data.into_json(),
                "status_code": ctx.status.as_u16(),
                "errors": ctx.extras.get("errors"),
            })
        });

        let options =
            ResponseOptions::new(StatusCode::BAD_REQUEST).extra("errors", json!({"error1": "hello"}));
        let response = formatter
            .log_response_as_error("Error", "custom envelope", options)
            .unwrap();

        assert_eq!(
            response.data(),
            &json!({"data": "Error", "status_code": 400, "errors": {"error1": "hello"}})
        );
    }

    #[test]
    fn missing_logger_fails_at_construction() {
        let mut settings = Settings::default().responses;
        settings.logger = None;
        let err = ResponseFormatter::<JsonResponse>::new(&settings).unwrap_err();
        assert!(matches!(err, ConfigError::MissingLogger { .. }));
    }

    #[test]
    fn redirect_from_locator_uses_status() {
        let (formatter, sink) = formatter::<RedirectResponse>();
        let response = formatter
            .log_redirect_as_info("/articles/", "moved", StatusCode::MOVED_PERMANENTLY)
            .unwrap();

        assert_eq!(response.location(), "/articles/");
        assert_eq!(response.status(), StatusCode::MOVED_PERMANENTLY);
        assert_eq!(sink.len(), 1);
    }

    #[test]
    fn redirect_passthrough_and_rejection() {
        let (formatter, sink) = formatter::<RedirectResponse>();
        let finished = RedirectResponse::new("/login/");
        let response = formatter
            .log_redirect_as_error(finished.clone(), "login required", StatusCode::MOVED_PERMANENTLY)
            .unwrap();
        assert_eq!(response, finished);

        let err = formatter
            .log_redirect_as_error("", "nowhere to go", StatusCode::FOUND)
            .unwrap_err();
        assert!(matches!(err, ResponseProgrammingError::InvalidRedirect(_)));
        assert_eq!(sink.count(LogLevel::Error), 2);
    }
}
