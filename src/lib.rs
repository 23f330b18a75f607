//! Logged response envelopes and service-call contracts for web backends.
//!
//! This crate puts two wrappers between request handlers and the layers they
//! talk to:
//! - **Responses**: a [`ResponseFormatter`] logs one message per response,
//!   wraps plain data in a `{verb: data}` envelope and validates responses
//!   that were built elsewhere
//! - **Services**: a [`Service`](services::Service) runs every data
//!   operation through the same contract (required log messages, template
//!   substitution, and a two-tier error taxonomy) and returns a new handle
//!   instead of mutating the old one
//!
//! # Core Types
//!
//! - [`Payload<R>`]: plain data or a finished response of kind `R`
//! - [`ResponseFormatter<R, C>`]: logs and produces responses of kind `R`
//!   using the [`ConversionStrategy`] `C`
//! - [`services::Service<M>`]: value-like handle over the rows of model `M`
//! - [`Settings`]: configuration every component is built from
//! - [`LogSink`]: where messages go; [`TracingSink`] by default
//!
//! # Examples
//!
//! ```
//! use heaven::{FinishedResponse, JsonFormatter, JsonResponse, LogLevel, RecordingSink, Settings};
//! use http::StatusCode;
//! use serde_json::json;
//!
//! let sink = RecordingSink::shared();
//! let settings = Settings::default().with_logger(sink.clone());
//! let formatter = JsonFormatter::new(&settings.responses).unwrap();
//!
//! // Plain data is wrapped.
//! let response = formatter
//!     .log_response_as_error(vec![json!("a"), json!("b")], "Bad input", StatusCode::BAD_REQUEST)
//!     .unwrap();
//! assert_eq!(response.json().unwrap(), json!({"detail": ["a", "b"]}));
//!
//! // Finished responses pass through, but must be safe.
//! let unsafe_list = JsonResponse::new_unsafe(&json!(["a"]));
//! assert!(formatter
//!     .log_response_as_info(unsafe_list, "Listing", StatusCode::OK)
//!     .is_err());
//!
//! // Both calls were logged.
//! assert_eq!(sink.len(), 2);
//! assert_eq!(sink.messages(LogLevel::Error), vec!["Bad input"]);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod logging;
mod responses;
pub mod services;
mod settings;
pub mod template;

pub use error::{
    ConfigError, Error, OperationError, ResponseProgrammingError, ServiceError, ServiceException,
    ServiceProgrammingError,
};
pub use logging::{LogLevel, LogRecord, LogSink, RecordingSink, SharedSink, TracingSink};
pub use responses::{
    BuildResponse, ConversionContext, ConversionStrategy, FinishedResponse, HttpFormatter,
    HttpResponse, JsonFormatter, JsonResponse, Passthrough, Payload, RawKind, RawTypes, RawValue,
    RedirectFormatter, RedirectResponse, RedirectTarget, ResponseFormatter, ResponseOptions,
    RestFormatter, RestResponse, StreamingFormatter, StreamingHttpResponse, VerbEnvelope,
};
pub use settings::{
    ResponseSettings, ServiceSettings, Settings, DEBUG_ENV, DEFAULT_ERROR_LOG_MESSAGE,
    SETTINGS_NAME, SETTINGS_PATH_ENV,
};
