use std::path::PathBuf;

/// Errors that can occur anywhere in the crate.
///
/// Every error falls into one of two tiers. Programming errors
/// ([`ResponseProgrammingError`], [`ServiceProgrammingError`], [`ConfigError`])
/// point at a defect in calling code and are always surfaced. Runtime errors
/// ([`ServiceException`]) come from the data layer and are logged before they
/// reach the caller.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid or missing configuration.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// A finished response failed validation.
    #[error(transparent)]
    Response(#[from] ResponseProgrammingError),
    /// A service call failed.
    #[error(transparent)]
    Service(#[from] ServiceError),
}

impl Error {
    /// Returns `true` if the error points at a defect in calling code.
    pub fn is_programming(&self) -> bool {
        match self {
            Error::Config(_) | Error::Response(_) => true,
            Error::Service(err) => err.is_programming(),
        }
    }
}

/// A response handed to a formatter could not be returned as-is.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResponseProgrammingError {
    /// The body decoded, but not to a key-value mapping.
    #[error("{kind} body must represent a mapping, found {found}")]
    NotAMapping {
        /// Response kind that failed validation
        kind: &'static str,
        /// Shape that was found instead
        found: &'static str,
    },
    /// The body could not be decoded at all.
    #[error("{kind} body could not be decoded: {reason}")]
    UndecodableBody {
        /// Response kind that failed validation
        kind: &'static str,
        /// Decoder message
        reason: String,
    },
    /// A JSON response was built with `safe` disabled.
    #[error("JsonResponse must be a safe one. Change your response structure to a dictionary")]
    UnsafeJson,
    /// A redirect without a target or with a non-3xx status.
    #[error("invalid redirect: {0}")]
    InvalidRedirect(String),
    /// A status code that cannot carry a response.
    #[error("{kind} cannot be returned with status {status}")]
    InvalidStatus {
        /// Response kind that failed validation
        kind: &'static str,
        /// Offending status code
        status: u16,
    },
    /// The converted body could not be serialized.
    #[error("response body could not be serialized: {0}")]
    Serialization(String),
}

/// A service was used incorrectly.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ServiceProgrammingError {
    /// A required argument was not supplied.
    #[error("You must provide named-only argument '{argument}' in {service}")]
    MissingArgument {
        /// Name of the missing argument
        argument: &'static str,
        /// Service the call was made on
        service: String,
    },
    /// `get()` was called without any lookup.
    #[error("You need to provide lookup arguments in {service} get()")]
    EmptyLookup {
        /// Service the call was made on
        service: String,
    },
    /// A lookup or update referenced a field the model does not have.
    #[error("Cannot resolve keyword '{field}' into field of {model}. Choices are: {choices}")]
    UnknownField {
        /// Model name
        model: &'static str,
        /// Field that was not found
        field: String,
        /// Comma-separated list of valid fields
        choices: String,
    },
    /// A value could not be read back as the service's model.
    #[error("{service} works with {expected}, but value is {found}")]
    ModelMismatch {
        /// Service the value was assigned to
        service: String,
        /// Model the service is bound to
        expected: &'static str,
        /// Description of the rejected value
        found: String,
    },
    /// A write operation was invoked on a read-only service.
    #[error("You are calling write function on read_only service {service}")]
    ReadOnly {
        /// Display form of the service
        service: String,
    },
}

/// Invalid or incomplete configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A log message argument was required but not supplied.
    #[error("You must provide {argument} argument")]
    MissingLogMessage {
        /// `"error_message"` or `"info_message"`
        argument: &'static str,
    },
    /// Neither the component nor the settings provide a logger.
    #[error("There is no logger assigned in {component} or in global settings")]
    MissingLogger {
        /// Component that was being built
        component: &'static str,
    },
    /// Settings could not be parsed.
    #[error("invalid heaven settings: {0}")]
    Parse(#[from] toml::de::Error),
    /// A settings file could not be read.
    #[error("could not read settings file {}: {source}", .path.display())]
    Io {
        /// File that was being read
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },
    /// An environment override had an invalid value.
    #[error("invalid value for {name}: {reason}")]
    InvalidValue {
        /// Setting name
        name: String,
        /// Why the value was rejected
        reason: String,
    },
}

/// A runtime failure inside a service operation.
///
/// The original failure is available through [`std::error::Error::source`].
#[derive(Debug, thiserror::Error)]
#[error("service operation failed: {source}")]
pub struct ServiceException {
    #[source]
    source: anyhow::Error,
}

impl ServiceException {
    /// Wraps a runtime failure.
    pub fn new(source: anyhow::Error) -> Self {
        Self { source }
    }

    /// Returns the wrapped failure.
    pub fn failure(&self) -> &anyhow::Error {
        &self.source
    }

    /// Unwraps the original failure.
    pub fn into_failure(self) -> anyhow::Error {
        self.source
    }
}

/// Error returned by decorated service calls.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// A required log message was missing.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// The call itself was malformed.
    #[error(transparent)]
    Programming(#[from] ServiceProgrammingError),
    /// The data layer failed and the service's policy is to raise.
    #[error(transparent)]
    Failed(#[from] ServiceException),
}

impl ServiceError {
    /// Returns `true` for configuration and programming errors.
    pub fn is_programming(&self) -> bool {
        !matches!(self, ServiceError::Failed(_))
    }
}

/// Error returned by the data operations a service wraps.
///
/// Programming errors pass through the service decorator untouched. Anything
/// else is a runtime failure and is logged.
#[derive(Debug, thiserror::Error)]
pub enum OperationError {
    /// Bad arguments or an unknown field.
    #[error(transparent)]
    Programming(#[from] ServiceProgrammingError),
    /// Any other failure.
    #[error(transparent)]
    Failure(#[from] anyhow::Error),
}

impl OperationError {
    /// Wraps any error as a runtime failure.
    pub fn failure<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        OperationError::Failure(anyhow::Error::new(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn programming_tier_classification() {
        let read_only: Error = ServiceError::from(ServiceProgrammingError::ReadOnly {
            service: "{UserService None}".to_string(),
        })
        .into();
        assert!(read_only.is_programming());

        let unsafe_json: Error = ResponseProgrammingError::UnsafeJson.into();
        assert!(unsafe_json.is_programming());

        let failed: Error =
            ServiceError::from(ServiceException::new(anyhow::anyhow!("db down"))).into();
        assert!(!failed.is_programming());
    }

    #[test]
    fn service_exception_keeps_source() {
        use std::error::Error as _;

        let exc = ServiceException::new(anyhow::anyhow!("connection reset"));
        assert_eq!(exc.to_string(), "service operation failed: connection reset");
        assert_eq!(exc.source().map(|s| s.to_string()).as_deref(), Some("connection reset"));
    }

    #[test]
    fn missing_log_message_display() {
        let err = ConfigError::MissingLogMessage {
            argument: "error_message",
        };
        assert_eq!(err.to_string(), "You must provide error_message argument");
    }

    #[test]
    fn read_only_display_names_service() {
        let err = ServiceProgrammingError::ReadOnly {
            service: "{ArticleService <Manager: Article>}".to_string(),
        };
        assert!(err.to_string().contains("{ArticleService <Manager: Article>}"));
    }
}
