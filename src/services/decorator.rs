//! The contract every service call goes through.

use std::fmt::Write;

use crate::error::{ConfigError, OperationError, ServiceError};
use crate::settings::Settings;
use crate::template::{format_log_message, OBJECTS_TOKEN, RESULT_TOKEN};

use super::model::Model;
use super::objects::Objects;
use super::service::Service;

/// Log messages supplied with a service call.
///
/// ```
/// use heaven::services::LogMessages;
///
/// let messages = LogMessages::new()
///     .info("Loaded $objects$")
///     .error("Could not load articles");
/// assert_eq!(messages.info_message.as_deref(), Some("Loaded $objects$"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogMessages {
    /// Logged at error level when the call fails
    pub error_message: Option<String>,
    /// Logged at info level when the call succeeds
    pub info_message: Option<String>,
    /// Append the resulting objects to the info message
    pub returned_result_in_info: bool,
}

impl LogMessages {
    /// No messages.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the info message.
    pub fn info(mut self, message: impl Into<String>) -> Self {
        self.info_message = Some(message.into());
        self
    }

    /// Sets the error message.
    pub fn error(mut self, message: impl Into<String>) -> Self {
        self.error_message = Some(message.into());
        self
    }

    /// Appends the resulting objects to the info message.
    pub fn with_result(mut self) -> Self {
        self.returned_result_in_info = true;
        self
    }
}

/// Runs data operations on behalf of a service.
///
/// A call checks its log messages, runs the operation and then either logs
/// `info_message` and returns a new service holding the result, or logs the
/// failure and applies the service's [`ErrorPolicy`](super::ErrorPolicy).
/// Programming errors from the operation are returned without logging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceFunction {
    /// Require an `error_message` on every call
    pub force_error_message: bool,
    /// Require an `info_message` on every call
    pub force_info_message: bool,
    default_error_message: String,
    include_exception: bool,
}

impl ServiceFunction {
    /// Reads the defaults from `settings`.
    pub fn from_settings(settings: &Settings) -> Self {
        let services = &settings.services;
        Self {
            force_error_message: services.force_error_message_argument,
            force_info_message: services.force_info_message_argument,
            default_error_message: services.default_error_log_message.clone(),
            include_exception: settings.debug || services.always_include_exception,
        }
    }

    /// Overrides whether `error_message` is required.
    pub fn force_error_message(mut self, force: bool) -> Self {
        self.force_error_message = force;
        self
    }

    /// Overrides whether `info_message` is required.
    pub fn force_info_message(mut self, force: bool) -> Self {
        self.force_info_message = force;
        self
    }

    /// Fails if a required message is missing.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingLogMessage`] naming the first missing
    /// argument, `info_message` before `error_message`.
    pub fn check_messages(&self, messages: &LogMessages) -> Result<(), ConfigError> {
        if self.force_info_message && messages.info_message.is_none() {
            return Err(ConfigError::MissingLogMessage {
                argument: "info_message",
            });
        }
        if self.force_error_message && messages.error_message.is_none() {
            return Err(ConfigError::MissingLogMessage {
                argument: "error_message",
            });
        }
        Ok(())
    }

    /// Runs `operation` against `service`.
    ///
    /// Returns the new service on success, and `Ok(None)` for a failure the
    /// service's policy suppresses.
    ///
    /// # Errors
    ///
    /// - [`ServiceError::Config`] if a required message is missing. The
    ///   operation is not run.
    /// - [`ServiceError::Programming`] if the operation reports one.
    /// - [`ServiceError::Failed`] for a runtime failure when the policy is to
    ///   raise.
    pub fn run<M, F>(
        &self,
        service: &Service<M>,
        messages: LogMessages,
        operation: F,
    ) -> Result<Option<Service<M>>, ServiceError>
    where
        M: Model,
        F: FnOnce(&Service<M>) -> Result<Objects<M>, OperationError>,
    {
        self.check_messages(&messages)?;

        match operation(service) {
            Ok(objects) => {
                let next = service.with_objects(objects);
                if let Some(template) = &messages.info_message {
                    let message = self.info_message(template, &messages, &next);
                    service.logger().info(&message);
                }
                Ok(Some(next))
            }
            Err(OperationError::Programming(err)) => Err(err.into()),
            Err(OperationError::Failure(err)) => {
                tracing::debug!(service = %service, error = %err, "service call failed");
                let message = self.error_message(messages.error_message.as_deref(), &err);
                service.logger().error(&format_log_message(&message, None));
                service.service_function_error_handler(err)
            }
        }
    }

    fn info_message<M: Model>(
        &self,
        template: &str,
        messages: &LogMessages,
        next: &Service<M>,
    ) -> String {
        let mut message = format_log_message(template, Some(next));
        if messages.returned_result_in_info
            && !template.contains(OBJECTS_TOKEN)
            && !template.contains(RESULT_TOKEN)
        {
            message.push_str(": ");
            message.push_str(&next.objects().to_string());
        }
        message
    }

    fn error_message(&self, supplied: Option<&str>, err: &anyhow::Error) -> String {
        let mut message = supplied.unwrap_or(&self.default_error_message).to_string();
        if self.include_exception {
            let _ = write!(message, ". Exception: {err}");
        }
        message
    }
}
