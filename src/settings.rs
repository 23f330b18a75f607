//! Configuration for response formatters and services.
//!
//! Settings are plain values. Components copy what they need when they are
//! built; changing configuration means building new components from a new
//! [`Settings`] value.
//!
//! Settings load from TOML using the same keys as the `HEAVEN` table:
//!
//! ```
//! use heaven::Settings;
//!
//! let settings = Settings::from_toml_str(
//!     r#"
//!     DEBUG = true
//!
//!     [RESPONSES]
//!     DEFAULT_RESPONSE_VERB = "data"
//!
//!     [SERVICES]
//!     RAISE_EXCEPTION = false
//!     "#,
//! )
//! .unwrap();
//!
//! assert!(settings.debug);
//! assert_eq!(settings.responses.default_response_verb, "data");
//! assert!(!settings.services.raise_exception);
//! // Unset keys keep their defaults.
//! assert!(settings.services.force_error_message_argument);
//! ```

use std::path::Path;

use serde::Deserialize;

use crate::error::ConfigError;
use crate::logging::{SharedSink, TracingSink};
use crate::responses::RawTypes;

/// Name of the settings table recognized by [`Settings::on_setting_changed`].
pub const SETTINGS_NAME: &str = "HEAVEN";

/// Environment variable holding the path of a TOML settings file.
pub const SETTINGS_PATH_ENV: &str = "HEAVEN_SETTINGS";

/// Environment variable overriding [`Settings::debug`].
pub const DEBUG_ENV: &str = "HEAVEN_DEBUG";

/// Default message logged when a service call fails without an `error_message`.
pub const DEFAULT_ERROR_LOG_MESSAGE: &str =
    "An error happened in your service. That is the default message for the service error";

/// Top-level settings.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "SCREAMING_SNAKE_CASE")]
pub struct Settings {
    /// Verbose mode: service error logs include the failure text.
    pub debug: bool,
    /// Settings for response formatters.
    pub responses: ResponseSettings,
    /// Settings for services.
    pub services: ServiceSettings,
}

/// Settings for response formatters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "SCREAMING_SNAKE_CASE")]
pub struct ResponseSettings {
    /// Key of the envelope raw payloads are wrapped in.
    pub default_response_verb: String,
    /// Payload kinds that are converted before a response is built.
    pub raw_types: RawTypes,
    /// Logger used when a formatter is built without one.
    #[serde(skip, default = "default_response_logger")]
    pub logger: Option<SharedSink>,
}

impl Default for ResponseSettings {
    fn default() -> Self {
        Self {
            default_response_verb: "detail".to_string(),
            raw_types: RawTypes::default(),
            logger: default_response_logger(),
        }
    }
}

/// Settings for services.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "SCREAMING_SNAKE_CASE")]
pub struct ServiceSettings {
    /// Whether services raise runtime failures instead of returning `None`.
    pub raise_exception: bool,
    /// Message logged when a failing call supplied no `error_message`.
    pub default_error_log_message: String,
    /// Whether every service call must carry an `error_message`.
    pub force_error_message_argument: bool,
    /// Whether every service call must carry an `info_message`.
    pub force_info_message_argument: bool,
    /// Append the failure text to error logs even outside debug mode.
    pub always_include_exception: bool,
    /// Logger used when a service is built without one.
    #[serde(skip, default = "default_service_logger")]
    pub logger: Option<SharedSink>,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            raise_exception: true,
            default_error_log_message: DEFAULT_ERROR_LOG_MESSAGE.to_string(),
            force_error_message_argument: true,
            force_info_message_argument: true,
            always_include_exception: false,
            logger: default_service_logger(),
        }
    }
}

fn default_response_logger() -> Option<SharedSink> {
    Some(TracingSink::shared("responses"))
}

fn default_service_logger() -> Option<SharedSink> {
    Some(TracingSink::shared("services"))
}

impl Settings {
    /// Parses settings from a TOML document. Missing keys take defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed TOML, unknown keys or
    /// values of the wrong type.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(source)?)
    }

    /// Reads settings from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or any error
    /// from [`Settings::from_toml_str`].
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&source)
    }

    /// Loads settings from the environment.
    ///
    /// A `.env` file is read first if present. Then:
    ///
    /// | Env Var           | Effect                                  |
    /// |-------------------|-----------------------------------------|
    /// | `HEAVEN_SETTINGS` | path of a TOML settings file            |
    /// | `HEAVEN_DEBUG`    | overrides `DEBUG` (`true`/`false`/`1`/`0`) |
    ///
    /// # Errors
    ///
    /// Returns an error if the settings file is unreadable or invalid, or if
    /// `HEAVEN_DEBUG` is not a boolean.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let mut settings = match std::env::var(SETTINGS_PATH_ENV) {
            Ok(path) => Self::from_path(path)?,
            Err(_) => Self::default(),
        };

        if let Ok(raw) = std::env::var(DEBUG_ENV) {
            settings.debug = parse_bool(DEBUG_ENV, &raw)?;
        }

        tracing::debug!(debug = settings.debug, "heaven settings loaded");
        Ok(settings)
    }

    /// Builds replacement settings when the `HEAVEN` setting changes.
    ///
    /// Returns `Ok(None)` for any other setting name. The current value is
    /// never modified; callers rebuild their formatters and services from the
    /// returned settings.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] if `value` is not a valid settings table.
    pub fn on_setting_changed(
        name: &str,
        value: toml::Value,
    ) -> Result<Option<Self>, ConfigError> {
        if name != SETTINGS_NAME {
            return Ok(None);
        }
        let settings: Settings = value.try_into()?;
        tracing::debug!("heaven settings reloaded");
        Ok(Some(settings))
    }

    /// Replaces the default logger of both sections.
    pub fn with_logger(mut self, logger: SharedSink) -> Self {
        self.responses.logger = Some(logger.clone());
        self.services.logger = Some(logger);
        self
    }
}

fn parse_bool(name: &str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => Err(ConfigError::InvalidValue {
            name: name.to_string(),
            reason: format!("'{other}' is not a boolean"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::responses::RawKind;

    #[test]
    fn defaults() {
        let settings = Settings::default();
        assert!(!settings.debug);
        assert_eq!(settings.responses.default_response_verb, "detail");
        assert!(settings.responses.raw_types.contains(RawKind::Int));
        assert!(settings.responses.raw_types.contains(RawKind::Map));
        assert!(!settings.responses.raw_types.contains(RawKind::Float));
        assert!(settings.responses.logger.is_some());
        assert!(settings.services.raise_exception);
        assert!(settings.services.force_error_message_argument);
        assert!(settings.services.force_info_message_argument);
        assert!(!settings.services.always_include_exception);
        assert_eq!(
            settings.services.default_error_log_message,
            DEFAULT_ERROR_LOG_MESSAGE
        );
    }

    #[test]
    fn partial_toml_merges_over_defaults() {
        let settings = Settings::from_toml_str(
            r#"
            [RESPONSES]
            RAW_TYPES = ["str", "dict"]

            [SERVICES]
            FORCE_INFO_MESSAGE_ARGUMENT = false
            "#,
        )
        .unwrap();

        assert_eq!(settings.responses.default_response_verb, "detail");
        assert!(settings.responses.raw_types.contains(RawKind::Str));
        assert!(settings.responses.raw_types.contains(RawKind::Map));
        assert!(!settings.responses.raw_types.contains(RawKind::Int));
        assert!(!settings.services.force_info_message_argument);
        assert!(settings.services.force_error_message_argument);
        assert!(settings.services.logger.is_some());
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = Settings::from_toml_str("[SERVICES]\nRAISE_EXCEPTIONS = true\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn reload_only_for_heaven_setting() {
        let value: toml::Value = toml::from_str("DEBUG = true").unwrap();
        assert!(Settings::on_setting_changed("DATABASES", value.clone())
            .unwrap()
            .is_none());

        let reloaded = Settings::on_setting_changed("HEAVEN", value).unwrap().unwrap();
        assert!(reloaded.debug);
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = Settings::from_path("/definitely/not/here.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn bool_parsing() {
        assert!(parse_bool("X", "TRUE").unwrap());
        assert!(parse_bool("X", "1").unwrap());
        assert!(!parse_bool("X", "off").unwrap());
        assert!(parse_bool("X", "maybe").is_err());
    }
}
