use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

/// Severity of a message written to a [`LogSink`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Informational message
    Info,
    /// Error message
    Error,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogLevel::Info => write!(f, "INFO"),
            LogLevel::Error => write!(f, "ERROR"),
        }
    }
}

/// Destination for the log messages that formatters and services emit.
///
/// Formatters and services call exactly one of these methods per logged
/// outcome. Implementations must not fail; a sink that cannot write drops
/// the message.
pub trait LogSink: fmt::Debug + Send + Sync {
    /// Writes an informational message.
    fn info(&self, message: &str);

    /// Writes an error message.
    fn error(&self, message: &str);

    /// Writes a message at the given level.
    fn log(&self, level: LogLevel, message: &str) {
        match level {
            LogLevel::Info => self.info(message),
            LogLevel::Error => self.error(message),
        }
    }
}

/// Shared handle to a log sink.
pub type SharedSink = Arc<dyn LogSink>;

/// The default sink: forwards messages to `tracing`.
///
/// Every event carries a `component` field so subscribers can tell response
/// logs from service logs.
///
/// ```no_run
/// use heaven::{LogSink, TracingSink};
///
/// let sink = TracingSink::new("services");
/// sink.info("User 7 retrieved the first article");
/// ```
#[derive(Debug, Clone, Copy)]
pub struct TracingSink {
    component: &'static str,
}

impl TracingSink {
    /// Creates a sink tagging its events with `component`.
    pub fn new(component: &'static str) -> Self {
        Self { component }
    }

    /// Returns the component tag.
    pub fn component(&self) -> &'static str {
        self.component
    }

    /// Wraps the sink in a [`SharedSink`].
    pub fn shared(component: &'static str) -> SharedSink {
        Arc::new(Self::new(component))
    }
}

impl LogSink for TracingSink {
    fn info(&self, message: &str) {
        tracing::info!(component = self.component, "{}", message);
    }

    fn error(&self, message: &str) {
        tracing::error!(component = self.component, "{}", message);
    }
}

/// A message captured by a [`RecordingSink`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    /// Level the message was written at
    pub level: LogLevel,
    /// The message text
    pub message: String,
}

/// An in-memory sink that records every message.
///
/// Useful as a spy in tests: it counts calls per level and keeps the exact
/// text that was written.
///
/// # Examples
///
/// ```
/// use heaven::{LogLevel, LogSink, RecordingSink};
///
/// let sink = RecordingSink::new();
/// sink.info("created");
/// sink.error("failed");
///
/// assert_eq!(sink.count(LogLevel::Info), 1);
/// assert_eq!(sink.messages(LogLevel::Error), vec!["failed"]);
/// ```
#[derive(Debug, Default)]
pub struct RecordingSink {
    records: Mutex<Vec<LogRecord>>,
}

impl RecordingSink {
    /// Creates an empty recording sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty recording sink behind an `Arc`.
    ///
    /// Keep a clone of the returned `Arc` to inspect the records after
    /// handing the sink to a formatter or service.
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Returns a snapshot of all records in write order.
    pub fn records(&self) -> Vec<LogRecord> {
        self.records.lock().clone()
    }

    /// Returns the messages written at `level`, in write order.
    pub fn messages(&self, level: LogLevel) -> Vec<String> {
        self.records
            .lock()
            .iter()
            .filter(|r| r.level == level)
            .map(|r| r.message.clone())
            .collect()
    }

    /// Returns how many messages were written at `level`.
    pub fn count(&self, level: LogLevel) -> usize {
        self.records.lock().iter().filter(|r| r.level == level).count()
    }

    /// Returns the total number of records.
    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    /// Returns `true` if nothing has been written.
    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }

    /// Drops all records.
    pub fn clear(&self) {
        self.records.lock().clear();
    }

    fn push(&self, level: LogLevel, message: &str) {
        self.records.lock().push(LogRecord {
            level,
            message: message.to_string(),
        });
    }
}

impl LogSink for RecordingSink {
    fn info(&self, message: &str) {
        self.push(LogLevel::Info, message);
    }

    fn error(&self, message: &str) {
        self.push(LogLevel::Error, message);
    }
}

/// Picks the injected sink, falling back to the configured default.
pub(crate) fn resolve_sink(
    injected: Option<SharedSink>,
    fallback: Option<&SharedSink>,
    component: &'static str,
) -> Result<SharedSink, crate::ConfigError> {
    injected
        .or_else(|| fallback.cloned())
        .ok_or(crate::ConfigError::MissingLogger { component })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recording_sink_keeps_order_and_levels() {
        let sink = RecordingSink::new();
        sink.info("one");
        sink.error("two");
        sink.log(LogLevel::Info, "three");

        let records = sink.records();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].level, LogLevel::Info);
        assert_eq!(records[1].message, "two");
        assert_eq!(sink.messages(LogLevel::Info), vec!["one", "three"]);
        assert_eq!(sink.count(LogLevel::Error), 1);

        sink.clear();
        assert!(sink.is_empty());
    }

    #[test]
    fn tracing_sink_emits_without_subscriber() {
        let sink = TracingSink::new("responses");
        sink.info("no subscriber installed");
        sink.error("still fine");
        assert_eq!(sink.component(), "responses");
    }

    #[test]
    fn resolve_prefers_injected_sink() {
        let injected: SharedSink = RecordingSink::shared();
        let fallback: SharedSink = TracingSink::shared("services");

        let chosen = resolve_sink(Some(injected.clone()), Some(&fallback), "Service").unwrap();
        assert!(Arc::ptr_eq(&chosen, &injected));

        let chosen = resolve_sink(None, Some(&fallback), "Service").unwrap();
        assert!(Arc::ptr_eq(&chosen, &fallback));
    }

    #[test]
    fn resolve_without_any_sink_is_a_config_error() {
        let err = resolve_sink(None, None, "ResponseFormatter").unwrap_err();
        assert!(matches!(
            err,
            crate::ConfigError::MissingLogger {
                component: "ResponseFormatter"
            }
        ));
    }

    #[test]
    fn log_level_display() {
        assert_eq!(LogLevel::Info.to_string(), "INFO");
        assert_eq!(LogLevel::Error.to_string(), "ERROR");
    }
}
