//! Logging configuration options.
use serde::Deserialize;
use serde::Serialize;

/// Minimum severity of log records to emit.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Critical,
    Error,
    #[serde(alias = "warn")]
    Warning,
    #[default]
    #[serde(alias = "notice")]
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for slog::Level {
    fn from(value: LogLevel) -> Self {
        match value {
            LogLevel::Critical => slog::Level::Critical,
            LogLevel::Error => slog::Level::Error,
            LogLevel::Warning => slog::Level::Warning,
            LogLevel::Info => slog::Level::Info,
            LogLevel::Debug => slog::Level::Debug,
            LogLevel::Trace => slog::Level::Trace,
        }
    }
}

/// Logging configuration options.
#[derive(Clone, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
pub struct LoggingConf {
    /// Flush logs asynchronously.
    #[serde(default = "LoggingConf::default_async", rename = "async")]
    pub asynchronous: bool,

    /// Minimum severity of log records to emit.
    #[serde(default)]
    pub level: LogLevel,
}

impl Default for LoggingConf {
    fn default() -> LoggingConf {
        LoggingConf {
            asynchronous: Self::default_async(),
            level: LogLevel::default(),
        }
    }
}

impl LoggingConf {
    /// Default value for `async` used by serde.
    fn default_async() -> bool {
        true
    }
}
