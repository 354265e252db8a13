//! Record severity.

use std::fmt;
use std::str::FromStr;

use crate::config::validation::ValidationError;

/// Severity of a log record, ordered from least to most severe.
///
/// Only `Debug` through `Error` can be configured as a minimum level;
/// `Panic` and `Fatal` are always emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Level {
    Debug,
    Info,
    Warn,
    Error,
    /// Emitted, then the calling thread panics.
    Panic,
    /// Emitted and flushed, then the process exits.
    Fatal,
}

impl Level {
    /// Lowercase name, as accepted in configuration.
    pub fn as_str(self) -> &'static str {
        match self {
            Level::Debug => "debug",
            Level::Info => "info",
            Level::Warn => "warn",
            Level::Error => "error",
            Level::Panic => "panic",
            Level::Fatal => "fatal",
        }
    }

    /// Name carried in the `severity` field of records above `Error`,
    /// which are written at the ERROR level.
    pub fn severity(self) -> Option<&'static str> {
        match self {
            Level::Panic => Some("panic"),
            Level::Fatal => Some("fatal"),
            _ => None,
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Level {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "debug" => Ok(Level::Debug),
            "info" => Ok(Level::Info),
            "warn" => Ok(Level::Warn),
            "error" => Ok(Level::Error),
            other => Err(ValidationError::Level(other.to_string())),
        }
    }
}

impl From<tracing::Level> for Level {
    fn from(level: tracing::Level) -> Self {
        match level {
            tracing::Level::TRACE | tracing::Level::DEBUG => Level::Debug,
            tracing::Level::INFO => Level::Info,
            tracing::Level::WARN => Level::Warn,
            tracing::Level::ERROR => Level::Error,
        }
    }
}
