//! Initialization errors.

use thiserror::Error;
use tracing_appender::rolling::InitError;

use crate::config::loader::join_errors;
use crate::config::ValidationError;

/// Errors surfaced by `initialize`.
///
/// Only configuration-shape problems appear here. Tracing failures are
/// reported through the agent's error handler and never fail initialization.
#[derive(Debug, Error)]
pub enum LogError {
    /// The configuration was rejected; nothing was replaced.
    #[error("invalid configuration: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),

    /// The format names no known encoder.
    #[error("unknown log format {0:?}")]
    UnknownFormat(String),

    /// The rotating file sink could not be opened.
    #[error("failed to open log file: {0}")]
    FileSink(#[from] InitError),
}

/// Result type for logger initialization.
pub type LogResult<T> = Result<T, LogError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = LogError::Validation(vec![
            ValidationError::Level("verbose".into()),
            ValidationError::Mode("syslog".into()),
        ]);
        let text = err.to_string();
        assert!(text.starts_with("invalid configuration: level:"));
        assert!(text.contains(", mode:"));

        assert_eq!(LogError::UnknownFormat("xml".into()).to_string(), "unknown log format \"xml\"");
    }
}
