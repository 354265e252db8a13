//! Configuration schema definitions.
//!
//! The structures here mirror the configuration file one-to-one: enumerated
//! settings stay as strings so a bad value survives deserialization and is
//! reported by [`validate_config`](super::validation::validate_config) with
//! the offending field named. The typed views ([`LogFormat`], [`SinkMode`],
//! [`RotationPolicy`], [`ExporterKind`]) are parsed from those strings once
//! validation has passed.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::config::validation::ValidationError;

/// Root logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Minimum level (debug, info, warn, error).
    pub level: String,

    /// Record encoding (json, text).
    pub format: String,

    /// Sink mode (file, console, or empty for both).
    pub mode: String,

    /// Rotating file sink settings.
    pub file: FileConfig,

    /// Distributed tracing settings.
    pub trace: TraceConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "text".to_string(),
            mode: "console".to_string(),
            file: FileConfig::default(),
            trace: TraceConfig::default(),
        }
    }
}

/// Rotating file sink configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct FileConfig {
    /// Directory holding the active and rotated log files.
    pub directory: String,

    /// File name; rotated files get a date suffix appended.
    pub filename: String,

    /// Rotation cadence (minutely, hourly, daily, never).
    pub rotation: String,

    /// Number of log files to retain. `None` keeps every file.
    pub max_files: Option<usize>,
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            directory: "logs".to_string(),
            filename: "spanlog.log".to_string(),
            rotation: "daily".to_string(),
            max_files: None,
        }
    }
}

/// Distributed tracing configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct TraceConfig {
    /// Service name recorded on every exported span.
    pub name: String,

    /// Collector endpoint. Empty keeps spans local (no export).
    pub endpoint: String,

    /// Sampling ratio for root spans, 0.0 to 1.0.
    pub sampler: f64,

    /// Exporter kind (jaeger, zipkin).
    pub batcher: String,
}

impl Default for TraceConfig {
    fn default() -> Self {
        Self {
            name: "spanlog".to_string(),
            endpoint: String::new(),
            sampler: 1.0,
            batcher: String::new(),
        }
    }
}

/// Record encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// One JSON object per line, production field set.
    Json,
    /// Tab separated, human readable, development field set.
    Text,
}

impl FromStr for LogFormat {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "json" => Ok(LogFormat::Json),
            "text" => Ok(LogFormat::Text),
            other => Err(ValidationError::Format(other.to_string())),
        }
    }
}

/// Which writers receive output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkMode {
    File,
    Console,
    /// File and console (the empty mode string).
    Both,
}

impl SinkMode {
    /// Returns true if this mode opens the rotating file sink.
    pub fn writes_file(self) -> bool {
        matches!(self, SinkMode::File | SinkMode::Both)
    }

    /// Returns true if this mode writes to the console.
    pub fn writes_console(self) -> bool {
        matches!(self, SinkMode::Console | SinkMode::Both)
    }
}

impl FromStr for SinkMode {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "file" => Ok(SinkMode::File),
            "console" => Ok(SinkMode::Console),
            "" => Ok(SinkMode::Both),
            other => Err(ValidationError::Mode(other.to_string())),
        }
    }
}

/// Rotation cadence of the file sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RotationPolicy {
    Minutely,
    Hourly,
    Daily,
    Never,
}

impl FromStr for RotationPolicy {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "minutely" => Ok(RotationPolicy::Minutely),
            "hourly" => Ok(RotationPolicy::Hourly),
            "daily" => Ok(RotationPolicy::Daily),
            "never" => Ok(RotationPolicy::Never),
            other => Err(ValidationError::Rotation(other.to_string())),
        }
    }
}

/// Span exporter protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExporterKind {
    Jaeger,
    Zipkin,
}

impl ExporterKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ExporterKind::Jaeger => "jaeger",
            ExporterKind::Zipkin => "zipkin",
        }
    }
}

impl fmt::Display for ExporterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExporterKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "jaeger" => Ok(ExporterKind::Jaeger),
            "zipkin" => Ok(ExporterKind::Zipkin),
            other => Err(ValidationError::Batcher(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.level, "info");
        assert_eq!(config.format, "text");
        assert_eq!(config.mode, "console");
        assert_eq!(config.file.rotation, "daily");
        assert!(config.trace.endpoint.is_empty());
        assert_eq!(config.trace.sampler, 1.0);
    }

    #[test]
    fn test_empty_mode_means_both() {
        let mode: SinkMode = "".parse().unwrap();
        assert_eq!(mode, SinkMode::Both);
        assert!(mode.writes_file());
        assert!(mode.writes_console());

        let mode: SinkMode = "console".parse().unwrap();
        assert!(!mode.writes_file());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: Config = toml::from_str(
            r#"
            level = "debug"

            [trace]
            endpoint = "collector:9411"
            batcher = "zipkin"
            "#,
        )
        .unwrap();

        assert_eq!(config.level, "debug");
        assert_eq!(config.format, "text");
        assert_eq!(config.trace.name, "spanlog");
        assert_eq!(config.trace.batcher.parse::<ExporterKind>().unwrap(), ExporterKind::Zipkin);
    }

    #[test]
    fn test_unknown_exporter_kind() {
        let err = "otlp".parse::<ExporterKind>().unwrap_err();
        assert_eq!(err, ValidationError::Batcher("otlp".to_string()));
    }
}
