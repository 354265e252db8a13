//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check enumerated values (level, format, mode, rotation, batcher)
//! - Validate value ranges (sampler ratio, retained file count)
//! - Check conditional requirements (file name when the file sink is used)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: Config → Result<(), Vec<ValidationError>>
//! - Runs before any sink is built, so a rejected config mutates nothing
//! - An endpoint with an empty batcher is accepted here; the tracing agent
//!   reports it and leaves tracing inert

use thiserror::Error;

use crate::config::schema::{Config, ExporterKind, LogFormat, RotationPolicy, SinkMode};
use crate::logger::Level;

/// A single rejected configuration field.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("level: unsupported value {0:?} (expected debug, info, warn or error)")]
    Level(String),

    #[error("format: unsupported value {0:?} (expected json or text)")]
    Format(String),

    #[error("mode: unsupported value {0:?} (expected file, console or empty)")]
    Mode(String),

    #[error("file.rotation: unsupported value {0:?} (expected minutely, hourly, daily or never)")]
    Rotation(String),

    #[error("file.filename: must not be empty when mode writes to a file")]
    EmptyFilename,

    #[error("file.max_files: must be greater than zero")]
    ZeroMaxFiles,

    #[error("trace.sampler: {0} is outside [0, 1]")]
    Sampler(f64),

    #[error("trace.batcher: unsupported value {0:?} (expected jaeger, zipkin or empty)")]
    Batcher(String),
}

impl ValidationError {
    /// Dotted path of the offending field.
    pub fn field(&self) -> &'static str {
        match self {
            ValidationError::Level(_) => "level",
            ValidationError::Format(_) => "format",
            ValidationError::Mode(_) => "mode",
            ValidationError::Rotation(_) => "file.rotation",
            ValidationError::EmptyFilename => "file.filename",
            ValidationError::ZeroMaxFiles => "file.max_files",
            ValidationError::Sampler(_) => "trace.sampler",
            ValidationError::Batcher(_) => "trace.batcher",
        }
    }
}

/// Validate a configuration, collecting every rejected field.
pub fn validate_config(config: &Config) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if let Err(e) = config.level.parse::<Level>() {
        errors.push(e);
    }
    if let Err(e) = config.format.parse::<LogFormat>() {
        errors.push(e);
    }

    match config.mode.parse::<SinkMode>() {
        Ok(mode) if mode.writes_file() => {
            if let Err(e) = config.file.rotation.parse::<RotationPolicy>() {
                errors.push(e);
            }
            if config.file.filename.trim().is_empty() {
                errors.push(ValidationError::EmptyFilename);
            }
            if config.file.max_files == Some(0) {
                errors.push(ValidationError::ZeroMaxFiles);
            }
        }
        Ok(_) => {}
        Err(e) => errors.push(e),
    }

    // NaN fails the range check as well
    if !(0.0..=1.0).contains(&config.trace.sampler) {
        errors.push(ValidationError::Sampler(config.trace.sampler));
    }
    if !config.trace.batcher.is_empty() {
        if let Err(e) = config.trace.batcher.parse::<ExporterKind>() {
            errors.push(e);
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
