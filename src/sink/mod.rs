//! Sink resolution.
//!
//! # Data Flow
//! ```text
//! Config (validated)
//!     → mode selects writers: file | console | file + console
//!     → caller-supplied writers appended (always)
//!     → writer.rs tees them into one MakeWriter
//!     → format selects the fmt formatter in encoder.rs: json | text
//!     → Sink (encoder over the writers + minimum level)
//! ```
//!
//! # Design Decisions
//! - A sink is built fresh for every initialization and owns its file handle;
//!   the handle closes when the last logger sharing the sink is dropped
//! - An unknown format is an error, never a fallback encoding
//! - The format is checked before the file is opened, so a rejected config
//!   leaves nothing behind on disk

pub mod encoder;
pub mod writer;

use std::fmt;

use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::fmt::MakeWriter;

use crate::config::{Config, LogFormat, RotationPolicy, SinkMode};
use crate::error::LogError;
use crate::logger::Level;

pub use encoder::{Caller, Encoder, FmtEncoder, Record};

/// Writer overrides supplied by the caller of `initialize`.
#[derive(Default)]
pub struct InitOptions {
    writers: Vec<BoxMakeWriter>,
    console: Option<BoxMakeWriter>,
}

impl InitOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an extra writer. It receives every record regardless of mode.
    pub fn with_writer<M>(mut self, writer: M) -> Self
    where
        M: for<'a> MakeWriter<'a> + Send + Sync + 'static,
    {
        self.writers.push(BoxMakeWriter::new(writer));
        self
    }

    /// Replace standard output as the console writer.
    pub fn with_console<M>(mut self, writer: M) -> Self
    where
        M: for<'a> MakeWriter<'a> + Send + Sync + 'static,
    {
        self.console = Some(BoxMakeWriter::new(writer));
        self
    }
}

impl fmt::Debug for InitOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InitOptions")
            .field("writers", &self.writers.len())
            .field("console", &self.console.is_some())
            .finish()
    }
}

/// An encoder bound to its writers and minimum level.
pub struct Sink {
    encoder: Box<dyn Encoder>,
    level: Level,
}

impl Sink {
    pub fn new(encoder: Box<dyn Encoder>, level: Level) -> Self {
        Self { encoder, level }
    }

    /// Text records to standard output at `level`.
    pub fn console(level: Level) -> Self {
        Self::new(Box::new(FmtEncoder::text(std::io::stdout)), level)
    }

    pub fn level(&self) -> Level {
        self.level
    }

    /// Returns true if records at `level` reach the writers.
    pub fn enabled(&self, level: Level) -> bool {
        level >= self.level
    }

    /// Encode and write one record.
    pub fn write(&self, record: &Record<'_>) {
        self.encoder.write(record);
    }

    /// Flush every writer.
    pub fn flush(&self) -> std::io::Result<()> {
        self.encoder.flush()
    }
}

impl fmt::Debug for Sink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sink")
            .field("encoder", &self.encoder)
            .field("level", &self.level)
            .finish_non_exhaustive()
    }
}

/// Resolve the writers and encoder described by `config`.
pub fn build_sink(config: &Config, options: InitOptions) -> Result<Sink, LogError> {
    let format: LogFormat = config
        .format
        .parse()
        .map_err(|_| LogError::UnknownFormat(config.format.clone()))?;
    let level: Level = config.level.parse().map_err(|e| LogError::Validation(vec![e]))?;
    let mode: SinkMode = config.mode.parse().map_err(|e| LogError::Validation(vec![e]))?;

    let mut writers = Vec::with_capacity(2 + options.writers.len());
    if mode.writes_file() {
        let rotation: RotationPolicy = config
            .file
            .rotation
            .parse()
            .map_err(|e| LogError::Validation(vec![e]))?;
        let appender = writer::rolling_file(&config.file, rotation)?;
        writers.push(BoxMakeWriter::new(appender));
    }
    if mode.writes_console() {
        writers.push(
            options
                .console
                .unwrap_or_else(|| BoxMakeWriter::new(std::io::stdout)),
        );
    }
    writers.extend(options.writers);

    Ok(Sink::new(
        encoder::encoder_for(format, writer::tee(writers)),
        level,
    ))
}
