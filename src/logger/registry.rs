//! Logger registry.
//!
//! # Responsibilities
//! - Hold the current logger behind an atomically swappable reference
//! - Compose validation, sink resolution and tracing start into `initialize`
//! - Provide the process-wide default handle used by the free functions
//!
//! # Design Decisions
//! - `ArcSwap` gives readers a lock-free snapshot; writers replace the whole
//!   logger, never a part of it
//! - `initialize` swaps only after every fallible step succeeded, so a
//!   failed call leaves the previous logger in place
//! - Handles are cheap to clone and can be injected instead of using the
//!   process-wide default

use std::panic::Location;
use std::sync::{Arc, LazyLock};

use arc_swap::ArcSwap;
use opentelemetry::Context;

use crate::config::{validate_config, Config};
use crate::error::LogError;
use crate::logger::{field, Field, Level, Logger};
use crate::sink::{build_sink, Caller, InitOptions};
use crate::trace::TracingAgent;

static GLOBAL: LazyLock<LoggerHandle> = LazyLock::new(LoggerHandle::default);

/// A shared, replaceable reference to the current logger.
#[derive(Debug, Clone)]
pub struct LoggerHandle {
    current: Arc<ArcSwap<Logger>>,
}

impl LoggerHandle {
    pub fn new(logger: Logger) -> Self {
        Self {
            current: Arc::new(ArcSwap::from_pointee(logger)),
        }
    }

    /// The process-wide handle used by `spanlog::info` and friends.
    pub fn global() -> &'static LoggerHandle {
        &GLOBAL
    }

    /// Snapshot of the current logger.
    ///
    /// The snapshot keeps writing to the sink it was taken from even after
    /// the handle is re-initialized.
    pub fn current(&self) -> Logger {
        Logger::clone(&self.current.load())
    }

    /// Replace the current logger.
    pub fn set(&self, logger: Logger) {
        self.current.store(Arc::new(logger));
    }

    /// Validate `config`, build its sink, start tracing for its endpoint and
    /// install the resulting logger.
    ///
    /// On error nothing is replaced. Tracing problems never fail this call;
    /// they are reported through the agent's error handler.
    pub fn initialize(
        &self,
        config: &Config,
        options: InitOptions,
        agent: &TracingAgent,
    ) -> Result<(), LogError> {
        validate_config(config).map_err(LogError::Validation)?;

        let sink = build_sink(config, options)?;

        agent.start(&config.trace);

        self.set(Logger::new(sink));
        self.named("spanlog").debug(
            "logger initialized",
            &[
                field("format", config.format.clone()),
                field("mode", config.mode.clone()),
                field("tracing", agent.is_started(&config.trace.endpoint)),
            ],
        );
        Ok(())
    }

    /// Returns true if the current logger writes records at `level`.
    pub fn enabled(&self, level: Level) -> bool {
        self.current.load().enabled(level)
    }

    #[track_caller]
    pub fn emit(&self, level: Level, message: &str, fields: &[Field]) {
        self.current.load().emit(level, message, fields);
    }

    #[track_caller]
    pub fn debug(&self, message: &str, fields: &[Field]) {
        self.log(Level::Debug, message, fields, Location::caller().into());
    }

    #[track_caller]
    pub fn info(&self, message: &str, fields: &[Field]) {
        self.log(Level::Info, message, fields, Location::caller().into());
    }

    #[track_caller]
    pub fn warn(&self, message: &str, fields: &[Field]) {
        self.log(Level::Warn, message, fields, Location::caller().into());
    }

    #[track_caller]
    pub fn error(&self, message: &str, fields: &[Field]) {
        self.log(Level::Error, message, fields, Location::caller().into());
    }

    #[track_caller]
    pub fn panic(&self, message: &str, fields: &[Field]) -> ! {
        self.current().panic(message, fields)
    }

    #[track_caller]
    pub fn fatal(&self, message: &str, fields: &[Field]) -> ! {
        self.current().fatal(message, fields)
    }

    /// Snapshot child carrying a `module` field.
    pub fn named(&self, name: &str) -> Logger {
        self.current.load().named(name)
    }

    /// Snapshot child carrying additional fields.
    pub fn with(&self, fields: impl IntoIterator<Item = Field>) -> Logger {
        self.current.load().with(fields)
    }

    /// Snapshot child carrying the trace and span ids of `cx`, if any.
    pub fn with_context(&self, cx: &Context) -> Logger {
        self.current.load().with_context(cx)
    }

    /// Flush the current logger's writers.
    pub fn flush(&self) -> std::io::Result<()> {
        self.current.load().flush()
    }

    fn log(&self, level: Level, message: &str, fields: &[Field], caller: Caller) {
        self.current.load().log_at(level, message, fields, Some(caller));
    }
}

impl Default for LoggerHandle {
    fn default() -> Self {
        Self::new(Logger::default())
    }
}

/// Initialize the process-wide logger and tracing agent from `config`.
pub fn initialize(config: &Config) -> Result<(), LogError> {
    initialize_with(config, InitOptions::default())
}

/// Like [`initialize`], with extra or replacement writers.
pub fn initialize_with(config: &Config, options: InitOptions) -> Result<(), LogError> {
    LoggerHandle::global().initialize(config, options, TracingAgent::global())
}

/// Snapshot of the process-wide logger.
pub fn logger() -> Logger {
    LoggerHandle::global().current()
}

/// Replace the process-wide logger.
pub fn set_logger(logger: Logger) {
    LoggerHandle::global().set(logger);
}

#[track_caller]
pub fn emit(level: Level, message: &str, fields: &[Field]) {
    LoggerHandle::global().emit(level, message, fields);
}

#[track_caller]
pub fn debug(message: &str, fields: &[Field]) {
    LoggerHandle::global().debug(message, fields);
}

#[track_caller]
pub fn info(message: &str, fields: &[Field]) {
    LoggerHandle::global().info(message, fields);
}

#[track_caller]
pub fn warn(message: &str, fields: &[Field]) {
    LoggerHandle::global().warn(message, fields);
}

#[track_caller]
pub fn error(message: &str, fields: &[Field]) {
    LoggerHandle::global().error(message, fields);
}

/// Emit at panic level, then panic.
#[track_caller]
pub fn panic(message: &str, fields: &[Field]) -> ! {
    LoggerHandle::global().panic(message, fields)
}

/// Emit at fatal level, flush, then exit the process.
#[track_caller]
pub fn fatal(message: &str, fields: &[Field]) -> ! {
    LoggerHandle::global().fatal(message, fields)
}

/// Returns true if the process-wide logger writes records at `level`.
pub fn enabled(level: Level) -> bool {
    LoggerHandle::global().enabled(level)
}

/// Snapshot of the process-wide logger scoped to a module name.
pub fn named(name: &str) -> Logger {
    LoggerHandle::global().named(name)
}

/// Snapshot of the process-wide logger carrying additional fields.
pub fn with(fields: impl IntoIterator<Item = Field>) -> Logger {
    LoggerHandle::global().with(fields)
}

/// Snapshot of the process-wide logger carrying the ids of `cx`.
pub fn with_context(cx: &Context) -> Logger {
    LoggerHandle::global().with_context(cx)
}

/// Like [`with_context`], using the thread's current OpenTelemetry context.
pub fn with_current_context() -> Logger {
    with_context(&Context::current())
}

/// Flush the process-wide logger.
pub fn flush() -> std::io::Result<()> {
    LoggerHandle::global().flush()
}
