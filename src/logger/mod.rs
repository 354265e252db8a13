//! Logger subsystem.
//!
//! # Data Flow
//! ```text
//! emission (spanlog::info, Logger::info, tracing::info! via LogLayer)
//!     → registry.rs: snapshot of the current Logger (lock-free load)
//!     → context.rs: optional traceId/spanId fields (derived logger)
//!     → Logger: level check, caller, stacktrace for error and above
//!     → Sink: encode + write to every writer
//! ```
//!
//! # Design Decisions
//! - A Logger is an immutable view: a shared sink plus fixed fields
//! - Deriving (with, named, with_context) allocates a new view and never
//!   mutates the logger it came from
//! - Emission functions read the handle on every call, so re-initialization
//!   is observed by every later record

pub mod context;
pub mod field;
pub mod layer;
pub mod level;
pub mod registry;

use std::backtrace::{Backtrace, BacktraceStatus};
use std::panic::Location;
use std::sync::Arc;

use crate::sink::{Caller, Record, Sink};

pub use field::{field, Field};
pub use layer::LogLayer;
pub use level::Level;
pub use registry::LoggerHandle;

/// Field key carried by loggers returned from [`Logger::named`].
pub const MODULE_KEY: &str = "module";

/// A sink plus the fields attached to every record it emits.
#[derive(Debug, Clone)]
pub struct Logger {
    sink: Arc<Sink>,
    fields: Arc<[Field]>,
}

impl Logger {
    pub fn new(sink: Sink) -> Self {
        Self::from_shared(Arc::new(sink))
    }

    pub fn from_shared(sink: Arc<Sink>) -> Self {
        Self {
            sink,
            fields: Arc::from(Vec::new()),
        }
    }

    /// Fields attached to every record of this logger.
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Returns true if a record at `level` would be written.
    pub fn enabled(&self, level: Level) -> bool {
        self.sink.enabled(level)
    }

    /// Derive a logger carrying additional fields.
    pub fn with(&self, fields: impl IntoIterator<Item = Field>) -> Logger {
        let mut combined = self.fields.to_vec();
        combined.extend(fields);
        Self {
            sink: Arc::clone(&self.sink),
            fields: combined.into(),
        }
    }

    /// Derive a logger scoped to a module name.
    ///
    /// Naming an already named logger joins the names with a dot.
    pub fn named(&self, name: &str) -> Logger {
        let mut fields = self.fields.to_vec();
        match fields.iter_mut().find(|f| f.key() == MODULE_KEY) {
            Some(existing) => {
                let parent = existing.value().as_str().unwrap_or_default().to_string();
                *existing = field(MODULE_KEY, format!("{parent}.{name}"));
            }
            None => fields.push(field(MODULE_KEY, name.to_string())),
        }
        Self {
            sink: Arc::clone(&self.sink),
            fields: fields.into(),
        }
    }

    #[track_caller]
    pub fn emit(&self, level: Level, message: &str, fields: &[Field]) {
        let caller = Caller::from(Location::caller());
        match level {
            Level::Panic => self.panic_at(message, fields, caller),
            Level::Fatal => self.fatal_at(message, fields, caller),
            _ => self.log_at(level, message, fields, Some(caller)),
        }
    }

    #[track_caller]
    pub fn debug(&self, message: &str, fields: &[Field]) {
        self.log_at(Level::Debug, message, fields, Some(Location::caller().into()));
    }

    #[track_caller]
    pub fn info(&self, message: &str, fields: &[Field]) {
        self.log_at(Level::Info, message, fields, Some(Location::caller().into()));
    }

    #[track_caller]
    pub fn warn(&self, message: &str, fields: &[Field]) {
        self.log_at(Level::Warn, message, fields, Some(Location::caller().into()));
    }

    #[track_caller]
    pub fn error(&self, message: &str, fields: &[Field]) {
        self.log_at(Level::Error, message, fields, Some(Location::caller().into()));
    }

    /// Emit at panic level, then panic with `message`.
    #[track_caller]
    pub fn panic(&self, message: &str, fields: &[Field]) -> ! {
        self.panic_at(message, fields, Location::caller().into())
    }

    /// Emit at fatal level, flush, then exit the process with status 1.
    #[track_caller]
    pub fn fatal(&self, message: &str, fields: &[Field]) -> ! {
        self.fatal_at(message, fields, Location::caller().into())
    }

    /// Flush every writer of the underlying sink.
    pub fn flush(&self) -> std::io::Result<()> {
        self.sink.flush()
    }

    fn panic_at(&self, message: &str, fields: &[Field], caller: Caller) -> ! {
        self.log_at(Level::Panic, message, fields, Some(caller));
        panic!("{message}");
    }

    fn fatal_at(&self, message: &str, fields: &[Field], caller: Caller) -> ! {
        self.log_at(Level::Fatal, message, fields, Some(caller));
        let _ = self.flush();
        std::process::exit(1);
    }

    pub(crate) fn log_at(&self, level: Level, message: &str, fields: &[Field], caller: Option<Caller>) {
        if !self.sink.enabled(level) {
            return;
        }

        let stacktrace = if level >= Level::Error {
            let backtrace = Backtrace::capture();
            (backtrace.status() == BacktraceStatus::Captured).then(|| backtrace.to_string())
        } else {
            None
        };

        self.sink.write(&Record {
            level,
            message,
            caller,
            context: &self.fields,
            fields,
            stacktrace,
        });
    }
}

impl Default for Logger {
    /// Text records to standard output at info level.
    fn default() -> Self {
        Logger::new(Sink::console(Level::Info))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::FmtEncoder;
    use std::io::Write;
    use std::sync::Mutex;
    use tracing_subscriber::fmt::MakeWriter;

    #[derive(Clone, Default)]
    struct Buffer(Arc<Mutex<Vec<u8>>>);

    impl Buffer {
        fn lines(&self) -> Vec<serde_json::Value> {
            let bytes = self.0.lock().unwrap();
            String::from_utf8_lossy(&bytes)
                .lines()
                .map(|l| serde_json::from_str(l).unwrap())
                .collect()
        }
    }

    impl Write for Buffer {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for Buffer {
        type Writer = Buffer;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    fn json_logger(level: Level) -> (Logger, Buffer) {
        let buffer = Buffer::default();
        let sink = Sink::new(Box::new(FmtEncoder::json(buffer.clone())), level);
        (Logger::new(sink), buffer)
    }

    #[test]
    fn test_level_filtering() {
        let (logger, buffer) = json_logger(Level::Info);
        logger.debug("hidden", &[]);
        logger.info("shown", &[]);

        let lines = buffer.lines();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0]["message"], "shown");
        assert_eq!(lines[0]["level"], "INFO");
    }

    #[test]
    fn test_caller_points_at_call_site() {
        let (logger, buffer) = json_logger(Level::Debug);
        logger.warn("here", &[]);

        let caller = buffer.lines()[0]["caller"].as_str().unwrap().to_string();
        assert!(caller.starts_with(file!()), "caller was {caller}");
    }

    #[test]
    fn test_with_does_not_mutate_parent() {
        let (logger, buffer) = json_logger(Level::Debug);
        let child = logger.with([field("request_id", "abc")]);

        child.info("child", &[]);
        logger.info("parent", &[]);

        let lines = buffer.lines();
        assert_eq!(lines[0]["request_id"], "abc");
        assert!(lines[1].get("request_id").is_none());
        assert!(logger.fields().is_empty());
    }

    #[test]
    fn test_named_joins_names() {
        let (logger, buffer) = json_logger(Level::Debug);
        logger.named("plugins").named("auth").info("loaded", &[field("count", 2)]);

        let lines = buffer.lines();
        assert_eq!(lines[0]["module"], "plugins.auth");
        assert_eq!(lines[0]["count"], 2);
    }

    #[test]
    fn test_panic_emits_before_unwinding() {
        let (logger, buffer) = json_logger(Level::Error);
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            logger.panic("invariant broken", &[]);
        }));

        assert!(result.is_err());
        let lines = buffer.lines();
        assert_eq!(lines[0]["level"], "ERROR");
        assert_eq!(lines[0]["severity"], "panic");
        assert_eq!(lines[0]["message"], "invariant broken");
    }

    #[test]
    fn test_emit_dispatches_on_level() {
        let (logger, buffer) = json_logger(Level::Debug);
        logger.emit(Level::Error, "boom", &[field("code", 7)]);

        let lines = buffer.lines();
        assert_eq!(lines[0]["level"], "ERROR");
        assert_eq!(lines[0]["code"], 7);
    }
}
