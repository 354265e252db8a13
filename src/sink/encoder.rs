//! Record encoding on top of `tracing_subscriber::fmt`.
//!
//! # Responsibilities
//! - Turn a record (level, message, fields, caller) into a `tracing` event
//! - Hand the event to a private `fmt` subscriber writing to the sink's
//!   writers: the JSON formatter for `json`, the full formatter for `text`
//!
//! # Design Decisions
//! - Records are dispatched straight to the sink's own `Dispatch`, never
//!   through the thread's default subscriber, so an application subscriber
//!   neither sees nor filters them
//! - Field names are only known at run time. Each level has one callsite;
//!   a field key is interned once per callsite and leaked, so memory grows
//!   with the number of distinct keys, not with the number of records
//! - Panic and fatal records are written at ERROR with a `severity` field

use std::collections::BTreeMap;
use std::fmt;
use std::io::{self, Write};
use std::sync::{Arc, PoisonError, RwLock};

use serde_json::Value as JsonValue;
use tracing::field::{display, DisplayValue, Field as EventField, FieldSet, Value};
use tracing::{Dispatch, Event, Metadata};
use tracing_core::callsite::Callsite;
use tracing_core::identify_callsite;
use tracing_core::metadata::Kind;
use tracing_core::subscriber::Interest;
use tracing_subscriber::fmt::time::ChronoUtc;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::SubscriberExt;

use crate::config::LogFormat;
use crate::logger::{Field, Level};

/// Event target of every record.
pub const RECORD_TARGET: &str = "spanlog";

/// UTC timestamps with microseconds and a `Z` suffix.
const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6fZ";

/// Values an event can carry: the message plus up to 31 fields.
const MAX_VALUES: usize = 32;

/// Source location of the emitting call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caller {
    pub file: &'static str,
    pub line: u32,
}

impl Caller {
    pub fn new(file: &'static str, line: u32) -> Self {
        Self { file, line }
    }
}

impl From<&'static std::panic::Location<'static>> for Caller {
    fn from(location: &'static std::panic::Location<'static>) -> Self {
        Self::new(location.file(), location.line())
    }
}

impl fmt::Display for Caller {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file, self.line)
    }
}

/// A single record handed to an encoder.
#[derive(Debug)]
pub struct Record<'a> {
    pub level: Level,
    pub message: &'a str,
    pub caller: Option<Caller>,
    /// Fields carried by the logger (module, trace ids, `with` fields).
    pub context: &'a [Field],
    /// Fields supplied at the call site.
    pub fields: &'a [Field],
    pub stacktrace: Option<String>,
}

impl Record<'_> {
    pub fn all_fields(&self) -> impl Iterator<Item = &Field> {
        self.context.iter().chain(self.fields.iter())
    }
}

/// Writes records to a sink's writers.
pub trait Encoder: Send + Sync + fmt::Debug {
    fn write(&self, record: &Record<'_>);

    /// Flush the underlying writers.
    fn flush(&self) -> io::Result<()>;
}

/// Encoder backed by a private `tracing_subscriber::fmt` subscriber.
pub struct FmtEncoder {
    format: LogFormat,
    dispatch: Dispatch,
    writer: SharedWriter,
}

impl FmtEncoder {
    pub fn new(format: LogFormat, writer: BoxMakeWriter) -> Self {
        let writer = SharedWriter(Arc::new(writer));
        let layer = tracing_subscriber::fmt::layer()
            .with_writer(writer.clone())
            .with_ansi(false)
            .with_target(false)
            .with_timer(ChronoUtc::new(TIMESTAMP_FORMAT.to_string()));

        let dispatch = match format {
            LogFormat::Json => Dispatch::new(
                tracing_subscriber::registry().with(
                    layer
                        .json()
                        .flatten_event(true)
                        .with_current_span(false)
                        .with_span_list(false),
                ),
            ),
            LogFormat::Text => Dispatch::new(tracing_subscriber::registry().with(layer)),
        };

        Self {
            format,
            dispatch,
            writer,
        }
    }

    /// One JSON object per line.
    pub fn json<M>(writer: M) -> Self
    where
        M: for<'a> MakeWriter<'a> + Send + Sync + 'static,
    {
        Self::new(LogFormat::Json, BoxMakeWriter::new(writer))
    }

    /// Human-readable lines.
    pub fn text<M>(writer: M) -> Self
    where
        M: for<'a> MakeWriter<'a> + Send + Sync + 'static,
    {
        Self::new(LogFormat::Text, BoxMakeWriter::new(writer))
    }

    pub fn format(&self) -> LogFormat {
        self.format
    }
}

impl Encoder for FmtEncoder {
    fn write(&self, record: &Record<'_>) {
        let callsite = RecordCallsite::for_level(record.level);
        let metadata = callsite.metadata;
        let Some(message_field) = metadata.fields().iter().next() else {
            return;
        };

        let caller = record.caller.map(display);
        let mut extra: Vec<(EventField, EventValue<'_>)> = Vec::new();
        if let Some(severity) = record.level.severity() {
            extra.extend(callsite.field("severity").map(|f| (f, EventValue::Str(severity))));
        }
        if let Some(caller) = caller {
            extra.extend(callsite.field("caller").map(|f| (f, EventValue::Caller(caller))));
        }
        for field in record.all_fields() {
            extra.extend(callsite.field(field.key()).map(|f| (f, EventValue::from(field.value()))));
        }
        if let Some(stacktrace) = record.stacktrace.as_deref() {
            extra.extend(callsite.field("stacktrace").map(|f| (f, EventValue::Str(stacktrace))));
        }

        let mut values: [(&EventField, Option<&dyn Value>); MAX_VALUES] =
            [(&message_field, None); MAX_VALUES];
        values[0].1 = Some(&record.message as &dyn Value);
        for (slot, (field, value)) in values.iter_mut().skip(1).zip(&extra) {
            *slot = (field, Some(value.as_value()));
        }

        let value_set = metadata.fields().value_set(&values);
        self.dispatch.event(&Event::new(metadata, &value_set));
    }

    fn flush(&self) -> io::Result<()> {
        self.writer.0.make_writer().flush()
    }
}

impl fmt::Debug for FmtEncoder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FmtEncoder")
            .field("format", &self.format)
            .finish_non_exhaustive()
    }
}

/// Build the encoder for a configured format.
pub fn encoder_for(format: LogFormat, writer: BoxMakeWriter) -> Box<dyn Encoder> {
    Box::new(FmtEncoder::new(format, writer))
}

/// Writer shared between the `fmt` layer and `Encoder::flush`.
#[derive(Clone)]
struct SharedWriter(Arc<BoxMakeWriter>);

impl<'a> MakeWriter<'a> for SharedWriter {
    type Writer = Box<dyn Write + 'a>;

    fn make_writer(&'a self) -> Self::Writer {
        self.0.make_writer()
    }
}

/// A field value in the shape `tracing` records it.
enum EventValue<'a> {
    Str(&'a str),
    I64(i64),
    U64(u64),
    F64(f64),
    Bool(bool),
    Caller(DisplayValue<Caller>),
    Json(DisplayValue<&'a JsonValue>),
}

impl<'a> From<&'a JsonValue> for EventValue<'a> {
    fn from(value: &'a JsonValue) -> Self {
        match value {
            JsonValue::String(s) => EventValue::Str(s),
            JsonValue::Bool(b) => EventValue::Bool(*b),
            JsonValue::Number(n) => match (n.as_i64(), n.as_u64(), n.as_f64()) {
                (Some(i), _, _) => EventValue::I64(i),
                (_, Some(u), _) => EventValue::U64(u),
                (_, _, Some(f)) => EventValue::F64(f),
                _ => EventValue::Json(display(value)),
            },
            other => EventValue::Json(display(other)),
        }
    }
}

impl EventValue<'_> {
    fn as_value(&self) -> &dyn Value {
        match self {
            EventValue::Str(s) => s,
            EventValue::I64(i) => i,
            EventValue::U64(u) => u,
            EventValue::F64(f) => f,
            EventValue::Bool(b) => b,
            EventValue::Caller(c) => c,
            EventValue::Json(j) => j,
        }
    }
}

/// Static callsite for the records of one level.
struct RecordCallsite {
    metadata: &'static Metadata<'static>,
    keys: RwLock<BTreeMap<String, EventField>>,
}

impl RecordCallsite {
    const fn new(metadata: &'static Metadata<'static>) -> Self {
        Self {
            metadata,
            keys: RwLock::new(BTreeMap::new()),
        }
    }

    fn for_level(level: Level) -> &'static RecordCallsite {
        match level {
            Level::Debug => &DEBUG_CALLSITE,
            Level::Info => &INFO_CALLSITE,
            Level::Warn => &WARN_CALLSITE,
            Level::Error | Level::Panic | Level::Fatal => &ERROR_CALLSITE,
        }
    }

    /// The event field named `key` on this callsite.
    fn field(&'static self, key: &str) -> Option<EventField> {
        if let Some(field) = self.keys.read().unwrap_or_else(PoisonError::into_inner).get(key) {
            return Some(field.clone());
        }

        let mut keys = self.keys.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(field) = keys.get(key) {
            return Some(field.clone());
        }
        let name: &'static str = Box::leak(key.to_owned().into_boxed_str());
        let names: &'static [&'static str] = Box::leak(Box::new([name]));
        let field = FieldSet::new(names, identify_callsite!(self)).iter().next()?;
        keys.insert(key.to_owned(), field.clone());
        Some(field)
    }
}

impl Callsite for RecordCallsite {
    fn set_interest(&self, _interest: Interest) {}

    fn metadata(&self) -> &Metadata<'_> {
        self.metadata
    }
}

macro_rules! record_callsite {
    ($callsite:ident, $metadata:ident, $level:expr) => {
        static $callsite: RecordCallsite = RecordCallsite::new(&$metadata);
        static $metadata: Metadata<'static> = Metadata::new(
            "record",
            RECORD_TARGET,
            $level,
            None,
            None,
            None,
            FieldSet::new(&["message"], identify_callsite!(&$callsite)),
            Kind::EVENT,
        );
    };
}

record_callsite!(DEBUG_CALLSITE, DEBUG_METADATA, tracing::Level::DEBUG);
record_callsite!(INFO_CALLSITE, INFO_METADATA, tracing::Level::INFO);
record_callsite!(WARN_CALLSITE, WARN_METADATA, tracing::Level::WARN);
record_callsite!(ERROR_CALLSITE, ERROR_METADATA, tracing::Level::ERROR);
