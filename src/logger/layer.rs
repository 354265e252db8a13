//! Bridge from `tracing` events to the logger registry.
//!
//! # Responsibilities
//! - Collect event fields into `Field`s
//! - Map `tracing` levels onto `Level`
//! - Attach trace and span ids of the current OpenTelemetry context
//!
//! # Design Decisions
//! - The layer reads the handle per event, so it follows re-initialization
//! - `message` becomes the record message; the event target is kept as a
//!   `target` field
//! - TRACE is folded into debug
//! - `opentelemetry*` events are left to the export error layer, so an
//!   exporter failure is reported once and logging it cannot feed back
//!   into the exporter

use std::fmt;

use opentelemetry::Context;
use tracing::field::{Field as TracingField, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::{self, Layer};

use crate::logger::{field, Field, Level, LoggerHandle};
use crate::sink::Caller;
use crate::trace::hook::is_export_target;
use crate::trace::TracingAgent;

/// A `tracing_subscriber` layer writing every event through a handle.
#[derive(Debug, Clone)]
pub struct LogLayer {
    handle: LoggerHandle,
}

impl LogLayer {
    pub fn new(handle: LoggerHandle) -> Self {
        Self { handle }
    }

    /// A layer writing through the process-wide handle.
    pub fn global() -> Self {
        Self::new(LoggerHandle::global().clone())
    }
}

impl<S: Subscriber> Layer<S> for LogLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: layer::Context<'_, S>) {
        let metadata = event.metadata();
        if is_export_target(metadata.target()) {
            return;
        }
        let level = Level::from(*metadata.level());

        let logger = self.handle.current();
        if !logger.enabled(level) {
            return;
        }

        let mut visitor = FieldVisitor::default();
        event.record(&mut visitor);
        visitor.fields.push(field("target", metadata.target()));

        let caller = metadata
            .file()
            .zip(metadata.line())
            .map(|(file, line)| Caller::new(file, line));

        logger
            .with_context(&Context::current())
            .log_at(level, &visitor.message, &visitor.fields, caller);
    }
}

/// Layer for an application's subscriber: `tracing` events go to the
/// process-wide logger and exporter errors to the process-wide agent's
/// error handler.
///
/// ```no_run
/// use tracing_subscriber::layer::SubscriberExt;
/// use tracing_subscriber::util::SubscriberInitExt;
///
/// tracing_subscriber::registry().with(spanlog::layer()).init();
/// ```
pub fn layer<S: Subscriber>() -> impl Layer<S> {
    LogLayer::global().and_then(TracingAgent::global().error_layer())
}

/// Collects an event's `message` and remaining fields.
#[derive(Debug, Default)]
pub(crate) struct FieldVisitor {
    pub(crate) message: String,
    pub(crate) fields: Vec<Field>,
}

impl FieldVisitor {
    /// Message and fields joined as `message key=value ...`.
    pub(crate) fn summary(&self) -> String {
        let mut summary = self.message.clone();
        for f in &self.fields {
            if !summary.is_empty() {
                summary.push(' ');
            }
            match f.value().as_str() {
                Some(s) => summary.push_str(&format!("{}={}", f.key(), s)),
                None => summary.push_str(&format!("{}={}", f.key(), f.value())),
            }
        }
        summary
    }
}

impl Visit for FieldVisitor {
    fn record_str(&mut self, tracing_field: &TracingField, value: &str) {
        if tracing_field.name() == "message" {
            self.message = value.to_string();
        } else {
            self.fields.push(field(tracing_field.name(), value.to_string()));
        }
    }

    fn record_i64(&mut self, tracing_field: &TracingField, value: i64) {
        self.fields.push(field(tracing_field.name(), value));
    }

    fn record_u64(&mut self, tracing_field: &TracingField, value: u64) {
        self.fields.push(field(tracing_field.name(), value));
    }

    fn record_f64(&mut self, tracing_field: &TracingField, value: f64) {
        self.fields.push(field(tracing_field.name(), value));
    }

    fn record_bool(&mut self, tracing_field: &TracingField, value: bool) {
        self.fields.push(field(tracing_field.name(), value));
    }

    fn record_error(&mut self, tracing_field: &TracingField, value: &(dyn std::error::Error + 'static)) {
        self.fields.push(field(tracing_field.name(), value.to_string()));
    }

    fn record_debug(&mut self, tracing_field: &TracingField, value: &dyn fmt::Debug) {
        if tracing_field.name() == "message" {
            self.message = format!("{value:?}");
        } else {
            self.fields.push(field(tracing_field.name(), format!("{value:?}")));
        }
    }
}
