//! Trace correlation for log records.
//!
//! Derives a logger carrying `traceId` and `spanId` from an OpenTelemetry
//! context. The ids are read per call and never stored on the shared logger.

use opentelemetry::trace::TraceContextExt;
use opentelemetry::Context;

use crate::logger::{field, Field, Logger};

pub const TRACE_ID_KEY: &str = "traceId";
pub const SPAN_ID_KEY: &str = "spanId";

/// Correlation fields for the span active in `cx`, or `None` when the
/// context carries no valid span.
pub fn correlation_fields(cx: &Context) -> Option<[Field; 2]> {
    let span = cx.span();
    let span_context = span.span_context();
    if !span_context.is_valid() {
        return None;
    }

    Some([
        field(TRACE_ID_KEY, span_context.trace_id().to_string()),
        field(SPAN_ID_KEY, span_context.span_id().to_string()),
    ])
}

impl Logger {
    /// Derive a logger annotated with the trace and span ids of `cx`.
    ///
    /// Returns an unmodified clone when `cx` carries no active span.
    pub fn with_context(&self, cx: &Context) -> Logger {
        match correlation_fields(cx) {
            Some(fields) => self.with(fields),
            None => self.clone(),
        }
    }
}
