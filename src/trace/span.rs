//! Span handle returned by `start_trace`.

use std::borrow::Cow;

use opentelemetry::trace::{SpanContext, SpanId, TraceContextExt, TraceId};
use opentelemetry::{Context, KeyValue};

/// A started span.
///
/// The span itself lives in the context returned next to this handle; the
/// handle keeps a clone of that context so the span can be annotated and
/// ended without threading the context around.
#[derive(Debug, Clone)]
pub struct Span {
    cx: Context,
}

impl Span {
    pub(crate) fn new(cx: Context) -> Self {
        Self { cx }
    }

    /// Context carrying this span, for starting children or logging.
    pub fn context(&self) -> &Context {
        &self.cx
    }

    pub fn span_context(&self) -> SpanContext {
        self.cx.span().span_context().clone()
    }

    pub fn trace_id(&self) -> TraceId {
        self.cx.span().span_context().trace_id()
    }

    pub fn span_id(&self) -> SpanId {
        self.cx.span().span_context().span_id()
    }

    /// Returns true if the span records events and attributes.
    pub fn is_recording(&self) -> bool {
        self.cx.span().is_recording()
    }

    pub fn set_attribute(&self, attribute: KeyValue) {
        self.cx.span().set_attribute(attribute);
    }

    pub fn add_event(&self, name: impl Into<Cow<'static, str>>, attributes: Vec<KeyValue>) {
        self.cx.span().add_event(name, attributes);
    }

    /// End the span. Ended spans are handed to the exporter.
    pub fn end(self) {
        self.cx.span().end();
    }
}
