//! Exporter runtime errors.
//!
//! The OpenTelemetry SDK reports export failures as `tracing` events under
//! `opentelemetry*` targets. [`ExportErrorLayer`] turns the ones at WARN and
//! above into [`TraceError::Export`] and hands them to its [`ErrorHandler`].
//!
//! The crate never installs a global subscriber. An application adds the
//! layer to its own, either directly from [`TracingAgent::error_layer`] or
//! through `spanlog::layer()`.
//!
//! [`TracingAgent::error_layer`]: crate::trace::TracingAgent::error_layer

use std::fmt;

use tracing::{Event, Metadata, Subscriber};
use tracing_subscriber::layer::{self, Layer};

use crate::logger::layer::FieldVisitor;
use crate::trace::exporter::{ErrorHandler, TraceError};

/// Returns true for events emitted by the OpenTelemetry crates.
pub(crate) fn is_export_target(target: &str) -> bool {
    target.starts_with("opentelemetry")
}

/// Forwards OpenTelemetry warnings and errors to an error handler.
#[derive(Clone)]
pub struct ExportErrorLayer {
    handler: ErrorHandler,
}

impl ExportErrorLayer {
    pub fn new(handler: ErrorHandler) -> Self {
        Self { handler }
    }

    fn interested(metadata: &Metadata<'_>) -> bool {
        is_export_target(metadata.target()) && *metadata.level() <= tracing::Level::WARN
    }
}

impl fmt::Debug for ExportErrorLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExportErrorLayer").finish_non_exhaustive()
    }
}

impl<S: Subscriber> Layer<S> for ExportErrorLayer {
    // Must not override `enabled`: a layered subscriber applies it to every layer
    fn on_event(&self, event: &Event<'_>, _ctx: layer::Context<'_, S>) {
        if !Self::interested(event.metadata()) {
            return;
        }

        let mut visitor = FieldVisitor::default();
        event.record(&mut visitor);
        (self.handler)(&TraceError::Export(visitor.summary()));
    }
}
