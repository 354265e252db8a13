//! Tracing agent.
//!
//! # Responsibilities
//! - Start tracing at most once per collector endpoint
//! - Build the tracer provider: parent-based ratio sampler, batch exporter,
//!   `service.name` resource
//! - Register the W3C trace-context + baggage propagator and the tracer
//!   provider globally
//! - Route exporter errors to the error handler, directly for start
//!   failures and through [`TracingAgent::error_layer`] for export failures
//!
//! # Design Decisions
//! - Best effort: an unknown exporter or a failed exporter build is reported
//!   and leaves tracing inert, it never fails logger initialization
//! - A failed start records nothing, so a later call with the same endpoint
//!   tries again
//! - The state lock is held across the membership check, exporter
//!   construction and insertion; first start for a new endpoint can be slow
//! - Providers are never torn down individually; all of them are kept so
//!   their batch processors keep running
//! - Exporters are built on a scoped thread: their blocking HTTP clients own
//!   a runtime that must not be created or dropped inside an async context
//! - The default error handler writes to the process-wide logger. An agent
//!   serving an injected `LoggerHandle` should get its own handler through
//!   [`TracingAgent::with_error_handler`]

use std::borrow::Cow;
use std::collections::HashSet;
use std::fmt;
use std::sync::{Arc, LazyLock, Mutex, MutexGuard, PoisonError};

use opentelemetry::propagation::TextMapCompositePropagator;
use opentelemetry::trace::{TraceContextExt, Tracer as _, TracerProvider as _};
use opentelemetry::{global, Context};
use opentelemetry_sdk::propagation::{BaggagePropagator, TraceContextPropagator};
use opentelemetry_sdk::trace::{Sampler, SdkTracerProvider};
use opentelemetry_sdk::Resource;

use crate::config::{ExporterKind, TraceConfig};
use crate::logger::{Field, LoggerHandle};
use crate::trace::exporter::{CollectorExporters, ErrorHandler, ExporterFactory, TraceError};
use crate::trace::hook::ExportErrorLayer;
use crate::trace::span::Span;

/// Tracer name used before any agent has started.
pub const DEFAULT_TRACER: &str = "spanlog";

static GLOBAL: LazyLock<TracingAgent> = LazyLock::new(TracingAgent::new);

struct ActiveTracer {
    service_name: String,
    provider: SdkTracerProvider,
}

#[derive(Default)]
struct AgentState {
    endpoints: HashSet<String>,
    /// Every started provider, most recent last.
    tracers: Vec<ActiveTracer>,
}

/// Idempotent, per-endpoint tracing bootstrap.
pub struct TracingAgent {
    state: Mutex<AgentState>,
    factory: Box<dyn ExporterFactory>,
    on_error: ErrorHandler,
}

impl TracingAgent {
    /// An agent exporting to Jaeger or Zipkin collectors.
    pub fn new() -> Self {
        Self::with_factory(CollectorExporters)
    }

    /// An agent building exporters through `factory`.
    pub fn with_factory(factory: impl ExporterFactory + 'static) -> Self {
        Self {
            state: Mutex::new(AgentState::default()),
            factory: Box::new(factory),
            on_error: Arc::new(log_trace_error),
        }
    }

    /// Replace the default handler, which logs a warning through the
    /// process-wide logger.
    pub fn with_error_handler(mut self, handler: ErrorHandler) -> Self {
        self.on_error = handler;
        self
    }

    /// The process-wide agent used by `spanlog::initialize`.
    pub fn global() -> &'static TracingAgent {
        &GLOBAL
    }

    /// Start tracing for `config.endpoint` unless it was already started.
    ///
    /// Errors are delivered to the error handler, never returned.
    pub fn start(&self, config: &TraceConfig) {
        let mut state = self.lock();
        if state.endpoints.contains(&config.endpoint) {
            return;
        }

        let built = std::thread::scope(|scope| scope.spawn(|| self.build_provider(config)).join())
            .unwrap_or_else(|_| Err(TraceError::Provider("exporter construction panicked".to_string())));
        let provider = match built {
            Ok(provider) => provider,
            Err(err) => {
                drop(state);
                (self.on_error)(&err);
                return;
            }
        };

        global::set_tracer_provider(provider.clone());
        global::set_text_map_propagator(TextMapCompositePropagator::new(vec![
            Box::new(TraceContextPropagator::new()),
            Box::new(BaggagePropagator::new()),
        ]));

        state.endpoints.insert(config.endpoint.clone());
        state.tracers.push(ActiveTracer {
            service_name: config.name.clone(),
            provider,
        });
    }

    /// A layer reporting exporter runtime errors to this agent's handler.
    pub fn error_layer(&self) -> ExportErrorLayer {
        ExportErrorLayer::new(Arc::clone(&self.on_error))
    }

    /// Returns true if tracing was started for `endpoint`.
    pub fn is_started(&self, endpoint: &str) -> bool {
        self.lock().endpoints.contains(endpoint)
    }

    /// Service name of the active tracer.
    pub fn service_name(&self) -> Option<String> {
        self.lock().tracers.last().map(|t| t.service_name.clone())
    }

    /// The active tracer provider, if any agent start succeeded.
    pub fn tracer_provider(&self) -> Option<SdkTracerProvider> {
        self.lock().tracers.last().map(|t| t.provider.clone())
    }

    /// Start a span named `name` as a child of the span in `cx`.
    ///
    /// Uses the active tracer, or the global tracer when nothing started.
    pub fn start_trace(&self, cx: &Context, name: impl Into<Cow<'static, str>>) -> (Context, Span) {
        let active = self
            .lock()
            .tracers
            .last()
            .map(|t| (t.service_name.clone(), t.provider.clone()));

        let cx = match active {
            Some((service_name, provider)) => {
                let span = provider.tracer(service_name).start_with_context(name, cx);
                cx.with_span(span)
            }
            None => cx.with_span(global::tracer(DEFAULT_TRACER).start_with_context(name, cx)),
        };

        (cx.clone(), Span::new(cx))
    }

    /// Export every finished span still buffered by the batch processors.
    pub fn force_flush(&self) {
        for provider in self.providers() {
            if let Err(e) = provider.force_flush() {
                (self.on_error)(&TraceError::Provider(e.to_string()));
            }
        }
    }

    /// Flush and shut down every provider. Started endpoints stay recorded.
    pub fn shutdown(&self) {
        for provider in self.providers() {
            if let Err(e) = provider.shutdown() {
                (self.on_error)(&TraceError::Provider(e.to_string()));
            }
        }
    }

    fn providers(&self) -> Vec<SdkTracerProvider> {
        self.lock().tracers.iter().map(|t| t.provider.clone()).collect()
    }

    fn build_provider(&self, config: &TraceConfig) -> Result<SdkTracerProvider, TraceError> {
        let mut builder = SdkTracerProvider::builder()
            .with_sampler(Sampler::ParentBased(Box::new(Sampler::TraceIdRatioBased(
                config.sampler,
            ))))
            .with_resource(Resource::builder().with_service_name(config.name.clone()).build());

        if !config.endpoint.is_empty() {
            let kind: ExporterKind = config
                .batcher
                .parse()
                .map_err(|_| TraceError::UnknownExporter(config.batcher.clone()))?;
            builder = self.factory.attach(kind, &config.endpoint, builder)?;
        }

        Ok(builder.build())
    }

    fn lock(&self) -> MutexGuard<'_, AgentState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for TracingAgent {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for TracingAgent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.lock();
        f.debug_struct("TracingAgent")
            .field("endpoints", &state.endpoints)
            .field("tracers", &state.tracers.len())
            .finish_non_exhaustive()
    }
}

fn log_trace_error(err: &TraceError) {
    LoggerHandle::global().warn("opentelemetry error", &[Field::error(err)]);
}

/// Start a span through the process-wide agent.
pub fn start_trace(cx: &Context, name: impl Into<Cow<'static, str>>) -> (Context, Span) {
    TracingAgent::global().start_trace(cx, name)
}
