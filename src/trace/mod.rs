//! Distributed tracing subsystem.
//!
//! # Data Flow
//! ```text
//! TraceConfig
//!     → agent.rs (once per endpoint, under lock)
//!         → exporter.rs (Jaeger | Zipkin, batched)
//!         → sampler + service.name resource → SdkTracerProvider
//!         → global provider + W3C propagator
//!
//! opentelemetry* WARN/ERROR events (application subscriber)
//!     → hook.rs ExportErrorLayer → agent's error handler
//!
//! start_trace(cx, name)
//!     → active provider's tracer → (Context with span, Span)
//!     → logger::context reads the ids back out for log records
//! ```
//!
//! # Design Decisions
//! - Tracing failures degrade to inert tracing; logging always keeps working
//! - Exporter construction is pluggable for tests

pub mod agent;
pub mod exporter;
pub mod hook;
pub mod span;

pub use agent::{start_trace, TracingAgent, DEFAULT_TRACER};
pub use exporter::{CollectorExporters, ErrorHandler, ExporterFactory, TraceError};
pub use hook::ExportErrorLayer;
pub use span::Span;
