//! spanlog: structured logging with OpenTelemetry trace correlation.
//!
//! # Architecture Overview
//!
//! ```text
//!     Config (TOML / struct)
//!         │
//!         ▼
//!   ┌────────────┐   ┌──────────────┐   ┌──────────────────────────┐
//!   │ validation │──▶│ sink builder │──▶│ LoggerHandle (ArcSwap)   │◀── emit / info / ...
//!   └────────────┘   │ json | text  │   │   current: Logger        │◀── tracing events (LogLayer)
//!                    │ file+console │   └────────────┬─────────────┘
//!                    └──────────────┘                │ with_context(cx)
//!                                                    ▼
//!   ┌───────────────────────────────┐   ┌──────────────────────────┐
//!   │ TracingAgent (per endpoint)   │──▶│ traceId / spanId fields  │
//!   │ sampler, Jaeger | Zipkin      │   └──────────────────────────┘
//!   └───────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```no_run
//! use opentelemetry::Context;
//! use spanlog::{field, Config};
//!
//! spanlog::initialize(&Config::default())?;
//!
//! let (cx, span) = spanlog::start_trace(&Context::current(), "checkout");
//! spanlog::with_context(&cx).info("order placed", &[field("items", 3)]);
//! span.end();
//! # Ok::<(), spanlog::LogError>(())
//! ```
//!
//! The crate does not install a global `tracing` subscriber. To route
//! `tracing` events into the logger and exporter errors to the agent's
//! handler, add [`layer()`] to the application's subscriber.

pub mod config;
pub mod error;
pub mod logger;
pub mod sink;
pub mod trace;

pub use config::{load_config, Config, ConfigError, ConfigWatcher, TraceConfig, ValidationError};
pub use error::{LogError, LogResult};
pub use logger::registry::{
    debug, emit, enabled, error, fatal, flush, info, initialize, initialize_with, logger, named,
    panic, set_logger, warn, with, with_context, with_current_context,
};
pub use logger::layer::layer;
pub use logger::{field, Field, Level, LogLayer, Logger, LoggerHandle};
pub use sink::InitOptions;
pub use trace::{start_trace, Span, TraceError, TracingAgent};
