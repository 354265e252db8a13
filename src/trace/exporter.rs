//! Span exporter construction.
//!
//! # Responsibilities
//! - Normalize collector endpoints into URLs
//! - Build the Jaeger or Zipkin exporter and attach it as a batch exporter
//!
//! # Design Decisions
//! - Jaeger is reached through its OTLP/HTTP collector port
//! - Every exporter HTTP client has a bounded timeout, so a dead collector
//!   cannot stall the agent lock indefinitely
//! - Construction sits behind `ExporterFactory` so tests can count calls

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::trace::TracerProviderBuilder;
use thiserror::Error;
use url::Url;

use crate::config::ExporterKind;

/// Timeout for exporter HTTP requests, including connection setup.
pub const EXPORT_TIMEOUT: Duration = Duration::from_secs(10);

const JAEGER_OTLP_PATH: &str = "/v1/traces";
const ZIPKIN_SPANS_PATH: &str = "/api/v2/spans";

/// Errors raised by the tracing subsystem.
///
/// These never fail logger initialization; they are delivered to the
/// agent's [`ErrorHandler`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TraceError {
    /// Endpoint configured without a recognized exporter kind.
    #[error("unknown exporter error: {0:?}")]
    UnknownExporter(String),

    /// The exporter could not be built.
    #[error("{kind} exporter for {endpoint}: {reason}")]
    Exporter {
        kind: ExporterKind,
        endpoint: String,
        reason: String,
    },

    /// The exporter failed after startup.
    #[error("export failed: {0}")]
    Export(String),

    /// Flushing or shutting down a provider failed.
    #[error("tracer provider: {0}")]
    Provider(String),
}

impl TraceError {
    pub fn exporter(kind: ExporterKind, endpoint: &str, reason: impl fmt::Display) -> Self {
        TraceError::Exporter {
            kind,
            endpoint: endpoint.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Callback receiving tracing errors.
pub type ErrorHandler = Arc<dyn Fn(&TraceError) + Send + Sync>;

/// Attaches a span exporter for `kind` and `endpoint` to a provider builder.
pub trait ExporterFactory: Send + Sync {
    fn attach(
        &self,
        kind: ExporterKind,
        endpoint: &str,
        builder: TracerProviderBuilder,
    ) -> Result<TracerProviderBuilder, TraceError>;
}

/// Network exporters: Jaeger (OTLP/HTTP) and Zipkin.
#[derive(Debug, Clone, Copy, Default)]
pub struct CollectorExporters;

impl ExporterFactory for CollectorExporters {
    fn attach(
        &self,
        kind: ExporterKind,
        endpoint: &str,
        builder: TracerProviderBuilder,
    ) -> Result<TracerProviderBuilder, TraceError> {
        match kind {
            ExporterKind::Jaeger => {
                let url = collector_url(kind, endpoint, JAEGER_OTLP_PATH)?;
                let exporter = opentelemetry_otlp::SpanExporter::builder()
                    .with_http()
                    .with_endpoint(url.as_str())
                    .with_timeout(EXPORT_TIMEOUT)
                    .build()
                    .map_err(|e| TraceError::exporter(kind, endpoint, e))?;
                Ok(builder.with_batch_exporter(exporter))
            }
            ExporterKind::Zipkin => {
                let url = collector_url(kind, endpoint, ZIPKIN_SPANS_PATH)?;
                let client = reqwest::blocking::Client::builder()
                    .connect_timeout(EXPORT_TIMEOUT)
                    .timeout(EXPORT_TIMEOUT)
                    .build()
                    .map_err(|e| TraceError::exporter(kind, endpoint, e))?;
                let exporter = opentelemetry_zipkin::ZipkinExporter::builder()
                    .with_collector_endpoint(url.as_str())
                    .with_http_client(client)
                    .build()
                    .map_err(|e| TraceError::exporter(kind, endpoint, e))?;
                Ok(builder.with_batch_exporter(exporter))
            }
        }
    }
}

/// Turn `endpoint` into a collector URL.
///
/// `http://` is assumed when no scheme is given and `default_path` is used
/// when the endpoint has no path.
pub fn collector_url(kind: ExporterKind, endpoint: &str, default_path: &str) -> Result<Url, TraceError> {
    let raw = if endpoint.contains("://") {
        endpoint.to_string()
    } else {
        format!("http://{endpoint}")
    };

    let mut url = Url::parse(&raw).map_err(|e| TraceError::exporter(kind, endpoint, e))?;
    if url.path().is_empty() || url.path() == "/" {
        url.set_path(default_path);
    }
    Ok(url)
}
