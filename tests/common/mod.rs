//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::fs;
use std::io::{self, Write};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use opentelemetry_sdk::trace::{InMemorySpanExporter, SpanData, TracerProviderBuilder};
use serde_json::Value;
use tracing_subscriber::fmt::MakeWriter;

use spanlog::config::ExporterKind;
use spanlog::trace::{ExporterFactory, TraceError};
use spanlog::{Config, TraceConfig};

/// In-memory writer recording everything written through it.
#[derive(Clone, Default)]
pub struct Capture(Arc<Mutex<Vec<u8>>>);

impl Capture {
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }

    pub fn lines(&self) -> Vec<String> {
        self.text().lines().map(str::to_string).collect()
    }

    /// Every line parsed as a JSON object.
    pub fn records(&self) -> Vec<Value> {
        self.lines()
            .iter()
            .map(|line| serde_json::from_str(line).expect("record is not JSON"))
            .collect()
    }

    /// Records written after the debug-level "logger initialized" record,
    /// which must be the first one.
    pub fn records_after_init(&self) -> Vec<Value> {
        let mut records = self.records();
        assert_eq!(records.first().map(|r| r["message"].clone()), Some(Value::from("logger initialized")));
        records.remove(0);
        records
    }
}

impl Write for Capture {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for Capture {
    type Writer = Capture;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Exporter double: counts constructions and keeps spans in memory.
#[derive(Clone, Default)]
pub struct CountingFactory {
    pub calls: Arc<AtomicUsize>,
    pub exporter: InMemorySpanExporter,
}

impl CountingFactory {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn spans(&self) -> Vec<SpanData> {
        self.exporter.get_finished_spans().unwrap()
    }
}

impl ExporterFactory for CountingFactory {
    fn attach(
        &self,
        _kind: ExporterKind,
        _endpoint: &str,
        builder: TracerProviderBuilder,
    ) -> Result<TracerProviderBuilder, TraceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(builder.with_simple_exporter(self.exporter.clone()))
    }
}

/// Contents of every file in `dir`, concatenated.
pub fn read_dir_text(dir: &Path) -> String {
    let Ok(entries) = fs::read_dir(dir) else {
        return String::new();
    };

    let mut paths: Vec<_> = entries.map(|e| e.unwrap().path()).collect();
    paths.sort();
    paths
        .iter()
        .filter(|p| p.is_file())
        .map(|p| fs::read_to_string(p).unwrap())
        .collect()
}

/// A config writing files under `dir` with no tracing endpoint.
pub fn config_in(dir: &Path, mode: &str) -> Config {
    let mut config = Config {
        level: "debug".into(),
        format: "json".into(),
        mode: mode.into(),
        ..Config::default()
    };
    config.file.directory = dir.to_string_lossy().into_owned();
    config.file.rotation = "never".into();
    config
}

pub fn trace_config(endpoint: &str, batcher: &str) -> TraceConfig {
    TraceConfig {
        name: "integration".into(),
        endpoint: endpoint.into(),
        sampler: 1.0,
        batcher: batcher.into(),
    }
}
