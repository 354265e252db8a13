//! Tracing agent start-up, idempotency and export.

use std::sync::{Arc, Mutex};

use opentelemetry::{Context, KeyValue};

use spanlog::trace::TraceError;
use spanlog::{Config, InitOptions, LoggerHandle, TracingAgent};

mod common;
use common::{trace_config, Capture, CountingFactory};

fn recording_agent(factory: &CountingFactory) -> (TracingAgent, Arc<Mutex<Vec<TraceError>>>) {
    let errors = Arc::new(Mutex::new(Vec::new()));
    let seen = errors.clone();
    let agent = TracingAgent::with_factory(factory.clone()).with_error_handler(Arc::new(
        move |e: &TraceError| seen.lock().unwrap().push(e.clone()),
    ));
    (agent, errors)
}

#[test]
fn test_same_endpoint_builds_one_exporter() {
    let factory = CountingFactory::default();
    let (agent, errors) = recording_agent(&factory);

    agent.start(&trace_config("collector:9411", "zipkin"));
    agent.start(&trace_config("collector:9411", "zipkin"));

    assert_eq!(factory.calls(), 1);
    assert!(agent.is_started("collector:9411"));
    assert!(errors.lock().unwrap().is_empty());
}

#[test]
fn test_second_start_keeps_first_settings() {
    let factory = CountingFactory::default();
    let (agent, _) = recording_agent(&factory);

    agent.start(&trace_config("collector:9411", "zipkin"));
    let mut changed = trace_config("collector:9411", "jaeger");
    changed.name = "renamed".into();
    agent.start(&changed);

    assert_eq!(factory.calls(), 1);
    assert_eq!(agent.service_name().as_deref(), Some("integration"));
}

#[test]
fn test_distinct_endpoints_build_distinct_exporters() {
    let factory = CountingFactory::default();
    let (agent, _) = recording_agent(&factory);

    agent.start(&trace_config("collector-a:9411", "zipkin"));
    agent.start(&trace_config("collector-b:4318", "jaeger"));

    assert_eq!(factory.calls(), 2);
    assert!(agent.is_started("collector-a:9411"));
    assert!(agent.is_started("collector-b:4318"));
}

#[test]
fn test_endpoint_without_exporter_leaves_tracing_inert() {
    let factory = CountingFactory::default();
    let (agent, errors) = recording_agent(&factory);
    let capture = Capture::default();
    let handle = LoggerHandle::default();

    let mut config = Config {
        mode: "console".into(),
        ..Config::default()
    };
    config.trace = trace_config("collector:9411", "");

    handle
        .initialize(&config, InitOptions::new().with_console(capture.clone()), &agent)
        .unwrap();
    handle.info("still logging", &[]);

    let (_, span) = agent.start_trace(&Context::new(), "dropped");
    span.end();
    agent.force_flush();

    assert!(capture.text().contains("still logging"));
    assert_eq!(factory.calls(), 0);
    assert!(factory.spans().is_empty());
    assert!(!agent.is_started("collector:9411"));
    assert_eq!(
        *errors.lock().unwrap(),
        vec![TraceError::UnknownExporter(String::new())]
    );
}

#[test]
fn test_finished_spans_are_exported() {
    let factory = CountingFactory::default();
    let (agent, _) = recording_agent(&factory);
    agent.start(&trace_config("collector:9411", "zipkin"));

    let (cx, root) = agent.start_trace(&Context::new(), "checkout");
    let (_, child) = agent.start_trace(&cx, "charge-card");
    child.set_attribute(KeyValue::new("amount", 1250_i64));
    child.add_event("authorized", vec![]);
    child.end();
    root.end();
    agent.force_flush();

    let spans = factory.spans();
    assert_eq!(spans.len(), 2);

    let charge = spans.iter().find(|s| s.name == "charge-card").unwrap();
    let checkout = spans.iter().find(|s| s.name == "checkout").unwrap();
    assert_eq!(charge.parent_span_id, checkout.span_context.span_id());
    assert_eq!(charge.span_context.trace_id(), checkout.span_context.trace_id());
    assert!(charge.attributes.contains(&KeyValue::new("amount", 1250_i64)));
    assert_eq!(charge.events.events.len(), 1);
}

#[test]
fn test_zero_sampler_exports_nothing() {
    let factory = CountingFactory::default();
    let (agent, _) = recording_agent(&factory);
    let mut config = trace_config("collector:9411", "jaeger");
    config.sampler = 0.0;
    agent.start(&config);

    let (_, span) = agent.start_trace(&Context::new(), "unsampled");
    assert!(!span.is_recording());
    span.end();
    agent.force_flush();

    assert_eq!(factory.calls(), 1);
    assert!(factory.spans().is_empty());
}

#[test]
fn test_unknown_exporter_is_reported_not_returned() {
    let factory = CountingFactory::default();
    let (agent, errors) = recording_agent(&factory);
    let handle = LoggerHandle::default();

    let mut config = Config {
        mode: "console".into(),
        ..Config::default()
    };
    config.trace = trace_config("collector:9411", "");

    assert!(handle
        .initialize(&config, InitOptions::new().with_console(Capture::default()), &agent)
        .is_ok());
    assert_eq!(errors.lock().unwrap().len(), 1);
    assert!(agent.tracer_provider().is_none());
}

#[test]
fn test_collector_exporters_build_without_network() {
    let errors = Arc::new(Mutex::new(Vec::new()));
    let seen = errors.clone();
    let agent = TracingAgent::new().with_error_handler(Arc::new(move |e: &TraceError| {
        seen.lock().unwrap().push(e.clone());
    }));

    agent.start(&trace_config("127.0.0.1:9411", "zipkin"));
    agent.start(&trace_config("127.0.0.1:4318", "jaeger"));

    assert!(!errors
        .lock()
        .unwrap()
        .iter()
        .any(|e| matches!(e, TraceError::Exporter { .. } | TraceError::UnknownExporter(_))));
    assert!(agent.is_started("127.0.0.1:9411"));
    assert!(agent.is_started("127.0.0.1:4318"));
}

#[tokio::test]
async fn test_collector_exporters_start_inside_a_runtime() {
    let errors = Arc::new(Mutex::new(Vec::new()));
    let seen = errors.clone();
    let agent = TracingAgent::new().with_error_handler(Arc::new(move |e: &TraceError| {
        seen.lock().unwrap().push(e.clone());
    }));
    let capture = Capture::default();
    let handle = LoggerHandle::default();

    for (endpoint, batcher) in [("127.0.0.1:9411", "zipkin"), ("127.0.0.1:4318", "jaeger")] {
        let mut config = Config {
            mode: "console".into(),
            ..Config::default()
        };
        config.trace = trace_config(endpoint, batcher);
        handle
            .initialize(&config, InitOptions::new().with_console(capture.clone()), &agent)
            .unwrap();
    }
    handle.info("logging from async code", &[]);

    assert!(agent.is_started("127.0.0.1:9411"));
    assert!(agent.is_started("127.0.0.1:4318"));
    let errors = errors.lock().unwrap();
    assert!(errors.is_empty(), "errors: {errors:?}");
    assert!(capture.text().contains("logging from async code"));
}
