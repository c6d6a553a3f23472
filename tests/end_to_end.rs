//! End-to-end tests over a real listener.

use std::collections::HashSet;
use std::time::Duration;

use opentelemetry::trace::SpanId;
use opentelemetry::KeyValue;
use opentelemetry_sdk::trace::InMemorySpanExporter;

use instrumented_http::http::handlers::{GREETING, SLEEP_DURATION, SLEEP_SPAN};
use instrumented_http::observability::build_resource;
use instrumented_http::{AppConfig, Application, Error, Shutdown, Telemetry};

mod common;

async fn start_in_memory(
    config: AppConfig,
) -> (
    String,
    InMemorySpanExporter,
    Shutdown,
    tokio::task::JoinHandle<instrumented_http::Result<()>>,
) {
    let exporter = InMemorySpanExporter::default();
    let telemetry = Telemetry::with_exporter(exporter.clone(), build_resource(&config.service));
    let app = Application::with_telemetry(config, telemetry).await.unwrap();
    let url = format!("http://{}/hello-instrumented", app.local_addr().unwrap());

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.clone();
    let handle = tokio::spawn(async move { app.run(&server_shutdown).await });

    (url, exporter, shutdown, handle)
}

#[tokio::test]
async fn one_request_one_trace_with_sleep_child() {
    let (url, exporter, shutdown, handle) = start_in_memory(common::test_config(1_000)).await;

    let res = common::client().get(&url).send().await.expect("server unreachable");
    assert_eq!(res.status(), 200);
    assert_eq!(res.text().await.unwrap(), GREETING);

    let spans = exporter.get_finished_spans().unwrap();
    assert_eq!(spans.len(), 2);

    let root = spans.iter().find(|s| s.name == "hello-instrumented").unwrap();
    let child = spans.iter().find(|s| s.name == SLEEP_SPAN).unwrap();
    assert_eq!(root.parent_span_id, SpanId::INVALID);
    assert_eq!(child.parent_span_id, root.span_context.span_id());
    assert!(child.attributes.contains(&KeyValue::new(SLEEP_DURATION, 1_000_i64)));

    let slept = child.end_time.duration_since(child.start_time).unwrap();
    assert!(slept >= Duration::from_millis(1_000));
    assert!(slept < Duration::from_millis(3_000));
    assert!(root.end_time >= child.end_time);

    shutdown.trigger();
    handle.await.unwrap().unwrap();
}

#[tokio::test]
async fn concurrent_requests_get_separate_traces() {
    let (url, exporter, shutdown, handle) = start_in_memory(common::test_config(50)).await;

    let client = common::client();
    let mut tasks = Vec::new();
    for _ in 0..10 {
        let client = client.clone();
        let url = url.clone();
        tasks.push(tokio::spawn(async move {
            let res = client.post(&url).send().await.unwrap();
            assert_eq!(res.status(), 200);
            res.text().await.unwrap()
        }));
    }
    for task in tasks {
        assert_eq!(task.await.unwrap(), GREETING);
    }

    let spans = exporter.get_finished_spans().unwrap();
    assert_eq!(spans.len(), 20);

    let roots: Vec<_> = spans.iter().filter(|s| s.name == "hello-instrumented").collect();
    let children: Vec<_> = spans.iter().filter(|s| s.name == SLEEP_SPAN).collect();
    assert_eq!(roots.len(), 10);
    assert_eq!(children.len(), 10);

    let trace_ids: HashSet<_> = roots.iter().map(|s| s.span_context.trace_id()).collect();
    assert_eq!(trace_ids.len(), 10);

    for child in children {
        let parent = roots
            .iter()
            .find(|r| r.span_context.span_id() == child.parent_span_id)
            .expect("child without server span");
        assert_eq!(parent.span_context.trace_id(), child.span_context.trace_id());
    }

    shutdown.trigger();
    handle.await.unwrap().unwrap();
}

#[tokio::test]
async fn shutdown_flushes_batched_spans_to_collector() {
    let (collector, received) = common::start_mock_collector().await;

    let mut config = common::test_config(10);
    config.exporter.endpoint = format!("http://{}/v1/traces", collector);
    let app = Application::build(config).await.expect("collector reachable");
    let url = format!("http://{}/hello-instrumented", app.local_addr().unwrap());

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.clone();
    let handle = tokio::spawn(async move { app.run(&server_shutdown).await });

    let client = common::client();
    for _ in 0..3 {
        let res = client.get(&url).send().await.unwrap();
        assert_eq!(res.status(), 200);
    }

    shutdown.trigger();
    handle.await.unwrap().unwrap();

    let received = received.lock().unwrap();
    assert!(!received.is_empty(), "no spans reached the collector");
    for export in received.iter() {
        assert_eq!(export.path, "/v1/traces");
        assert_eq!(export.content_type.as_deref(), Some("application/x-protobuf"));
        assert!(export.body_len > 0);
    }
}

#[tokio::test]
async fn unreachable_collector_fails_startup() {
    let unused = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let endpoint = format!("http://{}/v1/traces", unused.local_addr().unwrap());
    drop(unused);

    let mut config = common::test_config(0);
    config.exporter.endpoint = endpoint;
    config.exporter.probe_timeout_ms = 500;

    let result = Application::build(config).await;
    assert!(matches!(result, Err(Error::CollectorUnreachable { .. })));
}

#[tokio::test]
async fn bind_failure_is_reported() {
    let taken = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let mut config = common::test_config(0);
    config.listener.bind_address = taken.local_addr().unwrap().to_string();

    let telemetry = Telemetry::with_exporter(
        InMemorySpanExporter::default(),
        build_resource(&config.service),
    );
    let result = Application::with_telemetry(config, telemetry).await;
    assert!(matches!(result, Err(Error::Bind { .. })));
}
