//! Endpoint handlers.

use std::time::Duration;

use axum::extract::State;
use opentelemetry::trace::{TraceContextExt, Tracer};
use opentelemetry::{Context, KeyValue};
use opentelemetry_sdk::trace::SdkTracer;

use crate::http::middleware::RequestContext;
use crate::http::server::AppState;

/// Body returned by the instrumented endpoint.
pub const GREETING: &str = "Hello, World! I am instrumented automatically!";

/// Name of the simulated-work span.
pub const SLEEP_SPAN: &str = "sleep";

/// Attribute recording the simulated delay, in milliseconds.
pub const SLEEP_DURATION: &str = "sleep.duration";

/// The instrumented endpoint.
pub async fn hello(
    State(state): State<AppState>,
    RequestContext(cx): RequestContext,
) -> &'static str {
    sleepy(&state.tracer, &cx, state.sleep).await;
    GREETING
}

/// Simulated work: suspends the task for `duration` inside a `sleep` span
/// parented on `parent`.
///
/// The delay is fixed. If the request future is dropped mid-sleep the span
/// still ends, without the duration attribute.
pub async fn sleepy(tracer: &SdkTracer, parent: &Context, duration: Duration) {
    let cx = parent.with_span(tracer.start_with_context(SLEEP_SPAN, parent));

    tokio::time::sleep(duration).await;

    let span = cx.span();
    span.set_attribute(KeyValue::new(
        SLEEP_DURATION,
        i64::try_from(duration.as_millis()).unwrap_or(i64::MAX),
    ));
    span.end();
}

#[cfg(test)]
mod tests {
    use super::*;
    use opentelemetry::trace::TracerProvider as _;
    use opentelemetry_sdk::trace::{InMemorySpanExporter, SdkTracerProvider};

    #[tokio::test]
    async fn sleepy_creates_child_span() {
        let exporter = InMemorySpanExporter::default();
        let provider = SdkTracerProvider::builder()
            .with_simple_exporter(exporter.clone())
            .build();
        let tracer = provider.tracer("test");

        let parent = Context::new().with_span(tracer.start("parent"));
        sleepy(&tracer, &parent, Duration::from_millis(20)).await;
        parent.span().end();

        let spans = exporter.get_finished_spans().unwrap();
        assert_eq!(spans.len(), 2);

        let child = &spans[0];
        let root = &spans[1];
        assert_eq!(child.name, SLEEP_SPAN);
        assert_eq!(child.parent_span_id, root.span_context.span_id());
        assert_eq!(child.span_context.trace_id(), root.span_context.trace_id());
        assert!(child
            .attributes
            .contains(&KeyValue::new(SLEEP_DURATION, 20_i64)));

        let elapsed = child.end_time.duration_since(child.start_time).unwrap();
        assert!(elapsed >= Duration::from_millis(20));
    }

    #[tokio::test]
    async fn cancelled_sleep_still_ends_span() {
        let exporter = InMemorySpanExporter::default();
        let provider = SdkTracerProvider::builder()
            .with_simple_exporter(exporter.clone())
            .build();
        let tracer = provider.tracer("test");

        let parent = Context::new();
        let outcome = tokio::time::timeout(
            Duration::from_millis(10),
            sleepy(&tracer, &parent, Duration::from_secs(60)),
        )
        .await;
        assert!(outcome.is_err());

        let spans = exporter.get_finished_spans().unwrap();
        assert_eq!(spans.len(), 1);
        assert!(!spans[0]
            .attributes
            .iter()
            .any(|kv| kv.key.as_str() == SLEEP_DURATION));
    }
}
