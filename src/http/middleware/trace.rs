//! Request instrumentation.
//!
//! `InstrumentLayer` wraps a service so every request runs inside a server
//! span:
//!
//! ```text
//! request
//!     → extract remote parent (W3C traceparent)
//!     → start server span, derive request Context
//!     → insert RequestContext into extensions
//!     → inner service
//!     → record status, end span
//! ```
//!
//! The span is owned by a `SpanGuard` that lives in the response future.
//! It is ended right after the inner service returns; if the future panics
//! or is dropped first, the guard ends it on drop. Ending is idempotent, so
//! each span ends exactly once.

use std::borrow::Cow;
use std::convert::Infallible;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context as TaskContext, Poll};
use std::time::Instant;

use axum::extract::{FromRequestParts, MatchedPath};
use axum::http::request::Parts;
use axum::http::{Request, Response, StatusCode};
use opentelemetry::propagation::TextMapPropagator;
use opentelemetry::trace::{SpanKind, Status, TraceContextExt, Tracer};
use opentelemetry::{Context, KeyValue};
use opentelemetry_http::HeaderExtractor;
use opentelemetry_sdk::propagation::TraceContextPropagator;
use opentelemetry_sdk::trace::SdkTracer;
use opentelemetry_semantic_conventions::attribute::{
    HTTP_REQUEST_METHOD, HTTP_RESPONSE_STATUS_CODE, HTTP_ROUTE, URL_PATH, URL_SCHEME,
    USER_AGENT_ORIGINAL,
};
use tower::{Layer, Service};

use crate::http::request::RequestIdExt;
use crate::observability::metrics;

/// Span attribute holding the request ID.
pub const HTTP_REQUEST_ID: &str = "http.request_id";

/// How server spans are named.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SpanNaming {
    /// Every span gets this name.
    Fixed(Cow<'static, str>),
    /// `"{METHOD} {route}"`, or the method alone when no route matched.
    Route,
}

impl SpanNaming {
    /// `Fixed` for a non-empty operation name, `Route` otherwise.
    pub fn from_operation_name(name: &str) -> Self {
        if name.trim().is_empty() {
            SpanNaming::Route
        } else {
            SpanNaming::Fixed(Cow::Owned(name.to_string()))
        }
    }

    fn span_name<B>(&self, req: &Request<B>) -> Cow<'static, str> {
        match self {
            SpanNaming::Fixed(name) => name.clone(),
            SpanNaming::Route => match req.extensions().get::<MatchedPath>() {
                Some(route) => Cow::Owned(format!("{} {}", req.method(), route.as_str())),
                None => Cow::Owned(req.method().to_string()),
            },
        }
    }
}

/// The request's trace context, as stored by [`InstrumentLayer`].
///
/// Handlers extract it to parent their own spans on the server span.
/// Outside an instrumented route it falls back to an empty context.
#[derive(Clone, Debug)]
pub struct RequestContext(pub Context);

impl<S> FromRequestParts<S> for RequestContext
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts
            .extensions
            .get::<RequestContext>()
            .cloned()
            .unwrap_or_else(|| RequestContext(Context::new())))
    }
}

/// Ends the span of a context exactly once.
#[derive(Debug)]
pub struct SpanGuard {
    cx: Context,
    ended: bool,
}

impl SpanGuard {
    pub fn new(cx: Context) -> Self {
        Self { cx, ended: false }
    }

    pub fn context(&self) -> &Context {
        &self.cx
    }

    /// Record the response status on the span.
    pub fn record_status(&self, status: StatusCode) {
        let span = self.cx.span();
        span.set_attribute(KeyValue::new(
            HTTP_RESPONSE_STATUS_CODE,
            i64::from(status.as_u16()),
        ));
        if status.is_server_error() {
            span.set_status(Status::error(status.to_string()));
        }
    }

    /// End the span now. Dropping the guard afterwards does nothing.
    pub fn end(mut self) {
        self.finish();
    }

    fn finish(&mut self) {
        if !self.ended {
            self.ended = true;
            self.cx.span().end();
        }
    }
}

impl Drop for SpanGuard {
    fn drop(&mut self) {
        self.finish();
    }
}

/// Layer that instruments a service with server spans.
#[derive(Clone, Debug)]
pub struct InstrumentLayer {
    tracer: SdkTracer,
    naming: SpanNaming,
    propagator: TraceContextPropagator,
}

impl InstrumentLayer {
    pub fn new(tracer: SdkTracer, naming: SpanNaming) -> Self {
        Self {
            tracer,
            naming,
            propagator: TraceContextPropagator::new(),
        }
    }
}

impl<S> Layer<S> for InstrumentLayer {
    type Service = InstrumentService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        InstrumentService {
            inner,
            tracer: self.tracer.clone(),
            naming: self.naming.clone(),
            propagator: self.propagator.clone(),
        }
    }
}

/// Wrap `handler` so each call runs inside a span named `operation_name`.
pub fn wrap<S>(handler: S, tracer: SdkTracer, operation_name: &str) -> InstrumentService<S> {
    InstrumentLayer::new(tracer, SpanNaming::from_operation_name(operation_name)).layer(handler)
}

/// Service produced by [`InstrumentLayer`].
#[derive(Clone, Debug)]
pub struct InstrumentService<S> {
    inner: S,
    tracer: SdkTracer,
    naming: SpanNaming,
    propagator: TraceContextPropagator,
}

impl<S> InstrumentService<S> {
    fn start_span<B>(&self, req: &Request<B>) -> Context {
        let parent = self
            .propagator
            .extract(&HeaderExtractor(req.headers()));

        let mut attributes = vec![
            KeyValue::new(HTTP_REQUEST_METHOD, req.method().to_string()),
            KeyValue::new(URL_PATH, req.uri().path().to_string()),
            KeyValue::new(URL_SCHEME, "http"),
        ];
        if let Some(route) = req.extensions().get::<MatchedPath>() {
            attributes.push(KeyValue::new(HTTP_ROUTE, route.as_str().to_string()));
        }
        if let Some(agent) = req
            .headers()
            .get(axum::http::header::USER_AGENT)
            .and_then(|v| v.to_str().ok())
        {
            attributes.push(KeyValue::new(USER_AGENT_ORIGINAL, agent.to_string()));
        }
        if let Some(id) = req.request_id() {
            attributes.push(KeyValue::new(HTTP_REQUEST_ID, id.to_string()));
        }

        let span = self
            .tracer
            .span_builder(self.naming.span_name(req))
            .with_kind(SpanKind::Server)
            .with_attributes(attributes)
            .start_with_context(&self.tracer, &parent);

        parent.with_span(span)
    }
}

type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send + 'static>>;

impl<S, ReqBody, ResBody> Service<Request<ReqBody>> for InstrumentService<S>
where
    S: Service<Request<ReqBody>, Response = Response<ResBody>> + Send + 'static,
    S::Future: Send + 'static,
    S::Error: Send + 'static,
    ResBody: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = BoxFuture<Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut TaskContext<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request<ReqBody>) -> Self::Future {
        let start = Instant::now();
        let method = req.method().to_string();

        let cx = self.start_span(&req);
        req.extensions_mut().insert(RequestContext(cx.clone()));
        let guard = SpanGuard::new(cx);

        let future = self.inner.call(req);

        Box::pin(async move {
            let result = future.await;

            if let Ok(response) = &result {
                let status = response.status();
                guard.record_status(status);
                metrics::record_request(&method, status.as_u16(), start);
                tracing::debug!(
                    method = %method,
                    status = status.as_u16(),
                    trace_id = %guard.context().span().span_context().trace_id(),
                    "Request span finished"
                );
            }

            guard.end();
            result
        })
    }
}
