//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the instrumented route
//! - Wire up middleware (request ID, HTTP logging, spans, panic catching)
//! - Bind server to listener
//! - Stop accepting on shutdown and drain in-flight requests

use std::time::Duration;

use axum::routing::get;
use axum::Router;
use opentelemetry_sdk::trace::SdkTracer;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::trace::TraceLayer;

use crate::config::{AppConfig, HandlerConfig};
use crate::http::handlers;
use crate::http::middleware::{InstrumentLayer, SpanNaming};
use crate::http::request::{propagate_request_id_layer, set_request_id_layer};

/// Application state injected into handlers.
///
/// Carries the tracer explicitly; nothing in the request path reads the
/// global provider.
#[derive(Clone, Debug)]
pub struct AppState {
    pub tracer: SdkTracer,
    pub sleep: Duration,
}

/// HTTP server for the instrumented endpoint.
pub struct HttpServer {
    router: Router,
    config: AppConfig,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: AppConfig, tracer: SdkTracer) -> Self {
        let router = Self::build_router(&config.handler, tracer);
        Self { router, config }
    }

    /// Build the Axum router with all middleware layers.
    ///
    /// Route layers run only for the instrumented route, so unknown paths
    /// produce no spans. Layer order, outermost first: request ID, HTTP
    /// logging, server span, panic catcher, handler.
    fn build_router(handler: &HandlerConfig, tracer: SdkTracer) -> Router {
        let state = AppState {
            tracer: tracer.clone(),
            sleep: Duration::from_millis(handler.sleep_ms),
        };

        Router::new()
            .route(&handler.path, get(handlers::hello).post(handlers::hello))
            .route_layer(CatchPanicLayer::new())
            .route_layer(InstrumentLayer::new(
                tracer,
                SpanNaming::from_operation_name(&handler.operation_name),
            ))
            .with_state(state)
            .layer(propagate_request_id_layer())
            .layer(TraceLayer::new_for_http())
            .layer(set_request_id_layer())
    }

    /// Run the server until `shutdown` fires, then drain in-flight requests.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            path = %self.config.handler.path,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// The router, for in-process requests.
    pub fn router(&self) -> Router {
        self.router.clone()
    }
}
