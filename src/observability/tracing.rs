//! Distributed tracing support.
//!
//! # Responsibilities
//! - Build the OTLP/HTTP span exporter and the tracer provider
//! - Refuse to start when the collector is unreachable
//! - Hand out an explicit tracer handle for request instrumentation
//! - Flush and shut down the provider at exit
//!
//! # Design Decisions
//! - Batch span processor for the real exporter, simple processor for
//!   injected exporters so tests see spans as soon as they end
//! - Provider calls that block (exporter construction, flush, shutdown)
//!   run on the blocking pool, never on a runtime worker
//! - The global provider is installed only for third-party code; this
//!   crate passes its tracer explicitly

use std::time::Duration;

use opentelemetry::global;
use opentelemetry::trace::TracerProvider as _;
use opentelemetry::InstrumentationScope;
use opentelemetry_otlp::{Protocol, WithExportConfig};
use opentelemetry_sdk::trace::{SdkTracer, SdkTracerProvider, SpanExporter};
use opentelemetry_sdk::Resource;
use tokio::net::TcpStream;
use url::Url;

use crate::config::ExporterConfig;
use crate::error::{Error, Result};

/// Instrumentation scope name of spans created by this crate.
pub const INSTRUMENTATION_NAME: &str = "instrumented-http";

/// Handle to the process tracer provider.
///
/// Cloning is cheap; all clones share one provider.
#[derive(Clone, Debug)]
pub struct Telemetry {
    provider: SdkTracerProvider,
    tracer: SdkTracer,
}

impl Telemetry {
    /// Build a provider exporting to the configured OTLP/HTTP collector.
    pub async fn configure(config: &ExporterConfig, resource: Resource) -> Result<Self> {
        let endpoint = Url::parse(&config.endpoint).map_err(|e| {
            Error::Exporter(format!("invalid endpoint '{}': {}", config.endpoint, e))
        })?;

        if config.verify_on_startup {
            probe_collector(&endpoint, Duration::from_millis(config.probe_timeout_ms)).await?;
        }

        let exporter_config = config.clone();
        let exporter = tokio::task::spawn_blocking(move || {
            opentelemetry_otlp::SpanExporter::builder()
                .with_http()
                .with_protocol(Protocol::HttpBinary)
                .with_endpoint(exporter_config.endpoint)
                .with_timeout(Duration::from_millis(exporter_config.timeout_ms))
                .build()
        })
        .await
        .map_err(|e| Error::Exporter(e.to_string()))?
        .map_err(|e| Error::Exporter(e.to_string()))?;

        let provider = SdkTracerProvider::builder()
            .with_batch_exporter(exporter)
            .with_resource(resource)
            .build();

        tracing::info!(endpoint = %endpoint, "Span exporter configured");
        Ok(Self::from_provider(provider))
    }

    /// Build a provider around an arbitrary exporter.
    pub fn with_exporter<E>(exporter: E, resource: Resource) -> Self
    where
        E: SpanExporter + 'static,
    {
        let provider = SdkTracerProvider::builder()
            .with_simple_exporter(exporter)
            .with_resource(resource)
            .build();
        Self::from_provider(provider)
    }

    fn from_provider(provider: SdkTracerProvider) -> Self {
        let scope = InstrumentationScope::builder(INSTRUMENTATION_NAME)
            .with_version(env!("CARGO_PKG_VERSION"))
            .build();
        let tracer = provider.tracer_with_scope(scope);
        Self { provider, tracer }
    }

    /// Register the provider as the process-wide default.
    pub fn install_global(&self) {
        global::set_tracer_provider(self.provider.clone());
    }

    /// Tracer for creating spans.
    pub fn tracer(&self) -> SdkTracer {
        self.tracer.clone()
    }

    /// Flush buffered spans and release the exporter.
    ///
    /// Returns only after the span processors have handed every ended
    /// span to the exporter. A second call fails.
    pub async fn shutdown(&self) -> Result<()> {
        let provider = self.provider.clone();
        tokio::task::spawn_blocking(move || provider.shutdown())
            .await
            .map_err(|e| Error::Shutdown(e.to_string()))?
            .map_err(|e| Error::Shutdown(e.to_string()))?;

        tracing::info!("Tracer provider shut down");
        Ok(())
    }
}

/// Check that the collector accepts TCP connections.
pub async fn probe_collector(endpoint: &Url, timeout: Duration) -> Result<()> {
    let unreachable = |reason: String| Error::CollectorUnreachable {
        endpoint: endpoint.to_string(),
        reason,
    };

    let host = endpoint
        .host_str()
        .ok_or_else(|| unreachable("missing host".to_string()))?;
    let port = endpoint
        .port_or_known_default()
        .ok_or_else(|| unreachable("missing port".to_string()))?;

    match tokio::time::timeout(timeout, TcpStream::connect((host, port))).await {
        Ok(Ok(_)) => {
            tracing::debug!(host, port, "Collector reachable");
            Ok(())
        }
        Ok(Err(e)) => Err(unreachable(e.to_string())),
        Err(_) => Err(unreachable(format!("no connection within {:?}", timeout))),
    }
}
