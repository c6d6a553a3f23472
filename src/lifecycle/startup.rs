//! Startup orchestration.
//!
//! Order: metrics → tracer provider → listener. Any failure is fatal and
//! happens before the port is bound, so a misconfigured collector never
//! leaves a half-started server accepting traffic.

use std::net::SocketAddr;

use tokio::net::TcpListener;

use crate::config::AppConfig;
use crate::error::{Error, Result};
use crate::http::HttpServer;
use crate::lifecycle::Shutdown;
use crate::observability::{build_resource, metrics, Telemetry};

/// A fully initialized service, bound but not yet serving.
pub struct Application {
    server: HttpServer,
    listener: TcpListener,
    telemetry: Telemetry,
}

impl Application {
    /// Initialize every subsystem from `config`.
    pub async fn build(config: AppConfig) -> Result<Self> {
        if config.observability.metrics_enabled {
            let addr: SocketAddr = config
                .observability
                .metrics_address
                .parse()
                .map_err(|e: std::net::AddrParseError| Error::Metrics(e.to_string()))?;
            metrics::init_metrics(addr)?;
        }

        let resource = build_resource(&config.service);
        let telemetry = Telemetry::configure(&config.exporter, resource).await?;
        telemetry.install_global();

        Self::with_telemetry(config, telemetry).await
    }

    /// Bind the listener around an already configured provider.
    pub async fn with_telemetry(config: AppConfig, telemetry: Telemetry) -> Result<Self> {
        let address = config.listener.bind_address.clone();
        let listener = TcpListener::bind(&address)
            .await
            .map_err(|source| Error::Bind { address, source })?;

        let server = HttpServer::new(config, telemetry.tracer());
        Ok(Self {
            server,
            listener,
            telemetry,
        })
    }

    /// Address the listener is bound to.
    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.listener.local_addr().map_err(Error::Serve)
    }

    /// Serve until `shutdown` fires, then flush and shut down the tracer
    /// provider. Returns after every ended span reached the exporter.
    pub async fn run(self, shutdown: &Shutdown) -> Result<()> {
        let Self {
            server,
            listener,
            telemetry,
        } = self;

        let served = server.run(listener, shutdown.subscribe()).await;
        if let Err(e) = &served {
            tracing::error!(error = %e, "HTTP server failed");
        }

        telemetry.shutdown().await?;
        served.map_err(Error::Serve)
    }
}
