//! instrumented-http
//!
//! Serves one instrumented endpoint and exports its spans to a trace
//! collector.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────────────▶ request id ─▶ server span ─▶ handler ─▶ child span "sleep"
//!                                       │                           │
//!                                       ▼                           ▼
//!                                 batch span processor ◀────────────┘
//!                                       │
//!                                       ▼
//!                              OTLP/HTTP span exporter ─────▶ Collector
//! ```
//!
//! Exit status is 1 when configuration, exporter setup, binding, or the
//! final span flush fails.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use instrumented_http::config;
use instrumented_http::lifecycle::{signals, Application, Shutdown};
use instrumented_http::observability::logging;

#[derive(Parser)]
#[command(name = "instrumented-http")]
#[command(about = "HTTP endpoint instrumented with distributed tracing", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match config::resolve(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            logging::init_logging("info");
            tracing::error!(error = %e, "Invalid configuration");
            return ExitCode::FAILURE;
        }
    };

    logging::init_logging(&config.observability.log_level);
    tracing::info!("instrumented-http v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        exporter_endpoint = %config.exporter.endpoint,
        service = %config.service.name,
        "Configuration loaded"
    );

    let app = match Application::build(config).await {
        Ok(app) => app,
        Err(e) => {
            tracing::error!(error = %e, "Startup failed");
            return ExitCode::FAILURE;
        }
    };

    if let Ok(addr) = app.local_addr() {
        tracing::info!(address = %addr, "Listening for connections");
    }

    let shutdown = Shutdown::new();
    signals::spawn_signal_listener(shutdown.clone());

    match app.run(&shutdown).await {
        Ok(()) => {
            tracing::info!("Shutdown complete");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "Shutdown failed");
            ExitCode::FAILURE
        }
    }
}
