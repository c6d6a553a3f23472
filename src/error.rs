//! Service-level error type.

use thiserror::Error;

use crate::config::ConfigError;

/// Errors that abort startup or shutdown.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration could not be loaded or failed validation.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The span exporter could not be constructed.
    #[error("span exporter error: {0}")]
    Exporter(String),

    /// The trace collector did not accept a connection at startup.
    #[error("trace collector at {endpoint} is unreachable: {reason}")]
    CollectorUnreachable { endpoint: String, reason: String },

    /// The HTTP listener could not be bound.
    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    /// The HTTP server stopped with an IO error.
    #[error("server error: {0}")]
    Serve(#[source] std::io::Error),

    /// Flushing or shutting down the tracer provider failed.
    #[error("tracer provider shutdown failed: {0}")]
    Shutdown(String),

    /// The Prometheus exporter could not be installed.
    #[error("metrics exporter error: {0}")]
    Metrics(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
