//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the service.
//! All types derive Serde traits for deserialization from config files, and
//! every field has a compiled-in default so the service runs with no file.

use serde::{Deserialize, Serialize};

/// Root configuration for the instrumented service.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Service identity attached to every exported span.
    pub service: ServiceConfig,

    /// Span exporter settings.
    pub exporter: ExporterConfig,

    /// The instrumented route and its simulated work.
    pub handler: HandlerConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:3030").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:3030".to_string(),
        }
    }
}

/// Service identity, exported as resource attributes.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// `service.name`.
    pub name: String,

    /// `service.version`.
    pub version: String,

    /// `environment`.
    pub environment: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: "http".to_string(),
            version: "v0.1.0".to_string(),
            environment: "demo".to_string(),
        }
    }
}

/// OTLP/HTTP span exporter configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ExporterConfig {
    /// Full collector URL for trace export, including the `/v1/traces` path.
    pub endpoint: String,

    /// Export request timeout in milliseconds.
    pub timeout_ms: u64,

    /// Refuse to start when the collector cannot be reached.
    pub verify_on_startup: bool,

    /// Connect timeout for the startup reachability probe, in milliseconds.
    pub probe_timeout_ms: u64,
}

impl Default for ExporterConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:4318/v1/traces".to_string(),
            timeout_ms: 10_000,
            verify_on_startup: true,
            probe_timeout_ms: 2_000,
        }
    }
}

/// Configuration of the instrumented endpoint.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HandlerConfig {
    /// Route path of the instrumented endpoint.
    pub path: String,

    /// Name of the server span. When empty, the span is named after the
    /// matched route (`"GET /hello-instrumented"`).
    pub operation_name: String,

    /// Duration of the simulated work in milliseconds.
    pub sleep_ms: u64,
}

impl Default for HandlerConfig {
    fn default() -> Self {
        Self {
            path: "/hello-instrumented".to_string(),
            operation_name: "hello-instrumented".to_string(),
            sleep_ms: 1_000,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
