//! A single HTTP endpoint instrumented with OpenTelemetry spans.
//!
//! Each request to the endpoint runs inside a server span; the handler's
//! simulated work runs inside a child span. Spans are batched and exported
//! over OTLP/HTTP.

pub mod config;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod observability;

pub use config::schema::AppConfig;
pub use error::{Error, Result};
pub use http::HttpServer;
pub use lifecycle::{Application, Shutdown};
pub use observability::Telemetry;
