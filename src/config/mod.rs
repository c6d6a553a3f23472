//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! compiled-in defaults
//!     → optional TOML file (loader.rs)
//!     → environment overrides (OTEL_EXPORTER_OTLP_*)
//!     → validation.rs (semantic checks)
//!     → AppConfig (validated, immutable)
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded
//! - All fields have defaults to allow running with no file at all
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{resolve, ConfigError};
pub use schema::{
    AppConfig, ExporterConfig, HandlerConfig, ListenerConfig, ObservabilityConfig, ServiceConfig,
};
