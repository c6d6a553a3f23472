//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Request handling produces:
//!     → logging.rs (structured log events, stdout)
//!     → metrics.rs (counters, histograms)
//!     → tracing.rs (OpenTelemetry spans)
//!
//! Consumers:
//!     → Log aggregation (stdout)
//!     → Metrics endpoint (Prometheus scrape, optional)
//!     → Trace collector (OTLP/HTTP, batched)
//! ```
//!
//! # Design Decisions
//! - Every exported span carries the resource from resource.rs
//! - The tracer handle is passed explicitly, not looked up globally

pub mod logging;
pub mod metrics;
pub mod resource;
pub mod tracing;

pub use self::resource::build_resource;
pub use self::tracing::Telemetry;
