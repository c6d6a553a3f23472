//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, graceful shutdown)
//!     → request.rs (request ID assigned or propagated)
//!     → middleware/trace.rs (server span, request Context)
//!     → handlers.rs (greeting + traced simulated work)
//!     → Send to client
//! ```

pub mod handlers;
pub mod middleware;
pub mod request;
pub mod server;

pub use request::{RequestIdExt, RequestUuid, X_REQUEST_ID};
pub use server::{AppState, HttpServer};
