//! HTTP middleware.
//!
//! - trace.rs: server spans around instrumented routes

pub mod trace;

pub use trace::{wrap, InstrumentLayer, InstrumentService, RequestContext, SpanGuard, SpanNaming};
