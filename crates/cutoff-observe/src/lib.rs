//! Logging and span plumbing for `cutoff` applications.
//!
//! - [`init_logger`] installs a global `tracing` subscriber (text, json or journald).
//! - [`TracingTracer`] turns instrumented-race spans into `tracing` spans.
mod logger;
pub use logger::*;

mod span;
pub use span::TracingTracer;
