//! Span collaborator seam.
//!
//! Instrumented races open one span per attempt through a [`Tracer`]. Backends (the `tracing`
//! adapter in `cutoff-observe`, test recorders, ...) implement [`Tracer`] and are injected via
//! [`crate::RunContext`].
mod backend;
pub use backend::{Attribute, AttributeValue, SpanHandle, SpanStatus, Tracer, TracerHandle};

mod noop;
pub use noop::{NoopSpan, NoopTracer};

#[cfg(test)]
pub(crate) mod recording;

use std::sync::Arc;

/// Create a no-op tracer handle.
#[inline]
pub fn noop_tracer() -> TracerHandle {
    Arc::new(NoopTracer)
}
