use std::fmt;

use crate::trace::backend::{Attribute, AttributeValue, SpanHandle, SpanStatus, Tracer};

/// Tracer whose spans record nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopTracer;

/// Span handed out by [`NoopTracer`].
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSpan;

impl Tracer for NoopTracer {
    #[inline]
    fn start_span(&self, _: &str, _: &[Attribute]) -> Box<dyn SpanHandle> {
        Box::new(NoopSpan)
    }
}

impl SpanHandle for NoopSpan {
    #[inline(always)]
    fn set_attribute(&mut self, _: &'static str, _: AttributeValue) {}

    #[inline(always)]
    fn record_error(&mut self, _: &dyn fmt::Display) {}

    #[inline(always)]
    fn set_status(&mut self, _: SpanStatus) {}

    #[inline(always)]
    fn end(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn noop_span_is_zero_size() {
        assert_eq!(std::mem::size_of::<NoopSpan>(), 0);
    }

    #[test]
    fn noop_span_accepts_calls_after_end() {
        let mut span = NoopTracer.start_span("t", &[("k", 1_i64.into())]);
        span.end();
        span.record_error(&"boom");
        span.set_status(SpanStatus::Error(None));
        span.end();
    }
}
