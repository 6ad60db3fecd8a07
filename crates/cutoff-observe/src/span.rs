//! [`Tracer`] adapter that opens `tracing` spans.
use std::fmt;

use cutoff_core::{
    instrumented::{ATTR_REMAINING_MS, ATTR_TOKENS},
    trace::{Attribute, AttributeValue, SpanHandle, SpanStatus, Tracer},
};
use tracing::{Span, debug, field::Empty, info_span};

/// Opens one `cutoff.attempt` span per instrumented attempt.
///
/// The attempt's name lands in the `span_name` field. Deadline and token attributes, the final
/// status and the error message are recorded on the span and reported when it closes. The span is
/// never entered: events emitted by the attempter keep their own parent.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingTracer;

impl TracingTracer {
    pub fn new() -> Self {
        Self
    }
}

impl Tracer for TracingTracer {
    fn start_span(&self, name: &str, attributes: &[Attribute]) -> Box<dyn SpanHandle> {
        let span = info_span!(
            "cutoff.attempt",
            span_name = name,
            deadline.remaining_ms = Empty,
            tokens = Empty,
            status = Empty,
            error = Empty,
        );
        let mut handle = TracingSpan { span: Some(span) };
        for (key, value) in attributes {
            handle.set_attribute(key, value.clone());
        }
        Box::new(handle)
    }
}

struct TracingSpan {
    span: Option<Span>,
}

impl SpanHandle for TracingSpan {
    fn set_attribute(&mut self, key: &'static str, value: AttributeValue) {
        let Some(span) = &self.span else { return };

        match key {
            ATTR_REMAINING_MS | ATTR_TOKENS => record(span, key, &value),
            _ => {
                // fields of a tracing span are fixed at creation
                debug!(parent: span, attribute = key, value = %value, "span attribute");
            }
        }
    }

    fn record_error(&mut self, error: &dyn fmt::Display) {
        if let Some(span) = &self.span {
            span.record("error", tracing::field::display(error));
        }
    }

    fn set_status(&mut self, status: SpanStatus) {
        if let Some(span) = &self.span {
            span.record("status", status.as_label());
        }
    }

    fn end(&mut self) {
        self.span.take();
    }
}

fn record(span: &Span, key: &'static str, value: &AttributeValue) {
    match value {
        AttributeValue::Bool(v) => span.record(key, *v),
        AttributeValue::I64(v) => span.record(key, *v),
        AttributeValue::F64(v) => span.record(key, *v),
        AttributeValue::Str(v) => span.record(key, v.as_ref()),
    };
}
