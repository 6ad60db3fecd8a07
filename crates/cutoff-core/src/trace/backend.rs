use std::{borrow::Cow, fmt, sync::Arc};

/// Value of a span attribute.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    Bool(bool),
    I64(i64),
    F64(f64),
    Str(Cow<'static, str>),
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeValue::Bool(v) => write!(f, "{v}"),
            AttributeValue::I64(v) => write!(f, "{v}"),
            AttributeValue::F64(v) => write!(f, "{v}"),
            AttributeValue::Str(v) => f.write_str(v),
        }
    }
}

impl From<bool> for AttributeValue {
    fn from(v: bool) -> Self {
        AttributeValue::Bool(v)
    }
}

impl From<i64> for AttributeValue {
    fn from(v: i64) -> Self {
        AttributeValue::I64(v)
    }
}

impl From<u32> for AttributeValue {
    fn from(v: u32) -> Self {
        AttributeValue::I64(i64::from(v))
    }
}

impl From<usize> for AttributeValue {
    fn from(v: usize) -> Self {
        AttributeValue::I64(i64::try_from(v).unwrap_or(i64::MAX))
    }
}

impl From<f64> for AttributeValue {
    fn from(v: f64) -> Self {
        AttributeValue::F64(v)
    }
}

impl From<&'static str> for AttributeValue {
    fn from(v: &'static str) -> Self {
        AttributeValue::Str(Cow::Borrowed(v))
    }
}

impl From<String> for AttributeValue {
    fn from(v: String) -> Self {
        AttributeValue::Str(Cow::Owned(v))
    }
}

/// Key/value pair attached to a span.
pub type Attribute = (&'static str, AttributeValue);

/// Final status of a span.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpanStatus {
    Ok,
    Error(Option<String>),
}

impl SpanStatus {
    /// Return label value for logs.
    #[inline]
    pub fn as_label(&self) -> &'static str {
        match self {
            SpanStatus::Ok => "ok",
            SpanStatus::Error(_) => "error",
        }
    }
}

/// One open span.
///
/// The core calls `end` exactly once per span; calls after `end` must be ignored.
pub trait SpanHandle: Send {
    fn set_attribute(&mut self, key: &'static str, value: AttributeValue);

    /// Attach a failure to the span.
    fn record_error(&mut self, error: &dyn fmt::Display);

    fn set_status(&mut self, status: SpanStatus);

    fn end(&mut self);
}

/// Span collaborator used by instrumented races.
///
/// Implementations are injected via [`crate::RunContext`]; the core never holds a span open across
/// more than one attempt.
pub trait Tracer: Send + Sync + 'static {
    /// Open a span named `name` carrying `attributes`.
    fn start_span(&self, name: &str, attributes: &[Attribute]) -> Box<dyn SpanHandle>;
}

/// Shared handle to a tracer.
///
/// Stored in [`crate::RunContext`] and cloned into every attempt.
pub type TracerHandle = Arc<dyn Tracer>;
