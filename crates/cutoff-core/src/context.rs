use std::fmt;

use tokio_util::sync::CancellationToken;

use crate::{
    cancel::CancellationSet,
    metrics::{MetricsHandle, noop_metrics},
    trace::{TracerHandle, noop_tracer},
};

/// Collaborators and extra bounds passed to instrumented races and resilient runs.
#[derive(Clone)]
pub struct RunContext {
    tracer: TracerHandle,
    metrics: MetricsHandle,
    tokens: CancellationSet,
    escape_ambient: bool,
}

impl RunContext {
    /// Create a context with the given collaborators, no tokens, inheriting the ambient bound.
    pub fn new(tracer: TracerHandle, metrics: MetricsHandle) -> Self {
        Self {
            tracer,
            metrics,
            tokens: CancellationSet::new(),
            escape_ambient: false,
        }
    }

    pub fn tracer(&self) -> &TracerHandle {
        &self.tracer
    }

    /// Get a clonable handle to the metrics backend.
    pub fn metrics(&self) -> &MetricsHandle {
        &self.metrics
    }

    /// Tokens observed in addition to the ambient ones.
    pub fn tokens(&self) -> &CancellationSet {
        &self.tokens
    }

    /// `true` when the ambient bound is ignored.
    pub fn escapes_ambient(&self) -> bool {
        self.escape_ambient
    }

    /// Replace the tracer and return updated context.
    pub fn with_tracer(mut self, tracer: TracerHandle) -> Self {
        self.tracer = tracer;
        self
    }

    /// Replace the metrics backend and return updated context.
    pub fn with_metrics(mut self, metrics: MetricsHandle) -> Self {
        self.metrics = metrics;
        self
    }

    /// Add tokens to observe and return updated context.
    pub fn with_tokens(mut self, tokens: impl Into<CancellationSet>) -> Self {
        self.tokens = self.tokens.union(&tokens.into());
        self
    }

    /// Add one token to observe and return updated context.
    pub fn with_token(mut self, token: CancellationToken) -> Self {
        self.tokens.push(token);
        self
    }

    /// Ignore the ambient bound: only the explicit deadline and tokens apply.
    pub fn escaping_ambient(mut self) -> Self {
        self.escape_ambient = true;
        self
    }
}

impl Default for RunContext {
    fn default() -> Self {
        Self::new(noop_tracer(), noop_metrics())
    }
}

impl fmt::Debug for RunContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunContext")
            .field("tokens", &self.tokens.len())
            .field("escape_ambient", &self.escape_ambient)
            .field("tracer", &"<handle>")
            .field("metrics", &"<handle>")
            .finish()
    }
}

impl fmt::Display for RunContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "RunContext(tokens={}, escape_ambient={})",
            self.tokens.len(),
            self.escape_ambient
        )
    }
}
