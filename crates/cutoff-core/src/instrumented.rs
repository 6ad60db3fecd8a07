//! A race wrapped in a span, bounded by the ambient bound.
use std::{fmt, future::Future, marker::PhantomData, sync::Arc, time::Duration};

use tokio::time::Instant;
use tracing::debug;

use crate::{
    ambient,
    bound::Bound,
    classify::Classify,
    context::RunContext,
    error::RaceError,
    metrics::AttemptOutcome,
    race::{LateHooks, RaceState, race},
    trace::{Attribute, SpanHandle, SpanStatus},
};

/// Span attribute: milliseconds left on the effective deadline (absent when infinite).
pub const ATTR_REMAINING_MS: &str = "deadline.remaining_ms";
/// Span attribute: number of tokens bounding the attempt.
pub const ATTR_TOKENS: &str = "tokens";

/// A race that reports to the tracer and metrics of its [`RunContext`].
pub struct InstrumentedRace<A, T, E> {
    span_name: String,
    bound: Bound,
    ctx: RunContext,
    state: RaceState,
    attempter: A,
    late: LateHooks<T, E>,
    _out: PhantomData<fn() -> (T, E)>,
}

/// Race `attempter` against `bound`, the context's tokens and (unless the context escapes it) the
/// ambient bound.
///
/// The merged bound is the attempter's ambient bound for its whole extent, so nested races inherit it.
pub fn instrumented_race<A, Fut, T, E>(
    span_name: impl Into<String>,
    bound: impl Into<Bound>,
    ctx: &RunContext,
    attempter: A,
) -> InstrumentedRace<A, T, E>
where
    A: FnOnce(RaceState) -> Fut,
    Fut: Future<Output = Result<T, E>> + Send + 'static,
    T: Send + 'static,
    E: Classify + fmt::Display + Send + 'static,
{
    InstrumentedRace {
        span_name: span_name.into(),
        bound: bound.into(),
        ctx: ctx.clone(),
        state: RaceState::new(),
        attempter,
        late: LateHooks::default(),
        _out: PhantomData,
    }
}

impl<A, Fut, T, E> InstrumentedRace<A, T, E>
where
    A: FnOnce(RaceState) -> Fut,
    Fut: Future<Output = Result<T, E>> + Send + 'static,
    T: Send + 'static,
    E: Classify + fmt::Display + Send + 'static,
{
    pub fn state(&self) -> &RaceState {
        &self.state
    }

    /// See [`crate::Race::on_late_value`].
    pub fn on_late_value<F>(mut self, hook: F) -> Self
    where
        F: Fn(T, Duration) + Send + Sync + 'static,
    {
        self.late.value = Some(Arc::new(hook));
        self
    }

    /// See [`crate::Race::on_late_error`].
    pub fn on_late_error<F>(mut self, hook: F) -> Self
    where
        F: Fn(E, Duration) + Send + Sync + 'static,
    {
        self.late.error = Some(Arc::new(hook));
        self
    }

    pub(crate) fn with_late(mut self, late: LateHooks<T, E>) -> Self {
        self.late = late;
        self
    }

    pub async fn run(self) -> Result<T, RaceError<E>> {
        let InstrumentedRace {
            span_name,
            bound,
            ctx,
            state,
            attempter,
            late,
            ..
        } = self;

        let explicit = bound.with_tokens(ctx.tokens().clone());
        let effective = ambient::effective_bound(explicit.clone(), ctx.escapes_ambient());

        let mut attributes: Vec<Attribute> = Vec::with_capacity(2);
        if let Some(left) = effective.deadline().remaining() {
            let ms = i64::try_from(left.as_millis()).unwrap_or(i64::MAX);
            attributes.push((ATTR_REMAINING_MS, ms.into()));
        }
        attributes.push((ATTR_TOKENS, effective.tokens().len().into()));

        let span = SpanGuard::new(ctx.tracer().start_span(&span_name, &attributes));
        ctx.metrics().record_attempt_started(&span_name);
        let started = Instant::now();

        let scope = effective.clone();
        let result = race(effective, move |state| {
            let fut = ambient::scoped_sync(scope.clone(), || attempter(state));
            ambient::scoped(scope, fut)
        })
        .with_state(state)
        .with_late(late)
        .run()
        .await;
        explicit.release();

        let elapsed = started.elapsed();
        let outcome = AttemptOutcome::of(&result);
        debug!(
            span = %span_name,
            outcome = outcome.as_label(),
            elapsed_ms = elapsed.as_millis() as u64,
            "attempt settled"
        );
        ctx.metrics()
            .record_attempt_completed(&span_name, outcome, elapsed.as_millis() as u64);
        span.finish(&result);
        result
    }
}

/// Ends its span exactly once, even when the race future is dropped before settling.
struct SpanGuard {
    span: Box<dyn SpanHandle>,
    ended: bool,
}

impl SpanGuard {
    fn new(span: Box<dyn SpanHandle>) -> Self {
        Self { span, ended: false }
    }

    fn finish<T, E: fmt::Display>(mut self, result: &Result<T, RaceError<E>>) {
        match result {
            Ok(_) => self.span.set_status(SpanStatus::Ok),
            Err(err) => {
                self.span.record_error(err);
                self.span.set_status(SpanStatus::Error(Some(err.to_string())));
            }
        }
        self.ended = true;
        self.span.end();
    }
}

impl Drop for SpanGuard {
    fn drop(&mut self) {
        if !self.ended {
            self.span
                .set_status(SpanStatus::Error(Some("dropped before settling".into())));
            self.span.end();
        }
    }
}
