//! Racing an attempt against a [`Bound`].
//!
//! [`race`] builds a [`Race`]; [`Race::run`] invokes the attempter and settles with whichever comes
//! first: the attempter's result, the deadline, or one of the tokens.
mod late;
pub use late::{LateErrorHook, LateValueHook};
pub(crate) use late::LateHooks;

mod state;
pub use state::{RaceState, RaceStatus};

use std::{
    future::{Future, poll_fn},
    marker::PhantomData,
    sync::Arc,
    task::Poll,
    time::Duration,
};

use tokio::time::Instant;
use tracing::trace;

use crate::{
    bound::Bound,
    classify::Classify,
    error::{Interrupt, RaceError},
};

/// A single race, ready to [`run`](Race::run).
pub struct Race<A, T, E> {
    bound: Bound,
    state: RaceState,
    attempter: A,
    late: LateHooks<T, E>,
    _out: PhantomData<fn() -> (T, E)>,
}

/// Race `attempter` against `bound`.
///
/// The bound is used as is: ambient bounds are only merged by [`crate::instrumented_race`].
pub fn race<A, Fut, T, E>(bound: impl Into<Bound>, attempter: A) -> Race<A, T, E>
where
    A: FnOnce(RaceState) -> Fut,
    Fut: Future<Output = Result<T, E>> + Send + 'static,
    T: Send + 'static,
    E: Classify + Send + 'static,
{
    Race {
        bound: bound.into(),
        state: RaceState::new(),
        attempter,
        late: LateHooks::default(),
        _out: PhantomData,
    }
}

impl<A, Fut, T, E> Race<A, T, E>
where
    A: FnOnce(RaceState) -> Fut,
    Fut: Future<Output = Result<T, E>> + Send + 'static,
    T: Send + 'static,
    E: Classify + Send + 'static,
{
    /// State shared with the attempter.
    pub fn state(&self) -> &RaceState {
        &self.state
    }

    /// Deliver values the attempter produces after the race was decided.
    pub fn on_late_value<F>(mut self, hook: F) -> Self
    where
        F: Fn(T, Duration) + Send + Sync + 'static,
    {
        self.late.value = Some(Arc::new(hook));
        self
    }

    /// Deliver errors the attempter produces after the race was decided.
    ///
    /// [`crate::Abandoned`] errors are never delivered.
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

    pub(crate) fn with_state(mut self, state: RaceState) -> Self {
        self.state = state;
        self
    }

    /// Invoke the attempter and settle the race.
    ///
    /// The attempter is invoked and its future polled once before anything else, even when the
    /// bound already stops work; such a race is then lost whatever that first poll produced.
    pub async fn run(self) -> Result<T, RaceError<E>> {
        let Race {
            bound,
            state,
            attempter,
            late,
            ..
        } = self;

        state.start();
        let fut = attempter(state.clone());

        if let Some(interrupt) = bound.interruption() {
            // the attempter body still gets its first poll
            let mut fut = Box::pin(fut);
            let first = poll_fn(|cx| Poll::Ready(fut.as_mut().poll(cx))).await;
            let out = match first {
                Poll::Ready(settled) => {
                    state.lose(interrupt);
                    trace!(
                        status = state.status().as_label(),
                        "attempt settled on its first poll after the bound fired"
                    );
                    late.deliver(settled, Duration::ZERO);
                    Err(interrupt.into())
                }
                Poll::Pending => lose(&state, interrupt, fut, late),
            };
            bound.release();
            return out;
        }

        if bound.is_unbounded() {
            let out = fut.await;
            state.win();
            return out.map_err(RaceError::Failed);
        }

        let mut fut = Box::pin(fut);
        let interrupted = bound.interrupted();
        let out = tokio::select! {
            biased;
            out = &mut fut => {
                state.win();
                out.map_err(RaceError::Failed)
            }
            interrupt = interrupted => lose(&state, interrupt, fut, late),
        };
        bound.release();
        out
    }
}

fn lose<T, E, F>(
    state: &RaceState,
    interrupt: Interrupt,
    fut: F,
    late: LateHooks<T, E>,
) -> Result<T, RaceError<E>>
where
    F: Future<Output = Result<T, E>> + Send + 'static,
    T: Send + 'static,
    E: Classify + Send + 'static,
{
    state.lose(interrupt);
    trace!(status = state.status().as_label(), "race decided against attempter");
    late.track(fut, Instant::now());
    Err(interrupt.into())
}
