use std::sync::Arc;

use crate::{classify::Classify, error::RaceError};

/// Attempt outcome for metrics classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptOutcome {
    /// The attempter settled first with a value.
    Success,
    /// The attempter settled first with an error.
    Failure,
    /// A cancellation token decided the attempt.
    Canceled,
    /// A deadline decided the attempt.
    Timeout,
}

impl AttemptOutcome {
    /// Return label value for metrics.
    #[inline]
    pub fn as_label(&self) -> &'static str {
        match self {
            AttemptOutcome::Success => "success",
            AttemptOutcome::Failure => "failure",
            AttemptOutcome::Canceled => "canceled",
            AttemptOutcome::Timeout => "timeout",
        }
    }

    /// Classify the result of a race.
    ///
    /// Attempter errors that themselves mean "deadline exceeded" or "aborted" count as such.
    pub fn of<T, E: Classify>(result: &Result<T, RaceError<E>>) -> Self {
        match result {
            Ok(_) => AttemptOutcome::Success,
            Err(e) if Classify::is_deadline_exceeded(e) => AttemptOutcome::Timeout,
            Err(e) if Classify::is_aborted(e) => AttemptOutcome::Canceled,
            Err(_) => AttemptOutcome::Failure,
        }
    }
}

/// Backend metrics collection interface.
///
/// Implementations are injected via [`crate::RunContext`] and called by instrumented races and
/// resilient runs.
pub trait MetricsBackend: Send + Sync + 'static {
    /// Record an attempt entering its race.
    ///
    /// # Arguments
    /// - `span`: Span name of the operation
    fn record_attempt_started(&self, span: &str);
    /// Record attempt completion with outcome and duration.
    ///
    /// # Arguments
    /// - `span`: Span name of the operation
    /// - `outcome`: How the attempt's race was decided
    /// - `duration_ms`: Time from start to decision in milliseconds
    fn record_attempt_completed(&self, span: &str, outcome: AttemptOutcome, duration_ms: u64);
    /// Record a retry being scheduled.
    ///
    /// Called once per retry, before its backoff delay.
    fn record_retry(&self, span: &str);
}

/// Shared handle to metrics backend.
///
/// Stored in [`crate::RunContext`] and cloned into each attempt.
pub type MetricsHandle = Arc<dyn MetricsBackend>;
