use std::{fmt, time::Duration};

use thiserror::Error;
use tokio::time::Instant;

/// Well-known failure codes reported through [`crate::Classify::code`].
pub mod codes {
    /// A bounded operation ran out of time.
    pub const DEADLINE_EXCEEDED: &str = "DEADLINE_EXCEEDED";
    /// A cancellation token fired.
    pub const ABORTED: &str = "ABORTED";
    /// Cooperative signal raised inside an attempt whose race is already decided.
    pub const ABANDONED: &str = "ABANDONED";
}

/// The time budget of a bounded operation ran out.
///
/// Carries the cutoff instant when the deadline was finite and the original timeout when the deadline was built from a duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeadlineExceeded {
    cutoff: Option<Instant>,
    timeout: Option<Duration>,
}

impl DeadlineExceeded {
    /// Build the failure for a deadline with the given cutoff and original timeout.
    pub fn new(cutoff: Option<Instant>, timeout: Option<Duration>) -> Self {
        Self { cutoff, timeout }
    }

    /// Cutoff instant of the exceeded deadline.
    #[inline]
    pub fn cutoff(&self) -> Option<Instant> {
        self.cutoff
    }

    /// Timeout the deadline was created from, if any.
    #[inline]
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }
}

impl fmt::Display for DeadlineExceeded {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.timeout {
            Some(t) => write!(f, "deadline exceeded after {}ms", t.as_millis()),
            None => f.write_str("deadline exceeded"),
        }
    }
}

impl std::error::Error for DeadlineExceeded {}

/// An external cancellation token fired before the operation settled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Error)]
#[error("operation aborted")]
pub struct Aborted;

/// The race this attempt belongs to was already decided.
///
/// Only meaningful to code running inside a lost attempt: it is how
/// [`crate::RaceState::throw_if_lost`] unwinds that attempt. It is never reported as a race outcome nor as a late error.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Error)]
#[error("attempt abandoned: race already decided")]
pub struct Abandoned;

/// Why a bound stopped an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Interrupt {
    #[error(transparent)]
    Exceeded(#[from] DeadlineExceeded),

    #[error(transparent)]
    Aborted(#[from] Aborted),
}

impl Interrupt {
    /// Metrics/log label for this interruption.
    pub fn as_label(&self) -> &'static str {
        match self {
            Interrupt::Exceeded(_) => "timeout",
            Interrupt::Aborted(_) => "canceled",
        }
    }
}

/// Outcome error of a race or of a resilient run.
///
/// `Failed` carries the attempter's own error unchanged.
#[derive(Debug, Error)]
pub enum RaceError<E> {
    #[error(transparent)]
    Exceeded(#[from] DeadlineExceeded),

    #[error(transparent)]
    Aborted(#[from] Aborted),

    #[error("{0}")]
    Failed(E),
}

impl<E> RaceError<E> {
    /// `true` when the deadline decided the outcome.
    #[inline]
    pub fn is_exceeded(&self) -> bool {
        matches!(self, RaceError::Exceeded(_))
    }

    /// `true` when a cancellation token decided the outcome.
    #[inline]
    pub fn is_aborted(&self) -> bool {
        matches!(self, RaceError::Aborted(_))
    }

    /// Borrow the attempter's error, if that is what settled the race.
    pub fn failure(&self) -> Option<&E> {
        match self {
            RaceError::Failed(e) => Some(e),
            _ => None,
        }
    }

    /// Take the attempter's error, if that is what settled the race.
    pub fn into_failure(self) -> Option<E> {
        match self {
            RaceError::Failed(e) => Some(e),
            _ => None,
        }
    }

    /// Map the attempter's error type, keeping bound failures as they are.
    pub fn map_failure<F>(self, f: impl FnOnce(E) -> F) -> RaceError<F> {
        match self {
            RaceError::Exceeded(e) => RaceError::Exceeded(e),
            RaceError::Aborted(e) => RaceError::Aborted(e),
            RaceError::Failed(e) => RaceError::Failed(f(e)),
        }
    }
}

impl<E> From<Interrupt> for RaceError<E> {
    fn from(i: Interrupt) -> Self {
        match i {
            Interrupt::Exceeded(e) => RaceError::Exceeded(e),
            Interrupt::Aborted(e) => RaceError::Aborted(e),
        }
    }
}
