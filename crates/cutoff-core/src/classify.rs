//! Failure classification used by races and retry predicates.
//!
//! The core never inspects error internals: it only asks these questions.
use std::{borrow::Cow, error::Error, io};

use crate::error::{Abandoned, Aborted, DeadlineExceeded, Interrupt, RaceError, codes};

/// Questions the core asks about an attempter's error.
///
/// Every method has a conservative default, so a plain error type only needs an empty impl:
///
/// ```rust
/// use cutoff_core::Classify;
///
/// #[derive(Debug)]
/// struct QueryFailed;
///
/// impl Classify for QueryFailed {}
/// ```
pub trait Classify {
    /// Stable code used by code-based retry predicates.
    fn code(&self) -> Option<Cow<'_, str>> {
        None
    }

    /// The failure means a deadline ran out.
    fn is_deadline_exceeded(&self) -> bool {
        false
    }

    /// The failure means a cancellation token fired.
    fn is_aborted(&self) -> bool {
        false
    }

    /// The failure is the cooperative [`Abandoned`] signal.
    ///
    /// Such errors are dropped instead of being reported as late arrivals.
    fn is_abandoned(&self) -> bool {
        false
    }
}

impl Classify for DeadlineExceeded {
    fn code(&self) -> Option<Cow<'_, str>> {
        Some(Cow::Borrowed(codes::DEADLINE_EXCEEDED))
    }

    fn is_deadline_exceeded(&self) -> bool {
        true
    }
}

impl Classify for Aborted {
    fn code(&self) -> Option<Cow<'_, str>> {
        Some(Cow::Borrowed(codes::ABORTED))
    }

    fn is_aborted(&self) -> bool {
        true
    }
}

impl Classify for Abandoned {
    fn code(&self) -> Option<Cow<'_, str>> {
        Some(Cow::Borrowed(codes::ABANDONED))
    }

    fn is_abandoned(&self) -> bool {
        true
    }
}

impl Classify for Interrupt {
    fn code(&self) -> Option<Cow<'_, str>> {
        match self {
            Interrupt::Exceeded(e) => e.code(),
            Interrupt::Aborted(e) => e.code(),
        }
    }

    fn is_deadline_exceeded(&self) -> bool {
        matches!(self, Interrupt::Exceeded(_))
    }

    fn is_aborted(&self) -> bool {
        matches!(self, Interrupt::Aborted(_))
    }
}

impl<E: Classify> Classify for RaceError<E> {
    fn code(&self) -> Option<Cow<'_, str>> {
        match self {
            RaceError::Exceeded(e) => e.code(),
            RaceError::Aborted(e) => e.code(),
            RaceError::Failed(e) => e.code(),
        }
    }

    fn is_deadline_exceeded(&self) -> bool {
        match self {
            RaceError::Exceeded(_) => true,
            RaceError::Aborted(_) => false,
            RaceError::Failed(e) => e.is_deadline_exceeded(),
        }
    }

    fn is_aborted(&self) -> bool {
        match self {
            RaceError::Exceeded(_) => false,
            RaceError::Aborted(_) => true,
            RaceError::Failed(e) => e.is_aborted(),
        }
    }

    fn is_abandoned(&self) -> bool {
        matches!(self, RaceError::Failed(e) if e.is_abandoned())
    }
}

impl Classify for &'static str {}

impl Classify for String {}

impl Classify for io::Error {
    fn code(&self) -> Option<Cow<'_, str>> {
        Some(Cow::Owned(format!("{:?}", self.kind())))
    }

    fn is_deadline_exceeded(&self) -> bool {
        self.kind() == io::ErrorKind::TimedOut
    }
}

impl Classify for Box<dyn Error + Send + Sync> {
    fn is_deadline_exceeded(&self) -> bool {
        self.downcast_ref::<DeadlineExceeded>().is_some()
    }

    fn is_aborted(&self) -> bool {
        self.downcast_ref::<Aborted>().is_some()
    }

    fn is_abandoned(&self) -> bool {
        self.downcast_ref::<Abandoned>().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Coded(&'static str);

    impl Classify for Coded {
        fn code(&self) -> Option<Cow<'_, str>> {
            Some(Cow::Borrowed(self.0))
        }
    }

    #[test]
    fn bound_failures_report_their_codes() {
        let e = DeadlineExceeded::new(None, None);
        assert_eq!(e.code().as_deref(), Some(codes::DEADLINE_EXCEEDED));
        assert!(e.is_deadline_exceeded());
        assert_eq!(Aborted.code().as_deref(), Some(codes::ABORTED));
        assert!(Abandoned.is_abandoned());
    }

    #[test]
    fn race_error_delegates_to_failure() {
        let e: RaceError<Coded> = RaceError::Failed(Coded("UNAVAILABLE"));
        assert_eq!(e.code().as_deref(), Some("UNAVAILABLE"));
        assert!(!e.is_aborted());

        let e: RaceError<Coded> = RaceError::Aborted(Aborted);
        assert_eq!(e.code().as_deref(), Some(codes::ABORTED));
    }

    #[test]
    fn plain_strings_have_no_code() {
        assert!("boom".code().is_none());
        assert!(!String::from("boom").is_abandoned());
    }

    #[test]
    fn io_errors_expose_kind_as_code() {
        let e = io::Error::new(io::ErrorKind::TimedOut, "slow");
        assert_eq!(e.code().as_deref(), Some("TimedOut"));
        assert!(e.is_deadline_exceeded());
    }

    #[test]
    fn boxed_errors_are_downcast() {
        let e: Box<dyn Error + Send + Sync> = Box::new(Abandoned);
        assert!(e.is_abandoned());
        let e: Box<dyn Error + Send + Sync> = Box::new(Aborted);
        assert!(e.is_aborted());
    }
}
