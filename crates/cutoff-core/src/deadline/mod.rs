//! Time bounds for asynchronous work.
//!
//! A [`Deadline`] is either a fixed cutoff instant or "never". Finite deadlines allocate their timer
//! and cancellation token lazily, on the first call that needs them ([`Deadline::signal`],
//! [`Deadline::exceeded`], [`Deadline::on_exceeded`]); a deadline nobody waits on costs no timer.
//!
//! Cloning a `Deadline` is cheap and clones share timer state. Build a new deadline from an existing
//! one ([`DeadlineInput::Deadline`]) to get the same cutoff with independent state.
mod input;
pub use input::DeadlineInput;

mod timer;
pub use timer::ExceededHook;

use std::{fmt, future::Future, sync::Arc, time::Duration};

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::error::DeadlineExceeded;
use input::Resolved;
use timer::Finite;

/// Horizon beyond which a cutoff is treated as "never" (`i32::MAX` milliseconds, about 24.8 days).
pub const DISTANT_FUTURE: Duration = Duration::from_millis(i32::MAX as u64);

/// An expiration instant, or none.
#[derive(Clone, Default)]
pub struct Deadline {
    finite: Option<Arc<Finite>>,
}

impl Deadline {
    /// Build a deadline from any supported input.
    ///
    /// # Panics
    /// On [`DeadlineInput::Seconds`] carrying `NaN`.
    pub fn new(input: impl Into<DeadlineInput>) -> Self {
        match input.into().resolve(DISTANT_FUTURE) {
            Resolved::Infinite => Self::infinite(),
            Resolved::Finite {
                cutoff,
                timeout,
                exceeded,
            } => Self {
                finite: Some(Arc::new(Finite::new(cutoff, timeout, exceeded))),
            },
        }
    }

    /// A deadline `timeout` from now.
    #[inline]
    pub fn after(timeout: Duration) -> Self {
        Self::new(timeout)
    }

    /// A deadline at the given instant.
    #[inline]
    pub fn at(cutoff: Instant) -> Self {
        Self::new(cutoff)
    }

    /// A deadline that never expires.
    #[inline]
    pub const fn infinite() -> Self {
        Self { finite: None }
    }

    /// The instant beyond which cutoffs collapse to [`Deadline::infinite`].
    pub fn distant_future() -> Instant {
        Instant::now() + DISTANT_FUTURE
    }

    /// The tightest of the given deadlines, or infinite when there are none.
    ///
    /// Ties keep the first deadline with the minimal cutoff.
    pub fn first<'a>(deadlines: impl IntoIterator<Item = &'a Deadline>) -> Deadline {
        let mut best: Option<&Deadline> = None;
        for d in deadlines {
            let Some(cutoff) = d.cutoff() else {
                continue;
            };
            match best.and_then(Deadline::cutoff) {
                Some(current) if current <= cutoff => {}
                _ => best = Some(d),
            }
        }
        best.cloned().unwrap_or_default()
    }

    #[inline]
    pub fn is_infinite(&self) -> bool {
        self.finite.is_none()
    }

    /// Cutoff instant; `None` for infinite deadlines.
    #[inline]
    pub fn cutoff(&self) -> Option<Instant> {
        self.finite.as_ref().map(|f| f.cutoff)
    }

    /// Timeout the deadline was built from, when it was built from a duration.
    #[inline]
    pub fn timeout(&self) -> Option<Duration> {
        self.finite.as_ref().and_then(|f| f.timeout)
    }

    /// Time left before the cutoff, zero once passed; `None` for infinite deadlines.
    pub fn remaining(&self) -> Option<Duration> {
        self.cutoff()
            .map(|c| c.saturating_duration_since(Instant::now()))
    }

    /// `true` once the deadline was marked exceeded or the clock passed the cutoff.
    pub fn is_exceeded(&self) -> bool {
        self.finite.as_ref().is_some_and(|f| f.is_exceeded())
    }

    /// The failure describing this deadline being exceeded.
    ///
    /// Returns `None` while the deadline is live. With `force`, the deadline is marked exceeded
    /// right away (pending hooks run, the signal fires); forcing is permanent and idempotent.
    pub fn exceeded_error(&self, force: bool) -> Option<DeadlineExceeded> {
        match &self.finite {
            None if force => Some(DeadlineExceeded::new(None, None)),
            None => None,
            Some(f) if force => {
                f.fire();
                Some(f.error())
            }
            Some(f) => f.is_exceeded().then(|| f.error()),
        }
    }

    /// Synchronous check.
    pub fn throw_if_exceeded(&self) -> Result<(), DeadlineExceeded> {
        match self.exceeded_error(false) {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Cancellation token that fires at the cutoff.
    ///
    /// Created and cached on first call, so every caller gets the same token. Infinite deadlines
    /// hand out a token that never fires.
    ///
    /// Must be called from within a tokio runtime when the deadline is finite and live.
    pub fn signal(&self) -> CancellationToken {
        match &self.finite {
            Some(f) => f.signal(),
            None => CancellationToken::new(),
        }
    }

    /// Resolves with the failure once the deadline passes; never resolves for infinite deadlines.
    ///
    /// All calls share the deadline's single lazily armed timer.
    pub fn exceeded(&self) -> impl Future<Output = DeadlineExceeded> + Send + 'static {
        let armed = self.finite.as_ref().map(|f| (f.signal(), f.error()));
        async move {
            match armed {
                Some((token, err)) => {
                    token.cancelled_owned().await;
                    err
                }
                None => std::future::pending().await,
            }
        }
    }

    /// Run `hook` once when the deadline passes, or on the next scheduler tick if it already has.
    ///
    /// The returned handle deregisters the hook; dropping it does not. Infinite deadlines never
    /// call the hook.
    pub fn on_exceeded<F>(&self, hook: F) -> ExceededHook
    where
        F: FnOnce(DeadlineExceeded) + Send + 'static,
    {
        match &self.finite {
            Some(f) => {
                let id = f.on_exceeded(Box::new(hook));
                ExceededHook::new(f, id)
            }
            None => ExceededHook::inert(),
        }
    }

    /// Release the pending timer, registered hooks and cached token.
    ///
    /// The cutoff is unchanged: later probes fall back to the clock. Calling it again is a no-op.
    pub fn clear(&self) {
        if let Some(f) = &self.finite {
            f.clear();
        }
    }

    /// `true` when both handles share the same timer state.
    pub fn same_as(&self, other: &Deadline) -> bool {
        match (&self.finite, &other.finite) {
            (None, None) => true,
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl From<Duration> for Deadline {
    fn from(d: Duration) -> Self {
        Deadline::new(d)
    }
}

impl From<Instant> for Deadline {
    fn from(at: Instant) -> Self {
        Deadline::new(at)
    }
}

impl fmt::Debug for Deadline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.finite {
            None => f.write_str("Deadline(infinite)"),
            Some(inner) => f
                .debug_struct("Deadline")
                .field("remaining", &self.remaining())
                .field("timeout", &inner.timeout)
                .field("exceeded", &inner.is_exceeded())
                .finish(),
        }
    }
}

impl fmt::Display for Deadline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.remaining() {
            None => f.write_str("Deadline(infinite)"),
            Some(left) => write!(f, "Deadline(remaining_ms={})", left.as_millis()),
        }
    }
}
