use std::{
    fmt, mem,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use tracing::trace;

use crate::error::{Abandoned, Interrupt};

/// Lifecycle of a race.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RaceStatus {
    /// Built, not run yet.
    Pending,
    /// The attempter is executing and nothing decided yet.
    Running,
    /// The attempter settled first.
    Won,
    /// A cancellation token fired first.
    Aborted,
    /// The deadline passed first.
    Overtaken,
}

impl RaceStatus {
    #[inline]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Won | Self::Aborted | Self::Overtaken)
    }

    pub fn as_label(&self) -> &'static str {
        match self {
            RaceStatus::Pending => "pending",
            RaceStatus::Running => "running",
            RaceStatus::Won => "won",
            RaceStatus::Aborted => "aborted",
            RaceStatus::Overtaken => "overtaken",
        }
    }
}

type LossHook = Box<dyn FnOnce(Interrupt) + Send + 'static>;

/// Observable state of one race, handed to the attempter.
///
/// Clones share the same state. Only the race itself moves the status; the attempter can watch
/// it to stop early once the race is lost.
#[derive(Clone)]
pub struct RaceState {
    inner: Arc<Mutex<Inner>>,
}

struct Inner {
    status: RaceStatus,
    loss: Option<Interrupt>,
    on_loss: Vec<LossHook>,
}

impl RaceState {
    pub(crate) fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                status: RaceStatus::Pending,
                loss: None,
                on_loss: Vec::new(),
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn status(&self) -> RaceStatus {
        self.lock().status
    }

    /// `None` until the race is decided.
    pub fn is_lost(&self) -> Option<bool> {
        let status = self.status();
        status
            .is_terminal()
            .then_some(status != RaceStatus::Won)
    }

    /// `None` until the race is decided.
    pub fn is_won(&self) -> Option<bool> {
        self.is_lost().map(|lost| !lost)
    }

    /// What decided a lost race.
    pub fn loss_error(&self) -> Option<Interrupt> {
        self.lock().loss
    }

    /// Run `hook` once if the race is lost; immediately when it already is.
    ///
    /// Never called for a won race.
    pub fn on_loss<F>(&self, hook: F)
    where
        F: FnOnce(Interrupt) + Send + 'static,
    {
        let mut inner = self.lock();
        match inner.loss {
            Some(loss) => {
                drop(inner);
                hook(loss);
            }
            None if inner.status == RaceStatus::Won => {}
            None => inner.on_loss.push(Box::new(hook)),
        }
    }

    /// Fails with [`Abandoned`] once the race is lost.
    ///
    /// Attempters call it at their own checkpoints and propagate the error with `?`; the race
    /// discards it instead of reporting a late error.
    pub fn throw_if_lost(&self) -> Result<(), Abandoned> {
        match self.lock().loss {
            Some(_) => Err(Abandoned),
            None => Ok(()),
        }
    }

    pub(crate) fn start(&self) {
        let mut inner = self.lock();
        if inner.status == RaceStatus::Pending {
            inner.status = RaceStatus::Running;
        }
    }

    /// First decision wins; later ones are ignored.
    pub(crate) fn win(&self) -> bool {
        let mut inner = self.lock();
        if inner.status.is_terminal() {
            return false;
        }
        inner.status = RaceStatus::Won;
        inner.on_loss.clear();
        true
    }

    pub(crate) fn lose(&self, interrupt: Interrupt) -> bool {
        let hooks = {
            let mut inner = self.lock();
            if inner.status.is_terminal() {
                return false;
            }
            inner.status = match interrupt {
                Interrupt::Exceeded(_) => RaceStatus::Overtaken,
                Interrupt::Aborted(_) => RaceStatus::Aborted,
            };
            inner.loss = Some(interrupt);
            mem::take(&mut inner.on_loss)
        };
        trace!(reason = interrupt.as_label(), hooks = hooks.len(), "race lost");
        for hook in hooks {
            hook(interrupt);
        }
        true
    }
}

impl fmt::Debug for RaceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.lock();
        f.debug_struct("RaceState")
            .field("status", &inner.status)
            .field("loss", &inner.loss)
            .field("on_loss", &inner.on_loss.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::error::{Aborted, DeadlineExceeded};

    #[test]
    fn undecided_until_terminal() {
        let s = RaceState::new();
        assert_eq!(s.status(), RaceStatus::Pending);
        assert_eq!(s.is_lost(), None);
        s.start();
        assert_eq!(s.status(), RaceStatus::Running);
        assert_eq!(s.is_won(), None);
        assert!(s.throw_if_lost().is_ok());
    }

    #[test]
    fn first_decision_sticks() {
        let s = RaceState::new();
        s.start();
        assert!(s.lose(Interrupt::Aborted(Aborted)));
        assert!(!s.win());
        assert!(!s.lose(Interrupt::Exceeded(DeadlineExceeded::new(None, None))));

        assert_eq!(s.status(), RaceStatus::Aborted);
        assert_eq!(s.is_lost(), Some(true));
        assert_eq!(s.throw_if_lost(), Err(Abandoned));
    }

    #[test]
    fn overtaken_on_deadline() {
        let s = RaceState::new();
        s.start();
        s.lose(Interrupt::Exceeded(DeadlineExceeded::new(None, None)));
        assert_eq!(s.status(), RaceStatus::Overtaken);
        assert!(matches!(s.loss_error(), Some(Interrupt::Exceeded(_))));
    }

    #[test]
    fn loss_hooks_run_once() {
        let hits = Arc::new(AtomicUsize::new(0));
        let s = RaceState::new();
        s.start();
        let h = Arc::clone(&hits);
        s.on_loss(move |_| {
            h.fetch_add(1, Ordering::SeqCst);
        });
        s.lose(Interrupt::Aborted(Aborted));
        s.lose(Interrupt::Aborted(Aborted));
        assert_eq!(hits.load(Ordering::SeqCst), 1);

        let h = Arc::clone(&hits);
        s.on_loss(move |_| {
            h.fetch_add(1, Ordering::SeqCst);
        });
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn won_race_drops_loss_hooks() {
        let hits = Arc::new(AtomicUsize::new(0));
        let s = RaceState::new();
        s.start();
        let h = Arc::clone(&hits);
        s.on_loss(move |_| {
            h.fetch_add(1, Ordering::SeqCst);
        });
        assert!(s.win());
        assert_eq!(s.is_won(), Some(true));

        let h = Arc::clone(&hits);
        s.on_loss(move |_| {
            h.fetch_add(1, Ordering::SeqCst);
        });
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }
}
