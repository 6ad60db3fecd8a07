use std::{
    mem,
    sync::{Arc, Mutex, MutexGuard, PoisonError, Weak},
    time::Duration,
};

use tokio::{task::AbortHandle, time::Instant};
use tokio_util::sync::CancellationToken;
use tracing::trace;

use crate::error::DeadlineExceeded;

pub(super) type Hook = Box<dyn FnOnce(DeadlineExceeded) + Send + 'static>;

/// Shared state of a finite deadline.
///
/// `cutoff` is fixed; everything in `Timer` is allocated on first observation.
pub(super) struct Finite {
    pub(super) cutoff: Instant,
    pub(super) timeout: Option<Duration>,
    timer: Mutex<Timer>,
}

#[derive(Default)]
struct Timer {
    exceeded: bool,
    token: Option<CancellationToken>,
    task: Option<AbortHandle>,
    hooks: Vec<(u64, Hook)>,
    next_hook: u64,
}

impl Finite {
    pub(super) fn new(cutoff: Instant, timeout: Option<Duration>, exceeded: bool) -> Self {
        Self {
            cutoff,
            timeout,
            timer: Mutex::new(Timer {
                exceeded,
                ..Timer::default()
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Timer> {
        self.timer.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(super) fn error(&self) -> DeadlineExceeded {
        DeadlineExceeded::new(Some(self.cutoff), self.timeout)
    }

    pub(super) fn is_exceeded(&self) -> bool {
        self.lock().exceeded || Instant::now() >= self.cutoff
    }

    /// Token fired at the cutoff; created and cached on first call.
    pub(super) fn signal(self: &Arc<Self>) -> CancellationToken {
        let mut t = self.lock();
        if let Some(token) = &t.token {
            return token.clone();
        }
        let token = CancellationToken::new();
        t.token = Some(token.clone());

        if t.exceeded || Instant::now() >= self.cutoff {
            t.exceeded = true;
            token.cancel();
        } else {
            self.arm(&mut t);
        }
        token
    }

    /// Register a hook fired once at the cutoff, or on the next tick if already past.
    pub(super) fn on_exceeded(self: &Arc<Self>, hook: Hook) -> u64 {
        let mut t = self.lock();
        let id = t.next_hook;
        t.next_hook += 1;
        t.hooks.push((id, hook));
        self.arm(&mut t);
        id
    }

    pub(super) fn remove_hook(&self, id: u64) {
        self.lock().hooks.retain(|(hid, _)| *hid != id);
    }

    /// Mark exceeded and flush the token and hooks. Idempotent.
    pub(super) fn fire(&self) {
        let (task, token, hooks) = {
            let mut t = self.lock();
            t.exceeded = true;
            (t.task.take(), t.token.clone(), mem::take(&mut t.hooks))
        };
        if let Some(task) = task {
            task.abort();
        }
        if let Some(token) = token {
            token.cancel();
        }
        if !hooks.is_empty() {
            trace!(hooks = hooks.len(), "deadline exceeded; running hooks");
        }
        let err = self.error();
        for (_, hook) in hooks {
            hook(err);
        }
    }

    /// Release the pending timer, hooks and token. Double release is a no-op.
    pub(super) fn clear(&self) {
        let (task, _hooks, _token) = {
            let mut t = self.lock();
            (t.task.take(), mem::take(&mut t.hooks), t.token.take())
        };
        if let Some(task) = task {
            task.abort();
        }
    }

    /// Spawn the timer task unless one is pending.
    ///
    /// Must be called from within a tokio runtime.
    fn arm(self: &Arc<Self>, t: &mut Timer) {
        if t.task.is_some() {
            return;
        }
        let at = if t.exceeded { Instant::now() } else { self.cutoff };
        let this = Arc::clone(self);
        let handle = tokio::spawn(async move {
            tokio::time::sleep_until(at).await;
            this.fire();
        });
        t.task = Some(handle.abort_handle());
    }
}

/// Deregistration handle returned by [`super::Deadline::on_exceeded`].
///
/// Dropping it keeps the hook registered; call [`ExceededHook::clear`] to deregister.
#[derive(Debug, Clone, Default)]
pub struct ExceededHook {
    target: Option<(Weak<Finite>, u64)>,
}

impl ExceededHook {
    pub(super) fn new(finite: &Arc<Finite>, id: u64) -> Self {
        Self {
            target: Some((Arc::downgrade(finite), id)),
        }
    }

    /// A hook that was never registered (infinite deadlines).
    pub(super) fn inert() -> Self {
        Self { target: None }
    }

    /// Deregister the hook. Safe to call any number of times, before or after it fired.
    pub fn clear(&self) {
        if let Some((finite, id)) = &self.target {
            if let Some(finite) = finite.upgrade() {
                finite.remove_hook(*id);
            }
        }
    }
}

impl std::fmt::Debug for Finite {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Finite")
            .field("cutoff", &self.cutoff)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}
