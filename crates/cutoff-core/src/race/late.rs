use std::{future::Future, sync::Arc, time::Duration};

use tokio::time::Instant;
use tracing::{debug, trace};

use crate::classify::Classify;

/// Receives a value that settled after its race was decided, with the delay since the decision.
pub type LateValueHook<T> = Arc<dyn Fn(T, Duration) + Send + Sync + 'static>;

/// Receives an error that settled after its race was decided, with the delay since the decision.
pub type LateErrorHook<E> = Arc<dyn Fn(E, Duration) + Send + Sync + 'static>;

/// Optional late-arrival listeners of a race.
pub(crate) struct LateHooks<T, E> {
    pub(crate) value: Option<LateValueHook<T>>,
    pub(crate) error: Option<LateErrorHook<E>>,
}

impl<T, E> Default for LateHooks<T, E> {
    fn default() -> Self {
        Self {
            value: None,
            error: None,
        }
    }
}

impl<T, E> Clone for LateHooks<T, E> {
    fn clone(&self) -> Self {
        Self {
            value: self.value.clone(),
            error: self.error.clone(),
        }
    }
}

impl<T, E> LateHooks<T, E>
where
    T: Send + 'static,
    E: Classify + Send + 'static,
{
    #[inline]
    pub(crate) fn is_empty(&self) -> bool {
        self.value.is_none() && self.error.is_none()
    }

    /// Keep driving the lost attempter so its outcome reaches the listeners.
    ///
    /// Without listeners the future is dropped right here, which cancels it.
    pub(crate) fn track<F>(self, fut: F, decided_at: Instant)
    where
        F: Future<Output = Result<T, E>> + Send + 'static,
    {
        if self.is_empty() {
            trace!("no late listeners; dropping lost attempt");
            return;
        }
        tokio::spawn(async move {
            let out = fut.await;
            self.deliver(out, decided_at.elapsed());
        });
    }

    /// Hand an outcome settled after the decision to its listener.
    pub(crate) fn deliver(&self, out: Result<T, E>, delay: Duration) {
        match out {
            Ok(value) => {
                debug!(delay_ms = delay.as_millis() as u64, "late value");
                if let Some(hook) = &self.value {
                    hook(value, delay);
                }
            }
            Err(err) if err.is_abandoned() => {
                trace!("lost attempt unwound cooperatively");
            }
            Err(err) => {
                debug!(delay_ms = delay.as_millis() as u64, "late error");
                if let Some(hook) = &self.error {
                    hook(err, delay);
                }
            }
        }
    }
}
