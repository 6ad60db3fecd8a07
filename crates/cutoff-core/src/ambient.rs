//! The bound inherited by nested operations.
//!
//! The active bound is a task-local value: it follows the future it was installed on (across
//! `.await` points and threads) and is restored when that future completes. It does not leak into
//! tasks started with `tokio::spawn`; pass [`active_bound`] along explicitly when spawning.
use std::future::Future;

use tracing::trace;

use crate::{bound::Bound, error::Interrupt};

tokio::task_local! {
    static ACTIVE_BOUND: Bound;
}

/// The bound installed by the nearest enclosing [`with_active_bound`], if any.
pub fn active_bound() -> Option<Bound> {
    ACTIVE_BOUND.try_with(Bound::clone).ok()
}

/// Combine `explicit` with the active bound, unless `escape` is set.
pub(crate) fn effective_bound(explicit: Bound, escape: bool) -> Bound {
    if escape {
        return explicit;
    }
    match active_bound() {
        Some(ambient) => explicit.tighten(&ambient),
        None => explicit,
    }
}

/// Run `fut` with `bound` (tightened by the current active bound) installed as the active bound.
///
/// The previous bound is restored once `fut` completes. A deadline created by `bound` itself is
/// cleared afterwards.
pub async fn with_active_bound<F>(bound: impl Into<Bound>, fut: F) -> F::Output
where
    F: Future,
{
    let bound = bound.into();
    let merged = effective_bound(bound.clone(), false);
    trace!(remaining = ?merged.deadline().remaining(), tokens = merged.tokens().len(), "entering bound");

    let out = ACTIVE_BOUND.scope(merged, fut).await;
    bound.release();
    out
}

/// Synchronous counterpart of [`with_active_bound`] for code that does not await.
pub fn with_active_bound_sync<R>(bound: impl Into<Bound>, f: impl FnOnce() -> R) -> R {
    let bound = bound.into();
    let merged = effective_bound(bound.clone(), false);
    let out = ACTIVE_BOUND.sync_scope(merged, f);
    bound.release();
    out
}

/// Install `bound` as is, without merging; used by races that already merged it.
pub(crate) fn scoped<F: Future>(bound: Bound, fut: F) -> impl Future<Output = F::Output> {
    ACTIVE_BOUND.scope(bound, fut)
}

pub(crate) fn scoped_sync<R>(bound: Bound, f: impl FnOnce() -> R) -> R {
    ACTIVE_BOUND.sync_scope(bound, f)
}

/// `true` when the active deadline passed or an active token fired.
pub fn is_abandoned() -> bool {
    ACTIVE_BOUND.try_with(Bound::is_abandoned).unwrap_or(false)
}

/// Cooperative check for long-running code that does not race on its own.
pub fn throw_if_abandoned() -> Result<(), Interrupt> {
    match ACTIVE_BOUND.try_with(Bound::interruption).ok().flatten() {
        Some(interrupt) => Err(interrupt),
        None => Ok(()),
    }
}

/// Yield to the scheduler once, then run [`throw_if_abandoned`].
///
/// The yield lets cancellations issued during the current poll land before the check.
pub async fn reject_if_abandoned() -> Result<(), Interrupt> {
    tokio::task::yield_now().await;
    throw_if_abandoned()
}
