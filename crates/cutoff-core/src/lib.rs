//! Deadlines, races and retries for asynchronous work.
//!
//! - [`Deadline`]: an expiration instant or "never", with lazily armed timers.
//! - [`Bound`] / [`CancellationSet`]: a deadline plus the external tokens that may cut it short.
//! - [`with_active_bound`] / [`active_bound`]: the bound inherited by nested operations.
//! - [`race`] / [`instrumented_race`]: run one attempt against a bound.
//! - [`resilient`]: retry attempts with per-attempt timeouts and exponential backoff.
pub mod ambient;
pub mod bound;
pub mod cancel;
pub mod classify;
pub mod context;
pub mod deadline;
pub mod error;
pub mod instrumented;
pub mod map;
pub mod metrics;
pub mod race;
pub mod resilient;
pub mod trace;

pub use ambient::{
    active_bound, is_abandoned, reject_if_abandoned, throw_if_abandoned, with_active_bound,
    with_active_bound_sync,
};
pub use bound::Bound;
pub use cancel::CancellationSet;
pub use classify::Classify;
pub use context::RunContext;
pub use deadline::{DISTANT_FUTURE, Deadline, DeadlineInput, ExceededHook};
pub use error::{Abandoned, Aborted, DeadlineExceeded, Interrupt, RaceError, codes};
pub use instrumented::{InstrumentedRace, instrumented_race};
pub use metrics::{AttemptOutcome, MetricsBackend, MetricsHandle, NoOpMetrics, noop_metrics};
pub use race::{LateErrorHook, LateValueHook, Race, RaceState, RaceStatus, race};
pub use resilient::{Attempt, Backoff, Jitter, Resilient, ResilientOptions, resilient};
pub use trace::{
    AttributeValue, NoopTracer, SpanHandle, SpanStatus, Tracer, TracerHandle, noop_tracer,
};

pub mod prelude {
    pub use crate::ambient::{active_bound, is_abandoned, reject_if_abandoned, with_active_bound};
    pub use crate::bound::Bound;
    pub use crate::classify::Classify;
    pub use crate::context::RunContext;
    pub use crate::deadline::Deadline;
    pub use crate::error::{Interrupt, RaceError};
    pub use crate::instrumented::instrumented_race;
    pub use crate::race::{RaceState, race};
    pub use crate::resilient::{Attempt, ResilientOptions, resilient};
}
