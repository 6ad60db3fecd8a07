use crate::metrics::backend::{AttemptOutcome, MetricsBackend};

/// No-op metrics backend that compiles to nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpMetrics;

impl MetricsBackend for NoOpMetrics {
    #[inline(always)]
    fn record_attempt_started(&self, _: &str) {}

    #[inline(always)]
    fn record_attempt_completed(&self, _: &str, _: AttemptOutcome, _: u64) {}

    #[inline(always)]
    fn record_retry(&self, _: &str) {}
}
