use std::time::Duration;

use cutoff_model::BackoffStrategy;

use super::to_jitter;
use crate::resilient::Backoff;

pub fn to_backoff(s: &BackoffStrategy) -> Backoff {
    Backoff {
        first: Duration::from_millis(s.first_ms),
        max: Duration::from_millis(s.max_ms),
        jitter: to_jitter(s.jitter),
        factor: s.factor,
    }
}
