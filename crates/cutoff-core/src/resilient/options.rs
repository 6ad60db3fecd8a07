use std::time::Duration;

use cutoff_model::DEFAULT_RETRY_COUNT;

use super::backoff::{Backoff, Jitter};

/// Runtime options of a resilient run.
///
/// Usually built from a `cutoff_model::ResilientSpec` via [`crate::map::to_resilient_options`].
#[derive(Debug, Clone, PartialEq)]
pub struct ResilientOptions {
    /// Bounds the whole run, backoff included.
    pub timeout: Option<Duration>,
    /// Bounds each attempt independently of `timeout`.
    pub attempt_timeout: Option<Duration>,
    /// Additional attempts after the first one.
    pub retry_count: u32,
    pub backoff: Backoff,
}

impl Default for ResilientOptions {
    fn default() -> Self {
        Self {
            timeout: None,
            attempt_timeout: None,
            retry_count: DEFAULT_RETRY_COUNT,
            backoff: Backoff::default(),
        }
    }
}

impl ResilientOptions {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_attempt_timeout(mut self, timeout: Duration) -> Self {
        self.attempt_timeout = Some(timeout);
        self
    }

    pub fn with_retry_count(mut self, retry_count: u32) -> Self {
        self.retry_count = retry_count;
        self
    }

    pub fn with_backoff(mut self, backoff: Backoff) -> Self {
        self.backoff = backoff;
        self
    }

    /// Disable jitter so delays are reproducible.
    pub fn deterministic(mut self) -> Self {
        self.backoff.jitter = Jitter::None;
        self
    }

    /// Total number of attempts a run may make.
    #[inline]
    pub fn max_attempts(&self) -> u32 {
        self.retry_count.saturating_add(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_model_defaults() {
        let o = ResilientOptions::default();
        assert_eq!(o.retry_count, 3);
        assert_eq!(o.max_attempts(), 4);
        assert_eq!(o.backoff.first, Duration::from_millis(50));
        assert_eq!(o.backoff.max, Duration::from_secs(2));
        assert_eq!(o.backoff.jitter, Jitter::Full);
        assert!(o.timeout.is_none() && o.attempt_timeout.is_none());
    }

    #[test]
    fn deterministic_disables_jitter() {
        let o = ResilientOptions::default()
            .with_retry_count(u32::MAX)
            .deterministic();
        assert_eq!(o.backoff.jitter, Jitter::None);
        assert_eq!(o.max_attempts(), u32::MAX);
    }
}
