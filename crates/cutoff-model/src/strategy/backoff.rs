use serde::{Deserialize, Serialize};

use crate::{
    DEFAULT_ASYMPTOTIC_BACKOFF_MS, DEFAULT_BACKOFF_FACTOR, DEFAULT_INITIAL_BACKOFF_MS,
    error::{ModelError, ModelResult},
};

/// Exponential backoff between retried attempts.
///
/// `first_ms` is the ceiling of the first step, `max_ms` the asymptotic ceiling every later step is clamped to.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BackoffStrategy {
    pub jitter: super::JitterStrategy,
    pub first_ms: u64,
    pub max_ms: u64,
    pub factor: f64,
}

impl Default for BackoffStrategy {
    fn default() -> Self {
        Self {
            jitter: super::JitterStrategy::default(),
            first_ms: DEFAULT_INITIAL_BACKOFF_MS,
            max_ms: DEFAULT_ASYMPTOTIC_BACKOFF_MS,
            factor: DEFAULT_BACKOFF_FACTOR,
        }
    }
}

impl BackoffStrategy {
    /// Check numeric invariants.
    ///
    /// Rules:
    /// - `factor` is finite and `>= 1.0`;
    /// - `max_ms >= first_ms`.
    pub fn validate(&self) -> ModelResult<()> {
        if !self.factor.is_finite() || self.factor < 1.0 {
            return Err(ModelError::InvalidBackoff(format!(
                "factor must be a finite number >= 1.0, got {}",
                self.factor
            )));
        }
        if self.max_ms < self.first_ms {
            return Err(ModelError::InvalidBackoff(format!(
                "maxMs ({}) is lower than firstMs ({})",
                self.max_ms, self.first_ms
            )));
        }
        Ok(())
    }
}
