use serde::{Deserialize, Serialize};

use crate::{
    DEFAULT_RETRY_COUNT,
    domain::TimeoutMs,
    error::{ModelError, ModelResult},
    strategy::{BackoffStrategy, JitterStrategy},
};

/// Declarative description of a retried, time-bounded operation.
///
/// `ResilientSpec` is what configuration files carry; the core crate turns it into runtime options.
///
/// Fields cover:
/// - time limits (`timeout_ms` for the whole run, `attempt_timeout_ms` per attempt)
/// - retry budget and classification (`retry_count`, `retry_codes`)
/// - pacing between attempts (`backoff`, `deterministic`)
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ResilientSpec {
    /// Limit for the whole run, retries and backoff included.
    ///
    /// `None` leaves the run bounded only by the ambient context.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<TimeoutMs>,
    /// Limit for each individual attempt.
    ///
    /// An attempt that hits it may be retried even though the overall limit still has room.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attempt_timeout_ms: Option<TimeoutMs>,
    /// Additional attempts allowed after the first one.
    pub retry_count: u32,
    /// Delay schedule between attempts.
    pub backoff: BackoffStrategy,
    /// Disable jitter regardless of `backoff.jitter`.
    pub deterministic: bool,
    /// Failure codes considered retryable.
    ///
    /// Empty means "retry attempt timeouts only".
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub retry_codes: Vec<String>,
}

impl Default for ResilientSpec {
    fn default() -> Self {
        Self {
            timeout_ms: None,
            attempt_timeout_ms: None,
            retry_count: DEFAULT_RETRY_COUNT,
            backoff: BackoffStrategy::default(),
            deterministic: false,
            retry_codes: Vec::new(),
        }
    }
}

impl ResilientSpec {
    /// Validate the spec before it is mapped into runtime options.
    ///
    /// Rules:
    /// - explicit timeouts are non-zero;
    /// - the backoff strategy is valid.
    pub fn validate(&self) -> ModelResult<()> {
        if self.timeout_ms == Some(0) {
            return Err(ModelError::InvalidTimeout("timeoutMs must be positive".into()));
        }
        if self.attempt_timeout_ms == Some(0) {
            return Err(ModelError::InvalidTimeout(
                "attemptTimeoutMs must be positive".into(),
            ));
        }
        if self.retry_codes.iter().any(|c| c.trim().is_empty()) {
            return Err(ModelError::Invalid("retryCodes contains an empty code".into()));
        }
        self.backoff.validate()
    }

    /// Jitter actually applied, taking `deterministic` into account.
    pub fn effective_jitter(&self) -> JitterStrategy {
        if self.deterministic {
            JitterStrategy::None
        } else {
            self.backoff.jitter
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_json_is_default() {
        let spec: ResilientSpec = serde_json::from_str("{}").unwrap();
        assert_eq!(spec, ResilientSpec::default());
        assert_eq!(spec.retry_count, DEFAULT_RETRY_COUNT);
        assert!(spec.validate().is_ok());
    }

    #[test]
    fn deserializes_camel_case_fields() {
        let json = r#"{
            "timeoutMs": 5000,
            "attemptTimeoutMs": 250,
            "retryCount": 2,
            "deterministic": true,
            "retryCodes": ["UNAVAILABLE"],
            "backoff": {"firstMs": 20, "maxMs": 400, "factor": 3.0, "jitter": "equal"}
        }"#;
        let spec: ResilientSpec = serde_json::from_str(json).unwrap();

        assert_eq!(spec.timeout_ms, Some(5_000));
        assert_eq!(spec.attempt_timeout_ms, Some(250));
        assert_eq!(spec.retry_count, 2);
        assert_eq!(spec.retry_codes, vec!["UNAVAILABLE".to_string()]);
        assert_eq!(spec.backoff.factor, 3.0);
        assert_eq!(spec.effective_jitter(), JitterStrategy::None);
    }

    #[test]
    fn zero_timeouts_are_rejected() {
        let spec = ResilientSpec {
            timeout_ms: Some(0),
            ..Default::default()
        };
        assert!(matches!(spec.validate(), Err(ModelError::InvalidTimeout(_))));

        let spec = ResilientSpec {
            attempt_timeout_ms: Some(0),
            ..Default::default()
        };
        assert!(matches!(spec.validate(), Err(ModelError::InvalidTimeout(_))));
    }

    #[test]
    fn blank_retry_code_is_rejected() {
        let spec = ResilientSpec {
            retry_codes: vec!["  ".into()],
            ..Default::default()
        };
        assert!(matches!(spec.validate(), Err(ModelError::Invalid(_))));
    }

    #[test]
    fn invalid_backoff_bubbles_up() {
        let spec = ResilientSpec {
            backoff: BackoffStrategy {
                factor: 0.0,
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(matches!(spec.validate(), Err(ModelError::InvalidBackoff(_))));
    }

    #[test]
    fn serialization_skips_unset_options() {
        let json = serde_json::to_string(&ResilientSpec::default()).unwrap();
        assert!(!json.contains("timeoutMs"));
        assert!(!json.contains("retryCodes"));
        assert!(json.contains("retryCount"));
    }
}
