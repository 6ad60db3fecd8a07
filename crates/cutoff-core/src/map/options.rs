use std::time::Duration;

use cutoff_model::{ModelResult, ResilientSpec};

use super::{to_backoff, to_jitter};
use crate::resilient::ResilientOptions;

/// Validate `spec` and turn it into runtime options.
///
/// `retryCodes` is not part of the options: apply it with
/// [`crate::Resilient::retrying_codes`] when it is non-empty.
pub fn to_resilient_options(spec: &ResilientSpec) -> ModelResult<ResilientOptions> {
    spec.validate()?;

    let mut backoff = to_backoff(&spec.backoff);
    backoff.jitter = to_jitter(spec.effective_jitter());

    Ok(ResilientOptions {
        timeout: spec.timeout_ms.map(Duration::from_millis),
        attempt_timeout: spec.attempt_timeout_ms.map(Duration::from_millis),
        retry_count: spec.retry_count,
        backoff,
    })
}

#[cfg(test)]
mod tests {
    use cutoff_model::{BackoffStrategy, JitterStrategy, ModelError};

    use super::*;
    use crate::resilient::Jitter;

    #[test]
    fn default_spec_maps_to_default_options() {
        let opts = to_resilient_options(&ResilientSpec::default()).expect("valid");
        assert_eq!(opts, ResilientOptions::default());
    }

    #[test]
    fn maps_every_field() {
        let spec = ResilientSpec {
            timeout_ms: Some(5_000),
            attempt_timeout_ms: Some(250),
            retry_count: 2,
            backoff: BackoffStrategy {
                jitter: JitterStrategy::Decorrelated,
                first_ms: 20,
                max_ms: 400,
                factor: 3.0,
            },
            ..ResilientSpec::default()
        };
        let opts = to_resilient_options(&spec).expect("valid");
        assert_eq!(opts.timeout, Some(Duration::from_secs(5)));
        assert_eq!(opts.attempt_timeout, Some(Duration::from_millis(250)));
        assert_eq!(opts.retry_count, 2);
        assert_eq!(opts.backoff.first, Duration::from_millis(20));
        assert_eq!(opts.backoff.max, Duration::from_millis(400));
        assert_eq!(opts.backoff.factor, 3.0);
        assert_eq!(opts.backoff.jitter, Jitter::Decorrelated);
    }

    #[test]
    fn deterministic_overrides_jitter() {
        let spec = ResilientSpec {
            deterministic: true,
            ..ResilientSpec::default()
        };
        let opts = to_resilient_options(&spec).expect("valid");
        assert_eq!(opts.backoff.jitter, Jitter::None);
    }

    #[test]
    fn invalid_spec_is_rejected() {
        let spec = ResilientSpec {
            attempt_timeout_ms: Some(0),
            ..ResilientSpec::default()
        };
        assert!(matches!(
            to_resilient_options(&spec),
            Err(ModelError::InvalidTimeout(_))
        ));
    }
}
