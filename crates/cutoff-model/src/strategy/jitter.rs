use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::{ModelError, ModelResult};

/// Randomization applied to a backoff step before sleeping.
///
/// Every retry `n` has a *ceiling* (`first * factor^(n-1)`, capped at `max`) and a *floor*
/// (zero for the first retry, the previous ceiling afterwards).
///
/// Strategies:
/// - `None`: sleep exactly the ceiling. Used when a run asks to be deterministic.
/// - `Full`: uniform in `[floor, ceiling]`.
/// - `Equal`: half of the ceiling plus a uniform share of the other half.
/// - `Decorrelated`: uniform in `[floor, min(max, 3 * floor)]`, falling back to `[0, first]` on the first retry.
#[derive(Default, Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum JitterStrategy {
    /// No randomness, reproducible delays.
    None,
    /// Spread uniformly between the floor and the ceiling of the step.
    #[default]
    Full,
    /// Keep at least half of the ceiling, randomize the rest.
    Equal,
    /// Grow from the previous step by a random factor up to 3.
    Decorrelated,
}

impl JitterStrategy {
    /// Canonical lowercase name, as accepted by [`FromStr`].
    pub fn as_str(&self) -> &'static str {
        match self {
            JitterStrategy::None => "none",
            JitterStrategy::Full => "full",
            JitterStrategy::Equal => "equal",
            JitterStrategy::Decorrelated => "decorrelated",
        }
    }
}

impl FromStr for JitterStrategy {
    type Err = ModelError;
    fn from_str(s: &str) -> ModelResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" | "deterministic" => Ok(JitterStrategy::None),
            "" | "full" | "default" => Ok(JitterStrategy::Full),
            "equal" => Ok(JitterStrategy::Equal),
            "decorrelated" => Ok(JitterStrategy::Decorrelated),
            other => Err(ModelError::UnknownJitter(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_names_case_insensitive() {
        assert_eq!("NONE".parse::<JitterStrategy>().unwrap(), JitterStrategy::None);
        assert_eq!(" full ".parse::<JitterStrategy>().unwrap(), JitterStrategy::Full);
        assert_eq!("".parse::<JitterStrategy>().unwrap(), JitterStrategy::Full);
        assert_eq!("Equal".parse::<JitterStrategy>().unwrap(), JitterStrategy::Equal);
        assert_eq!(
            "decorrelated".parse::<JitterStrategy>().unwrap(),
            JitterStrategy::Decorrelated
        );
        assert_eq!(
            "deterministic".parse::<JitterStrategy>().unwrap(),
            JitterStrategy::None
        );
    }

    #[test]
    fn rejects_unknown_name() {
        let err = "gaussian".parse::<JitterStrategy>().unwrap_err();
        assert!(matches!(err, ModelError::UnknownJitter(ref s) if s == "gaussian"));
    }

    #[test]
    fn as_str_parses_back() {
        for j in [
            JitterStrategy::None,
            JitterStrategy::Full,
            JitterStrategy::Equal,
            JitterStrategy::Decorrelated,
        ] {
            assert_eq!(j.as_str().parse::<JitterStrategy>().unwrap(), j);
        }
    }

    #[test]
    fn serde_uses_camel_case() {
        let json = serde_json::to_string(&JitterStrategy::Decorrelated).unwrap();
        assert_eq!(json, r#""decorrelated""#);
    }
}
