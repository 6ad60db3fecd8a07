use std::time::Duration;

use cutoff_model::{DEFAULT_ASYMPTOTIC_BACKOFF_MS, DEFAULT_BACKOFF_FACTOR, DEFAULT_INITIAL_BACKOFF_MS};
use rand::Rng;

/// Randomisation applied to each backoff step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Jitter {
    /// Exact exponential steps.
    None,
    /// Uniform between the previous step and the current one.
    #[default]
    Full,
    /// Upper half of the current step.
    Equal,
    /// Uniform between the previous step and three times it.
    Decorrelated,
}

/// Exponential backoff between retried attempts.
///
/// Retry `n` (1-based) has the ceiling `min(max, first * factor^(n-1))`; its floor is zero for the
/// first retry and the previous ceiling afterwards.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Backoff {
    pub first: Duration,
    pub max: Duration,
    pub factor: f64,
    pub jitter: Jitter,
}

impl Default for Backoff {
    fn default() -> Self {
        Self {
            first: Duration::from_millis(DEFAULT_INITIAL_BACKOFF_MS),
            max: Duration::from_millis(DEFAULT_ASYMPTOTIC_BACKOFF_MS),
            factor: DEFAULT_BACKOFF_FACTOR,
            jitter: Jitter::default(),
        }
    }
}

impl Backoff {
    /// Upper bound of the delay before retry `retry`.
    pub fn ceiling(&self, retry: u32) -> Duration {
        let exp = i32::try_from(retry.saturating_sub(1)).unwrap_or(i32::MAX);
        let ms = self.first.as_millis() as f64 * self.factor.max(1.0).powi(exp);
        let max_ms = self.max.as_millis() as f64;
        if !ms.is_finite() || ms >= max_ms {
            return self.max;
        }
        Duration::from_millis(ms as u64)
    }

    /// Lower bound of the delay before retry `retry`.
    pub fn floor(&self, retry: u32) -> Duration {
        if retry <= 1 {
            Duration::ZERO
        } else {
            self.ceiling(retry - 1)
        }
    }

    /// Delay before retry `retry`, jitter applied.
    pub fn delay(&self, retry: u32) -> Duration {
        let ceiling = self.ceiling(retry);
        match self.jitter {
            Jitter::None => ceiling,
            Jitter::Full => uniform(self.floor(retry), ceiling),
            Jitter::Equal => {
                let half = ceiling / 2;
                uniform(half, ceiling)
            }
            Jitter::Decorrelated => {
                if retry <= 1 {
                    return uniform(Duration::ZERO, self.first.min(self.max));
                }
                let floor = self.floor(retry);
                uniform(floor, (floor * 3).min(self.max))
            }
        }
    }
}

fn uniform(lo: Duration, hi: Duration) -> Duration {
    let lo = lo.as_millis() as u64;
    let hi = hi.as_millis() as u64;
    if hi <= lo {
        return Duration::from_millis(lo);
    }
    Duration::from_millis(rand::thread_rng().gen_range(lo..=hi))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backoff(jitter: Jitter) -> Backoff {
        Backoff {
            first: Duration::from_millis(100),
            max: Duration::from_millis(1_000),
            factor: 2.0,
            jitter,
        }
    }

    #[test]
    fn ceiling_grows_and_saturates() {
        let b = backoff(Jitter::None);
        let steps: Vec<u64> = (1..=6).map(|n| b.delay(n).as_millis() as u64).collect();
        assert_eq!(steps, vec![100, 200, 400, 800, 1_000, 1_000]);
        assert_eq!(b.ceiling(u32::MAX), b.max);
    }

    #[test]
    fn first_retry_has_zero_floor() {
        let b = backoff(Jitter::Full);
        assert_eq!(b.floor(1), Duration::ZERO);
        assert_eq!(b.floor(3), Duration::from_millis(200));
    }

    #[test]
    fn jittered_delays_stay_in_range() {
        for _ in 0..200 {
            let full = backoff(Jitter::Full).delay(3);
            assert!(full >= Duration::from_millis(200) && full <= Duration::from_millis(400));

            let equal = backoff(Jitter::Equal).delay(2);
            assert!(equal >= Duration::from_millis(100) && equal <= Duration::from_millis(200));

            let first = backoff(Jitter::Decorrelated).delay(1);
            assert!(first <= Duration::from_millis(100));

            let deco = backoff(Jitter::Decorrelated).delay(5);
            assert!(deco >= Duration::from_millis(800) && deco <= Duration::from_millis(1_000));
        }
    }

    #[test]
    fn zero_first_step_never_sleeps() {
        let b = Backoff {
            first: Duration::ZERO,
            ..backoff(Jitter::Full)
        };
        assert_eq!(b.delay(1), Duration::ZERO);
        assert_eq!(b.delay(10), Duration::ZERO);
    }
}
