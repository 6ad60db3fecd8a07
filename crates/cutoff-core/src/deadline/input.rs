use std::time::{Duration, SystemTime};

use tokio::time::Instant;

use super::Deadline;

/// Anything a [`Deadline`] can be built from.
///
/// Conversions exist for the common shapes, so most call sites pass a `Duration`, an `Instant` or an existing deadline directly.
#[derive(Debug, Clone)]
pub enum DeadlineInput {
    /// Relative to now. Zero yields an already exceeded deadline.
    Timeout(Duration),
    /// Relative to now, signed. Non-positive values yield an already exceeded deadline.
    Millis(i64),
    /// Relative to now, fractional seconds. `NaN` is a programmer error.
    Seconds(f64),
    /// Absolute monotonic instant.
    At(Instant),
    /// Absolute wall-clock time.
    AtSystem(SystemTime),
    /// Same cutoff as an existing deadline, with fresh timer state.
    Deadline(Deadline),
    /// Never expires.
    Infinite,
}

impl Default for DeadlineInput {
    fn default() -> Self {
        DeadlineInput::Infinite
    }
}

impl From<Duration> for DeadlineInput {
    fn from(d: Duration) -> Self {
        DeadlineInput::Timeout(d)
    }
}

impl From<Option<Duration>> for DeadlineInput {
    fn from(d: Option<Duration>) -> Self {
        d.map_or(DeadlineInput::Infinite, DeadlineInput::Timeout)
    }
}

impl From<i64> for DeadlineInput {
    fn from(ms: i64) -> Self {
        DeadlineInput::Millis(ms)
    }
}

impl From<f64> for DeadlineInput {
    fn from(secs: f64) -> Self {
        DeadlineInput::Seconds(secs)
    }
}

impl From<Instant> for DeadlineInput {
    fn from(at: Instant) -> Self {
        DeadlineInput::At(at)
    }
}

impl From<std::time::Instant> for DeadlineInput {
    fn from(at: std::time::Instant) -> Self {
        DeadlineInput::At(Instant::from_std(at))
    }
}

impl From<SystemTime> for DeadlineInput {
    fn from(at: SystemTime) -> Self {
        DeadlineInput::AtSystem(at)
    }
}

impl From<Deadline> for DeadlineInput {
    fn from(d: Deadline) -> Self {
        DeadlineInput::Deadline(d)
    }
}

impl From<&Deadline> for DeadlineInput {
    fn from(d: &Deadline) -> Self {
        DeadlineInput::Deadline(d.clone())
    }
}

/// What a [`DeadlineInput`] resolves to at construction time.
pub(super) enum Resolved {
    Infinite,
    Finite {
        cutoff: Instant,
        timeout: Option<Duration>,
        exceeded: bool,
    },
}

impl DeadlineInput {
    /// Resolve against the current clock.
    ///
    /// `distant` is the horizon beyond which a cutoff collapses to "never".
    pub(super) fn resolve(self, distant: Duration) -> Resolved {
        let now = Instant::now();
        match self {
            DeadlineInput::Infinite => Resolved::Infinite,
            DeadlineInput::Timeout(d) => relative(now, d, distant),
            DeadlineInput::Millis(ms) if ms <= 0 => past(now, Duration::from_millis(ms.unsigned_abs())),
            DeadlineInput::Millis(ms) => relative(now, Duration::from_millis(ms as u64), distant),
            DeadlineInput::Seconds(secs) => {
                assert!(!secs.is_nan(), "deadline seconds must not be NaN");
                if secs <= 0.0 {
                    past(now, Duration::from_secs_f64((-secs).min(distant.as_secs_f64())))
                } else if secs >= distant.as_secs_f64() {
                    Resolved::Infinite
                } else {
                    relative(now, Duration::from_secs_f64(secs), distant)
                }
            }
            DeadlineInput::At(at) => absolute(now, at, distant),
            DeadlineInput::AtSystem(at) => match at.duration_since(SystemTime::now()) {
                Ok(ahead) if ahead > distant => Resolved::Infinite,
                Ok(ahead) => absolute(now, now + ahead, distant),
                Err(behind) => past(now, behind.duration()),
            },
            DeadlineInput::Deadline(d) => match d.cutoff() {
                None => Resolved::Infinite,
                Some(cutoff) => Resolved::Finite {
                    cutoff,
                    timeout: d.timeout(),
                    exceeded: d.is_exceeded(),
                },
            },
        }
    }
}

fn relative(now: Instant, d: Duration, distant: Duration) -> Resolved {
    if d.is_zero() {
        return past(now, Duration::ZERO);
    }
    if d > distant {
        return Resolved::Infinite;
    }
    Resolved::Finite {
        cutoff: now + d,
        timeout: Some(d),
        exceeded: false,
    }
}

fn absolute(now: Instant, at: Instant, distant: Duration) -> Resolved {
    if at.saturating_duration_since(now) > distant {
        return Resolved::Infinite;
    }
    Resolved::Finite {
        cutoff: at,
        timeout: None,
        exceeded: at <= now,
    }
}

fn past(now: Instant, behind: Duration) -> Resolved {
    Resolved::Finite {
        cutoff: now.checked_sub(behind).unwrap_or(now),
        timeout: None,
        exceeded: true,
    }
}
