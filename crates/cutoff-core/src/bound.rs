//! A deadline paired with the cancellation tokens that may cut it short.
use std::future::Future;

use tokio_util::sync::CancellationToken;

use crate::{
    cancel::CancellationSet,
    deadline::{Deadline, DeadlineInput},
    error::{Aborted, Interrupt},
};

/// Limits an operation runs under: a deadline and a set of external tokens.
///
/// The default bound is unbounded (infinite deadline, no tokens).
#[derive(Clone, Debug, Default)]
pub struct Bound {
    deadline: Deadline,
    tokens: CancellationSet,
    /// The deadline was created for this bound and may be cleared with it.
    owned: bool,
}

impl Bound {
    /// Bound by a deadline built from `input`, with no tokens.
    ///
    /// Passing an existing [`Deadline`] shares it; any other input creates a deadline owned by the bound.
    pub fn new(input: impl Into<DeadlineInput>) -> Self {
        match input.into() {
            DeadlineInput::Deadline(deadline) => Self::from(deadline),
            other => {
                let deadline = Deadline::new(other);
                Self {
                    owned: !deadline.is_infinite(),
                    deadline,
                    tokens: CancellationSet::new(),
                }
            }
        }
    }

    /// No deadline, no tokens.
    #[inline]
    pub fn unbounded() -> Self {
        Self::default()
    }

    /// Add one token to observe.
    pub fn with_token(mut self, token: CancellationToken) -> Self {
        self.tokens.push(token);
        self
    }

    /// Add a set of tokens to observe.
    pub fn with_tokens(mut self, tokens: impl Into<CancellationSet>) -> Self {
        self.tokens = self.tokens.union(&tokens.into());
        self
    }

    #[inline]
    pub fn deadline(&self) -> &Deadline {
        &self.deadline
    }

    #[inline]
    pub fn tokens(&self) -> &CancellationSet {
        &self.tokens
    }

    /// Infinite deadline and no tokens: nothing can interrupt the operation.
    pub fn is_unbounded(&self) -> bool {
        self.deadline.is_infinite() && self.tokens.is_empty()
    }

    /// Tightest combination of both bounds: the earlier deadline and the union of tokens.
    ///
    /// On equal cutoffs `self`'s deadline is kept. The result never owns its deadline.
    pub fn tighten(&self, other: &Bound) -> Bound {
        Bound {
            deadline: Deadline::first([&self.deadline, &other.deadline]),
            tokens: self.tokens.union(&other.tokens),
            owned: false,
        }
    }

    /// Why the bound already stops work, if it does.
    ///
    /// Tokens are checked before the deadline.
    pub fn interruption(&self) -> Option<Interrupt> {
        if self.tokens.is_cancelled() {
            return Some(Interrupt::Aborted(Aborted));
        }
        self.deadline.exceeded_error(false).map(Interrupt::Exceeded)
    }

    /// `true` once the deadline passed or any token fired.
    #[inline]
    pub fn is_abandoned(&self) -> bool {
        self.interruption().is_some()
    }

    /// Resolves with the first interruption; never resolves for unbounded bounds.
    ///
    /// A deadline firing marks it exceeded; a token firing leaves the deadline untouched.
    pub fn interrupted(&self) -> impl Future<Output = Interrupt> + Send + 'static {
        let tokens = self.tokens.cancelled();
        let exceeded = self.deadline.exceeded();
        async move {
            tokio::select! {
                biased;
                _ = tokens => Interrupt::Aborted(Aborted),
                err = exceeded => Interrupt::Exceeded(err),
            }
        }
    }

    /// Release the deadline's timer if this bound created it.
    pub(crate) fn release(&self) {
        if self.owned {
            self.deadline.clear();
        }
    }
}

impl From<Deadline> for Bound {
    fn from(deadline: Deadline) -> Self {
        Self {
            deadline,
            tokens: CancellationSet::new(),
            owned: false,
        }
    }
}

impl From<CancellationSet> for Bound {
    fn from(tokens: CancellationSet) -> Self {
        Self {
            deadline: Deadline::infinite(),
            tokens,
            owned: false,
        }
    }
}

impl From<CancellationToken> for Bound {
    fn from(token: CancellationToken) -> Self {
        Self::from(CancellationSet::from(token))
    }
}

impl From<std::time::Duration> for Bound {
    fn from(timeout: std::time::Duration) -> Self {
        Self::new(timeout)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn default_is_unbounded() {
        let b = Bound::default();
        assert!(b.is_unbounded());
        assert!(b.interruption().is_none());
    }

    #[test]
    fn tighten_takes_earlier_deadline_and_all_tokens() {
        let t1 = CancellationToken::new();
        let t2 = CancellationToken::new();
        let wide = Bound::new(Duration::from_secs(10)).with_token(t1);
        let narrow = Bound::new(Duration::from_millis(50)).with_token(t2.clone());

        let merged = wide.tighten(&narrow);
        assert!(merged.deadline().same_as(narrow.deadline()));
        assert_eq!(merged.tokens().len(), 2);

        t2.cancel();
        assert!(merged.is_abandoned());
    }

    #[test]
    fn tokens_win_over_exceeded_deadline() {
        let t = CancellationToken::new();
        t.cancel();
        let b = Bound::new(Duration::ZERO).with_token(t);
        assert!(matches!(b.interruption(), Some(Interrupt::Aborted(_))));
    }

    #[test]
    fn exceeded_deadline_interrupts() {
        let b = Bound::new(-1_i64);
        assert!(matches!(b.interruption(), Some(Interrupt::Exceeded(_))));
    }

    #[test]
    fn shared_deadline_is_not_owned() {
        let d = Deadline::after(Duration::from_secs(1));
        assert!(!Bound::new(&d).owned);
        assert!(!Bound::from(d).owned);
        assert!(Bound::new(Duration::from_secs(1)).owned);
        assert!(!Bound::new(DeadlineInput::Infinite).owned);
    }

    #[tokio::test(start_paused = true)]
    async fn interrupted_reports_deadline() {
        let b = Bound::new(Duration::from_millis(30));
        let i = b.interrupted().await;
        assert!(matches!(i, Interrupt::Exceeded(_)));
        assert!(b.deadline().is_exceeded());
    }

    #[tokio::test(start_paused = true)]
    async fn interrupted_reports_token() {
        let t = CancellationToken::new();
        let b = Bound::new(Duration::from_secs(30)).with_token(t.clone());
        let wait = b.interrupted();
        t.cancel();
        assert!(matches!(wait.await, Interrupt::Aborted(_)));
        assert!(!b.deadline().is_exceeded());
    }
}
