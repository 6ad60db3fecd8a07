//! Merging of caller-owned cancellation tokens.
use std::{
    fmt,
    future::{Future, poll_fn},
    pin::Pin,
    task::Poll,
};

use tokio_util::sync::{CancellationToken, WaitForCancellationFutureOwned};

/// A set of external cancellation tokens observed as one "first to fire" signal.
///
/// The set never cancels the tokens it holds: they belong to the caller.
#[derive(Clone, Default)]
pub struct CancellationSet {
    tokens: Vec<CancellationToken>,
}

impl CancellationSet {
    /// Create an empty set.
    #[inline]
    pub fn new() -> Self {
        Self { tokens: Vec::new() }
    }

    /// Add a token to observe.
    pub fn push(&mut self, token: CancellationToken) {
        self.tokens.push(token);
    }

    /// Builder-style [`CancellationSet::push`].
    pub fn with(mut self, token: CancellationToken) -> Self {
        self.push(token);
        self
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Iterate over the observed tokens.
    pub fn iter(&self) -> impl Iterator<Item = &CancellationToken> {
        self.tokens.iter()
    }

    /// `true` if any token already fired.
    pub fn is_cancelled(&self) -> bool {
        self.tokens.iter().any(CancellationToken::is_cancelled)
    }

    /// Tokens of both sets; `self` keeps its order and goes first.
    pub fn union(&self, other: &CancellationSet) -> CancellationSet {
        let mut tokens = Vec::with_capacity(self.len() + other.len());
        tokens.extend(self.tokens.iter().cloned());
        tokens.extend(other.tokens.iter().cloned());
        CancellationSet { tokens }
    }

    /// Wait for the first token to fire and return its index.
    ///
    /// An empty set never resolves. The returned future owns clones of the tokens,
    /// so it does not borrow the set; dropping it releases every listener.
    pub fn cancelled(&self) -> impl Future<Output = usize> + Send + 'static {
        let mut waits: Vec<Pin<Box<WaitForCancellationFutureOwned>>> = self
            .tokens
            .iter()
            .cloned()
            .map(|t| Box::pin(t.cancelled_owned()))
            .collect();

        poll_fn(move |cx| {
            for (idx, wait) in waits.iter_mut().enumerate() {
                if wait.as_mut().poll(cx).is_ready() {
                    return Poll::Ready(idx);
                }
            }
            Poll::Pending
        })
    }
}

impl FromIterator<CancellationToken> for CancellationSet {
    fn from_iter<I: IntoIterator<Item = CancellationToken>>(iter: I) -> Self {
        Self {
            tokens: iter.into_iter().collect(),
        }
    }
}

impl From<CancellationToken> for CancellationSet {
    fn from(token: CancellationToken) -> Self {
        Self {
            tokens: vec![token],
        }
    }
}

impl From<Vec<CancellationToken>> for CancellationSet {
    fn from(tokens: Vec<CancellationToken>) -> Self {
        Self { tokens }
    }
}

impl fmt::Debug for CancellationSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CancellationSet")
            .field("len", &self.tokens.len())
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}
