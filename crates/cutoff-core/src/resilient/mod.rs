//! Retrying orchestrator.
//!
//! [`resilient`] runs an attempter through [`crate::instrumented_race`] until it succeeds, the
//! retry budget runs out, the retry predicate declines, or the overall bound stops the run.
//! Each attempt is bounded by the tighter of the overall deadline and its own attempt timeout.
mod backoff;
pub use backoff::{Backoff, Jitter};

mod options;
pub use options::ResilientOptions;

use std::{collections::HashSet, fmt, future::Future, sync::Arc, time::Duration};

use tracing::{debug, instrument};

use crate::{
    ambient,
    bound::Bound,
    classify::Classify,
    context::RunContext,
    deadline::Deadline,
    error::RaceError,
    instrumented::instrumented_race,
    race::{LateErrorHook, LateHooks, LateValueHook, RaceState},
};

/// What the attempter receives on every attempt.
#[derive(Debug, Clone)]
pub struct Attempt {
    /// State of this attempt's race.
    pub state: RaceState,
    /// 1-based sequence number, never reused within a run.
    pub seqno: u32,
}

/// Decides whether a failed attempt is retried; gets the failure and the attempt's seqno.
pub type RetryPredicate<E> = Arc<dyn Fn(&RaceError<E>, u32) -> bool + Send + Sync + 'static>;

/// Called right before a retry is scheduled.
pub type RetryHook<E> = Arc<dyn Fn(&RaceError<E>, u32) + Send + Sync + 'static>;

/// Receives a value an attempt produced after its own race was decided.
pub type LateAttemptValueHook<T> = Arc<dyn Fn(T, u32, Duration) + Send + Sync + 'static>;

/// Receives an error an attempt produced after its own race was decided.
pub type LateAttemptErrorHook<E> = Arc<dyn Fn(E, u32, Duration) + Send + Sync + 'static>;

/// A retrying run, ready to [`run`](Resilient::run).
pub struct Resilient<A, T, E> {
    span_name: String,
    options: ResilientOptions,
    attempter: A,
    predicate: Option<RetryPredicate<E>>,
    on_retry: Option<RetryHook<E>>,
    late_value: Option<LateAttemptValueHook<T>>,
    late_error: Option<LateAttemptErrorHook<E>>,
}

/// Build a retrying run named `span_name`.
///
/// Without [`Resilient::retrying`] only attempt timeouts are retried.
pub fn resilient<A, Fut, T, E>(
    span_name: impl Into<String>,
    options: ResilientOptions,
    attempter: A,
) -> Resilient<A, T, E>
where
    A: FnMut(Attempt) -> Fut,
    Fut: Future<Output = Result<T, E>> + Send + 'static,
    T: Send + 'static,
    E: Classify + fmt::Display + Send + 'static,
{
    Resilient {
        span_name: span_name.into(),
        options,
        attempter,
        predicate: None,
        on_retry: None,
        late_value: None,
        late_error: None,
    }
}

impl<A, Fut, T, E> Resilient<A, T, E>
where
    A: FnMut(Attempt) -> Fut,
    Fut: Future<Output = Result<T, E>> + Send + 'static,
    T: Send + 'static,
    E: Classify + fmt::Display + Send + 'static,
{
    /// Retry failures accepted by `predicate`.
    ///
    /// The predicate sees the failure as the attempt reported it: the attempter's own error comes
    /// as [`RaceError::Failed`], an attempt timeout as [`RaceError::Exceeded`].
    pub fn retrying<P>(mut self, predicate: P) -> Self
    where
        P: Fn(&RaceError<E>, u32) -> bool + Send + Sync + 'static,
    {
        self.predicate = Some(Arc::new(predicate));
        self
    }

    /// Retry failures whose [`Classify::code`] is one of `codes`.
    pub fn retrying_codes<I, S>(self, codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let codes: HashSet<String> = codes.into_iter().map(Into::into).collect();
        self.retrying(move |err, _| err.code().is_some_and(|c| codes.contains(c.as_ref())))
    }

    pub fn on_retry<F>(mut self, hook: F) -> Self
    where
        F: Fn(&RaceError<E>, u32) + Send + Sync + 'static,
    {
        self.on_retry = Some(Arc::new(hook));
        self
    }

    /// Deliver values of attempts that settled after their attempt deadline.
    pub fn on_late_attempt_value<F>(mut self, hook: F) -> Self
    where
        F: Fn(T, u32, Duration) + Send + Sync + 'static,
    {
        self.late_value = Some(Arc::new(hook));
        self
    }

    /// Deliver errors of attempts that settled after their attempt deadline.
    pub fn on_late_attempt_error<F>(mut self, hook: F) -> Self
    where
        F: Fn(E, u32, Duration) + Send + Sync + 'static,
    {
        self.late_error = Some(Arc::new(hook));
        self
    }

    /// Run attempts until one settles the run.
    ///
    /// Fails with the last attempt's failure when retries are exhausted or declined, and with the
    /// overall bound's failure once it stops the run (mid-backoff included).
    #[instrument(
        name = "resilient",
        skip_all,
        fields(span = %self.span_name, retry_count = self.options.retry_count)
    )]
    pub async fn run(mut self, ctx: &RunContext) -> Result<T, RaceError<E>> {
        let explicit = Bound::new(self.options.timeout).with_tokens(ctx.tokens().clone());
        let overall = ambient::effective_bound(explicit.clone(), ctx.escapes_ambient());

        // attempts already carry the merged bound
        let attempt_ctx =
            RunContext::new(ctx.tracer().clone(), ctx.metrics().clone()).escaping_ambient();

        let out = self.attempts(&overall, &attempt_ctx).await;
        explicit.release();
        out
    }

    async fn attempts(&mut self, overall: &Bound, ctx: &RunContext) -> Result<T, RaceError<E>> {
        let mut seqno: u32 = 0;
        loop {
            seqno += 1;

            let own = Deadline::new(self.options.attempt_timeout);
            let bound = Bound::from(Deadline::first([overall.deadline(), &own]))
                .with_tokens(overall.tokens().clone());
            let late = self.late_for(seqno);
            let span_name = self.span_name.clone();
            let attempter = &mut self.attempter;

            let result = instrumented_race(span_name, bound, ctx, |state| {
                attempter(Attempt { state, seqno })
            })
            .with_late(late)
            .run()
            .await;
            own.clear();

            let err = match result {
                Ok(value) => return Ok(value),
                Err(err) => err,
            };

            if seqno >= self.options.max_attempts() {
                debug!(seqno, error = %err, "retries exhausted");
                return Err(err);
            }
            if let Some(interrupt) = overall.interruption() {
                debug!(seqno, reason = interrupt.as_label(), "run interrupted");
                return Err(interrupt.into());
            }
            if !self.should_retry(&err, seqno) {
                debug!(seqno, error = %err, "failure not retryable");
                return Err(err);
            }

            let delay = self.options.backoff.delay(seqno);
            debug!(seqno, error = %err, delay_ms = delay.as_millis() as u64, "retrying");
            if let Some(hook) = &self.on_retry {
                hook(&err, seqno);
            }
            ctx.metrics().record_retry(&self.span_name);

            tokio::select! {
                biased;
                interrupt = overall.interrupted() => {
                    debug!(seqno, reason = interrupt.as_label(), "run interrupted during backoff");
                    return Err(interrupt.into());
                }
                _ = tokio::time::sleep(delay) => {}
            }
        }
    }

    fn should_retry(&self, err: &RaceError<E>, seqno: u32) -> bool {
        match &self.predicate {
            Some(predicate) => predicate(err, seqno),
            None => err.is_exceeded(),
        }
    }

    fn late_for(&self, seqno: u32) -> LateHooks<T, E> {
        let value = self.late_value.clone().map(|hook| {
            Arc::new(move |v: T, delay: Duration| hook(v, seqno, delay)) as LateValueHook<T>
        });
        let error = self.late_error.clone().map(|hook| {
            Arc::new(move |e: E, delay: Duration| hook(e, seqno, delay)) as LateErrorHook<E>
        });
        LateHooks { value, error }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        Mutex,
        atomic::{AtomicU32, AtomicUsize, Ordering},
    };

    use tokio::time::Instant;
    use tokio_util::sync::CancellationToken;

    use super::*;
    use crate::{
        ambient::with_active_bound,
        metrics::{AttemptOutcome, MetricsBackend},
        trace::recording::RecordingTracer,
    };

    fn quick() -> ResilientOptions {
        ResilientOptions::default()
            .with_backoff(Backoff {
                first: Duration::from_millis(10),
                max: Duration::from_millis(100),
                factor: 2.0,
                jitter: Jitter::Full,
            })
            .deterministic()
    }

    #[tokio::test(start_paused = true)]
    async fn two_failures_then_value() {
        let retries = Arc::new(Mutex::new(Vec::new()));
        let r = Arc::clone(&retries);
        let calls = AtomicU32::new(0);

        let out = resilient("t", quick().with_retry_count(2), |_| {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 { Err("boom") } else { Ok(42) }
            }
        })
        .retrying(|_, _| true)
        .on_retry(move |err, seqno| {
            r.lock().expect("lock").push((err.to_string(), seqno));
        })
        .run(&RunContext::default())
        .await;

        assert_eq!(out.expect("value"), 42);
        assert_eq!(
            *retries.lock().expect("lock"),
            vec![("boom".to_string(), 1), ("boom".to_string(), 2)]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn exhausted_retries_surface_last_original_error() {
        let calls = AtomicU32::new(0);
        let out = resilient("t", quick().with_retry_count(3), |a: Attempt| {
            calls.fetch_add(1, Ordering::SeqCst);
            async move { Err::<(), _>(format!("failure {}", a.seqno)) }
        })
        .retrying(|_, _| true)
        .run(&RunContext::default())
        .await;

        assert_eq!(calls.load(Ordering::SeqCst), 4);
        assert_eq!(out.unwrap_err().into_failure().as_deref(), Some("failure 4"));
    }

    #[tokio::test(start_paused = true)]
    async fn plain_errors_are_not_retried_by_default() {
        let calls = AtomicU32::new(0);
        let out = resilient("t", quick(), |_| {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err::<(), _>("nope") }
        })
        .run(&RunContext::default())
        .await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(matches!(out, Err(RaceError::Failed("nope"))));
    }

    #[tokio::test(start_paused = true)]
    async fn attempt_timeouts_are_retried_by_default() {
        let out = resilient(
            "t",
            quick().with_attempt_timeout(Duration::from_millis(20)),
            |a: Attempt| async move {
                if a.seqno < 3 {
                    tokio::time::sleep(Duration::from_millis(50)).await;
                }
                Ok::<_, String>(a.seqno)
            },
        )
        .run(&RunContext::default())
        .await;
        assert_eq!(out.expect("third attempt wins"), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn predicate_sees_seqno() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let s = Arc::clone(&seen);
        let out = resilient("t", quick().with_retry_count(5), |_| async { Err::<(), _>("x") })
            .retrying(move |_, seqno| {
                s.lock().expect("lock").push(seqno);
                seqno < 2
            })
            .run(&RunContext::default())
            .await;
        assert!(out.is_err());
        assert_eq!(*seen.lock().expect("lock"), vec![1, 2]);
    }

    #[derive(Debug)]
    struct Coded(&'static str);

    impl fmt::Display for Coded {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str(self.0)
        }
    }

    impl Classify for Coded {
        fn code(&self) -> Option<std::borrow::Cow<'_, str>> {
            Some(self.0.into())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn retrying_codes_matches_failure_code() {
        let calls = AtomicU32::new(0);
        let out = resilient("t", quick(), |_| {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                match n {
                    0 => Err::<(), _>(Coded("UNAVAILABLE")),
                    _ => Err(Coded("INVALID")),
                }
            }
        })
        .retrying_codes(["UNAVAILABLE", "RESOURCE_EXHAUSTED"])
        .run(&RunContext::default())
        .await;

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(out.unwrap_err().failure().map(|c| c.0), Some("INVALID"));
    }

    #[tokio::test(start_paused = true)]
    async fn abort_token_stops_retries() {
        let token = CancellationToken::new();
        let t = token.clone();
        let calls = AtomicU32::new(0);

        let out = resilient("t", quick().with_retry_count(10), |_| {
            calls.fetch_add(1, Ordering::SeqCst);
            t.cancel();
            async { Err::<(), _>("boom") }
        })
        .retrying(|_, _| true)
        .run(&RunContext::default().with_token(token))
        .await;

        assert!(out.unwrap_err().is_aborted());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_interrupts_backoff() {
        let token = CancellationToken::new();
        let t = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            t.cancel();
        });

        let start = Instant::now();
        let calls = AtomicU32::new(0);
        let options = quick().with_backoff(Backoff {
            first: Duration::from_secs(30),
            max: Duration::from_secs(60),
            factor: 2.0,
            jitter: Jitter::None,
        });
        let out = resilient("t", options, |_| {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err::<(), _>("boom") }
        })
        .retrying(|_, _| true)
        .run(&RunContext::default().with_token(token))
        .await;

        assert!(out.unwrap_err().is_aborted());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn overall_timeout_bounds_the_run() {
        let options = quick()
            .with_retry_count(100)
            .with_timeout(Duration::from_millis(250))
            .with_backoff(Backoff {
                first: Duration::from_millis(100),
                max: Duration::from_secs(1),
                factor: 2.0,
                jitter: Jitter::None,
            });
        let start = Instant::now();
        let out = resilient("t", options, |_| async { Err::<(), _>("boom") })
            .retrying(|_, _| true)
            .run(&RunContext::default())
            .await;

        assert!(out.unwrap_err().is_exceeded());
        let waited = start.elapsed();
        assert!(waited >= Duration::from_millis(250) && waited < Duration::from_millis(300));
    }

    #[tokio::test]
    async fn cancelled_token_still_runs_first_attempt_body() {
        let token = CancellationToken::new();
        token.cancel();
        let bodies = Arc::new(AtomicU32::new(0));

        let out = resilient("t", quick().with_retry_count(5), |_| {
            let b = Arc::clone(&bodies);
            async move {
                b.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>("boom")
            }
        })
        .retrying(|_, _| true)
        .run(&RunContext::default().with_token(token))
        .await;

        assert!(out.unwrap_err().is_aborted());
        assert_eq!(bodies.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn exceeded_overall_timeout_still_runs_first_attempt_body() {
        let bodies = Arc::new(AtomicU32::new(0));

        let out = resilient("t", quick().with_timeout(Duration::ZERO), |_| {
            let b = Arc::clone(&bodies);
            async move {
                b.fetch_add(1, Ordering::SeqCst);
                Ok::<_, &str>(())
            }
        })
        .run(&RunContext::default())
        .await;

        assert!(out.unwrap_err().is_exceeded());
        assert_eq!(bodies.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn ambient_bound_limits_run() {
        let out = with_active_bound(Duration::from_millis(30), async {
            resilient("t", quick().with_retry_count(50), |_| async {
                Err::<(), _>("boom")
            })
            .retrying(|_, _| true)
            .run(&RunContext::default())
            .await
        })
        .await;
        assert!(out.unwrap_err().is_exceeded());
    }

    #[tokio::test(start_paused = true)]
    async fn late_attempt_values_carry_seqno() {
        let late = Arc::new(Mutex::new(Vec::new()));
        let l = Arc::clone(&late);
        let out = resilient(
            "t",
            quick().with_attempt_timeout(Duration::from_millis(10)),
            |a: Attempt| async move {
                if a.seqno == 1 {
                    tokio::time::sleep(Duration::from_millis(30)).await;
                    return Ok::<_, String>("late");
                }
                Ok("fast")
            },
        )
        .on_late_attempt_value(move |v, seqno, _| l.lock().expect("lock").push((v, seqno)))
        .run(&RunContext::default())
        .await;
        assert_eq!(out.expect("second attempt"), "fast");

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(*late.lock().expect("lock"), vec![("late", 1)]);
    }

    #[derive(Default)]
    struct CountingMetrics {
        started: AtomicUsize,
        timeouts: AtomicUsize,
        retries: AtomicUsize,
    }

    impl MetricsBackend for CountingMetrics {
        fn record_attempt_started(&self, _: &str) {
            self.started.fetch_add(1, Ordering::SeqCst);
        }

        fn record_attempt_completed(&self, _: &str, outcome: AttemptOutcome, _: u64) {
            if outcome == AttemptOutcome::Timeout {
                self.timeouts.fetch_add(1, Ordering::SeqCst);
            }
        }

        fn record_retry(&self, _: &str) {
            self.retries.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn one_span_and_metric_per_attempt() {
        let tracer = RecordingTracer::default();
        let metrics = Arc::new(CountingMetrics::default());
        let ctx = RunContext::default()
            .with_tracer(Arc::new(tracer.clone()))
            .with_metrics(metrics.clone());

        let out = resilient(
            "fetch",
            quick()
                .with_retry_count(2)
                .with_attempt_timeout(Duration::from_millis(5)),
            |_| std::future::pending::<Result<(), String>>(),
        )
        .run(&ctx)
        .await;
        assert!(out.unwrap_err().is_exceeded());

        let spans = tracer.spans();
        assert_eq!(spans.len(), 3);
        assert!(spans.iter().all(|s| s.name == "fetch" && s.ends == 1));
        assert_eq!(metrics.started.load(Ordering::SeqCst), 3);
        assert_eq!(metrics.timeouts.load(Ordering::SeqCst), 3);
        assert_eq!(metrics.retries.load(Ordering::SeqCst), 2);
    }
}
