use std::{
    borrow::Cow,
    sync::{
        Arc,
        atomic::{AtomicU32, Ordering},
    },
    time::Duration,
};

use prometheus::{Encoder, TextEncoder};
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use cutoff_core::{
    Bound, Classify, Deadline, RunContext, codes, instrumented_race, map::to_resilient_options,
    reject_if_abandoned, resilient, with_active_bound,
};
use cutoff_model::{BackoffStrategy, JitterStrategy, ResilientSpec};
use cutoff_observe::{LoggerConfig, LoggerLevel, TracingTracer, init_logger};
use cutoff_prometheus::PrometheusMetrics;

#[derive(Debug, Error)]
enum LookupError {
    #[error("backend unavailable")]
    Unavailable,
    #[error("record not found")]
    NotFound,
}

impl Classify for LookupError {
    fn code(&self) -> Option<Cow<'_, str>> {
        match self {
            LookupError::Unavailable => Some(Cow::Borrowed("UNAVAILABLE")),
            LookupError::NotFound => Some(Cow::Borrowed("NOT_FOUND")),
        }
    }
}

#[tokio::main(flavor = "multi_thread")]
async fn main() -> anyhow::Result<()> {
    // 1) logger
    let cfg = LoggerConfig {
        level: LoggerLevel::new("cutoff_core=debug,info")?,
        ..Default::default()
    };
    init_logger(&cfg)?;
    info!("logger initialized");

    // 2) collaborators
    let metrics = PrometheusMetrics::new()?;
    let ctx = RunContext::new(Arc::new(TracingTracer::new()), Arc::new(metrics.clone()));

    // 3) retried lookup, configured the way a config file would
    let spec = ResilientSpec {
        timeout_ms: Some(2_000),
        attempt_timeout_ms: Some(200),
        retry_count: 3,
        backoff: BackoffStrategy {
            jitter: JitterStrategy::Equal,
            first_ms: 50,
            max_ms: 400,
            factor: 2.0,
        },
        retry_codes: vec!["UNAVAILABLE".into(), codes::DEADLINE_EXCEEDED.into()],
        ..Default::default()
    };
    let options = to_resilient_options(&spec)?;

    let calls = AtomicU32::new(0);
    let record = resilient("lookup", options, |attempt| {
        let n = calls.fetch_add(1, Ordering::SeqCst);
        async move {
            match n {
                0 => Err(LookupError::Unavailable),
                // the second attempt hangs past its attempt timeout
                1 => {
                    tokio::time::sleep(Duration::from_secs(1)).await;
                    Ok(format!("stale record from attempt {}", attempt.seqno))
                }
                _ => Ok(format!("record from attempt {}", attempt.seqno)),
            }
        }
    })
    .retrying_codes(spec.retry_codes.iter().cloned())
    .on_retry(|err, seqno| warn!(%err, seqno, "retrying lookup"))
    .on_late_attempt_value(|value, seqno, delay| {
        info!(%value, seqno, delay_ms = delay.as_millis() as u64, "late attempt value dropped")
    })
    .run(&ctx)
    .await?;
    info!(%record, "lookup finished");

    // 4) non-retryable code surfaces immediately
    let missing = resilient("lookup-missing", to_resilient_options(&spec)?, |_| async {
        Err::<(), _>(LookupError::NotFound)
    })
    .retrying_codes(spec.retry_codes.iter().cloned())
    .run(&ctx)
    .await;
    info!(failed = missing.is_err(), "missing record lookup settled");

    // 5) nested races share one ambient deadline
    let outer = Deadline::after(Duration::from_millis(300));
    let (fast, slow) = with_active_bound(outer, async {
        tokio::join!(
            instrumented_race("fast", Bound::unbounded(), &ctx, |_| async {
                tokio::time::sleep(Duration::from_millis(10)).await;
                Ok::<_, LookupError>("fast done")
            })
            .run(),
            instrumented_race("slow", Duration::from_secs(5), &ctx, |_| async {
                tokio::time::sleep(Duration::from_secs(1)).await;
                Ok::<_, LookupError>("slow done")
            })
            .run(),
        )
    })
    .await;
    info!(fast = ?fast.ok(), slow_exceeded = slow.is_err(), "ambient deadline applied");

    // 6) cooperative cancellation
    let token = CancellationToken::new();
    let canceller = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        canceller.cancel();
    });
    let aborted = with_active_bound(token, async {
        loop {
            if let Err(interrupt) = reject_if_abandoned().await {
                return interrupt;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await;
    info!(reason = aborted.as_label(), "background loop stopped");

    // 7) exposition
    let mut buffer = Vec::new();
    TextEncoder::new().encode(&metrics.gather(), &mut buffer)?;
    info!("metrics:\n{}", String::from_utf8_lossy(&buffer));

    Ok(())
}
