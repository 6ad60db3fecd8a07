use std::sync::Arc;

use prometheus::{CounterVec, HistogramOpts, HistogramVec, Opts, Registry, proto::MetricFamily};

use cutoff_core::{AttemptOutcome, MetricsBackend};

const NAMESPACE: &str = "cutoff";

/// Prometheus implementation of [`MetricsBackend`].
///
/// ## Label cardinality
/// - `span`: the span names given to `instrumented_race` / `resilient`; keep them static
/// - `outcome`: "success", "failure", "canceled", "timeout"
#[derive(Clone)]
pub struct PrometheusMetrics {
    attempts_started: CounterVec,
    attempts_completed: CounterVec,
    attempt_duration: HistogramVec,
    retries: CounterVec,
    registry: Arc<Registry>,
}

impl PrometheusMetrics {
    /// Register the cutoff metrics in `registry`.
    ///
    /// Fails if the registry already holds metrics with the same names.
    pub fn new_with_registry(registry: Arc<Registry>) -> Result<Self, prometheus::Error> {
        let attempts_started = CounterVec::new(
            Opts::new("attempts_started_total", "Attempts that entered their race")
                .namespace(NAMESPACE),
            &["span"],
        )?;
        registry.register(Box::new(attempts_started.clone()))?;

        let attempts_completed = CounterVec::new(
            Opts::new("attempts_completed_total", "Attempts whose race was decided")
                .namespace(NAMESPACE),
            &["span", "outcome"],
        )?;
        registry.register(Box::new(attempts_completed.clone()))?;

        let attempt_duration = HistogramVec::new(
            HistogramOpts::new(
                "attempt_duration_seconds",
                "Time from attempt start to race decision in seconds",
            )
            .namespace(NAMESPACE)
            .buckets(vec![0.005, 0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]),
            &["span"],
        )?;
        registry.register(Box::new(attempt_duration.clone()))?;

        let retries = CounterVec::new(
            Opts::new("retries_total", "Retries scheduled after a failed attempt")
                .namespace(NAMESPACE),
            &["span"],
        )?;
        registry.register(Box::new(retries.clone()))?;

        Ok(Self {
            attempts_started,
            attempts_completed,
            attempt_duration,
            retries,
            registry,
        })
    }

    /// Register the cutoff metrics in a fresh registry.
    pub fn new() -> Result<Self, prometheus::Error> {
        Self::new_with_registry(Arc::new(Registry::new()))
    }

    /// Gather all metrics of the registry for exposition.
    pub fn gather(&self) -> Vec<MetricFamily> {
        self.registry.gather()
    }

    /// Underlying registry, for registering application metrics next to ours.
    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }
}

impl MetricsBackend for PrometheusMetrics {
    fn record_attempt_started(&self, span: &str) {
        self.attempts_started.with_label_values(&[span]).inc();
    }

    fn record_attempt_completed(&self, span: &str, outcome: AttemptOutcome, duration_ms: u64) {
        self.attempts_completed
            .with_label_values(&[span, outcome.as_label()])
            .inc();
        self.attempt_duration
            .with_label_values(&[span])
            .observe(duration_ms as f64 / 1000.0);
    }

    fn record_retry(&self, span: &str) {
        self.retries.with_label_values(&[span]).inc();
    }
}
