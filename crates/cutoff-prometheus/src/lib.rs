//! Prometheus backend for cutoff attempt and retry metrics.
//!
//! [`PrometheusMetrics`] implements [`cutoff_core::MetricsBackend`]; inject it through a
//! [`cutoff_core::RunContext`] and every instrumented race or resilient run reports to it.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use cutoff_core::RunContext;
//! use cutoff_prometheus::PrometheusMetrics;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let metrics = PrometheusMetrics::new()?;
//! let ctx = RunContext::default().with_metrics(Arc::new(metrics.clone()));
//!
//! // later, from a /metrics handler:
//! let mut buffer = Vec::new();
//! let encoder = prometheus::TextEncoder::new();
//! prometheus::Encoder::encode(&encoder, &metrics.gather(), &mut buffer)?;
//! # let _ = ctx;
//! # Ok(())
//! # }
//! ```
//!
//! ## Metrics
//! - `cutoff_attempts_started_total{span}` - Counter
//! - `cutoff_attempts_completed_total{span, outcome}` - Counter
//! - `cutoff_attempt_duration_seconds{span}` - Histogram
//! - `cutoff_retries_total{span}` - Counter
//!
//! No HTTP server is included; expose [`PrometheusMetrics::gather`] from the application's own.
mod backend;
pub use backend::PrometheusMetrics;
