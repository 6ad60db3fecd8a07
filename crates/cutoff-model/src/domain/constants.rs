//! Defaults shared by the model and the core mapping layer.
//!
//! Keeping them here gives config files and code-built options one source of truth.

/// Additional attempts allowed after the first one.
pub const DEFAULT_RETRY_COUNT: u32 = 3;

/// Ceiling of the first backoff step, in milliseconds.
pub const DEFAULT_INITIAL_BACKOFF_MS: u64 = 50;

/// Upper bound every backoff step converges to, in milliseconds.
pub const DEFAULT_ASYMPTOTIC_BACKOFF_MS: u64 = 2_000;

/// Growth factor between consecutive backoff steps.
pub const DEFAULT_BACKOFF_FACTOR: f64 = 2.0;
