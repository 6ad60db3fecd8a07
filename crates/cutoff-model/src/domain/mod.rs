mod constants;
pub use constants::{
    DEFAULT_ASYMPTOTIC_BACKOFF_MS, DEFAULT_BACKOFF_FACTOR, DEFAULT_INITIAL_BACKOFF_MS,
    DEFAULT_RETRY_COUNT,
};

/// Timeout value in milliseconds.
///
/// Used for overall and per-attempt limits in [`crate::ResilientSpec`].
pub type TimeoutMs = u64;
