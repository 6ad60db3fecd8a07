//! Mapping from the `cutoff-model` configuration types to runtime types.
mod backoff;
mod jitter;
mod options;

pub use backoff::to_backoff;
pub use jitter::to_jitter;
pub use options::to_resilient_options;
