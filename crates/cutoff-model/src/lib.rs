mod domain;
pub use domain::{
    DEFAULT_ASYMPTOTIC_BACKOFF_MS, DEFAULT_BACKOFF_FACTOR, DEFAULT_INITIAL_BACKOFF_MS,
    DEFAULT_RETRY_COUNT, TimeoutMs,
};

mod error;
pub use error::{ModelError, ModelResult};

mod spec;
pub use spec::ResilientSpec;

mod strategy;
pub use strategy::{BackoffStrategy, JitterStrategy};
