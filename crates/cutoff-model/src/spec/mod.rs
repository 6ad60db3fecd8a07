mod resilient;
pub use resilient::ResilientSpec;
