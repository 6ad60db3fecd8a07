mod config;
mod error;
mod install;
mod object;

pub use config::LoggerConfig;
pub use error::{LoggerError, LoggerResult};
pub use object::{LoggerFormat, LoggerLevel, LoggerTimeZone, init_local_offset};

/// Install the global `tracing` subscriber described by `cfg`.
///
/// Every `tracing` event and span of the process, including the ones emitted by `cutoff-core`
/// (`trace` for race transitions, `debug` for retries and late arrivals), goes through it.
///
/// With [`LoggerTimeZone::Local`], call [`init_local_offset`] before the runtime starts any thread.
///
/// # Examples
/// ```rust
/// use cutoff_observe::{LoggerConfig, init_logger};
///
/// let config = LoggerConfig {
///     level: "cutoff_core=debug,info".parse().expect("valid filter"),
///     ..LoggerConfig::default()
/// };
/// init_logger(&config).expect("first initialisation");
/// tracing::info!("logger ready");
/// ```
pub fn init_logger(cfg: &LoggerConfig) -> LoggerResult<()> {
    match cfg.format {
        LoggerFormat::Text => install::text(cfg),
        LoggerFormat::Json => install::json(cfg),
        LoggerFormat::Journald => install::journald(cfg),
    }
}
