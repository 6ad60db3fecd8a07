use std::{fmt, str::FromStr, sync::OnceLock};

use serde::{Deserialize, Serialize};
use time::UtcOffset;

use crate::logger::error::LoggerError;

static LOCAL_OFFSET: OnceLock<UtcOffset> = OnceLock::new();

/// Zone of log timestamps.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "&'static str")]
pub enum LoggerTimeZone {
    #[default]
    Utc,
    /// The system zone, as detected by [`init_local_offset`].
    Local,
}

impl LoggerTimeZone {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoggerTimeZone::Utc => "utc",
            LoggerTimeZone::Local => "local",
        }
    }
}

impl FromStr for LoggerTimeZone {
    type Err = LoggerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "utc" => Ok(Self::Utc),
            "local" => Ok(Self::Local),
            _ => Err(LoggerError::InvalidTimeZone(s.to_string())),
        }
    }
}

impl TryFrom<String> for LoggerTimeZone {
    type Error = LoggerError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<LoggerTimeZone> for &'static str {
    fn from(tz: LoggerTimeZone) -> Self {
        tz.as_str()
    }
}

impl fmt::Display for LoggerTimeZone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Detect the local offset once, while the process is still single-threaded.
///
/// Detection fails on most Unix platforms once other threads exist, so call it in `main` before
/// building the tokio runtime. Later calls are no-ops. An undetectable offset falls back to UTC.
///
/// # Example
/// ```no_run
/// fn main() {
///     cutoff_observe::init_local_offset();
///
///     let rt = tokio::runtime::Builder::new_current_thread()
///         .enable_all()
///         .build()
///         .unwrap();
///     rt.block_on(async { /* ... */ });
/// }
/// ```
pub fn init_local_offset() {
    local_offset();
}

pub(crate) fn local_offset() -> UtcOffset {
    *LOCAL_OFFSET.get_or_init(|| UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC))
}
