#![forbid(unsafe_code)]

//! Logging setup.
//!
//! Library code only emits `tracing` spans and events. Binaries and test
//! drivers that want output call [`init`] once (behind the `tracing-json`
//! feature) to install a `tracing-subscriber` formatter.
//!
//! The filter is read from the `IMESYNC_LOG` environment variable using
//! `EnvFilter` syntax and falls back to the level given in [`LogOptions`].

/// Environment variable holding the log filter directive.
pub const LOG_ENV_VAR: &str = "IMESYNC_LOG";

/// Output format for installed subscribers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Pretty,
    /// One JSON object per line.
    Json,
}

/// Options for [`init`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogOptions {
    /// Output format.
    pub format: LogFormat,
    /// Default filter when `IMESYNC_LOG` is unset.
    pub default_filter: String,
}

impl Default for LogOptions {
    fn default() -> Self {
        Self {
            format: LogFormat::Pretty,
            default_filter: "info".to_owned(),
        }
    }
}

impl LogOptions {
    /// JSON output at the given default filter.
    #[must_use]
    pub fn json(default_filter: impl Into<String>) -> Self {
        Self {
            format: LogFormat::Json,
            default_filter: default_filter.into(),
        }
    }
}

/// Install a global subscriber.
///
/// Returns `false` if a global subscriber was already installed.
#[cfg(feature = "tracing-json")]
pub fn init(options: &LogOptions) -> bool {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_env(LOG_ENV_VAR)
        .unwrap_or_else(|_| EnvFilter::new(&options.default_filter));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    let result = match options.format {
        LogFormat::Pretty => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    result.is_ok()
}
