use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[cfg(feature = "init")]
use tracing_subscriber::{EnvFilter, Layer, Registry, fmt as format, prelude::*};

// Import CRATE_NAMES, which lists all crates in the workspace.
#[cfg(feature = "init")]
include!(concat!(env!("OUT_DIR"), "/constants.gen.rs"));

/// The maximum verbosity of log messages.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    /// Disables logging entirely.
    Off,
    /// Only errors.
    Error,
    /// Warnings and errors.
    Warn,
    /// Informational messages and above.
    Info,
    /// Debugging messages and above.
    Debug,
    /// All messages.
    Trace,
}

impl Level {
    /// Returns the lowercase name of this level.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Off => "off",
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
            Self::Trace => "trace",
        }
    }

    /// Converts this level into a [`tracing`] level filter.
    pub fn level_filter(&self) -> tracing::level_filters::LevelFilter {
        use tracing::level_filters::LevelFilter;

        match self {
            Self::Off => LevelFilter::OFF,
            Self::Error => LevelFilter::ERROR,
            Self::Warn => LevelFilter::WARN,
            Self::Info => LevelFilter::INFO,
            Self::Debug => LevelFilter::DEBUG,
            Self::Trace => LevelFilter::TRACE,
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown [`Level`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParseLevelError(String);

impl fmt::Display for ParseLevelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid log level `{}`", self.0)
    }
}

impl std::error::Error for ParseLevelError {}

impl FromStr for Level {
    type Err = ParseLevelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_ascii_lowercase().as_str() {
            "off" => Self::Off,
            "error" => Self::Error,
            "warn" | "warning" => Self::Warn,
            "info" => Self::Info,
            "debug" => Self::Debug,
            "trace" => Self::Trace,
            _ => return Err(ParseLevelError(s.to_owned())),
        })
    }
}

/// Controls the log format.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Auto detect the best format.
    ///
    /// This chooses [`LogFormat::Pretty`] for TTY, otherwise [`LogFormat::Simplified`].
    Auto,

    /// Compact single-line output with colors.
    ///
    /// ```text
    /// INFO scatter::setup: loaded 2 shards
    /// ```
    Pretty,

    /// Simplified plain text output.
    ///
    /// ```text
    /// 2026-10-18T12:10:32.112Z  INFO scatter::setup: loaded 2 shards
    /// ```
    Simplified,

    /// Dump out JSON lines.
    ///
    /// ```text
    /// {"timestamp":"2026-10-18T12:11:08.729716Z","level":"INFO","message":"loaded 2 shards","target":"scatter::setup"}
    /// ```
    Json,
}

/// Controls the logging system.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct LogConfig {
    /// The log level for Scatter's own crates.
    pub level: Level,

    /// Controls the log output format.
    ///
    /// Defaults to [`LogFormat::Auto`], which detects the best format based on the TTY.
    pub format: LogFormat,

    /// When set to `true`, backtraces are forced on.
    ///
    /// Otherwise, backtraces can be enabled by setting the `RUST_BACKTRACE` variable to `full`.
    pub enable_backtraces: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: Level::Info,
            format: LogFormat::Auto,
            enable_backtraces: false,
        }
    }
}

/// Builds the filter used when `RUST_LOG` is not set.
///
/// Third-party crates never log more verbose than `info`. All of Scatter's crates log at the
/// configured level.
#[cfg(feature = "init")]
fn default_filter(level: Level) -> EnvFilter {
    use std::fmt::Write;

    let mut directives = level.min(Level::Info).to_string();
    for name in CRATE_NAMES {
        let _ = write!(directives, ",{name}={level}");
    }

    EnvFilter::new(directives)
}

/// Initialize the logging system.
///
/// If the `RUST_LOG` environment variable is set, it takes precedence over the configured level.
/// Calling this more than once has no effect.
///
/// # Example
///
/// ```
/// let log_config = scatter_log::LogConfig {
///     enable_backtraces: true,
///     ..Default::default()
/// };
///
/// scatter_log::init(&log_config);
/// ```
#[cfg(feature = "init")]
pub fn init(config: &LogConfig) {
    if config.enable_backtraces {
        // SAFETY: Logging is set up during startup, before any other thread reads the environment.
        unsafe { std::env::set_var("RUST_BACKTRACE", "full") };
    }

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter(config.level));

    let layer: Box<dyn Layer<Registry> + Send + Sync> =
        match (config.format, console::user_attended()) {
            (LogFormat::Auto, true) | (LogFormat::Pretty, _) => format::layer()
                .compact()
                .with_ansi(true)
                .with_writer(std::io::stderr)
                .boxed(),
            (LogFormat::Auto, false) | (LogFormat::Simplified, _) => format::layer()
                .with_ansi(false)
                .with_writer(std::io::stderr)
                .boxed(),
            (LogFormat::Json, _) => format::layer()
                .json()
                .flatten_event(true)
                .with_current_span(true)
                .with_writer(std::io::stderr)
                .boxed(),
        };

    tracing_subscriber::registry()
        .with(layer.with_filter(filter))
        .try_init()
        .ok();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_config_defaults() {
        let config: LogConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, LogConfig::default());
    }

    #[test]
    fn test_log_config_deserialize() {
        let config: LogConfig =
            serde_json::from_str(r#"{"level": "trace", "format": "json"}"#).unwrap();
        assert_eq!(config.level, Level::Trace);
        assert_eq!(config.format, LogFormat::Json);
        assert!(!config.enable_backtraces);
    }

    #[test]
    fn test_level_parse() {
        assert_eq!("INFO".parse::<Level>(), Ok(Level::Info));
        assert_eq!(" warning ".parse::<Level>(), Ok(Level::Warn));
        assert_eq!(
            "verbose".parse::<Level>(),
            Err(ParseLevelError("verbose".to_owned()))
        );
    }

    #[test]
    fn test_level_ordering() {
        assert!(Level::Off < Level::Error);
        assert!(Level::Trace > Level::Info);
        assert_eq!(Level::Debug.min(Level::Info), Level::Info);
        assert_eq!(Level::Warn.min(Level::Info), Level::Warn);
    }

    #[test]
    #[cfg(feature = "init")]
    fn test_default_filter_lists_workspace_crates() {
        assert!(CRATE_NAMES.contains(&"scatter_log"));
        assert!(CRATE_NAMES.contains(&"scatter_threading"));
        assert!(CRATE_NAMES.iter().all(|name| !name.contains('-')));

        let filter = default_filter(Level::Trace).to_string().to_lowercase();
        assert!(filter.contains("scatter_threading=trace"));
    }

    #[test]
    fn test_level_filter() {
        assert_eq!(
            Level::Debug.level_filter(),
            tracing::level_filters::LevelFilter::DEBUG
        );
        assert_eq!(Level::Off.to_string(), "off");
    }
}
