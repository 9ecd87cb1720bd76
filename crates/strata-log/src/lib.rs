//! Structured logging for the strata tools.
//!
//! Console output goes to stderr so command output on stdout stays clean.
//! When a log directory is configured, every event is also written as JSON
//! to `strata.log` for later inspection.

use std::fs::File;
use std::path::{Path, PathBuf};

use strata_config::LoggingConfig;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Filter used when neither `RUST_LOG` nor the config provides one.
pub const DEFAULT_FILTER: &str = "info";

/// Name of the JSON log file inside the log directory.
pub const LOG_FILE: &str = "strata.log";

/// Initialize the global tracing subscriber.
///
/// Sets up:
/// - environment-based filtering (`RUST_LOG` wins over `config.log_level`)
/// - console output on stderr with uptime timestamps and targets
/// - a JSON file layer when `config.log_dir` is set and writable
///
/// Returns the path of the JSON log file, if one was opened.
///
/// # Panics
///
/// If a global subscriber is already installed.
///
/// # Examples
///
/// ```no_run
/// use strata_config::LoggingConfig;
/// use strata_log::init_logging;
///
/// init_logging(&LoggingConfig::default());
/// ```
pub fn init_logging(config: &LoggingConfig) -> Option<PathBuf> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter_directive(config)));

    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_level(true)
        .with_timer(fmt::time::uptime());

    let subscriber = tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer);

    if let Some(log_dir) = &config.log_dir
        && let Some((path, log_file)) = open_log_file(log_dir)
    {
        let file_layer = fmt::layer()
            .with_writer(log_file)
            .with_ansi(false)
            .with_target(true)
            .with_timer(fmt::time::uptime())
            .json();

        subscriber.with(file_layer).init();
        tracing::debug!(path = %path.display(), "writing JSON log");
        return Some(path);
    }

    subscriber.init();
    None
}

/// The filter directive for `config`, falling back to [`DEFAULT_FILTER`]
/// when the configured level is blank.
pub fn filter_directive(config: &LoggingConfig) -> &str {
    let level = config.log_level.trim();
    if level.is_empty() { DEFAULT_FILTER } else { level }
}

/// An `EnvFilter` with [`DEFAULT_FILTER`].
pub fn default_env_filter() -> EnvFilter {
    EnvFilter::new(DEFAULT_FILTER)
}

fn open_log_file(log_dir: &Path) -> Option<(PathBuf, File)> {
    std::fs::create_dir_all(log_dir).ok()?;
    let path = log_dir.join(LOG_FILE);
    let file = File::create(&path).ok()?;
    Some((path, file))
}
