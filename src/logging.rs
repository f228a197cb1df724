//! Structured logging setup using `tracing-subscriber` and `tracing-appender`.
//!
//! Two modes:
//! - **Production** ([`init_production`]): JSON file layer (daily rotation) + console layer
//! - **CLI** ([`init_cli`]): console-only for one-shot subcommands
//!
//! Both start from the configured level and hold the HTTP stack at `warn`, so
//! `info` shows turn decisions rather than connection chatter. `RUST_LOG`
//! replaces the whole directive.

use std::path::PathBuf;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use crate::config::LoggingConfig;

/// Crates whose own logs stay at `warn` unless `RUST_LOG` says otherwise.
const QUIET_DEPENDENCIES: [&str; 4] = ["hyper", "hyper_util", "reqwest", "h2"];

/// Holds the non-blocking writer guard for file logging.
///
/// The [`WorkerGuard`] must be kept alive for the duration of the process.
/// Dropping it flushes pending log entries and closes the file.
pub struct LoggingGuard {
    _guard: WorkerGuard,
}

/// Default directory for rotated logs: the platform data dir, or `./logs`.
pub fn default_logs_dir() -> PathBuf {
    directories::ProjectDirs::from("", "", "rituo")
        .map(|dirs| dirs.data_local_dir().join("logs"))
        .unwrap_or_else(|| PathBuf::from("logs"))
}

/// Directory rotated logs go to: `[logging] dir` when set and non-blank,
/// with a leading `~/` expanded, else [`default_logs_dir`].
pub fn logs_dir(config: &LoggingConfig) -> PathBuf {
    let Some(dir) = config.dir.as_deref().map(str::trim).filter(|d| !d.is_empty()) else {
        return default_logs_dir();
    };
    match dir.strip_prefix("~/") {
        Some(rest) => directories::BaseDirs::new()
            .map_or_else(|| PathBuf::from(dir), |base| base.home_dir().join(rest)),
        None => PathBuf::from(dir),
    }
}

/// `EnvFilter` directive used when `RUST_LOG` is unset.
pub fn default_directive(level: &str) -> String {
    let level = match level.trim() {
        "" => "info",
        other => other,
    };
    QUIET_DEPENDENCIES
        .iter()
        .fold(level.to_owned(), |mut directive, krate| {
            directive.push_str(&format!(",{krate}=warn"));
            directive
        })
}

/// Initialise logging for the interactive `chat` session.
///
/// Writes JSON logs to `{logs_dir}/rituo.log.YYYY-MM-DD` with daily
/// rotation, the directory resolved by [`logs_dir`]. Also emits
/// human-readable output to stderr controlled by `RUST_LOG` (default:
/// [`default_directive`] of the configured level).
///
/// # Errors
///
/// Returns an error if the logs directory cannot be created.
pub fn init_production(config: &LoggingConfig) -> anyhow::Result<LoggingGuard> {
    let logs_dir = logs_dir(config);
    std::fs::create_dir_all(&logs_dir).map_err(|e| {
        anyhow::anyhow!(
            "failed to create logs directory {}: {e}",
            logs_dir.display()
        )
    })?;

    let file_appender = tracing_appender::rolling::daily(&logs_dir, "rituo.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let json_layer = tracing_subscriber::fmt::layer()
        .json()
        .with_writer(non_blocking);

    let console_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(env_filter(&config.level))
        .with(json_layer)
        .with(console_layer)
        .init();

    Ok(LoggingGuard { _guard: guard })
}

/// Initialise minimal logging for one-shot subcommands.
///
/// Emits human-readable output to stderr only. No file rotation.
/// Controlled by `RUST_LOG` (default: [`default_directive`] of `default_level`).
pub fn init_cli(default_level: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter(default_level))
        .with_writer(std::io::stderr)
        .init();
}

fn env_filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive(default_level)))
}
