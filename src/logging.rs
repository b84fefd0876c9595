//! Log file setup

use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use crate::config::ENV_LOG_FILTER;

/// Filter used when the log environment variable is unset or invalid
const DEFAULT_LOG_FILTER: &str = "info";

/// Build the log filter from `DVRS_LOG`, falling back to `info`
pub fn env_filter() -> EnvFilter {
    EnvFilter::try_from_env(ENV_LOG_FILTER).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER))
}

/// Send logs to `log_path` through a background writer.
///
/// The returned guard flushes pending lines when dropped, so keep it alive
/// for the lifetime of the process.
pub fn init(log_path: &Path, json: bool) -> anyhow::Result<WorkerGuard> {
    let dir = log_path.parent().unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(dir)?;

    let file_name = log_path
        .file_name()
        .ok_or_else(|| anyhow::anyhow!("log path {:?} has no file name", log_path))?;
    let appender = tracing_appender::rolling::never(dir, file_name);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(writer)
        .with_ansi(false);

    let installed = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    installed.map_err(|e| anyhow::anyhow!("failed to install log subscriber: {}", e))?;

    Ok(guard)
}
