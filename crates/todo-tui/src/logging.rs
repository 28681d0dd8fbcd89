use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

/// Where log lines go.
#[derive(Debug, Clone)]
pub enum LogTarget {
    /// Append to a file. Used while the TUI owns the terminal.
    File(PathBuf),
    Stderr,
}

/// Install the global subscriber. `RUST_LOG` overrides `level`.
///
/// The returned guard flushes buffered lines when dropped; keep it alive
/// until exit.
pub fn init(level: &str, target: LogTarget) -> Result<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let ansi = matches!(target, LogTarget::Stderr);
    let (writer, guard) = match target {
        LogTarget::File(path) => {
            let dir = path
                .parent()
                .context("log path has no parent directory")?
                .to_path_buf();
            let file_name = path
                .file_name()
                .context("log path has no file name")?
                .to_os_string();
            std::fs::create_dir_all(&dir)
                .with_context(|| format!("failed to create log directory {}", dir.display()))?;
            tracing_appender::non_blocking(tracing_appender::rolling::never(dir, file_name))
        }
        LogTarget::Stderr => tracing_appender::non_blocking(std::io::stderr()),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(ansi)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to install log subscriber: {e}"))?;

    Ok(guard)
}
