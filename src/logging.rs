use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Environment variable consulted when no level is passed explicitly
pub const LOG_ENV: &str = "TYPEAMP_LOG";

/// Keeps the background log writer alive; drop it last.
pub struct FileLogGuard {
    _guard: WorkerGuard,
}

pub fn env_filter(level: Option<&str>) -> EnvFilter {
    let directive = level
        .map(str::to_string)
        .or_else(|| std::env::var(LOG_ENV).ok())
        .unwrap_or_else(|| "info".to_string());
    EnvFilter::try_new(&directive).unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Logs go to a daily rolling file because the TUI owns stdout.
pub fn init_file_logging(log_dir: &Path, level: Option<&str>) -> Option<FileLogGuard> {
    if let Err(err) = std::fs::create_dir_all(log_dir) {
        eprintln!("failed to create log directory {}: {err}", log_dir.display());
        return None;
    }

    let file_appender = RollingFileAppender::new(Rotation::DAILY, log_dir, "typeamp.log");
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);
    let file_layer = fmt::layer()
        .with_writer(file_writer)
        .with_ansi(false)
        .with_target(true);

    if tracing_subscriber::registry()
        .with(env_filter(level))
        .with(file_layer)
        .try_init()
        .is_err()
    {
        return None;
    }

    Some(FileLogGuard { _guard: guard })
}

/// Stderr logging for the non-interactive commands
pub fn init_stderr_logging(level: Option<&str>) {
    let _ = tracing_subscriber::registry()
        .with(env_filter(level))
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_level_wins() {
        assert_eq!(env_filter(Some("debug")).to_string(), "debug");
    }

    #[test]
    fn invalid_directive_falls_back_to_info() {
        assert_eq!(env_filter(Some("typeamp=loud")).to_string(), "info");
    }
}
