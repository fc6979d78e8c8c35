//! Logging setup for the host binary.

use std::io::IsTerminal;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::adapters::sanitize::SanitizingMakeWriter;
use crate::config::{LogMode, LogSettings};

/// Resolve `Auto` against the terminal state of stdin.
///
/// stdout carries responses, so piped runs log to stderr and interactive
/// runs log to a file.
#[must_use]
pub fn resolve_mode(mode: LogMode, interactive: bool) -> LogMode {
    match mode {
        LogMode::Auto if interactive => LogMode::File,
        LogMode::Auto => LogMode::Stderr,
        other => other,
    }
}

/// Install the global subscriber.
///
/// The returned guard flushes buffered log lines on drop; keep it alive for
/// the lifetime of the process.
///
/// # Errors
/// Returns an error if the log file cannot be opened.
pub fn init_logging(settings: &LogSettings) -> std::io::Result<WorkerGuard> {
    let mode = resolve_mode(settings.mode, std::io::stdin().is_terminal());

    let (writer, guard) = match mode {
        LogMode::File => {
            if let Some(parent) = settings.file.parent() {
                // Best-effort: a missing directory surfaces as the open error below.
                let _ = std::fs::create_dir_all(parent);
            }
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&settings.file)?;
            tracing_appender::non_blocking(file)
        }
        LogMode::Stdout => tracing_appender::non_blocking(std::io::stdout()),
        LogMode::Stderr | LogMode::Auto => tracing_appender::non_blocking(std::io::stderr()),
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(SanitizingMakeWriter::new(writer)),
        )
        .init();

    Ok(guard)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auto_mode_follows_terminal() {
        assert_eq!(resolve_mode(LogMode::Auto, true), LogMode::File);
        assert_eq!(resolve_mode(LogMode::Auto, false), LogMode::Stderr);
    }

    #[test]
    fn test_explicit_mode_wins() {
        assert_eq!(resolve_mode(LogMode::Stdout, true), LogMode::Stdout);
        assert_eq!(resolve_mode(LogMode::File, false), LogMode::File);
    }
}
