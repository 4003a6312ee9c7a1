use crate::config::LoggingConfig;
use std::fs;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const DEFAULT_DIRECTIVE: &str = "openstates_web=info";

/// Initializes console logging plus a daily-rotated file log.
///
/// The returned guard flushes the file writer on drop; keep it alive for the
/// lifetime of the process.
pub fn init_logging(config: &LoggingConfig) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVE));

    if fs::create_dir_all(&config.dir).is_err() {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_writer(std::io::stdout))
            .init();
        tracing::warn!(dir = %config.dir.display(), "log directory unavailable, console only");
        return None;
    }

    let file_appender = tracing_appender::rolling::daily(&config.dir, &config.file_name);
    let (non_blocking_writer, guard) = tracing_appender::non_blocking(file_appender);

    if config.json_file {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(non_blocking_writer))
            .with(fmt::layer().with_writer(std::io::stdout))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_ansi(false).with_writer(non_blocking_writer))
            .with(fmt::layer().with_writer(std::io::stdout))
            .init();
    }

    Some(guard)
}

#[cfg(test)]
mod tests {
    use super::*;

    // Installs the global subscriber, so it is the only test here that calls `init_logging`.
    #[test]
    fn console_and_file_layers_install_together() {
        let dir = tempfile::tempdir().unwrap();
        let config = LoggingConfig {
            dir: dir.path().join("logs"),
            file_name: "openstates.log".into(),
            json_file: true,
        };
        let guard = init_logging(&config);
        assert!(guard.is_some());
        tracing::info!("logging ready");
        drop(guard);

        let files: Vec<String> = fs::read_dir(&config.dir)
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert!(files.iter().any(|name| name.starts_with("openstates.log")));
    }
}
