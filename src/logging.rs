use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::env_bool;

const LOG_FILE_PREFIX: &str = "exam-backend.log";

/// Crates whose default output drowns the exam events at `info`.
const QUIET_TARGETS: &[(&str, &str)] = &[("sqlx", "warn"), ("tower_http", "info")];

pub struct FileLogGuard {
    _guard: WorkerGuard,
}

pub fn file_logging_enabled() -> bool {
    env_bool("ENABLE_FILE_LOGS", false)
}

/// Installs the global subscriber: stdout always, plus a daily rolling file
/// when `ENABLE_FILE_LOGS` is set. Keep the returned guard alive for the
/// lifetime of the process or buffered file lines are lost.
pub fn init_tracing(log_level: &str) -> Option<FileLogGuard> {
    let env_filter = EnvFilter::try_new(filter_directives(log_level))
        .unwrap_or_else(|_| EnvFilter::new(filter_directives("info")));
    let stdout_layer = fmt::layer().with_target(true);

    if file_logging_enabled() {
        let log_dir = std::env::var("LOG_DIR").unwrap_or_else(|_| "./logs".to_string());
        if let Err(err) = std::fs::create_dir_all(&log_dir) {
            eprintln!("failed to create log directory {log_dir}: {err}");
        } else {
            let file_appender = RollingFileAppender::new(Rotation::DAILY, &log_dir, LOG_FILE_PREFIX);
            let (file_writer, guard) = tracing_appender::non_blocking(file_appender);
            let file_layer = fmt::layer()
                .with_writer(file_writer)
                .with_ansi(false)
                .with_target(true);

            tracing_subscriber::registry()
                .with(env_filter)
                .with(stdout_layer)
                .with(file_layer)
                .init();

            return Some(FileLogGuard { _guard: guard });
        }
    }

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .init();

    None
}

/// Expands a bare level such as `debug` into per-target directives.
///
/// The level applies to this crate and to anything not listed in
/// [`QUIET_TARGETS`]. Targets the caller names explicitly keep their
/// directive.
pub fn filter_directives(log_level: &str) -> String {
    let log_level = log_level.trim();
    let log_level = if log_level.is_empty() { "info" } else { log_level };

    let mut directives = vec![log_level.to_string()];
    if !log_level.contains(env!("CARGO_CRATE_NAME")) {
        directives.push(format!("{}={}", env!("CARGO_CRATE_NAME"), default_level(log_level)));
    }
    for (target, level) in QUIET_TARGETS {
        if !log_level.contains(target) {
            directives.push(format!("{target}={level}"));
        }
    }
    directives.join(",")
}

fn default_level(log_level: &str) -> &str {
    log_level
        .split(',')
        .find(|directive| !directive.contains('='))
        .unwrap_or("info")
}
