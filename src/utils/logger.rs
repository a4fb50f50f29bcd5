use crate::config::LoggingConfig;
use crate::utils::error::{EtlError, Result};
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn build_filter(level: &str, verbose: bool) -> EnvFilter {
    let default_directive = if verbose {
        "attempt_etl=debug,info".to_string()
    } else {
        format!("attempt_etl={},warn", level)
    };

    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive))
}

/// Creates the daily log appender. Files are named `YYYY-MM-DD.log` so the
/// retention pass can read their dates back.
pub fn daily_log_appender(log_dir: &Path) -> Result<RollingFileAppender> {
    std::fs::create_dir_all(log_dir)?;

    RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_suffix("log")
        .build(log_dir)
        .map_err(|e| EtlError::ConfigError {
            message: format!("cannot open log file in {}: {}", log_dir.display(), e),
        })
}

/// Installs console and file logging for the process. The returned guard
/// flushes the file writer when dropped and must outlive the run.
pub fn init_cli_logger(logging: &LoggingConfig, verbose: bool) -> Result<WorkerGuard> {
    let appender = daily_log_appender(Path::new(&logging.log_dir))?;
    let (file_writer, guard) = tracing_appender::non_blocking(appender);

    let console_layer = fmt::layer()
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact();

    let json_file = logging.format == "json";
    let file_layer = fmt::layer()
        .with_writer(file_writer.clone())
        .with_target(false)
        .with_ansi(false);
    let json_file_layer = fmt::layer()
        .with_writer(file_writer)
        .with_target(false)
        .with_ansi(false)
        .json();

    tracing_subscriber::registry()
        .with(build_filter(&logging.level, verbose))
        .with(console_layer)
        .with((!json_file).then_some(file_layer))
        .with(json_file.then_some(json_file_layer))
        .try_init()
        .map_err(|e| EtlError::ConfigError {
            message: format!("logger already initialized: {}", e),
        })?;

    Ok(guard)
}

/// Writes a failure that happened before logging was configured into the
/// day's file under `log_dir`, so scheduled runs leave a trace.
pub fn log_startup_failure(log_dir: &Path, context: &str, error: &EtlError) -> Result<()> {
    let appender = daily_log_appender(log_dir)?;
    let (file_writer, guard) = tracing_appender::non_blocking(appender);

    let subscriber = tracing_subscriber::registry().with(
        fmt::layer()
            .with_writer(file_writer)
            .with_target(false)
            .with_ansi(false),
    );
    tracing::subscriber::with_default(subscriber, || {
        tracing::error!("❌ {}: {}", context, error);
        tracing::error!("💡 Suggestion: {}", error.recovery_suggestion());
    });

    drop(guard);
    Ok(())
}
