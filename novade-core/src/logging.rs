//! Logging for the NovaDE backend layer.
//!
//! Built on the `tracing` ecosystem. Supports console output and optional
//! daily-rolling file logging, each in text or JSON format.

use crate::config::LoggingConfig;
use crate::error::{CoreError, LoggingError};
use crate::utils;

use once_cell::sync::Lazy;
use std::io::stdout;
use std::path::Path;
use std::sync::Mutex;
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer, Registry,
};

/// Initializes a minimal logging setup, directing messages to `stderr`.
///
/// Intended for tests, early startup before the configuration is loaded, or as
/// a fallback when [`init_logging`] fails. Filters on `RUST_LOG`, defaulting to
/// "info". Errors (e.g. a global subscriber is already set) are ignored.
pub fn init_minimal_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(Level::INFO.to_string()));

    let _ = fmt::Subscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(atty::is(atty::Stream::Stderr))
        .try_init();
}

/// Creates a file logging layer.
///
/// Ensures the parent directory for the log file exists, sets up a daily
/// rolling appender and picks the text or JSON format.
fn create_file_layer(
    log_path: &Path,
    format: &str,
) -> Result<(Box<dyn Layer<Registry> + Send + Sync + 'static>, WorkerGuard), CoreError> {
    if let Some(parent) = log_path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            utils::fs::ensure_dir_exists(parent)?;
        }
    }

    let file_appender = tracing_appender::rolling::daily(
        log_path.parent().unwrap_or_else(|| Path::new(".")),
        log_path
            .file_name()
            .unwrap_or_else(|| std::ffi::OsStr::new("backend.log")),
    );

    let (non_blocking_writer, guard) = tracing_appender::non_blocking(file_appender);

    match format.to_lowercase().as_str() {
        "json" => {
            let layer = fmt::layer()
                .json()
                .with_writer(non_blocking_writer)
                .with_ansi(false);
            Ok((Box::new(layer), guard))
        }
        _ => {
            let layer = fmt::layer()
                .with_writer(non_blocking_writer)
                .with_ansi(false);
            Ok((Box::new(layer), guard))
        }
    }
}

/// Keeps the file logger's worker alive for the lifetime of the process so
/// buffered lines are flushed.
static LOG_WORKER_GUARD: Lazy<Mutex<Option<WorkerGuard>>> = Lazy::new(|| Mutex::new(None));

/// Parses a configured level name into the filter directive `tracing` expects.
fn level_directive(level: &str) -> Result<String, LoggingError> {
    let level = match level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        invalid_level => {
            return Err(LoggingError::InitializationFailure(format!(
                "Invalid log level in config: {}",
                invalid_level
            )))
        }
    };
    Ok(level.to_string())
}

/// Initializes the global logging system based on the provided [`LoggingConfig`].
///
/// Configures a stdout layer and an optional file layer, then installs them
/// as the global `tracing` subscriber.
///
/// # Arguments
///
/// * `config`: The logging section of the loaded configuration.
/// * `is_reload`: If `true`, an already installed subscriber is not an error.
///
/// # Errors
///
/// Returns `CoreError::Logging` if the level is invalid or, on an initial
/// setup, if a global subscriber is already installed.
pub fn init_logging(config: &LoggingConfig, is_reload: bool) -> Result<(), CoreError> {
    let directive = level_directive(&config.level)?;

    let stdout_filter = EnvFilter::new(directive.clone());
    let stdout_layer = match config.format.to_lowercase().as_str() {
        "json" => fmt::layer()
            .json()
            .with_writer(stdout)
            .with_ansi(false)
            .with_filter(stdout_filter)
            .boxed(),
        _ => fmt::layer()
            .with_writer(stdout)
            .with_ansi(atty::is(atty::Stream::Stdout))
            .with_filter(stdout_filter)
            .boxed(),
    };

    let mut new_file_guard: Option<WorkerGuard> = None;
    let mut layers: Vec<Box<dyn Layer<Registry> + Send + Sync + 'static>> = vec![stdout_layer];
    if let Some(log_path) = &config.file_path {
        let (file_layer, guard) = create_file_layer(log_path, &config.format)?;
        new_file_guard = Some(guard);
        layers.push(file_layer.with_filter(EnvFilter::new(directive)).boxed());
    }

    let result = Registry::default().with(layers).try_init();

    match LOG_WORKER_GUARD.lock() {
        // The previous guard (if any) is dropped here, flushing its logs.
        Ok(mut guard_slot) => *guard_slot = new_file_guard,
        Err(e) => eprintln!(
            "[ERROR] Failed to lock LOG_WORKER_GUARD to update: {}. Log flushing may be affected.",
            e
        ),
    }

    match result {
        Ok(()) => Ok(()),
        Err(e) if is_reload => {
            eprintln!(
                "[INFO] Re-initializing logging configuration attempted. Previous logger may persist. Error: {}",
                e
            );
            Ok(())
        }
        Err(e) => Err(LoggingError::InitializationFailure(format!(
            "Failed to set global tracing subscriber. Was it already initialized? Error: {}",
            e
        ))
        .into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use tempfile::TempDir;

    #[test]
    fn test_init_minimal_logging_runs_without_panic() {
        init_minimal_logging();
        // A second call must be ignored rather than panic.
        init_minimal_logging();
        tracing::info!("Minimal logging test message.");
    }

    #[rstest]
    #[case("text")]
    #[case("json")]
    #[case("TEXT")]
    fn test_create_file_layer_formats(#[case] format: &str) {
        let temp_dir = TempDir::new().unwrap();
        let log_path = temp_dir.path().join("backend.log");

        let result = create_file_layer(&log_path, format);
        assert!(result.is_ok(), "create_file_layer failed for {}: {:?}", format, result.err());
    }

    #[test]
    fn test_create_file_layer_ensures_parent_dir_exists() {
        let temp_dir = TempDir::new().unwrap();
        let nested_log_path = temp_dir.path().join("new_parent_dir/nested.log");
        assert!(!nested_log_path.parent().unwrap().exists());

        let result = create_file_layer(&nested_log_path, "text");
        assert!(result.is_ok(), "create_file_layer failed: {:?}", result.err());
        assert!(nested_log_path.parent().unwrap().exists(), "Parent directory was not created");
    }

    #[rstest]
    #[case("trace", "TRACE")]
    #[case("Debug", "DEBUG")]
    #[case("info", "INFO")]
    #[case("WARN", "WARN")]
    #[case("error", "ERROR")]
    fn test_level_directive_accepts_known_levels(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(level_directive(input).unwrap(), expected);
    }

    #[test]
    fn test_init_logging_invalid_level_returns_error() {
        let config = LoggingConfig {
            level: "supertrace".to_string(),
            file_path: None,
            format: "text".to_string(),
        };
        match init_logging(&config, false) {
            Err(CoreError::Logging(LoggingError::InitializationFailure(msg))) => {
                assert!(msg.contains("Invalid log level in config: supertrace"));
            }
            other => panic!("Unexpected result: {:?}", other),
        }
    }
}
