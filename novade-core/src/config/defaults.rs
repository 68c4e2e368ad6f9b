//! Default configuration values.
//!
//! Used by `serde`'s `default` attribute in [`super::types`] when a value is
//! missing from the configuration file.

use super::types::LoggingConfig;
use std::path::PathBuf;

/// Default `LoggingConfig`, used when the `[logging]` section is missing.
pub(crate) fn default_logging_config() -> LoggingConfig {
    LoggingConfig {
        level: default_log_level(),
        file_path: default_log_file_path(),
        format: default_log_format(),
    }
}

pub(crate) fn default_log_level() -> String {
    "info".to_string()
}

/// No log file by default.
pub(crate) fn default_log_file_path() -> Option<PathBuf> {
    None
}

pub(crate) fn default_log_format() -> String {
    "text".to_string()
}

pub(crate) fn default_activation_timeout_ms() -> u64 {
    10_000
}
