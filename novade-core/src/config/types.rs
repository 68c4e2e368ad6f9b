//! Configuration Data Structures.
//!
//! These structs are populated by deserializing the TOML configuration file.
//! Missing fields take their values from [`super::defaults`]; unknown fields
//! are rejected via `#[serde(deny_unknown_fields)]`.

use super::defaults;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Configuration settings for the logging subsystem.
///
/// # Examples
///
/// ```
/// use novade_core::config::LoggingConfig;
/// use std::path::PathBuf;
///
/// let default_log_config = LoggingConfig::default();
/// assert_eq!(default_log_config.level, "info");
/// assert_eq!(default_log_config.file_path, None);
/// assert_eq!(default_log_config.format, "text");
///
/// let toml_str = r#"
/// level = "debug"
/// file_path = "/var/log/novade_backend.log"
/// format = "json"
/// "#;
/// let log_config: LoggingConfig = toml::from_str(toml_str).unwrap();
/// assert_eq!(log_config.level, "debug");
/// assert_eq!(log_config.file_path, Some(PathBuf::from("/var/log/novade_backend.log")));
/// assert_eq!(log_config.format, "json");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Minimum level to record: "trace", "debug", "info", "warn" or "error".
    #[serde(default = "defaults::default_log_level")]
    pub level: String,
    /// Optional log file. Relative paths are resolved against the state directory.
    #[serde(default = "defaults::default_log_file_path")]
    pub file_path: Option<PathBuf>,
    /// "text" or "json".
    #[serde(default = "defaults::default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        defaults::default_logging_config()
    }
}

/// Settings for acquiring the privileged device-access session.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SessionConfig {
    /// How long to pump the session's event loop waiting for it to become
    /// active before giving up, in milliseconds. Must be greater than zero.
    #[serde(default = "defaults::default_activation_timeout_ms")]
    pub activation_timeout_ms: u64,
}

impl SessionConfig {
    pub fn activation_timeout(&self) -> Duration {
        Duration::from_millis(self.activation_timeout_ms)
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            activation_timeout_ms: defaults::default_activation_timeout_ms(),
        }
    }
}

/// Root configuration structure.
///
/// # Examples
///
/// ```
/// use novade_core::config::CoreConfig;
///
/// let toml_str = r#"
/// [logging]
/// level = "warn"
///
/// [session]
/// activation_timeout_ms = 5000
/// "#;
/// let loaded: CoreConfig = toml::from_str(toml_str).unwrap();
/// assert_eq!(loaded.logging.level, "warn");
/// assert_eq!(loaded.logging.format, "text");
/// assert_eq!(loaded.session.activation_timeout_ms, 5000);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CoreConfig {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub session: SessionConfig,
}
