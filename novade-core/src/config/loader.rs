//! Configuration Loading.
//!
//! [`ConfigLoader`] locates the configuration file, deserializes it from TOML,
//! applies defaults and validates the result.
//!
//! ## Configuration File Location
//!
//! `ConfigLoader::load()` reads the path named by `$NOVADE_BACKEND_CONFIG` when
//! it is set, otherwise `backend.toml` inside the application configuration
//! directory (see [`get_app_config_dir`]). A missing file is not an error.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::CoreConfig;
use crate::error::{ConfigError, CoreError};
use crate::utils::fs as nova_fs;
use crate::utils::paths::{get_app_config_dir, get_app_state_dir};

/// Environment variable overriding the configuration file location.
pub const CONFIG_PATH_ENV: &str = "NOVADE_BACKEND_CONFIG";

/// File name looked up in the application configuration directory.
pub const CONFIG_FILE_NAME: &str = "backend.toml";

/// Namespace for configuration loading.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Loads and validates the `CoreConfig` for the process.
    ///
    /// # Errors
    ///
    /// Returns a `CoreError` if the configuration directory cannot be
    /// determined, the file cannot be read or parsed, or validation fails.
    pub fn load() -> Result<CoreConfig, CoreError> {
        let path = Self::config_path()?;
        Self::load_from_path(&path)
    }

    /// Resolves the configuration file path without reading it.
    pub fn config_path() -> Result<PathBuf, CoreError> {
        match env::var_os(CONFIG_PATH_ENV) {
            Some(path) if !path.is_empty() => Ok(PathBuf::from(path)),
            _ => Ok(get_app_config_dir()?.join(CONFIG_FILE_NAME)),
        }
    }

    /// Loads the configuration from an explicit path.
    ///
    /// A missing file yields the default configuration.
    pub fn load_from_path(path: &Path) -> Result<CoreConfig, CoreError> {
        match fs::read_to_string(path) {
            Ok(content) => Self::load_from_str(&content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No configuration file, using defaults");
                let mut config = CoreConfig::default();
                Self::validate_config(&mut config)?;
                Ok(config)
            }
            Err(e) => Err(ConfigError::ReadError {
                path: path.to_path_buf(),
                source: e,
            }
            .into()),
        }
    }

    /// Parses and validates configuration from TOML text. Blank input yields defaults.
    pub fn load_from_str(content: &str) -> Result<CoreConfig, CoreError> {
        let mut config: CoreConfig = if content.trim().is_empty() {
            CoreConfig::default()
        } else {
            toml::from_str(content).map_err(ConfigError::ParseError)?
        };
        Self::validate_config(&mut config)?;
        Ok(config)
    }

    /// Validates the configuration and normalizes it in place.
    ///
    /// - The logging level must be one of "trace", "debug", "info", "warn", "error".
    /// - The logging format must be "text" or "json".
    /// - A relative log file path is made absolute against the application
    ///   state directory, and the log file's parent directory is created.
    /// - The session activation timeout must be greater than zero.
    fn validate_config(config: &mut CoreConfig) -> Result<(), CoreError> {
        let level_lower = config.logging.level.to_lowercase();
        match level_lower.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => config.logging.level = level_lower,
            _ => {
                return Err(ConfigError::ValidationError(format!(
                    "Invalid log level: '{}'. Must be one of trace, debug, info, warn, error.",
                    config.logging.level
                ))
                .into());
            }
        }

        let format_lower = config.logging.format.to_lowercase();
        match format_lower.as_str() {
            "text" | "json" => config.logging.format = format_lower,
            _ => {
                return Err(ConfigError::ValidationError(format!(
                    "Invalid log format: '{}'. Must be one of text, json.",
                    config.logging.format
                ))
                .into());
            }
        }

        if let Some(file_path) = &config.logging.file_path {
            let absolute_path = if file_path.is_absolute() {
                file_path.clone()
            } else {
                get_app_state_dir()?.join(file_path)
            };
            if let Some(parent_dir) = absolute_path.parent() {
                if !parent_dir.exists() {
                    nova_fs::ensure_dir_exists(parent_dir)?;
                }
            }
            config.logging.file_path = Some(absolute_path);
        }

        if config.session.activation_timeout_ms == 0 {
            return Err(ConfigError::ValidationError(
                "session.activation_timeout_ms must be greater than zero.".to_string(),
            )
            .into());
        }

        Ok(())
    }
}
