//! Error handling for the NovaDE core layer.
//!
//! This module defines the error types shared by the NovaDE backend crates
//! using the `thiserror` crate for ergonomic error definition.
//!
//! The main error type for this crate is [`CoreError`], which encapsulates
//! more specific errors like [`ConfigError`] and [`LoggingError`].
//!
//! # Examples
//!
//! ```rust,ignore
//! use novade_core::error::CoreError;
//!
//! fn do_something_risky() -> Result<(), CoreError> {
//!     // If something goes wrong:
//!     // return Err(CoreError::Internal("Something went wrong".to_string()));
//!     Ok(())
//! }
//! ```

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Core error type for the NovaDE backend layer.
///
/// This enum represents all possible errors that can occur in the core layer.
/// It is used as the common error type of `novade-core`, often by wrapping
/// more specific error types.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Errors related to configuration loading, parsing, or validation.
    /// Wraps a [`ConfigError`].
    #[error("Configuration Error: {0}")]
    Config(#[from] ConfigError),

    /// Errors that occur while setting up the logging system.
    /// Wraps a [`LoggingError`].
    #[error("Logging Error: {0}")]
    Logging(#[from] LoggingError),

    /// Errors related to filesystem operations, such as creating directories,
    /// that are not covered by more specific configuration or logging I/O errors.
    #[error("Filesystem Error: {message} (Path: {path:?})")]
    Filesystem {
        message: String,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// General I/O errors not covered by other specific variants.
    #[error("I/O Error: {0}")]
    Io(#[from] io::Error),

    /// Errors due to invalid input provided to a function or method.
    #[error("Invalid Input: {0}")]
    InvalidInput(String),

    /// Catch-all for unexpected internal errors within the core library.
    #[error("An unexpected internal error occurred: {0}")]
    Internal(String),
}

/// Error type for configuration-related operations.
///
/// Typically wrapped by [`CoreError::Config`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An error occurred while attempting to read a configuration file.
    #[error("Failed to read configuration file from {path:?}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The configuration file is not valid TOML or does not match the schema.
    #[error("Failed to parse configuration file: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Invalid configuration values after successful parsing.
    #[error("Configuration validation failed: {0}")]
    ValidationError(String),

    /// A required base directory (e.g., XDG config/state home) could not be determined.
    #[error("Could not determine base directory for {dir_type}")]
    DirectoryUnavailable { dir_type: String },
}

/// Error type for logging-related operations.
#[derive(Debug, Error)]
pub enum LoggingError {
    /// Failed to install the global subscriber or the configuration was rejected.
    #[error("Failed to initialize logging: {0}")]
    InitializationFailure(String),

    /// Failed to set or parse a log filter.
    #[error("Failed to set log filter: {0}")]
    FilterError(String),

    /// An I/O error occurred during logging, such as failing to open a log file.
    #[error("Logging I/O error: {0}")]
    IoError(#[from] io::Error),
}
