//! Configuration Management for the NovaDE backend layer.
//!
//! ## Submodules
//!
//! - [`types`]: The configuration schema ([`CoreConfig`], [`LoggingConfig`], [`SessionConfig`]).
//! - [`defaults`]: Default values used by `serde` when a field is missing.
//! - [`loader`]: [`ConfigLoader`], which locates, parses and validates the TOML file.
//!
//! ## Configuration Loading Process
//!
//! 1. `ConfigLoader::load()` resolves the file path: `$NOVADE_BACKEND_CONFIG` if set,
//!    otherwise `backend.toml` in the application configuration directory.
//! 2. A missing file yields `CoreConfig::default()`.
//! 3. A present file is parsed as TOML into `CoreConfig`. Parsing errors map to
//!    [`crate::error::ConfigError::ParseError`].
//! 4. The result is validated (level/format normalization, relative log paths
//!    resolved against the state directory, positive session timeout).
//!
//! # Examples
//!
//! ```rust,ignore
//! use novade_core::config::ConfigLoader;
//!
//! match ConfigLoader::load() {
//!     Ok(config) => println!("Session timeout: {:?}", config.session.activation_timeout()),
//!     Err(e) => {
//!         novade_core::logging::init_minimal_logging();
//!         tracing::error!("Configuration error: {}", e);
//!     }
//! }
//! ```

pub mod defaults;
pub mod loader;
pub mod types;

pub use loader::ConfigLoader;
pub use types::{CoreConfig, LoggingConfig, SessionConfig};
