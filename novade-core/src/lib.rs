//! # NovaDE Core Library (`novade-core`)
//!
//! `novade-core` is the foundational library shared by the NovaDE backend
//! crates. It carries the pieces every layer needs but none of them owns:
//!
//! - **Error Handling**: A unified error system through the [`CoreError`] enum and its
//!   associated specific error types like [`ConfigError`] and [`LoggingError`].
//! - **Configuration Management**: TOML-based loading of [`CoreConfig`] with
//!   defaults for every field and validation, through [`ConfigLoader`].
//! - **Logging**: A logging framework built on top of the `tracing` crate,
//!   configurable for console and file outputs in text or JSON format.
//! - **Utility Functions**: Filesystem and XDG path helpers (`utils::fs`,
//!   `utils::paths`) and a monotonic [`Deadline`] for bounded waits (`utils::time`).
//!
//! ## Usage
//!
//! ```rust,ignore
//! use novade_core::config::ConfigLoader;
//! use novade_core::logging::init_logging;
//! use novade_core::error::CoreError;
//!
//! fn main() -> Result<(), CoreError> {
//!     let core_config = ConfigLoader::load()?;
//!     init_logging(&core_config.logging, false)?;
//!
//!     tracing::info!("NovaDE core initialized.");
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod logging;
pub mod utils;

// Re-export key types for convenience
pub use config::{ConfigLoader, CoreConfig, LoggingConfig, SessionConfig};
pub use error::{ConfigError, CoreError, LoggingError};
pub use logging::{init_logging, init_minimal_logging};
pub use utils::time::{Deadline, ToMs};
