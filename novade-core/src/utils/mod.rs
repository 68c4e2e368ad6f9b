//! General Utilities for the NovaDE backend layer.
//!
//! # Submodules
//!
//! - [`fs`]: Filesystem helpers such as ensuring a directory exists.
//! - [`paths`]: XDG base directory and application directory resolution.
//! - [`time`]: Monotonic deadlines for bounded waits and millisecond conversion.

pub mod fs;
pub mod paths;
pub mod time;

pub use fs::ensure_dir_exists;
pub use time::{Deadline, ToMs};
