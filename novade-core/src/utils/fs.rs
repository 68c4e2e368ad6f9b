//! Filesystem Utilities.
//!
//! Helpers for common filesystem operations that report failures as
//! [`CoreError::Filesystem`].

use crate::error::CoreError;
use std::fs;
use std::path::Path;

/// Ensures that a directory exists at the given path, creating it and any
/// missing parents.
///
/// # Errors
///
/// Returns `CoreError::Filesystem` if the path exists but is not a directory,
/// or if creation fails.
///
/// # Examples
///
/// ```
/// use novade_core::utils::fs::ensure_dir_exists;
///
/// let temp_dir = tempfile::tempdir().unwrap();
/// let dir_path = temp_dir.path().join("logs");
/// ensure_dir_exists(&dir_path).unwrap();
/// assert!(dir_path.is_dir());
/// ```
pub fn ensure_dir_exists(path: &Path) -> Result<(), CoreError> {
    if path.exists() {
        if path.is_dir() {
            return Ok(());
        }
        return Err(CoreError::Filesystem {
            message: "Path exists but is not a directory".to_string(),
            path: path.to_path_buf(),
            source: std::io::Error::new(
                std::io::ErrorKind::AlreadyExists,
                "Path exists but is not a directory",
            ),
        });
    }

    fs::create_dir_all(path).map_err(|e| CoreError::Filesystem {
        message: "Failed to create directory".to_string(),
        path: path.to_path_buf(),
        source: e,
    })
}
