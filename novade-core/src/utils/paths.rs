//! XDG Base Directory and Application-Specific Path Resolution.
//!
//! Relies on the `directories-next` crate. Application directories are
//! derived from `QUALIFIER`, `ORGANIZATION` and `APPLICATION`, e.g.
//! `~/.config/NovaDE` on Linux.

use crate::error::{ConfigError, CoreError};
use directories_next::{BaseDirs, ProjectDirs};
use std::path::PathBuf;

const QUALIFIER: &str = "org";
const ORGANIZATION: &str = "NovaDE";
const APPLICATION: &str = "NovaDE";

fn project_dirs(dir_type: &str) -> Result<ProjectDirs, CoreError> {
    ProjectDirs::from(QUALIFIER, ORGANIZATION, APPLICATION).ok_or_else(|| {
        CoreError::Config(ConfigError::DirectoryUnavailable {
            dir_type: dir_type.to_string(),
        })
    })
}

/// Returns the application-specific configuration directory.
///
/// # Errors
/// Returns [`ConfigError::DirectoryUnavailable`] (wrapped in `CoreError::Config`)
/// if the home directory cannot be determined.
pub fn get_app_config_dir() -> Result<PathBuf, CoreError> {
    project_dirs("App Config").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Returns the application-specific state directory, used for log files.
///
/// On Linux this honours `$XDG_STATE_HOME`, falling back to
/// `$HOME/.local/state`. Other platforms use the local data directory.
pub fn get_app_state_dir() -> Result<PathBuf, CoreError> {
    let base = BaseDirs::new()
        .map(|dirs| {
            #[cfg(target_os = "linux")]
            {
                match std::env::var("XDG_STATE_HOME") {
                    Ok(state_home) if !state_home.is_empty() => PathBuf::from(state_home),
                    _ => dirs.home_dir().join(".local/state"),
                }
            }
            #[cfg(not(target_os = "linux"))]
            {
                dirs.data_local_dir().to_path_buf()
            }
        })
        .ok_or_else(|| {
            CoreError::Config(ConfigError::DirectoryUnavailable {
                dir_type: "State Base".to_string(),
            })
        })?;
    Ok(base.join(ORGANIZATION))
}
