//! Parsed form of the backend environment.
//!
//! [`BackendConfig::from_env`] is the only place that reads the process
//! environment. Everything downstream takes a `BackendConfig`, and tests build
//! one with [`BackendConfig::from_lookup`].

use std::path::PathBuf;
use std::time::Duration;

use tracing::warn;

use crate::session::SESSION_ACTIVATION_TIMEOUT;

pub const BACKENDS_ENV: &str = "WLR_BACKENDS";
pub const WAYLAND_DISPLAY_ENV: &str = "WAYLAND_DISPLAY";
pub const WAYLAND_SOCKET_ENV: &str = "WAYLAND_SOCKET";
pub const X11_DISPLAY_ENV: &str = "DISPLAY";
pub const WAYLAND_OUTPUTS_ENV: &str = "WLR_WL_OUTPUTS";
pub const X11_OUTPUTS_ENV: &str = "WLR_X11_OUTPUTS";
pub const HEADLESS_OUTPUTS_ENV: &str = "WLR_HEADLESS_OUTPUTS";
pub const LIBINPUT_NO_DEVICES_ENV: &str = "WLR_LIBINPUT_NO_DEVICES";
pub const DRM_DEVICES_ENV: &str = "WLR_DRM_DEVICES";

pub const DEFAULT_OUTPUT_COUNT: usize = 1;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendConfig {
    /// Explicit backend list. Overrides every auto-detection rule when set.
    pub backends: Option<Vec<String>>,
    /// A parent Wayland compositor is reachable.
    pub wayland_display: bool,
    /// A parent X server is reachable.
    pub x11_display: bool,
    pub wayland_outputs: usize,
    pub x11_outputs: usize,
    pub headless_outputs: usize,
    /// Start without an input backend if libinput cannot be created.
    pub allow_missing_libinput: bool,
    /// Pinned DRM device nodes. Replaces GPU enumeration and disables hotplug.
    pub drm_devices: Option<Vec<PathBuf>>,
    pub session_timeout: Duration,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            backends: None,
            wayland_display: false,
            x11_display: false,
            wayland_outputs: DEFAULT_OUTPUT_COUNT,
            x11_outputs: DEFAULT_OUTPUT_COUNT,
            headless_outputs: DEFAULT_OUTPUT_COUNT,
            allow_missing_libinput: false,
            drm_devices: None,
            session_timeout: SESSION_ACTIVATION_TIMEOUT,
        }
    }
}

impl BackendConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            backends: lookup(BACKENDS_ENV).map(|names| parse_backend_list(&names)),
            wayland_display: lookup(WAYLAND_DISPLAY_ENV).is_some()
                || lookup(WAYLAND_SOCKET_ENV).is_some(),
            x11_display: lookup(X11_DISPLAY_ENV).is_some(),
            wayland_outputs: parse_output_count(
                WAYLAND_OUTPUTS_ENV,
                lookup(WAYLAND_OUTPUTS_ENV).as_deref(),
            ),
            x11_outputs: parse_output_count(X11_OUTPUTS_ENV, lookup(X11_OUTPUTS_ENV).as_deref()),
            headless_outputs: parse_output_count(
                HEADLESS_OUTPUTS_ENV,
                lookup(HEADLESS_OUTPUTS_ENV).as_deref(),
            ),
            allow_missing_libinput: lookup(LIBINPUT_NO_DEVICES_ENV).as_deref() == Some("1"),
            drm_devices: lookup(DRM_DEVICES_ENV).map(|paths| parse_drm_devices(&paths)),
            session_timeout: SESSION_ACTIVATION_TIMEOUT,
        }
    }

    pub fn with_session_timeout(mut self, timeout: Duration) -> Self {
        self.session_timeout = timeout;
        self
    }
}

fn parse_backend_list(names: &str) -> Vec<String> {
    names
        .split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_drm_devices(paths: &str) -> Vec<PathBuf> {
    paths
        .split(':')
        .filter(|path| !path.is_empty())
        .map(PathBuf::from)
        .collect()
}

/// Parses an output-count variable.
///
/// Unset yields the default of 1. A value that is not a non-negative integer
/// is reported and also yields 1.
pub fn parse_output_count(name: &str, value: Option<&str>) -> usize {
    let Some(raw) = value else {
        return DEFAULT_OUTPUT_COUNT;
    };
    match raw.parse::<i64>().ok().and_then(|n| usize::try_from(n).ok()) {
        Some(count) => count,
        None => {
            warn!("{} specified with invalid integer '{}', ignoring", name, raw);
            DEFAULT_OUTPUT_COUNT
        }
    }
}
