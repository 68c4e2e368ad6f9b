//! The backend capability contract.
//!
//! A backend abstracts one windowing or input subsystem (nested Wayland,
//! nested X11, headless, DRM, libinput). Every backend exposes the same
//! lifecycle operations through [`Backend`] and the same three event streams
//! through [`BackendEvents`].

use std::any::Any;
use std::cell::Cell;
use std::fmt;
use std::os::unix::io::RawFd;
use std::rc::Rc;
use std::str::FromStr;

use bitflags::bitflags;

use crate::error::{BackendError, Result};
use crate::session::SessionRef;
use crate::signal::Signal;

pub mod headless;
pub mod multi;
pub mod provider;

/// Shared handle to any backend.
pub type BackendRef = Rc<dyn Backend>;

/// Identifies the kind of a backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendKind {
    Wayland,
    X11,
    Headless,
    Drm,
    Libinput,
    Multi,
}

impl BackendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::Wayland => "wayland",
            BackendKind::X11 => "x11",
            BackendKind::Headless => "headless",
            BackendKind::Drm => "drm",
            BackendKind::Libinput => "libinput",
            BackendKind::Multi => "multi",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parses a name from the explicit backend list.
///
/// `"multi"` is not selectable, and `"x11"` is only recognized when the `x11`
/// feature is enabled.
impl FromStr for BackendKind {
    type Err = BackendError;

    fn from_str(name: &str) -> Result<Self> {
        match name {
            "wayland" => Ok(BackendKind::Wayland),
            #[cfg(feature = "x11")]
            "x11" => Ok(BackendKind::X11),
            "headless" => Ok(BackendKind::Headless),
            "drm" => Ok(BackendKind::Drm),
            "libinput" => Ok(BackendKind::Libinput),
            _ => Err(BackendError::UnknownBackend(name.to_string())),
        }
    }
}

/// Clock used to timestamp presentation events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockId {
    Monotonic,
    Realtime,
}

impl ClockId {
    pub fn as_raw(&self) -> libc::clockid_t {
        match self {
            ClockId::Monotonic => libc::CLOCK_MONOTONIC,
            ClockId::Realtime => libc::CLOCK_REALTIME,
        }
    }
}

bitflags! {
    /// Buffer types a backend can display directly.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct BufferCaps: u32 {
        const DATA_PTR = 1 << 0;
        const DMABUF = 1 << 1;
        const SHM = 1 << 2;
    }
}

/// An output announced through [`BackendEvents::new_output`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Output {
    pub name: String,
    pub width: u32,
    pub height: u32,
    /// Refresh rate in mHz.
    pub refresh_mhz: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputDeviceKind {
    Keyboard,
    Pointer,
    Touch,
    TabletTool,
    TabletPad,
    Switch,
}

impl fmt::Display for InputDeviceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            InputDeviceKind::Keyboard => "keyboard",
            InputDeviceKind::Pointer => "pointer",
            InputDeviceKind::Touch => "touch",
            InputDeviceKind::TabletTool => "tablet-tool",
            InputDeviceKind::TabletPad => "tablet-pad",
            InputDeviceKind::Switch => "switch",
        };
        f.write_str(name)
    }
}

/// An input device announced through [`BackendEvents::new_input`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputDevice {
    pub name: String,
    pub kind: InputDeviceKind,
}

/// The event streams every backend exposes, plus its destroyed flag.
#[derive(Debug, Default)]
pub struct BackendEvents {
    /// Fired exactly once, when the backend is destroyed.
    pub destroy: Signal<()>,
    pub new_input: Signal<InputDevice>,
    pub new_output: Signal<Output>,
    destroyed: Cell<bool>,
}

impl BackendEvents {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed.get()
    }

    /// Marks the backend as destroyed.
    ///
    /// Returns `false` if it already was, in which case the caller must not
    /// tear anything down or emit `destroy` again.
    pub fn begin_destroy(&self) -> bool {
        !self.destroyed.replace(true)
    }
}

/// Capability contract implemented by every backend.
///
/// Only [`Backend::kind`], [`Backend::events`] and [`Backend::as_any`] are
/// required. The remaining methods default to "unsupported".
pub trait Backend {
    fn kind(&self) -> BackendKind;

    fn events(&self) -> &BackendEvents;

    /// Makes the backend operational. It may announce inputs and outputs
    /// from here on.
    fn start(&self) -> Result<()> {
        Ok(())
    }

    /// Releases the backend and fires `destroy`.
    ///
    /// Implementations must tolerate repeated calls and calls on a backend
    /// that never started.
    fn destroy(&self) {
        let events = self.events();
        if events.begin_destroy() {
            events.destroy.emit(&());
        }
    }

    fn is_destroyed(&self) -> bool {
        self.events().is_destroyed()
    }

    fn session(&self) -> Option<SessionRef> {
        None
    }

    fn drm_fd(&self) -> Option<RawFd> {
        None
    }

    fn presentation_clock(&self) -> ClockId {
        ClockId::Monotonic
    }

    fn buffer_caps(&self) -> BufferCaps {
        BufferCaps::empty()
    }

    fn as_any(&self) -> &dyn Any;
}

/// Destroys `backend` if there is one.
pub fn destroy(backend: Option<&BackendRef>) {
    if let Some(backend) = backend {
        backend.destroy();
    }
}

/// Identity of a backend handle, independent of its vtable.
pub(crate) fn backend_key(backend: &BackendRef) -> *const () {
    Rc::as_ptr(backend) as *const ()
}
