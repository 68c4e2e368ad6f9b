//! The privileged device-access session.
//!
//! A [`Session`] represents exclusive ownership of the seat (logind, seatd or
//! similar). DRM and libinput backends open their devices through it. This
//! crate only consumes the contract; implementations live with the
//! compositor's seat integration.

use std::cell::Cell;
use std::os::unix::io::RawFd;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::Duration;

use crate::error::SessionError;
use crate::signal::Signal;

pub mod gpu;
#[cfg(feature = "udev")]
pub mod udev;
pub mod wait;

pub use gpu::{select_gpus, GpuCandidate};
pub use wait::{create_session, wait_for_activation, SESSION_ACTIVATION_TIMEOUT};

pub type SessionRef = Rc<dyn Session>;

/// An opened KMS-capable DRM device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GpuDevice {
    pub path: PathBuf,
    pub fd: RawFd,
}

#[derive(Debug, Default)]
pub struct SessionEvents {
    /// A DRM card was hot-added. Carries the device node path.
    pub add_drm_card: Signal<PathBuf>,
    pub destroy: Signal<()>,
    destroyed: Cell<bool>,
}

impl SessionEvents {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed.get()
    }

    /// Marks the session destroyed. Returns `false` if it already was.
    pub fn begin_destroy(&self) -> bool {
        !self.destroyed.replace(true)
    }
}

pub trait Session {
    fn events(&self) -> &SessionEvents;

    fn is_active(&self) -> bool;

    /// Processes pending session events, blocking for at most `timeout`.
    fn dispatch(&self, timeout: Duration) -> Result<(), SessionError>;

    /// Lists and opens up to `max` KMS-capable GPUs, boot GPU first.
    fn find_gpus(&self, max: usize) -> Result<Vec<GpuDevice>, SessionError>;

    /// Opens `path` if it is a KMS-capable DRM device.
    fn open_if_kms(&self, path: &Path) -> Option<GpuDevice>;

    fn destroy(&self) {
        let events = self.events();
        if events.begin_destroy() {
            events.destroy.emit(&());
        }
    }

    fn is_destroyed(&self) -> bool {
        self.events().is_destroyed()
    }
}
