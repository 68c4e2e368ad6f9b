//! Construction seam for concrete backends and sessions.
//!
//! The orchestrator never names a concrete Wayland, X11, DRM or libinput type.
//! It asks a [`BackendProvider`] for them instead, which keeps those
//! implementations pluggable and lets tests substitute doubles.

use std::rc::Rc;

use super::headless::HeadlessBackend;
use super::{Backend, BackendKind, BackendRef, Output};
use crate::display::DisplayHandle;
use crate::error::{BackendError, Result, SessionError};
use crate::session::{GpuDevice, SessionRef};

/// A backend that runs inside another windowing system and can create
/// outputs on demand (nested Wayland, nested X11, headless).
pub trait NestedBackend: Backend {
    /// Creates one output with the backend's default mode.
    fn create_output(&self) -> Result<Output>;

    fn into_backend(self: Rc<Self>) -> BackendRef;
}

/// Constructs the concrete backends and the session.
///
/// Every method defaults to "unavailable", except [`BackendProvider::create_headless`],
/// which builds the crate's own [`HeadlessBackend`].
pub trait BackendProvider {
    fn create_wayland(&self, _display: &DisplayHandle) -> Result<Rc<dyn NestedBackend>> {
        Err(BackendError::Unsupported(BackendKind::Wayland))
    }

    fn create_x11(&self, _display: &DisplayHandle) -> Result<Rc<dyn NestedBackend>> {
        Err(BackendError::Unsupported(BackendKind::X11))
    }

    fn create_headless(&self, display: &DisplayHandle) -> Result<Rc<dyn NestedBackend>> {
        let backend: Rc<dyn NestedBackend> = HeadlessBackend::new(display);
        Ok(backend)
    }

    /// Opens a session. It does not need to be active yet.
    fn open_session(&self, _display: &DisplayHandle) -> Result<SessionRef, SessionError> {
        Err(SessionError::Unsupported)
    }

    fn create_libinput(&self, _display: &DisplayHandle, _session: &SessionRef) -> Result<BackendRef> {
        Err(BackendError::Unsupported(BackendKind::Libinput))
    }

    /// Creates a DRM backend driving `gpu`.
    ///
    /// `primary` is the first DRM backend of the group, if one already
    /// exists; secondary GPUs render through it.
    fn create_drm(
        &self,
        _display: &DisplayHandle,
        _session: &SessionRef,
        _gpu: GpuDevice,
        _primary: Option<&BackendRef>,
    ) -> Result<BackendRef> {
        Err(BackendError::Unsupported(BackendKind::Drm))
    }
}

/// Provider offering only the headless backend.
#[derive(Debug, Default, Clone, Copy)]
pub struct HeadlessOnlyProvider;

impl BackendProvider for HeadlessOnlyProvider {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::Display;

    #[test]
    fn test_headless_only_provider() {
        let display = Display::new("wayland-test");
        let provider = HeadlessOnlyProvider;

        let headless = provider.create_headless(&display).unwrap();
        assert_eq!(headless.kind(), BackendKind::Headless);
        assert!(matches!(
            provider.create_wayland(&display),
            Err(BackendError::Unsupported(BackendKind::Wayland))
        ));
        assert!(matches!(
            provider.create_x11(&display),
            Err(BackendError::Unsupported(BackendKind::X11))
        ));
        assert!(matches!(provider.open_session(&display), Err(SessionError::Unsupported)));
    }
}
