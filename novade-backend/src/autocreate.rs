//! Backend autocreation.
//!
//! [`autocreate`] picks the backends to run from a [`BackendConfig`] and
//! composes them into one [`MultiBackend`]. Rules are tried in order and the
//! first one that applies decides the outcome:
//!
//! 1. An explicit backend list creates exactly the named backends.
//! 2. A parent Wayland compositor gets one nested Wayland backend.
//! 3. A parent X server gets one nested X11 backend (`x11` feature).
//! 4. Otherwise a session is opened and libinput plus one DRM backend per
//!    GPU are created, and a [`DrmMonitor`] watches for GPU hotplug.
//!
//! On failure everything created so far is destroyed before the error is
//! returned: the multi-backend first, then the session.

use std::path::{Path, PathBuf};
use std::rc::Rc;

use tracing::{debug, error, info, warn};

use crate::backend::multi::MultiBackend;
use crate::backend::provider::{BackendProvider, NestedBackend};
use crate::backend::{Backend, BackendKind, BackendRef};
use crate::config::{BackendConfig, LIBINPUT_NO_DEVICES_ENV};
use crate::display::DisplayHandle;
use crate::drm_monitor::DrmMonitor;
use crate::error::{BackendError, Result};
use crate::session::{create_session, GpuDevice, SessionRef};

/// Upper bound on the GPUs a DRM group is built from.
pub const MAX_GPUS: usize = 8;

/// Creates the compositor's top-level backend.
///
/// The returned multi-backend has not been started. Backends that need a
/// session share one, reachable through [`Backend::session`] on the result.
///
/// # Errors
///
/// Any failure of the rule that applied. Nothing created along the way
/// outlives the call in that case.
pub fn autocreate(
    display: &DisplayHandle,
    provider: &Rc<dyn BackendProvider>,
    config: &BackendConfig,
) -> Result<Rc<MultiBackend>> {
    let mut ctx = Autocreate {
        display,
        provider,
        config,
        multi: MultiBackend::create(display),
        session: None,
    };

    match ctx.run() {
        Ok(()) => {
            info!(children = ctx.multi.len(), "Backend autocreation complete");
            Ok(Rc::clone(&ctx.multi))
        }
        Err(e) => {
            error!("Backend autocreation failed: {}", e);
            ctx.teardown();
            Err(e)
        }
    }
}

struct Autocreate<'a> {
    display: &'a DisplayHandle,
    provider: &'a Rc<dyn BackendProvider>,
    config: &'a BackendConfig,
    multi: Rc<MultiBackend>,
    session: Option<SessionRef>,
}

impl<'a> Autocreate<'a> {
    fn run(&mut self) -> Result<()> {
        let config = self.config;

        if let Some(names) = &config.backends {
            info!(backends = ?names, "Loading user-specified backends");
            for name in names {
                self.attempt_by_name(name).map_err(|e| {
                    error!(backend = %name, "Failed to start backend: {}", e);
                    e
                })?;
            }
            return Ok(());
        }

        if config.wayland_display {
            info!("Parent Wayland compositor detected, starting nested Wayland backend");
            return self.attempt_nested(BackendKind::Wayland);
        }

        #[cfg(feature = "x11")]
        {
            if config.x11_display {
                info!("Parent X server detected, starting nested X11 backend");
                return self.attempt_nested(BackendKind::X11);
            }
        }

        // Bare metal: session, libinput and DRM.
        let session = self.ensure_session()?;
        self.attempt_libinput(&session)?;
        self.attempt_drm(&session)?;
        Ok(())
    }

    fn attempt_by_name(&mut self, name: &str) -> Result<()> {
        let kind: BackendKind = name.parse()?;
        match kind {
            BackendKind::Wayland | BackendKind::X11 | BackendKind::Headless => {
                self.attempt_nested(kind)
            }
            BackendKind::Libinput => {
                let session = self.ensure_session()?;
                let libinput = self.provider.create_libinput(self.display, &session)?;
                self.add_or_destroy(libinput)
            }
            BackendKind::Drm => {
                let session = self.ensure_session()?;
                self.attempt_drm(&session).map(|_| ())
            }
            BackendKind::Multi => Err(BackendError::UnknownBackend(name.to_string())),
        }
    }

    fn attempt_nested(&self, kind: BackendKind) -> Result<()> {
        let (created, outputs) = match kind {
            BackendKind::Wayland => (
                self.provider.create_wayland(self.display),
                self.config.wayland_outputs,
            ),
            BackendKind::X11 => (self.provider.create_x11(self.display), self.config.x11_outputs),
            _ => (
                self.provider.create_headless(self.display),
                self.config.headless_outputs,
            ),
        };
        let backend: Rc<dyn NestedBackend> = created?;

        for _ in 0..outputs {
            if let Err(e) = backend.create_output() {
                warn!(backend = %kind, "Failed to create output: {}", e);
            }
        }
        debug!(backend = %kind, outputs, "Created nested backend");
        self.add_or_destroy(backend.into_backend())
    }

    fn attempt_libinput(&self, session: &SessionRef) -> Result<()> {
        match self.provider.create_libinput(self.display, session) {
            Ok(libinput) => self.add_or_destroy(libinput),
            Err(e) if self.config.allow_missing_libinput => {
                info!(
                    "Failed to create libinput backend ({}), {} is set, continuing without input devices",
                    e, LIBINPUT_NO_DEVICES_ENV
                );
                Ok(())
            }
            Err(e) => {
                error!("Failed to start libinput backend: {}", e);
                error!("Set {}=1 to skip libinput devices", LIBINPUT_NO_DEVICES_ENV);
                Err(e)
            }
        }
    }

    /// Creates one DRM backend per GPU and returns the primary one.
    ///
    /// GPUs whose backend cannot be created or added are skipped.
    fn attempt_drm(&self, session: &SessionRef) -> Result<BackendRef> {
        let gpus = match &self.config.drm_devices {
            Some(paths) => open_explicit_gpus(session, paths),
            None => session.find_gpus(MAX_GPUS)?,
        };
        if gpus.is_empty() {
            error!("Found 0 GPUs, cannot create backend");
            return Err(BackendError::NoGpus);
        }
        info!(count = gpus.len(), "Found GPUs");

        let mut primary: Option<BackendRef> = None;
        for gpu in gpus {
            let path = gpu.path.clone();
            let drm = match self
                .provider
                .create_drm(self.display, session, gpu, primary.as_ref())
            {
                Ok(drm) => drm,
                Err(e) => {
                    error!(path = %path.display(), "Failed to create DRM backend: {}", e);
                    continue;
                }
            };
            if let Err(e) = self.multi.add(Rc::clone(&drm)) {
                error!(path = %path.display(), "Failed to add DRM backend: {}", e);
                drm.destroy();
                continue;
            }
            debug!(path = %path.display(), primary = primary.is_none(), "Created DRM backend");
            if primary.is_none() {
                primary = Some(drm);
            }
        }

        let Some(primary) = primary else {
            error!("Could not create a DRM backend on any GPU");
            return Err(BackendError::NoDrmBackend);
        };

        if self.config.drm_devices.is_none() {
            DrmMonitor::new(self.display, Rc::clone(self.provider), &self.multi, &primary, session);
        }
        Ok(primary)
    }

    fn ensure_session(&mut self) -> Result<SessionRef> {
        if let Some(session) = &self.session {
            return Ok(Rc::clone(session));
        }
        let session = create_session(&**self.provider, self.display, self.config.session_timeout)?;
        self.multi.set_session(Some(Rc::clone(&session)));
        self.session = Some(Rc::clone(&session));
        Ok(session)
    }

    fn add_or_destroy(&self, backend: BackendRef) -> Result<()> {
        if let Err(e) = self.multi.add(Rc::clone(&backend)) {
            error!(backend = %backend.kind(), "Failed to add backend: {}", e);
            backend.destroy();
            return Err(e);
        }
        Ok(())
    }

    fn teardown(&mut self) {
        self.multi.destroy();
        if let Some(session) = self.session.take() {
            session.destroy();
        }
    }
}

fn open_explicit_gpus(session: &SessionRef, paths: &[PathBuf]) -> Vec<GpuDevice> {
    paths
        .iter()
        .filter_map(|path| open_gpu(session, path))
        .take(MAX_GPUS)
        .collect()
}

fn open_gpu(session: &SessionRef, path: &Path) -> Option<GpuDevice> {
    let gpu = session.open_if_kms(path);
    if gpu.is_none() {
        warn!(path = %path.display(), "Not a KMS-capable DRM device, skipping");
    }
    gpu
}
