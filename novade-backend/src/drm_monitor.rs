//! DRM hotplug monitor.
//!
//! A [`DrmMonitor`] watches a session for hot-added GPUs and grows the
//! multi-backend with a new DRM backend for each one. It is bound to three
//! owners (the multi-backend, the primary DRM backend and the session) and
//! destroys itself as soon as any of them is destroyed.

use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::rc::{Rc, Weak};

use tracing::{debug, error, info};

use crate::backend::multi::MultiBackend;
use crate::backend::provider::BackendProvider;
use crate::backend::{Backend, BackendRef};
use crate::display::DisplayHandle;
use crate::session::{Session, SessionRef};
use crate::signal::{Signal, Subscription};

struct Listeners {
    _add_drm_card: Subscription,
    _session_destroy: Subscription,
    _primary_destroy: Subscription,
    _multi_destroy: Subscription,
}

pub struct DrmMonitor {
    display: DisplayHandle,
    provider: Rc<dyn BackendProvider>,
    multi: Weak<MultiBackend>,
    primary: Weak<dyn Backend>,
    session: Weak<dyn Session>,
    listeners: RefCell<Option<Listeners>>,
    /// The monitor owns itself while armed.
    keepalive: RefCell<Option<Rc<DrmMonitor>>>,
    destroy: Signal<()>,
}

impl DrmMonitor {
    /// Arms a monitor. It keeps itself alive until it is destroyed, so the
    /// returned handle may be dropped.
    pub fn new(
        display: &DisplayHandle,
        provider: Rc<dyn BackendProvider>,
        multi: &Rc<MultiBackend>,
        primary: &BackendRef,
        session: &SessionRef,
    ) -> Rc<Self> {
        let monitor = Rc::new_cyclic(|weak_self: &Weak<DrmMonitor>| {
            let add_drm_card = {
                let weak_self = weak_self.clone();
                session.events().add_drm_card.subscribe(move |path: &PathBuf| {
                    if let Some(monitor) = weak_self.upgrade() {
                        monitor.handle_add_drm_card(path);
                    }
                })
            };
            let listeners = Listeners {
                _add_drm_card: add_drm_card,
                _session_destroy: destroy_on(weak_self, &session.events().destroy),
                _primary_destroy: destroy_on(weak_self, &primary.events().destroy),
                _multi_destroy: destroy_on(weak_self, &multi.events().destroy),
            };

            DrmMonitor {
                display: Rc::clone(display),
                provider,
                multi: Rc::downgrade(multi),
                primary: Rc::downgrade(primary),
                session: Rc::downgrade(session),
                listeners: RefCell::new(Some(listeners)),
                keepalive: RefCell::new(None),
                destroy: Signal::new(),
            }
        });
        *monitor.keepalive.borrow_mut() = Some(Rc::clone(&monitor));
        debug!("DRM hotplug monitor armed");
        monitor
    }

    pub fn is_armed(&self) -> bool {
        self.listeners.borrow().is_some()
    }

    /// Fired once, when the monitor is destroyed.
    pub fn on_destroy(&self) -> &Signal<()> {
        &self.destroy
    }

    /// Unsubscribes from all watched objects and releases the monitor.
    ///
    /// Safe to call from inside any of the watched signals. Later calls do nothing.
    pub fn destroy(&self) {
        let listeners = self.listeners.borrow_mut().take();
        let Some(listeners) = listeners else {
            return;
        };
        drop(listeners);
        debug!("DRM hotplug monitor destroyed");
        self.destroy.emit(&());
        let keepalive = self.keepalive.borrow_mut().take();
        drop(keepalive);
    }

    fn handle_add_drm_card(&self, path: &Path) {
        let (Some(session), Some(multi), Some(primary)) = (
            self.session.upgrade(),
            self.multi.upgrade(),
            self.primary.upgrade(),
        ) else {
            return;
        };
        debug!(path = %path.display(), "Got a DRM card hotplug event");

        let Some(gpu) = session.open_if_kms(path) else {
            debug!(path = %path.display(), "Ignoring non-KMS DRM device");
            return;
        };

        let drm = match self
            .provider
            .create_drm(&self.display, &session, gpu, Some(&primary))
        {
            Ok(drm) => drm,
            Err(e) => {
                error!(path = %path.display(), "Failed to create DRM backend on hotplug: {}", e);
                return;
            }
        };

        if let Err(e) = multi.add(Rc::clone(&drm)) {
            error!(path = %path.display(), "Failed to add new DRM backend to multi-backend: {}", e);
            drm.destroy();
            return;
        }

        if let Err(e) = drm.start() {
            error!(path = %path.display(), "Failed to start new DRM backend: {}", e);
            drm.destroy();
            return;
        }
        info!(path = %path.display(), "Added hotplugged DRM backend");
    }
}

fn destroy_on(weak_self: &Weak<DrmMonitor>, signal: &Signal<()>) -> Subscription {
    let weak_self = weak_self.clone();
    signal.subscribe(move |_| {
        if let Some(monitor) = weak_self.upgrade() {
            monitor.destroy();
        }
    })
}
