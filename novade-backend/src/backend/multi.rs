//! A backend composed of other backends.
//!
//! [`MultiBackend`] owns an ordered list of children. Lifecycle calls are
//! forwarded to every child, and each child's `new_input`/`new_output`
//! events are re-emitted on the container's own events.

use std::any::Any;
use std::cell::RefCell;
use std::os::unix::io::RawFd;
use std::rc::{Rc, Weak};

use tracing::{debug, error, info};

use super::{backend_key, Backend, BackendEvents, BackendKind, BackendRef, BufferCaps, ClockId};
use crate::display::DisplayHandle;
use crate::error::{BackendError, Result};
use crate::session::SessionRef;
use crate::signal::{Signal, Subscription};

struct SubBackend {
    backend: BackendRef,
    _destroy: Subscription,
    _new_input: Subscription,
    _new_output: Subscription,
}

/// Container backend aggregating any number of child backends.
pub struct MultiBackend {
    weak_self: Weak<MultiBackend>,
    events: BackendEvents,
    children: RefCell<Vec<SubBackend>>,
    session: RefCell<Option<SessionRef>>,
    backend_add: Signal<BackendRef>,
    backend_remove: Signal<BackendRef>,
    display_destroy: RefCell<Option<Subscription>>,
}

impl MultiBackend {
    /// Creates an empty multi-backend bound to `display`.
    ///
    /// It destroys itself, and with it every child, when the display is destroyed.
    pub fn create(display: &DisplayHandle) -> Rc<Self> {
        Rc::new_cyclic(|weak_self: &Weak<MultiBackend>| {
            let display_destroy = {
                let weak_self = weak_self.clone();
                display.on_destroy().subscribe(move |_| {
                    if let Some(multi) = weak_self.upgrade() {
                        multi.destroy();
                    }
                })
            };

            MultiBackend {
                weak_self: weak_self.clone(),
                events: BackendEvents::new(),
                children: RefCell::new(Vec::new()),
                session: RefCell::new(None),
                backend_add: Signal::new(),
                backend_remove: Signal::new(),
                display_destroy: RefCell::new(Some(display_destroy)),
            }
        })
    }

    /// Adds `child` to the container.
    ///
    /// The child is removed automatically when it is destroyed. Adding a
    /// child that is already present succeeds without side effects. Adding
    /// does not start the child.
    ///
    /// # Errors
    ///
    /// `BackendError::Destroyed` if the container has been destroyed, and
    /// `BackendError::InvalidChild` if `child` is this container or has
    /// itself been destroyed.
    pub fn add(&self, child: BackendRef) -> Result<()> {
        if self.events.is_destroyed() {
            return Err(BackendError::Destroyed);
        }
        if backend_key(&child) == self as *const Self as *const () {
            return Err(BackendError::InvalidChild(
                "a multi-backend cannot contain itself".to_string(),
            ));
        }
        if child.is_destroyed() {
            return Err(BackendError::InvalidChild(format!(
                "{} backend has already been destroyed",
                child.kind()
            )));
        }
        if self.contains(&child) {
            debug!(backend = %child.kind(), "Backend already added to multi-backend");
            return Ok(());
        }

        let key = backend_key(&child);
        let events = child.events();
        let destroy = {
            let weak_self = self.weak_self.clone();
            events.destroy.subscribe(move |_| {
                if let Some(multi) = weak_self.upgrade() {
                    multi.detach(key);
                }
            })
        };
        let new_input = {
            let weak_self = self.weak_self.clone();
            events.new_input.subscribe(move |device| {
                if let Some(multi) = weak_self.upgrade() {
                    multi.events.new_input.emit(device);
                }
            })
        };
        let new_output = {
            let weak_self = self.weak_self.clone();
            events.new_output.subscribe(move |output| {
                if let Some(multi) = weak_self.upgrade() {
                    multi.events.new_output.emit(output);
                }
            })
        };

        self.children.borrow_mut().push(SubBackend {
            backend: Rc::clone(&child),
            _destroy: destroy,
            _new_input: new_input,
            _new_output: new_output,
        });
        debug!(backend = %child.kind(), children = self.len(), "Added backend to multi-backend");
        self.backend_add.emit(&child);
        Ok(())
    }

    /// Detaches `child` without destroying it. Returns whether it was present.
    pub fn remove(&self, child: &BackendRef) -> bool {
        self.detach(backend_key(child)).is_some()
    }

    fn detach(&self, key: *const ()) -> Option<BackendRef> {
        let removed = {
            let mut children = self.children.borrow_mut();
            children
                .iter()
                .position(|sub| backend_key(&sub.backend) == key)
                .map(|index| children.remove(index))
        };
        let backend = removed.map(|sub| Rc::clone(&sub.backend))?;
        debug!(backend = %backend.kind(), "Removed backend from multi-backend");
        self.backend_remove.emit(&backend);
        Some(backend)
    }

    pub fn contains(&self, child: &BackendRef) -> bool {
        let key = backend_key(child);
        self.children
            .borrow()
            .iter()
            .any(|sub| backend_key(&sub.backend) == key)
    }

    pub fn is_empty(&self) -> bool {
        self.children.borrow().is_empty()
    }

    pub fn len(&self) -> usize {
        self.children.borrow().len()
    }

    /// Snapshot of the children in insertion order.
    pub fn backends(&self) -> Vec<BackendRef> {
        self.children
            .borrow()
            .iter()
            .map(|sub| Rc::clone(&sub.backend))
            .collect()
    }

    /// Associates a session. The multi-backend does not own it.
    pub fn set_session(&self, session: Option<SessionRef>) {
        *self.session.borrow_mut() = session;
    }

    /// Fired after a child has been added.
    pub fn on_backend_add(&self) -> &Signal<BackendRef> {
        &self.backend_add
    }

    /// Fired after a child has been removed, whether explicitly or because it
    /// was destroyed.
    pub fn on_backend_remove(&self) -> &Signal<BackendRef> {
        &self.backend_remove
    }
}

impl Backend for MultiBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Multi
    }

    fn events(&self) -> &BackendEvents {
        &self.events
    }

    /// Starts every child in insertion order, stopping at the first failure.
    fn start(&self) -> Result<()> {
        if self.events.is_destroyed() {
            return Err(BackendError::Destroyed);
        }
        for child in self.backends() {
            if let Err(e) = child.start() {
                error!(backend = %child.kind(), "Failed to initialize backend: {}", e);
                return Err(e);
            }
        }
        info!(children = self.len(), "Multi-backend started");
        Ok(())
    }

    fn destroy(&self) {
        if !self.events.begin_destroy() {
            return;
        }
        let display_destroy = self.display_destroy.borrow_mut().take();
        drop(display_destroy);

        loop {
            let next = self
                .children
                .borrow()
                .first()
                .map(|sub| Rc::clone(&sub.backend));
            let Some(child) = next else {
                break;
            };
            child.destroy();
            // Children that skip their destroy event are detached here.
            self.detach(backend_key(&child));
        }

        self.session.borrow_mut().take();
        debug!("Multi-backend destroyed");
        self.events.destroy.emit(&());
    }

    fn session(&self) -> Option<SessionRef> {
        self.session.borrow().clone()
    }

    fn drm_fd(&self) -> Option<RawFd> {
        self.backends().iter().find_map(|child| child.drm_fd())
    }

    /// Clock of the first child that presents outputs. Input-only children are skipped.
    fn presentation_clock(&self) -> ClockId {
        self.backends()
            .iter()
            .find(|child| child.kind() != BackendKind::Libinput)
            .map(|child| child.presentation_clock())
            .unwrap_or(ClockId::Monotonic)
    }

    /// Buffer types every child can display. Children reporting no caps are ignored.
    fn buffer_caps(&self) -> BufferCaps {
        let children = self.backends();
        if children.is_empty() {
            return BufferCaps::empty();
        }
        children
            .iter()
            .map(|child| child.buffer_caps())
            .filter(|caps| !caps.is_empty())
            .fold(BufferCaps::all(), |acc, caps| acc & caps)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::headless::HeadlessBackend;
    use crate::display::Display;
    use pretty_assertions::assert_eq;
    use std::cell::Cell;

    fn headless(display: &DisplayHandle) -> BackendRef {
        HeadlessBackend::new(display)
    }

    #[test]
    fn test_add_and_remove() {
        let display = Display::new("wayland-test");
        let multi = MultiBackend::create(&display);
        assert!(multi.is_empty());

        let child = headless(&display);
        multi.add(Rc::clone(&child)).unwrap();
        assert_eq!(multi.len(), 1);
        assert!(multi.contains(&child));

        assert!(multi.remove(&child));
        assert!(!multi.remove(&child));
        assert!(multi.is_empty());
        assert!(!child.is_destroyed());
    }

    #[test]
    fn test_duplicate_add_is_noop() {
        let display = Display::new("wayland-test");
        let multi = MultiBackend::create(&display);
        let child = headless(&display);
        let adds = Rc::new(Cell::new(0));
        let _on_add = {
            let adds = Rc::clone(&adds);
            multi.on_backend_add().subscribe(move |_| adds.set(adds.get() + 1))
        };

        multi.add(Rc::clone(&child)).unwrap();
        multi.add(Rc::clone(&child)).unwrap();
        assert_eq!(multi.len(), 1);
        assert_eq!(adds.get(), 1);
    }

    #[test]
    fn test_add_rejects_destroyed_child() {
        let display = Display::new("wayland-test");
        let multi = MultiBackend::create(&display);
        let child = headless(&display);
        child.destroy();

        assert!(matches!(multi.add(child), Err(BackendError::InvalidChild(_))));
        assert!(multi.is_empty());
    }

    #[test]
    fn test_add_rejects_self() {
        let display = Display::new("wayland-test");
        let multi = MultiBackend::create(&display);
        let as_child: BackendRef = multi.clone();

        assert!(matches!(multi.add(as_child), Err(BackendError::InvalidChild(_))));
    }

    #[test]
    fn test_add_after_destroy_fails() {
        let display = Display::new("wayland-test");
        let multi = MultiBackend::create(&display);
        multi.destroy();

        assert!(matches!(multi.add(headless(&display)), Err(BackendError::Destroyed)));
    }

    #[test]
    fn test_child_destroy_removes_it() {
        let display = Display::new("wayland-test");
        let multi = MultiBackend::create(&display);
        let child = headless(&display);
        let destroys = Rc::new(Cell::new(0));
        let _on_destroy = {
            let destroys = Rc::clone(&destroys);
            child.events().destroy.subscribe(move |_| destroys.set(destroys.get() + 1))
        };
        multi.add(Rc::clone(&child)).unwrap();

        child.destroy();
        assert!(multi.is_empty());

        multi.destroy();
        assert_eq!(destroys.get(), 1);
    }

    #[test]
    fn test_destroy_destroys_children_then_fires() {
        let display = Display::new("wayland-test");
        let multi = MultiBackend::create(&display);
        let first = headless(&display);
        let second = headless(&display);
        multi.add(Rc::clone(&first)).unwrap();
        multi.add(Rc::clone(&second)).unwrap();

        let children_at_destroy = Rc::new(Cell::new(usize::MAX));
        let _on_destroy = {
            let weak = Rc::downgrade(&multi);
            let children_at_destroy = Rc::clone(&children_at_destroy);
            multi.events().destroy.subscribe(move |_| {
                if let Some(multi) = weak.upgrade() {
                    children_at_destroy.set(multi.len());
                }
            })
        };

        multi.destroy();
        assert!(first.is_destroyed());
        assert!(second.is_destroyed());
        assert_eq!(children_at_destroy.get(), 0);
    }

    #[test]
    fn test_display_destroy_destroys_multi() {
        let display = Display::new("wayland-test");
        let multi = MultiBackend::create(&display);
        let child = headless(&display);
        multi.add(Rc::clone(&child)).unwrap();

        display.destroy();
        assert!(multi.is_destroyed());
        assert!(child.is_destroyed());
    }

    #[test]
    fn test_forwards_child_outputs() {
        let display = Display::new("wayland-test");
        let multi = MultiBackend::create(&display);
        let child = HeadlessBackend::new(&display);
        child.add_output(800, 600).unwrap();
        multi.add(child.clone()).unwrap();

        let names = Rc::new(RefCell::new(Vec::new()));
        let _on_output = {
            let names = Rc::clone(&names);
            multi
                .events()
                .new_output
                .subscribe(move |output| names.borrow_mut().push(output.name.clone()))
        };

        multi.start().unwrap();
        assert_eq!(*names.borrow(), vec!["HEADLESS-1".to_string()]);
    }

    #[test]
    fn test_empty_multi_capabilities() {
        let display = Display::new("wayland-test");
        let multi = MultiBackend::create(&display);
        assert_eq!(multi.buffer_caps(), BufferCaps::empty());
        assert_eq!(multi.presentation_clock(), ClockId::Monotonic);
        assert_eq!(multi.drm_fd(), None);
        assert!(multi.start().is_ok());
    }

    #[test]
    fn test_buffer_caps_intersect_children() {
        let display = Display::new("wayland-test");
        let multi = MultiBackend::create(&display);
        multi.add(headless(&display)).unwrap();
        assert_eq!(multi.buffer_caps(), BufferCaps::all());
    }
}
