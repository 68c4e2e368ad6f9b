//! Single-threaded observer signals.
//!
//! A [`Signal`] keeps an ordered list of listeners. [`Signal::subscribe`]
//! returns a [`Subscription`] guard; dropping the guard removes the listener.
//!
//! Emission is re-entrant: a listener may subscribe, drop subscriptions
//! (including its own) or emit again while it runs. A listener removed during
//! an emission is not called for the rest of that emission. A listener added
//! during an emission is first called on the next one.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

type Callback<T> = Rc<dyn Fn(&T)>;

struct Slot<T> {
    id: u64,
    callback: Callback<T>,
}

struct Listeners<T> {
    next_id: u64,
    slots: Vec<Slot<T>>,
}

impl<T> Listeners<T> {
    fn contains(&self, id: u64) -> bool {
        self.slots.iter().any(|slot| slot.id == id)
    }
}

/// An event stream carrying values of type `T`.
pub struct Signal<T> {
    listeners: Rc<RefCell<Listeners<T>>>,
}

impl<T: 'static> Signal<T> {
    pub fn new() -> Self {
        Self {
            listeners: Rc::new(RefCell::new(Listeners {
                next_id: 0,
                slots: Vec::new(),
            })),
        }
    }

    /// Registers `callback`. It stays registered until the returned guard is dropped.
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&T) + 'static,
    {
        let id = {
            let mut listeners = self.listeners.borrow_mut();
            let id = listeners.next_id;
            listeners.next_id += 1;
            listeners.slots.push(Slot {
                id,
                callback: Rc::new(callback),
            });
            id
        };

        let weak: Weak<RefCell<Listeners<T>>> = Rc::downgrade(&self.listeners);
        Subscription {
            unsubscribe: Some(Box::new(move || {
                let Some(listeners) = weak.upgrade() else {
                    return;
                };
                let removed = {
                    let mut listeners = listeners.borrow_mut();
                    listeners
                        .slots
                        .iter()
                        .position(|slot| slot.id == id)
                        .map(|index| listeners.slots.remove(index))
                };
                // The callback may own guards for this same signal.
                drop(removed);
            })),
        }
    }

    /// Calls every listener in subscription order.
    pub fn emit(&self, value: &T) {
        let snapshot: Vec<(u64, Callback<T>)> = self
            .listeners
            .borrow()
            .slots
            .iter()
            .map(|slot| (slot.id, Rc::clone(&slot.callback)))
            .collect();

        for (id, callback) in snapshot {
            if self.listeners.borrow().contains(id) {
                callback(value);
            }
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.borrow().slots.len()
    }
}

impl<T: 'static> Default for Signal<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for Signal<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signal")
            .field("listeners", &self.listeners.borrow().slots.len())
            .finish()
    }
}

/// Keeps a listener registered. Dropping it unsubscribes.
#[must_use = "dropping a Subscription immediately unsubscribes the listener"]
pub struct Subscription {
    unsubscribe: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    /// Unsubscribes now. Equivalent to dropping the guard.
    pub fn cancel(mut self) {
        if let Some(unsubscribe) = self.unsubscribe.take() {
            unsubscribe();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(unsubscribe) = self.unsubscribe.take() {
            unsubscribe();
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.unsubscribe.is_some())
            .finish()
    }
}
