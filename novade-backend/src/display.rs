//! The display handle shared by every backend constructor.

use std::cell::Cell;
use std::rc::Rc;

use crate::signal::Signal;

/// Stand-in for the compositor's display and event loop.
///
/// Backends bound to a display destroy themselves when it is destroyed.
#[derive(Debug)]
pub struct Display {
    name: String,
    destroy: Signal<()>,
    destroyed: Cell<bool>,
}

pub type DisplayHandle = Rc<Display>;

impl Display {
    pub fn new(name: impl Into<String>) -> DisplayHandle {
        Rc::new(Self {
            name: name.into(),
            destroy: Signal::new(),
            destroyed: Cell::new(false),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Fired once, when the display is destroyed.
    pub fn on_destroy(&self) -> &Signal<()> {
        &self.destroy
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed.get()
    }

    pub fn destroy(&self) {
        if self.destroyed.replace(true) {
            return;
        }
        tracing::debug!(display = %self.name, "Destroying display");
        self.destroy.emit(&());
    }
}
