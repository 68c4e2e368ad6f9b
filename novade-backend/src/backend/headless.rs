//! Headless backend: virtual outputs and input devices with no hardware.
//!
//! Used for CI and for running the compositor without a display. Outputs and
//! input devices created before [`Backend::start`] are announced when the
//! backend starts; ones created afterwards are announced immediately.

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use tracing::{debug, info};

use super::provider::NestedBackend;
use super::{Backend, BackendEvents, BackendKind, BackendRef, BufferCaps, InputDevice, InputDeviceKind, Output};
use crate::display::DisplayHandle;
use crate::error::{BackendError, Result};
use crate::signal::Subscription;

pub const DEFAULT_OUTPUT_WIDTH: u32 = 1280;
pub const DEFAULT_OUTPUT_HEIGHT: u32 = 720;
/// 60 Hz, in mHz.
pub const DEFAULT_REFRESH_MHZ: u32 = 60_000;

pub struct HeadlessBackend {
    events: BackendEvents,
    started: Cell<bool>,
    outputs: RefCell<Vec<Output>>,
    input_devices: RefCell<Vec<InputDevice>>,
    last_output_num: Cell<usize>,
    display_destroy: RefCell<Option<Subscription>>,
}

impl HeadlessBackend {
    /// Creates a headless backend with no outputs. It is destroyed along with `display`.
    pub fn new(display: &DisplayHandle) -> Rc<Self> {
        debug!("Creating headless backend");
        Rc::new_cyclic(|weak_self: &Weak<HeadlessBackend>| {
            let display_destroy = {
                let weak_self = weak_self.clone();
                display.on_destroy().subscribe(move |_| {
                    if let Some(backend) = weak_self.upgrade() {
                        backend.destroy();
                    }
                })
            };
            HeadlessBackend {
                events: BackendEvents::new(),
                started: Cell::new(false),
                outputs: RefCell::new(Vec::new()),
                input_devices: RefCell::new(Vec::new()),
                last_output_num: Cell::new(0),
                display_destroy: RefCell::new(Some(display_destroy)),
            }
        })
    }

    /// Creates a virtual output named `HEADLESS-<n>`.
    pub fn add_output(&self, width: u32, height: u32) -> Result<Output> {
        if self.events.is_destroyed() {
            return Err(BackendError::Destroyed);
        }
        if width == 0 || height == 0 {
            return Err(BackendError::Output {
                kind: BackendKind::Headless,
                reason: format!("invalid output size {}x{}", width, height),
            });
        }

        let num = self.last_output_num.get() + 1;
        self.last_output_num.set(num);
        let output = Output {
            name: format!("HEADLESS-{}", num),
            width,
            height,
            refresh_mhz: DEFAULT_REFRESH_MHZ,
        };
        self.outputs.borrow_mut().push(output.clone());
        debug!(output = %output.name, width, height, "Created headless output");

        if self.started.get() {
            self.events.new_output.emit(&output);
        }
        Ok(output)
    }

    pub fn add_input_device(&self, kind: InputDeviceKind) -> Result<InputDevice> {
        if self.events.is_destroyed() {
            return Err(BackendError::Destroyed);
        }
        let device = InputDevice {
            name: format!("headless-{}", kind),
            kind,
        };
        self.input_devices.borrow_mut().push(device.clone());

        if self.started.get() {
            self.events.new_input.emit(&device);
        }
        Ok(device)
    }

    pub fn outputs(&self) -> Vec<Output> {
        self.outputs.borrow().clone()
    }

    pub fn input_devices(&self) -> Vec<InputDevice> {
        self.input_devices.borrow().clone()
    }

    pub fn is_started(&self) -> bool {
        self.started.get()
    }
}

impl Backend for HeadlessBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Headless
    }

    fn events(&self) -> &BackendEvents {
        &self.events
    }

    fn start(&self) -> Result<()> {
        if self.events.is_destroyed() {
            return Err(BackendError::Destroyed);
        }
        if self.started.replace(true) {
            return Ok(());
        }
        info!("Starting headless backend");

        for device in self.input_devices() {
            self.events.new_input.emit(&device);
        }
        for output in self.outputs() {
            self.events.new_output.emit(&output);
        }
        Ok(())
    }

    fn destroy(&self) {
        if !self.events.begin_destroy() {
            return;
        }
        let display_destroy = self.display_destroy.borrow_mut().take();
        drop(display_destroy);
        self.outputs.borrow_mut().clear();
        self.input_devices.borrow_mut().clear();
        self.events.destroy.emit(&());
    }

    fn buffer_caps(&self) -> BufferCaps {
        BufferCaps::DATA_PTR | BufferCaps::DMABUF | BufferCaps::SHM
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl NestedBackend for HeadlessBackend {
    fn create_output(&self) -> Result<Output> {
        self.add_output(DEFAULT_OUTPUT_WIDTH, DEFAULT_OUTPUT_HEIGHT)
    }

    fn into_backend(self: Rc<Self>) -> BackendRef {
        self
    }
}
