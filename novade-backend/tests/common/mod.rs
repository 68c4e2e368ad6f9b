//! Test doubles shared by the integration tests.
#![allow(dead_code)]

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::io;
use std::os::unix::io::RawFd;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use novade_backend::{
    Backend, BackendConfig, BackendError, BackendEvents, BackendKind, BackendProvider, BackendRef,
    ClockId, DisplayHandle, GpuDevice, NestedBackend, Output, Result, Session, SessionError,
    SessionEvents, SessionRef,
};

/// Ordered record of destroy calls across doubles.
pub type Journal = Rc<RefCell<Vec<String>>>;

pub fn config_from(vars: &[(&str, &str)]) -> BackendConfig {
    let vars: HashMap<String, String> = vars
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    BackendConfig::from_lookup(|name| vars.get(name).cloned())
        .with_session_timeout(Duration::from_millis(50))
}

/// Runs `f` with a subscriber that records formatted events, returning both.
pub fn capture_logs<R>(f: impl FnOnce() -> R) -> (R, String) {
    let logs = CapturedLogs::default();
    let writer = logs.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(move || writer.clone())
        .with_ansi(false)
        .finish();
    let result = tracing::subscriber::with_default(subscriber, f);
    let output = String::from_utf8(logs.0.lock().unwrap().clone()).unwrap();
    (result, output)
}

#[derive(Clone, Default)]
struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

pub fn card(n: u32) -> PathBuf {
    PathBuf::from(format!("/dev/dri/card{}", n))
}

pub struct FakeBackend {
    kind: BackendKind,
    events: BackendEvents,
    pub gpu: Option<GpuDevice>,
    pub had_primary: bool,
    pub starts: Cell<usize>,
    pub destroys: Cell<usize>,
    fail_start: Cell<bool>,
    clock: Cell<ClockId>,
    outputs: RefCell<Vec<Output>>,
    journal: Journal,
}

impl FakeBackend {
    pub fn new(kind: BackendKind, journal: &Journal) -> Rc<Self> {
        Self::build(kind, None, false, journal)
    }

    pub fn drm(gpu: GpuDevice, had_primary: bool, journal: &Journal) -> Rc<Self> {
        Self::build(BackendKind::Drm, Some(gpu), had_primary, journal)
    }

    fn build(kind: BackendKind, gpu: Option<GpuDevice>, had_primary: bool, journal: &Journal) -> Rc<Self> {
        Rc::new(Self {
            kind,
            events: BackendEvents::new(),
            gpu,
            had_primary,
            starts: Cell::new(0),
            destroys: Cell::new(0),
            fail_start: Cell::new(false),
            clock: Cell::new(ClockId::Monotonic),
            outputs: RefCell::new(Vec::new()),
            journal: Rc::clone(journal),
        })
    }

    pub fn set_fail_start(&self, fail: bool) {
        self.fail_start.set(fail);
    }

    pub fn set_clock(&self, clock: ClockId) {
        self.clock.set(clock);
    }

    pub fn outputs(&self) -> Vec<Output> {
        self.outputs.borrow().clone()
    }

    pub fn label(&self) -> String {
        match &self.gpu {
            Some(gpu) => format!("{} {}", self.kind, gpu.path.display()),
            None => self.kind.to_string(),
        }
    }
}

impl Backend for FakeBackend {
    fn kind(&self) -> BackendKind {
        self.kind
    }

    fn events(&self) -> &BackendEvents {
        &self.events
    }

    fn start(&self) -> Result<()> {
        self.starts.set(self.starts.get() + 1);
        if self.fail_start.get() {
            return Err(BackendError::Start {
                kind: self.kind,
                reason: "forced failure".to_string(),
            });
        }
        Ok(())
    }

    fn destroy(&self) {
        if !self.events.begin_destroy() {
            return;
        }
        self.destroys.set(self.destroys.get() + 1);
        self.journal.borrow_mut().push(format!("destroy {}", self.label()));
        self.events.destroy.emit(&());
    }

    fn drm_fd(&self) -> Option<RawFd> {
        self.gpu.as_ref().map(|gpu| gpu.fd)
    }

    fn presentation_clock(&self) -> ClockId {
        self.clock.get()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl NestedBackend for FakeBackend {
    fn create_output(&self) -> Result<Output> {
        let mut outputs = self.outputs.borrow_mut();
        let output = Output {
            name: format!("{}-{}", self.kind.as_str().to_uppercase(), outputs.len() + 1),
            width: 1280,
            height: 720,
            refresh_mhz: 60_000,
        };
        outputs.push(output.clone());
        Ok(output)
    }

    fn into_backend(self: Rc<Self>) -> BackendRef {
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activation {
    Immediate,
    AfterDispatches(usize),
    Never,
    DispatchError,
}

pub struct FakeSession {
    events: SessionEvents,
    active: Cell<bool>,
    activation: Activation,
    pub dispatches: Cell<usize>,
    pub gpus: RefCell<Vec<PathBuf>>,
    pub kms_paths: RefCell<Vec<PathBuf>>,
    pub destroys: Cell<usize>,
    journal: Journal,
}

impl FakeSession {
    pub fn new(activation: Activation, journal: &Journal) -> Rc<Self> {
        Rc::new(Self {
            events: SessionEvents::new(),
            active: Cell::new(activation == Activation::Immediate),
            activation,
            dispatches: Cell::new(0),
            gpus: RefCell::new(Vec::new()),
            kms_paths: RefCell::new(Vec::new()),
            destroys: Cell::new(0),
            journal: Rc::clone(journal),
        })
    }

    /// Registers `paths` as enumerated GPUs, all KMS-capable.
    pub fn with_gpus(self: Rc<Self>, paths: &[PathBuf]) -> Rc<Self> {
        self.gpus.borrow_mut().extend(paths.iter().cloned());
        self.kms_paths.borrow_mut().extend(paths.iter().cloned());
        self
    }

    pub fn add_kms_path(&self, path: PathBuf) {
        self.kms_paths.borrow_mut().push(path);
    }

    pub fn hotplug(&self, path: PathBuf) {
        self.events.add_drm_card.emit(&path);
    }

    fn open(&self, path: &Path) -> GpuDevice {
        let index = self
            .kms_paths
            .borrow()
            .iter()
            .position(|p| p == path)
            .unwrap_or(0);
        GpuDevice {
            path: path.to_path_buf(),
            fd: 100 + index as RawFd,
        }
    }
}

impl Session for FakeSession {
    fn events(&self) -> &SessionEvents {
        &self.events
    }

    fn is_active(&self) -> bool {
        self.active.get()
    }

    fn dispatch(&self, timeout: Duration) -> std::result::Result<(), SessionError> {
        let count = self.dispatches.get() + 1;
        self.dispatches.set(count);
        match self.activation {
            Activation::Immediate => {}
            Activation::AfterDispatches(n) => {
                if count >= n {
                    self.active.set(true);
                }
            }
            Activation::Never => std::thread::sleep(timeout.min(Duration::from_millis(5))),
            Activation::DispatchError => {
                return Err(SessionError::Dispatch("seat connection lost".to_string()))
            }
        }
        Ok(())
    }

    fn find_gpus(&self, max: usize) -> std::result::Result<Vec<GpuDevice>, SessionError> {
        let gpus = self.gpus.borrow().clone();
        Ok(gpus.iter().take(max).map(|path| self.open(path)).collect())
    }

    fn open_if_kms(&self, path: &Path) -> Option<GpuDevice> {
        if self.kms_paths.borrow().iter().any(|p| p == path) {
            Some(self.open(path))
        } else {
            None
        }
    }

    fn destroy(&self) {
        if !self.events.begin_destroy() {
            return;
        }
        self.destroys.set(self.destroys.get() + 1);
        self.journal.borrow_mut().push("destroy session".to_string());
        self.events.destroy.emit(&());
    }
}

pub struct FakeProvider {
    pub journal: Journal,
    pub wayland_ok: Cell<bool>,
    pub x11_ok: Cell<bool>,
    pub libinput_ok: Cell<bool>,
    pub session: RefCell<Option<Rc<FakeSession>>>,
    pub sessions_opened: Cell<usize>,
    pub drm_create_failures: RefCell<Vec<PathBuf>>,
    pub drm_start_failures: RefCell<Vec<PathBuf>>,
    pub created: RefCell<Vec<Rc<FakeBackend>>>,
}

impl FakeProvider {
    pub fn new() -> Rc<Self> {
        Rc::new(Self {
            journal: Rc::new(RefCell::new(Vec::new())),
            wayland_ok: Cell::new(true),
            x11_ok: Cell::new(true),
            libinput_ok: Cell::new(true),
            session: RefCell::new(None),
            sessions_opened: Cell::new(0),
            drm_create_failures: RefCell::new(Vec::new()),
            drm_start_failures: RefCell::new(Vec::new()),
            created: RefCell::new(Vec::new()),
        })
    }

    /// Installs a session that `open_session` hands out.
    pub fn with_session(self: Rc<Self>, activation: Activation, gpus: &[PathBuf]) -> Rc<Self> {
        let session = FakeSession::new(activation, &self.journal).with_gpus(gpus);
        *self.session.borrow_mut() = Some(session);
        self
    }

    pub fn session(&self) -> Rc<FakeSession> {
        self.session
            .borrow()
            .clone()
            .expect("provider has no session installed")
    }

    pub fn as_provider(self: &Rc<Self>) -> Rc<dyn BackendProvider> {
        Rc::clone(self) as Rc<dyn BackendProvider>
    }

    pub fn created_of(&self, kind: BackendKind) -> Vec<Rc<FakeBackend>> {
        self.created
            .borrow()
            .iter()
            .filter(|backend| backend.kind() == kind)
            .cloned()
            .collect()
    }

    pub fn journal(&self) -> Vec<String> {
        self.journal.borrow().clone()
    }

    fn nested(&self, kind: BackendKind, ok: bool) -> Result<Rc<dyn NestedBackend>> {
        if !ok {
            return Err(BackendError::Creation {
                kind,
                reason: "no parent display".to_string(),
            });
        }
        let backend = FakeBackend::new(kind, &self.journal);
        self.created.borrow_mut().push(Rc::clone(&backend));
        let nested: Rc<dyn NestedBackend> = backend;
        Ok(nested)
    }
}

impl BackendProvider for FakeProvider {
    fn create_wayland(&self, _display: &DisplayHandle) -> Result<Rc<dyn NestedBackend>> {
        self.nested(BackendKind::Wayland, self.wayland_ok.get())
    }

    fn create_x11(&self, _display: &DisplayHandle) -> Result<Rc<dyn NestedBackend>> {
        self.nested(BackendKind::X11, self.x11_ok.get())
    }

    fn open_session(&self, _display: &DisplayHandle) -> std::result::Result<SessionRef, SessionError> {
        self.sessions_opened.set(self.sessions_opened.get() + 1);
        match self.session.borrow().clone() {
            Some(session) => {
                let session: SessionRef = session;
                Ok(session)
            }
            None => Err(SessionError::Open("no seat available".to_string())),
        }
    }

    fn create_libinput(&self, _display: &DisplayHandle, _session: &SessionRef) -> Result<BackendRef> {
        if !self.libinput_ok.get() {
            return Err(BackendError::Creation {
                kind: BackendKind::Libinput,
                reason: "failed to create udev context".to_string(),
            });
        }
        let backend = FakeBackend::new(BackendKind::Libinput, &self.journal);
        self.created.borrow_mut().push(Rc::clone(&backend));
        let backend: BackendRef = backend;
        Ok(backend)
    }

    fn create_drm(
        &self,
        _display: &DisplayHandle,
        _session: &SessionRef,
        gpu: GpuDevice,
        primary: Option<&BackendRef>,
    ) -> Result<BackendRef> {
        if self.drm_create_failures.borrow().contains(&gpu.path) {
            return Err(BackendError::Creation {
                kind: BackendKind::Drm,
                reason: format!("no connectors on {}", gpu.path.display()),
            });
        }
        let fail_start = self.drm_start_failures.borrow().contains(&gpu.path);
        let backend = FakeBackend::drm(gpu, primary.is_some(), &self.journal);
        backend.set_fail_start(fail_start);
        self.created.borrow_mut().push(Rc::clone(&backend));
        let backend: BackendRef = backend;
        Ok(backend)
    }
}
