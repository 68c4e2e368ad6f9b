//! # NovaDE Backend (`novade-backend`)
//!
//! Discovers and composes the windowing backends the compositor runs on.
//!
//! - [`backend`]: the [`Backend`] capability trait, the [`MultiBackend`]
//!   container, the concrete [`HeadlessBackend`] and the [`BackendProvider`]
//!   seam through which the other concrete backends are constructed.
//! - [`session`]: the privileged device-access [`Session`] contract and the
//!   bounded wait for it to become active.
//! - [`autocreate()`]: picks and instantiates backends from a parsed
//!   [`BackendConfig`] and wires them into one [`MultiBackend`].
//! - [`drm_monitor`]: grows the multi-backend with new DRM backends when a
//!   GPU is hot-plugged.
//!
//! All objects live on the thread that drives the compositor's event loop.
//! Events are delivered synchronously through [`Signal`]s.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::rc::Rc;
//! use novade_backend::{autocreate, BackendConfig, BackendProvider, Display, HeadlessOnlyProvider};
//!
//! let display = Display::new("wayland-1");
//! let provider: Rc<dyn BackendProvider> = Rc::new(HeadlessOnlyProvider);
//! let backend = autocreate(&display, &provider, &BackendConfig::from_env())?;
//! backend.start()?;
//! ```

pub mod autocreate;
pub mod backend;
pub mod config;
pub mod display;
pub mod drm_monitor;
pub mod error;
pub mod session;
pub mod signal;

pub use autocreate::{autocreate, MAX_GPUS};
pub use backend::headless::HeadlessBackend;
pub use backend::multi::MultiBackend;
pub use backend::provider::{BackendProvider, HeadlessOnlyProvider, NestedBackend};
pub use backend::{
    Backend, BackendEvents, BackendKind, BackendRef, BufferCaps, ClockId, InputDevice,
    InputDeviceKind, Output,
};
pub use config::BackendConfig;
pub use display::{Display, DisplayHandle};
pub use drm_monitor::DrmMonitor;
pub use error::{BackendError, Result, SessionError};
pub use session::{GpuDevice, Session, SessionEvents, SessionRef};
pub use signal::{Signal, Subscription};
