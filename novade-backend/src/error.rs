//! Error types for backend creation and session handling.

use std::time::Duration;
use thiserror::Error;

use crate::backend::BackendKind;

/// Errors raised while creating, composing or starting backends.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("{0} backend is not available")]
    Unsupported(BackendKind),

    #[error("Failed to create {kind} backend: {reason}")]
    Creation { kind: BackendKind, reason: String },

    #[error("Failed to start {kind} backend: {reason}")]
    Start { kind: BackendKind, reason: String },

    /// A name in the explicit backend list matched no known backend.
    #[error("Unrecognized backend '{0}'")]
    UnknownBackend(String),

    #[error("Backend has already been destroyed")]
    Destroyed,

    /// The backend cannot be added to a multi-backend.
    #[error("Invalid child backend: {0}")]
    InvalidChild(String),

    #[error("Found 0 GPUs, cannot create a DRM backend")]
    NoGpus,

    #[error("Could not create a DRM backend on any GPU")]
    NoDrmBackend,

    #[error("Failed to create output on {kind} backend: {reason}")]
    Output { kind: BackendKind, reason: String },

    #[error("Session error: {0}")]
    Session(#[from] SessionError),
}

/// Errors raised by a [`crate::session::Session`] or while waiting for one.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("No session implementation is available")]
    Unsupported,

    #[error("Failed to open session: {0}")]
    Open(String),

    #[error("Session did not become active within {0:?}")]
    ActivationTimeout(Duration),

    #[error("Failed to dispatch session event loop: {0}")]
    Dispatch(String),

    #[error("Failed to enumerate GPUs: {0}")]
    GpuEnumeration(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T, E = BackendError> = std::result::Result<T, E>;
