//! Bounded wait for a session to become active.
//!
//! The wait pumps the session's own event loop on the calling thread. The
//! remaining budget is recomputed against a fixed deadline on every
//! iteration, so the total wait never exceeds the timeout.

use std::time::Duration;

use novade_core::utils::time::{Deadline, ToMs};
use tracing::{debug, error, info};

use super::{Session, SessionRef};
use crate::backend::provider::BackendProvider;
use crate::display::DisplayHandle;
use crate::error::SessionError;

pub const SESSION_ACTIVATION_TIMEOUT: Duration = Duration::from_millis(10_000);

/// Blocks until `session` is active.
///
/// # Errors
///
/// `SessionError::ActivationTimeout` once `timeout` has elapsed, or the
/// session's own error if dispatching its event loop fails.
pub fn wait_for_activation(session: &dyn Session, timeout: Duration) -> Result<(), SessionError> {
    if session.is_active() {
        return Ok(());
    }

    debug!(timeout_ms = timeout.to_ms(), "Waiting for session to become active");
    let deadline = Deadline::after(timeout);
    while !session.is_active() {
        let Some(remaining) = deadline.remaining() else {
            return Err(SessionError::ActivationTimeout(timeout));
        };
        session.dispatch(remaining)?;
    }
    Ok(())
}

/// Opens a session through `provider` and waits for it to become active.
///
/// If the wait fails the session is destroyed before the error is returned,
/// so the caller only ever owns active sessions.
pub fn create_session(
    provider: &dyn BackendProvider,
    display: &DisplayHandle,
    timeout: Duration,
) -> Result<SessionRef, SessionError> {
    let session = provider.open_session(display).map_err(|e| {
        error!("Failed to open session: {}", e);
        e
    })?;

    if let Err(e) = wait_for_activation(session.as_ref(), timeout) {
        match &e {
            SessionError::ActivationTimeout(_) => {
                error!(timeout_ms = timeout.to_ms(), "Timeout waiting for session to become active")
            }
            _ => error!("Failed to wait for session activation: {}", e),
        }
        session.destroy();
        return Err(e);
    }

    info!("Session is active");
    Ok(session)
}
