//! Client-side session lifecycle.
//!
//! ```text
//!  NotConnected ──► Connected ──► NotConnected
//! ```
//!
//! Connecting is awaited to completion, so there is no observable
//! in-between phase.

use std::time::Instant;

use crate::error::TestlinkError;

/// The current phase of a client session.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionPhase {
    /// No socket. Initial and terminal state.
    #[default]
    NotConnected,

    /// Socket open and the start notification was written.
    Connected {
        /// Listener port the session reports to.
        port: u16,
        /// When the session entered the `Connected` state.
        since: Instant,
    },
}

impl std::fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotConnected => write!(f, "NotConnected"),
            Self::Connected { port, .. } => write!(f, "Connected(:{port})"),
        }
    }
}

impl SessionPhase {
    pub fn is_connected(&self) -> bool {
        matches!(self, Self::Connected { .. })
    }

    /// How long the session has been connected.
    pub fn connected_duration(&self) -> Option<std::time::Duration> {
        match self {
            Self::Connected { since, .. } => Some(since.elapsed()),
            Self::NotConnected => None,
        }
    }

    // ── Transitions ──────────────────────────────────────────────

    /// Transition to `Connected`.
    ///
    /// Valid from: `NotConnected`.
    pub fn connect(&mut self, port: u16) -> Result<(), TestlinkError> {
        match self {
            Self::NotConnected => {
                *self = Self::Connected {
                    port,
                    since: Instant::now(),
                };
                Ok(())
            }
            Self::Connected { .. } => Err(TestlinkError::ProtocolViolation(
                "cannot start: session already connected",
            )),
        }
    }

    /// Return to `NotConnected` from any state.
    pub fn disconnect(&mut self) {
        *self = Self::NotConnected;
    }
}
