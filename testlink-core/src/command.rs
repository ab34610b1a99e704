//! Host entry points.
//!
//! The host application invokes *Start* and *End* as commands and only
//! understands a success flag plus an optional message, so every error is
//! folded into a [`CommandOutcome`] here.

use tracing::error;

use crate::client::ClientSession;
use crate::launch::LaunchConfiguration;

/// Result of a host command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    Success,
    /// The command failed; the message is shown to the host user.
    Failure(String),
}

impl CommandOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, CommandOutcome::Success)
    }

    pub fn message(&self) -> Option<&str> {
        match self {
            CommandOutcome::Success => None,
            CommandOutcome::Failure(msg) => Some(msg),
        }
    }
}

/// The *Start* command: connect and announce the session.
pub async fn start(session: &mut ClientSession, launch: &LaunchConfiguration) -> CommandOutcome {
    match session.start(launch).await {
        Ok(()) => CommandOutcome::Success,
        Err(e) => {
            error!("start command failed: {e}");
            CommandOutcome::Failure(e.to_string())
        }
    }
}

/// The *End* command: announce the end and close. Always succeeds.
pub async fn end(session: &mut ClientSession) -> CommandOutcome {
    session.end().await;
    CommandOutcome::Success
}
