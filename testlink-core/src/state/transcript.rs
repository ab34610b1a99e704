//! Receiver-side session tracking.
//!
//! Validates the frame order a client must follow and accumulates what it
//! reported: the running test, finished outcomes and console output.
//!
//! ```text
//!  AwaitingStart ──[Start]──► Running ──[End]──► Ended
//! ```

use std::time::{Duration, Instant};

use serde::Serialize;

use crate::error::TestlinkError;
use crate::message::{ConsoleLine, ControlKind, Message, TestInfo};

// ── TranscriptPhase ──────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TranscriptPhase {
    /// Nothing received yet.
    #[default]
    AwaitingStart,
    /// Start received; events may follow.
    Running,
    /// End received; the peer should close next.
    Ended,
}

impl std::fmt::Display for TranscriptPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Debug::fmt(self, f)
    }
}

// ── TestOutcome ──────────────────────────────────────────────────

/// A finished test as reported by the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TestOutcome {
    pub test_name: String,
    pub fixture_name: String,
    pub result: String,
    pub stack_trace: String,
}

// ── Transcript ───────────────────────────────────────────────────

/// Everything a single client session told the receiver.
#[derive(Debug, Default)]
pub struct Transcript {
    phase: TranscriptPhase,

    /// When the start notification arrived.
    started_at: Option<Instant>,

    /// Test announced by the last `Data` frame and not yet finished.
    current_test: Option<TestInfo>,

    outcomes: Vec<TestOutcome>,

    console: Vec<ConsoleLine>,

    /// Frames accepted so far, control frames included.
    frames: usize,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed the next decoded message.
    ///
    /// Rejected messages leave the transcript unchanged.
    pub fn observe(&mut self, message: Message) -> Result<(), TestlinkError> {
        match (self.phase, message) {
            (TranscriptPhase::AwaitingStart, Message::Control(ControlKind::NotificationOfStart)) => {
                self.phase = TranscriptPhase::Running;
                self.started_at = Some(Instant::now());
            }
            (TranscriptPhase::AwaitingStart, _) => {
                return Err(TestlinkError::ProtocolViolation(
                    "first frame must be NotificationOfStart",
                ));
            }
            (TranscriptPhase::Ended, _) => {
                return Err(TestlinkError::ProtocolViolation(
                    "frame received after NotificationOfEnd",
                ));
            }
            (TranscriptPhase::Running, Message::Control(ControlKind::NotificationOfStart)) => {
                return Err(TestlinkError::ProtocolViolation(
                    "duplicate NotificationOfStart",
                ));
            }
            (TranscriptPhase::Running, Message::Control(ControlKind::NotificationOfEnd)) => {
                self.phase = TranscriptPhase::Ended;
            }
            (TranscriptPhase::Running, Message::Data(info)) => {
                self.current_test = Some(info);
            }
            (TranscriptPhase::Running, Message::TestResult(info)) => {
                let finishes_current = self.current_test.as_ref().is_some_and(|current| {
                    current.test_name == info.test_name && current.fixture_name == info.fixture_name
                });
                if finishes_current {
                    self.current_test = None;
                }
                self.outcomes.push(TestOutcome {
                    test_name: info.test_name,
                    fixture_name: info.fixture_name,
                    result: info.result,
                    stack_trace: info.stack_trace,
                });
            }
            (TranscriptPhase::Running, Message::ConsoleOut(line)) => {
                self.console.push(line);
            }
        }
        self.frames += 1;
        Ok(())
    }

    pub fn phase(&self) -> TranscriptPhase {
        self.phase
    }

    /// `true` once the end notification has been seen.
    pub fn is_complete(&self) -> bool {
        self.phase == TranscriptPhase::Ended
    }

    pub fn current_test(&self) -> Option<&TestInfo> {
        self.current_test.as_ref()
    }

    pub fn outcomes(&self) -> &[TestOutcome] {
        &self.outcomes
    }

    pub fn console(&self) -> &[ConsoleLine] {
        &self.console
    }

    pub fn frame_count(&self) -> usize {
        self.frames
    }

    /// Time since the start notification arrived.
    pub fn elapsed(&self) -> Option<Duration> {
        self.started_at.map(|t| t.elapsed())
    }
}

// ── Tests ─────────────────────────────────────────────────────────
