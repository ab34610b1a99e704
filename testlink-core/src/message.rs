//! Back-channel message model.
//!
//! Every frame on the wire carries exactly one [`Message`]. The set of
//! variants is closed; the declaration order below is the wire tag order,
//! so new variants go at the end.

use serde::{Deserialize, Serialize};
use std::fmt;

// ── ControlKind ──────────────────────────────────────────────────

/// Lifecycle events announced by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ControlKind {
    /// Sent once, immediately after the socket connects.
    NotificationOfStart,
    /// Sent once, right before the socket is closed.
    NotificationOfEnd,
}

impl fmt::Display for ControlKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

// ── ConsoleStream ────────────────────────────────────────────────

/// Which console stream an intercepted line was written to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ConsoleStream {
    #[default]
    ConsoleOut,
    ConsoleError,
}

impl fmt::Display for ConsoleStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConsoleStream::ConsoleOut => write!(f, "stdout"),
            ConsoleStream::ConsoleError => write!(f, "stderr"),
        }
    }
}

// ── Payload records ──────────────────────────────────────────────

/// A test is about to run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestInfo {
    pub test_name: String,
    pub fixture_name: String,
}

/// A test finished with the given outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestResultInfo {
    pub test_name: String,
    pub fixture_name: String,
    pub result: String,
    /// Empty when the test produced no stack trace.
    pub stack_trace: String,
}

/// One line of intercepted console output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsoleLine {
    pub message_type: ConsoleStream,
    pub text: String,
}

// ── Message ──────────────────────────────────────────────────────

/// A single back-channel message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Message {
    /// Client lifecycle announcement.
    Control(ControlKind),
    /// Test about to execute.
    Data(TestInfo),
    /// Test completed.
    TestResult(TestResultInfo),
    /// Relayed console output.
    ConsoleOut(ConsoleLine),
}

impl Message {
    pub fn start() -> Self {
        Message::Control(ControlKind::NotificationOfStart)
    }

    pub fn end() -> Self {
        Message::Control(ControlKind::NotificationOfEnd)
    }

    pub fn test_info(test_name: impl Into<String>, fixture_name: impl Into<String>) -> Self {
        Message::Data(TestInfo {
            test_name: test_name.into(),
            fixture_name: fixture_name.into(),
        })
    }

    pub fn test_result(
        test_name: impl Into<String>,
        fixture_name: impl Into<String>,
        result: impl Into<String>,
        stack_trace: impl Into<String>,
    ) -> Self {
        Message::TestResult(TestResultInfo {
            test_name: test_name.into(),
            fixture_name: fixture_name.into(),
            result: result.into(),
            stack_trace: stack_trace.into(),
        })
    }

    pub fn console(message_type: ConsoleStream, text: impl Into<String>) -> Self {
        Message::ConsoleOut(ConsoleLine {
            message_type,
            text: text.into(),
        })
    }

    /// Short variant name, used in logs.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Message::Control(_) => "Control",
            Message::Data(_) => "Data",
            Message::TestResult(_) => "TestResult",
            Message::ConsoleOut(_) => "ConsoleOut",
        }
    }

    /// Returns the control kind if this is a lifecycle announcement.
    pub fn control_kind(&self) -> Option<ControlKind> {
        match self {
            Message::Control(kind) => Some(*kind),
            _ => None,
        }
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Message::Control(kind) => write!(f, "Control({kind})"),
            Message::Data(info) => write!(f, "Data({}.{})", info.fixture_name, info.test_name),
            Message::TestResult(info) => write!(
                f,
                "TestResult({}.{} = {})",
                info.fixture_name, info.test_name, info.result
            ),
            Message::ConsoleOut(line) => write!(f, "ConsoleOut({}: {})", line.message_type, line.text),
        }
    }
}
