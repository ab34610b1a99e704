//! Domain-specific error types for the testlink back-channel.
//!
//! All fallible operations return `Result<T, TestlinkError>`.
//! A missing socket at send time is not an error and never shows up here.

use std::net::SocketAddr;
use std::time::Duration;
use thiserror::Error;

/// The canonical error type for the testlink back-channel.
#[derive(Debug, Error)]
pub enum TestlinkError {
    // ── Configuration Errors ─────────────────────────────────────
    /// The launch configuration has no usable `"Port"` entry.
    #[error("The port is not given or is in a bad format!")]
    InvalidPort,

    // ── Connection Errors ────────────────────────────────────────
    /// The TCP connect to the listener failed.
    #[error("failed to connect to {addr}: {source}")]
    Connect {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    /// The connect did not complete within the configured deadline.
    #[error("timeout after {0:?}")]
    Timeout(Duration),

    /// A read or write on a live socket failed.
    #[error("connection error: {0}")]
    Io(#[from] std::io::Error),

    // ── Serialization Errors ─────────────────────────────────────
    /// Encoding or decoding of a message payload failed.
    #[error("encoding error: {0}")]
    Encoding(String),

    /// The encoded payload exceeds the protocol limit.
    #[error("payload too large: {size} bytes (max {max})")]
    PayloadTooLarge { size: usize, max: usize },

    /// An incoming length prefix announced more than the protocol allows.
    #[error("frame too large: {size} bytes (max {max})")]
    FrameTooLarge { size: usize, max: usize },

    // ── Lifecycle Errors ─────────────────────────────────────────
    /// An operation or frame arrived in a state that does not allow it.
    #[error("protocol violation: {0}")]
    ProtocolViolation(&'static str),
}

impl TestlinkError {
    /// Returns `true` for errors caused by the launch configuration rather
    /// than by the network.
    pub fn is_configuration(&self) -> bool {
        matches!(self, TestlinkError::InvalidPort)
    }
}

impl From<Box<bincode::ErrorKind>> for TestlinkError {
    fn from(e: Box<bincode::ErrorKind>) -> Self {
        TestlinkError::Encoding(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_port_message_is_fixed() {
        assert_eq!(
            TestlinkError::InvalidPort.to_string(),
            "The port is not given or is in a bad format!"
        );
        assert!(TestlinkError::InvalidPort.is_configuration());
    }

    #[test]
    fn error_display_messages() {
        let e = TestlinkError::PayloadTooLarge {
            size: 1000,
            max: 500,
        };
        assert!(e.to_string().contains("1000"));
        assert!(e.to_string().contains("500"));
    }

    #[test]
    fn from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "pipe broke");
        let e: TestlinkError = io_err.into();
        assert!(matches!(e, TestlinkError::Io(_)));
        assert!(!e.is_configuration());
    }

    #[test]
    fn connect_error_names_address() {
        let e = TestlinkError::Connect {
            addr: "127.0.0.1:9000".parse().unwrap(),
            source: std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused"),
        };
        assert!(e.to_string().contains("127.0.0.1:9000"));
    }
}
