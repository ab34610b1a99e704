//! # testlink-core
//!
//! Back-channel between an in-host test client and an external test
//! controller.
//!
//! This crate contains:
//! - **Message model**: `Message` and its payload records
//! - **Codec**: `BackchannelCodec`, length-prefixed framing via `tokio_util`
//! - **Network**: `Connection`, the single TCP socket of a session
//! - **Client**: `ClientSession`, connect → start → relay → end → close
//! - **Commands**: the host's *Start* / *End* entry points
//! - **State**: client session phase and the receiver-side `Transcript`
//! - **Config**: `TestlinkConfig`, loaded from TOML
//! - **Error**: `TestlinkError`, a `thiserror`-based error enum

pub mod client;
pub mod codec;
pub mod command;
pub mod config;
pub mod error;
pub mod launch;
pub mod message;
pub mod network;
pub mod state;

// ── Re-exports for ergonomic usage ───────────────────────────────

pub use client::ClientSession;
pub use codec::{
    BackchannelCodec, LENGTH_PREFIX_SIZE, MAX_PAYLOAD_SIZE, decode_payload,
    encode_frame, encode_payload,
};
pub use command::CommandOutcome;
pub use config::{LoggingConfig, NetworkConfig, TestlinkConfig};
pub use error::TestlinkError;
pub use launch::{LaunchConfiguration, PORT_KEY};
pub use message::{ConsoleLine, ConsoleStream, ControlKind, Message, TestInfo, TestResultInfo};
pub use network::{Connection, ConnectionInfo};
pub use state::{SessionPhase, TestOutcome, Transcript, TranscriptPhase};
