//! Client session: the in-host side of the back-channel.
//!
//! A [`ClientSession`] owns its [`Connection`] and drives it through
//! connect, start notification, relayed events, end notification and
//! close. Every outbound message goes through [`ClientSession::send`].

use tracing::{debug, info, trace, warn};

use crate::codec::encode_frame;
use crate::config::NetworkConfig;
use crate::error::TestlinkError;
use crate::launch::LaunchConfiguration;
use crate::message::{ConsoleStream, Message};
use crate::network::Connection;
use crate::state::SessionPhase;

#[derive(Debug)]
pub struct ClientSession {
    config: NetworkConfig,
    connection: Connection,
    phase: SessionPhase,
}

impl ClientSession {
    pub fn new(config: NetworkConfig) -> Self {
        let connection = Connection::new(config.remote_address);
        Self {
            config,
            connection,
            phase: SessionPhase::default(),
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────────

    /// Connect to the listener named by the launch configuration and
    /// announce the start of the session.
    ///
    /// A missing or malformed port fails before any network activity.
    /// If the start notification cannot be written the socket is released
    /// again and the session stays `NotConnected`.
    pub async fn start(&mut self, launch: &LaunchConfiguration) -> Result<(), TestlinkError> {
        let port = launch.port()?;
        if self.phase.is_connected() {
            return Err(TestlinkError::ProtocolViolation(
                "cannot start: session already connected",
            ));
        }

        self.connection
            .connect(port, self.config.connect_timeout())
            .await?;
        self.phase.connect(port)?;

        self.send(&Message::start()).await?;
        info!("session started on port {port}");
        Ok(())
    }

    /// Entry point for the host's end command. Never fails.
    pub async fn end(&mut self) {
        self.shutdown().await;
    }

    /// Announce the end of the session and close the socket.
    ///
    /// Does nothing when not connected, so repeated calls are harmless.
    pub async fn shutdown(&mut self) {
        if !self.connection.is_connected() {
            debug!("shutdown: not connected");
            return;
        }

        if let Err(e) = self.send(&Message::end()).await {
            warn!("failed to send end notification: {e}");
        }
        self.connection.shutdown();
        if let Some(elapsed) = self.phase.connected_duration() {
            info!("session ended after {elapsed:?}");
        }
        self.phase.disconnect();
    }

    // ── Relay helpers ─────────────────────────────────────────────

    /// Announce that a test is about to run.
    pub async fn send_test_information(
        &mut self,
        test_name: &str,
        fixture_name: &str,
    ) -> Result<(), TestlinkError> {
        self.send(&Message::test_info(test_name, fixture_name)).await
    }

    /// Report the outcome of a finished test.
    pub async fn send_test_result_information(
        &mut self,
        test_name: &str,
        fixture_name: &str,
        result: &str,
        stack_trace: &str,
    ) -> Result<(), TestlinkError> {
        self.send(&Message::test_result(test_name, fixture_name, result, stack_trace))
            .await
    }

    pub async fn send_console_out(&mut self, text: &str) -> Result<(), TestlinkError> {
        self.send_console_message(ConsoleStream::ConsoleOut, text).await
    }

    pub async fn send_console_error(&mut self, text: &str) -> Result<(), TestlinkError> {
        self.send_console_message(ConsoleStream::ConsoleError, text).await
    }

    pub async fn send_console_message(
        &mut self,
        stream: ConsoleStream,
        text: &str,
    ) -> Result<(), TestlinkError> {
        self.send(&Message::console(stream, text)).await
    }

    /// Frame and write a single message.
    ///
    /// Without a live connection the message is dropped silently. A failed
    /// write releases the connection, so later sends become no-ops, and the
    /// error is returned to the caller.
    pub async fn send(&mut self, message: &Message) -> Result<(), TestlinkError> {
        if !self.connection.is_connected() {
            trace!("not connected; dropping {}", message.kind_name());
            return Ok(());
        }

        let frame = encode_frame(message)?;
        if let Err(e) = self.connection.send_frame(&frame).await {
            warn!("write failed, releasing connection: {e}");
            self.connection.release();
            self.phase.disconnect();
            return Err(e);
        }
        trace!("sent {message} ({} bytes)", frame.len());
        Ok(())
    }

    // ── Accessors ─────────────────────────────────────────────────

    pub fn phase(&self) -> &SessionPhase {
        &self.phase
    }

    pub fn is_connected(&self) -> bool {
        self.phase.is_connected()
    }

    /// The connected listener port, or 0 when not connected.
    pub fn port(&self) -> u16 {
        self.connection.port()
    }
}

impl Drop for ClientSession {
    fn drop(&mut self) {
        if self.connection.is_connected() {
            warn!(
                "session dropped while connected to port {}; closing without end notification",
                self.connection.port()
            );
        }
    }
}
