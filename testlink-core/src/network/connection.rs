use std::net::{IpAddr, Shutdown, SocketAddr};
use std::time::Duration;

use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tracing::{debug, info};

use crate::error::TestlinkError;

/// The single TCP socket a client session reports over.
///
/// Transport only: callers hand it finished frames. While no socket is
/// open `port()` is 0 and every send is a silent no-op.
#[derive(Debug)]
pub struct Connection {
    stream: Option<TcpStream>,
    port: u16,
    remote_address: IpAddr,
}

impl Connection {
    pub fn new(remote_address: IpAddr) -> Self {
        Self {
            stream: None,
            port: 0,
            remote_address,
        }
    }

    /// Open the socket to `remote_address:port`.
    ///
    /// With `timeout` set, the attempt is abandoned after that long.
    pub async fn connect(&mut self, port: u16, timeout: Option<Duration>) -> Result<(), TestlinkError> {
        if self.stream.is_some() {
            return Err(TestlinkError::ProtocolViolation("connection already open"));
        }

        let info = ConnectionInfo::new(self.remote_address, port);
        let addr = info.socket_addr();
        debug!("connecting to {addr}");

        let attempt = TcpStream::connect(addr);
        let result = match timeout {
            Some(limit) => tokio::time::timeout(limit, attempt)
                .await
                .map_err(|_| TestlinkError::Timeout(limit))?,
            None => attempt.await,
        };
        let stream = result.map_err(|source| TestlinkError::Connect { addr, source })?;
        stream.set_nodelay(true)?;

        info!("connected to {addr}");
        self.stream = Some(stream);
        self.port = info.port();
        Ok(())
    }

    /// Write one complete frame. No-op when the socket is closed.
    pub async fn send_frame(&mut self, frame: &[u8]) -> Result<(), TestlinkError> {
        let Some(stream) = self.stream.as_mut() else {
            return Ok(());
        };
        stream.write_all(frame).await?;
        Ok(())
    }

    /// Half-close both directions and release the socket.
    ///
    /// Idempotent; errors from the half-close are logged and dropped.
    pub fn shutdown(&mut self) {
        let Some(stream) = self.stream.take() else {
            return;
        };
        match stream.into_std() {
            Ok(std_stream) => {
                if let Err(e) = std_stream.shutdown(Shutdown::Both) {
                    debug!("socket shutdown: {e}");
                }
            }
            Err(e) => debug!("socket release: {e}"),
        }
        info!("closed connection on port {}", self.port);
        self.port = 0;
    }

    /// Drop the socket without a half-close, e.g. after a failed write.
    pub fn release(&mut self) {
        if self.stream.take().is_some() {
            debug!("released connection on port {}", self.port);
        }
        self.port = 0;
    }

    pub fn is_connected(&self) -> bool {
        self.stream.is_some()
    }

    /// The connected port, or 0 when closed.
    pub fn port(&self) -> u16 {
        self.port
    }
}

/// Endpoint of a back-channel listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionInfo {
    ip: IpAddr,
    port: u16,
}

impl ConnectionInfo {
    pub fn new(ip: IpAddr, port: u16) -> Self {
        Self { ip, port }
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.ip, self.port)
    }
}

impl std::fmt::Display for ConnectionInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.socket_addr().fmt(f)
    }
}
