//! Accept loop and per-session frame handling.

use std::net::SocketAddr;

use futures::StreamExt;
use testlink_core::{BackchannelCodec, Message, TestlinkError, Transcript};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio_util::codec::FramedRead;
use tracing::{error, info, warn};

/// What a session handler reports back to the accept loop.
#[derive(Debug)]
pub enum ListenerEvent {
    /// A decoded message, in arrival order.
    Message { peer: SocketAddr, message: Message },
    /// The peer closed; the transcript holds everything it sent.
    Closed { peer: SocketAddr, transcript: Transcript },
}

pub struct Listener {
    listener: TcpListener,
    events: mpsc::UnboundedSender<ListenerEvent>,
}

impl Listener {
    pub async fn bind(
        addr: SocketAddr,
        events: mpsc::UnboundedSender<ListenerEvent>,
    ) -> Result<Self, TestlinkError> {
        let listener = TcpListener::bind(addr).await?;
        info!("listening on {}", listener.local_addr()?);
        Ok(Self { listener, events })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, TestlinkError> {
        Ok(self.listener.local_addr()?)
    }

    /// Accept sessions forever, one task per connection.
    pub async fn run(&self) -> Result<(), TestlinkError> {
        loop {
            let (stream, peer) = self.listener.accept().await?;
            info!("session connected from {peer}");
            let events = self.events.clone();
            tokio::spawn(async move {
                if let Err(e) = handle_session(stream, peer, events).await {
                    error!("session {peer}: {e}");
                }
            });
        }
    }
}

/// Take every event already queued, without waiting for more.
pub fn drain_pending(events: &mut mpsc::UnboundedReceiver<ListenerEvent>) -> Vec<ListenerEvent> {
    let mut pending = Vec::new();
    while let Ok(event) = events.try_recv() {
        pending.push(event);
    }
    pending
}

/// Decode frames from one client until it closes the socket.
///
/// Ordering violations are logged and the offending frame is skipped;
/// decode errors end the session.
pub async fn handle_session(
    stream: TcpStream,
    peer: SocketAddr,
    events: mpsc::UnboundedSender<ListenerEvent>,
) -> Result<(), TestlinkError> {
    let mut frames = FramedRead::new(stream, BackchannelCodec);
    let mut transcript = Transcript::new();

    let result = loop {
        let Some(next) = frames.next().await else {
            break Ok(());
        };
        let message = match next {
            Ok(message) => message,
            Err(e) => break Err(e),
        };

        info!("{peer}: {message}");
        if let Err(e) = transcript.observe(message.clone()) {
            warn!("{peer}: {e}");
            continue;
        }
        // Receiver gone means the process is shutting down.
        let _ = events.send(ListenerEvent::Message { peer, message });
    };

    if !transcript.is_complete() {
        warn!("{peer}: closed without end notification");
    }
    info!(
        "{peer}: session closed, {} frames, {} results",
        transcript.frame_count(),
        transcript.outcomes().len()
    );
    let _ = events.send(ListenerEvent::Closed { peer, transcript });
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use testlink_core::{ClientSession, LaunchConfiguration, NetworkConfig, encode_frame};
    use tokio::io::AsyncWriteExt;

    /// Collect events until the session reports it closed.
    async fn collect_session(
        rx: &mut mpsc::UnboundedReceiver<ListenerEvent>,
    ) -> (Vec<Message>, Transcript) {
        let mut messages = Vec::new();
        loop {
            let event = tokio::time::timeout(std::time::Duration::from_secs(5), rx.recv())
                .await
                .expect("timeout")
                .expect("channel closed");
            match event {
                ListenerEvent::Message { message, .. } => messages.push(message),
                ListenerEvent::Closed { transcript, .. } => return (messages, transcript),
            }
        }
    }

    #[tokio::test]
    async fn session_events_reach_the_channel() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let listener = Listener::bind("127.0.0.1:0".parse().unwrap(), tx)
            .await
            .unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move { listener.run().await });

        let mut session = ClientSession::new(NetworkConfig::default());
        let launch = LaunchConfiguration::new().with("Port", port.to_string());
        session.start(&launch).await.unwrap();
        session.send_test_information("TestA", "FixtureX").await.unwrap();
        session.end().await;

        let (messages, transcript) = collect_session(&mut rx).await;

        assert_eq!(
            messages,
            vec![
                Message::start(),
                Message::test_info("TestA", "FixtureX"),
                Message::end(),
            ]
        );
        assert!(transcript.is_complete());
    }

    #[tokio::test]
    async fn out_of_order_frame_is_skipped() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let listener = Listener::bind("127.0.0.1:0".parse().unwrap(), tx)
            .await
            .unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move { listener.run().await });

        let mut client = TcpStream::connect(("127.0.0.1", port)).await.unwrap();
        for message in [
            Message::test_info("Early", "FixtureX"),
            Message::start(),
            Message::end(),
        ] {
            client
                .write_all(&encode_frame(&message).unwrap())
                .await
                .unwrap();
        }
        client.shutdown().await.unwrap();

        let (messages, transcript) = collect_session(&mut rx).await;
        assert_eq!(messages, vec![Message::start(), Message::end()]);
        assert!(transcript.is_complete());
        assert_eq!(transcript.frame_count(), 2);
        assert!(transcript.current_test().is_none());
    }

    #[tokio::test]
    async fn decode_error_ends_session_but_reports_closed() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let mut client = TcpStream::connect(addr).await.unwrap();
        let (stream, peer) = listener.accept().await.unwrap();

        let (tx, mut rx) = mpsc::unbounded_channel();
        let handler = tokio::spawn(handle_session(stream, peer, tx));

        client
            .write_all(&encode_frame(&Message::start()).unwrap())
            .await
            .unwrap();
        // Length 4, then an unknown variant tag.
        client.write_all(&[0, 0, 0, 4, 0, 0, 0, 9]).await.unwrap();

        let (messages, transcript) = collect_session(&mut rx).await;
        assert_eq!(messages, vec![Message::start()]);
        assert!(!transcript.is_complete());
        assert_eq!(transcript.frame_count(), 1);

        let result = handler.await.unwrap();
        assert!(matches!(result, Err(TestlinkError::Encoding(_))));
    }

    #[test]
    fn drain_pending_returns_queued_events() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let peer: SocketAddr = "127.0.0.1:9000".parse().unwrap();
        tx.send(ListenerEvent::Message {
            peer,
            message: Message::start(),
        })
        .unwrap();
        tx.send(ListenerEvent::Closed {
            peer,
            transcript: Transcript::new(),
        })
        .unwrap();

        let pending = drain_pending(&mut rx);
        assert_eq!(pending.len(), 2);
        assert!(matches!(pending[0], ListenerEvent::Message { .. }));
        assert!(matches!(pending[1], ListenerEvent::Closed { .. }));

        // Nothing left, and draining does not wait for the sender to close.
        assert!(drain_pending(&mut rx).is_empty());
        drop(tx);
    }
}
