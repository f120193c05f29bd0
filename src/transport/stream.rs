//! Stream (TCP) transport channel.
//!
//! The stream channel is the session's control channel: reliable and
//! ordered, used for the data-port hello and for text frames. Because TCP
//! erases message boundaries, every received byte runs through a
//! [`FrameBuffer`] before being emitted as a payload event.

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

use super::ChannelEvent;
use super::framing::{FrameBuffer, Framing};
use crate::core::constants::{CONNECT_TIMEOUT, SEND_QUEUE_DEPTH, STREAM_READ_BUFFER_SIZE};
use crate::core::{ServiceEndpoint, TransportError};

/// One TCP connection, owned by the channel.
///
/// Incoming bytes are reassembled per the configured [`Framing`] and
/// delivered as [`ChannelEvent::Payload`] on the owner's event queue, one
/// event per complete unit, in arrival order. Outgoing payloads are
/// enqueued by [`send`](Self::send) and written in order by a background
/// task.
///
/// Any I/O error emits exactly one [`ChannelEvent::Disconnected`] and stops
/// the channel; reconnection is the session controller's decision, never
/// the channel's.
#[derive(Debug)]
pub struct StreamChannel {
    outgoing: mpsc::Sender<Vec<u8>>,
    closed: Arc<AtomicBool>,
    reader: JoinHandle<()>,
    writer: JoinHandle<()>,
    local_addr: SocketAddr,
    peer_addr: SocketAddr,
}

impl StreamChannel {
    /// Connect to a stream endpoint.
    ///
    /// Resolves within [`CONNECT_TIMEOUT`]; a connection that cannot be
    /// established in time fails with [`TransportError::ConnectTimeout`].
    pub async fn connect(
        endpoint: ServiceEndpoint,
        framing: Framing,
        events: mpsc::Sender<ChannelEvent>,
    ) -> Result<Self, TransportError> {
        let stream = tokio::time::timeout(CONNECT_TIMEOUT, TcpStream::connect(endpoint.socket_addr()))
            .await
            .map_err(|_| TransportError::ConnectTimeout)??;
        Self::from_stream(stream, framing, events)
    }

    /// Wrap an already-established TCP stream (the accepting side).
    pub fn from_stream(
        stream: TcpStream,
        framing: Framing,
        events: mpsc::Sender<ChannelEvent>,
    ) -> Result<Self, TransportError> {
        stream.set_nodelay(true)?;
        let local_addr = stream.local_addr()?;
        let peer_addr = stream.peer_addr()?;
        let (mut read_half, mut write_half) = stream.into_split();

        let closed = Arc::new(AtomicBool::new(false));
        let (outgoing, mut outgoing_rx) = mpsc::channel::<Vec<u8>>(SEND_QUEUE_DEPTH);

        let reader_closed = Arc::clone(&closed);
        let reader = tokio::spawn(async move {
            let mut buffer = FrameBuffer::new(framing);
            let mut read_buf = vec![0u8; STREAM_READ_BUFFER_SIZE];
            loop {
                let result = read_half.read(&mut read_buf).await;
                if reader_closed.load(Ordering::SeqCst) {
                    return;
                }
                match result {
                    Ok(0) => {
                        debug!(peer = %peer_addr, "stream closed by peer");
                        let err = std::io::Error::new(
                            std::io::ErrorKind::UnexpectedEof,
                            "peer closed the stream",
                        );
                        let _ = events.send(ChannelEvent::Disconnected(err.into())).await;
                        return;
                    }
                    Ok(n) => {
                        for unit in buffer.push(&read_buf[..n]) {
                            if events.send(ChannelEvent::Payload(unit)).await.is_err() {
                                return;
                            }
                        }
                    }
                    Err(e) => {
                        debug!(peer = %peer_addr, error = %e, "stream read failed");
                        let _ = events.send(ChannelEvent::Disconnected(e.into())).await;
                        return;
                    }
                }
            }
        });

        let writer = tokio::spawn(async move {
            while let Some(bytes) = outgoing_rx.recv().await {
                // A write failure surfaces through the reader as a
                // disconnect; the writer just stops.
                if write_half.write_all(&bytes).await.is_err() {
                    return;
                }
            }
        });

        Ok(Self {
            outgoing,
            closed,
            reader,
            writer,
            local_addr,
            peer_addr,
        })
    }

    /// Enqueue a payload for ordered, reliable transmission.
    ///
    /// Fails with [`TransportError::ChannelClosed`] once the channel has
    /// been closed.
    pub async fn send(&self, bytes: Vec<u8>) -> Result<(), TransportError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(TransportError::ChannelClosed);
        }
        self.outgoing
            .send(bytes)
            .await
            .map_err(|_| TransportError::ChannelClosed)
    }

    /// Release the socket. Idempotent.
    ///
    /// No events are delivered after this returns; outstanding reads are
    /// cancelled, and subsequent [`send`](Self::send) calls fail with
    /// [`TransportError::ChannelClosed`].
    pub fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        self.reader.abort();
        self.writer.abort();
    }

    /// True once [`close`](Self::close) has been called or the channel
    /// dropped its socket.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Local socket address.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Remote peer address.
    pub fn peer_addr(&self) -> SocketAddr {
        self.peer_addr
    }
}

impl Drop for StreamChannel {
    fn drop(&mut self) {
        self.close();
    }
}

/// Listening socket for the advertising side.
///
/// Accepts one peer at a time; the session protocol is point-to-point.
#[derive(Debug)]
pub struct StreamListener {
    listener: TcpListener,
}

impl StreamListener {
    /// Bind a listener on all interfaces at `port` (0 picks an ephemeral
    /// port, which is what the advertised service then names).
    pub async fn bind(port: u16) -> Result<Self, TransportError> {
        let listener = TcpListener::bind(("0.0.0.0", port)).await?;
        Ok(Self { listener })
    }

    /// Local listening address.
    pub fn local_addr(&self) -> Result<SocketAddr, TransportError> {
        Ok(self.listener.local_addr()?)
    }

    /// Wait for the next peer and wrap it as a channel.
    pub async fn accept(
        &self,
        framing: Framing,
        events: mpsc::Sender<ChannelEvent>,
    ) -> Result<StreamChannel, TransportError> {
        let (stream, peer) = self.listener.accept().await?;
        debug!(%peer, "accepted control connection");
        StreamChannel::from_stream(stream, framing, events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::constants::{EVENT_QUEUE_DEPTH, POSE_FRAME_SIZE};
    use crate::core::TransportKind;
    use std::time::Duration;

    async fn connected_pair(
        framing: Framing,
    ) -> (StreamChannel, StreamChannel, mpsc::Receiver<ChannelEvent>, mpsc::Receiver<ChannelEvent>) {
        let listener = StreamListener::bind(0).await.unwrap();
        let addr = listener.local_addr().unwrap();
        let endpoint = ServiceEndpoint::new("127.0.0.1".parse().unwrap(), addr.port(), TransportKind::Stream);

        let (client_tx, client_rx) = mpsc::channel(EVENT_QUEUE_DEPTH);
        let (server_tx, server_rx) = mpsc::channel(EVENT_QUEUE_DEPTH);

        let (client, server) = tokio::join!(
            StreamChannel::connect(endpoint, framing, client_tx),
            listener.accept(framing, server_tx),
        );
        (client.unwrap(), server.unwrap(), client_rx, server_rx)
    }

    #[tokio::test]
    async fn test_send_and_receive_fixed_frames() {
        let (client, _server, _client_rx, mut server_rx) =
            connected_pair(Framing::pose_frames()).await;

        let frame = vec![7u8; POSE_FRAME_SIZE];
        client.send(frame.clone()).await.unwrap();

        match server_rx.recv().await {
            Some(ChannelEvent::Payload(payload)) => assert_eq!(payload, frame),
            other => panic!("expected payload, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_split_frame_emits_one_payload() {
        let (client, _server, _client_rx, mut server_rx) =
            connected_pair(Framing::pose_frames()).await;

        let frame: Vec<u8> = (0..POSE_FRAME_SIZE as u8).collect();
        client.send(frame[..20].to_vec()).await.unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        client.send(frame[20..].to_vec()).await.unwrap();

        match server_rx.recv().await {
            Some(ChannelEvent::Payload(payload)) => assert_eq!(payload, frame),
            other => panic!("expected one reassembled payload, got {other:?}"),
        }

        // And nothing else arrived.
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(server_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_delimited_text_frames() {
        let (client, _server, _client_rx, mut server_rx) = connected_pair(Framing::lines()).await;

        client.send(b"{\"a\":1}\n{\"b\":2}\n".to_vec()).await.unwrap();

        match server_rx.recv().await {
            Some(ChannelEvent::Payload(payload)) => assert_eq!(payload, b"{\"a\":1}"),
            other => panic!("expected payload, got {other:?}"),
        }
        match server_rx.recv().await {
            Some(ChannelEvent::Payload(payload)) => assert_eq!(payload, b"{\"b\":2}"),
            other => panic!("expected payload, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_send_after_close_fails_and_no_events_follow() {
        let (client, server, mut client_rx, _server_rx) =
            connected_pair(Framing::pose_frames()).await;

        client.close();
        client.close(); // idempotent

        let result = client.send(vec![0u8; POSE_FRAME_SIZE]).await;
        assert!(matches!(result, Err(TransportError::ChannelClosed)));

        // Peer traffic after close must not surface as events.
        let _ = server.send(vec![1u8; POSE_FRAME_SIZE]).await;
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(client_rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_peer_disconnect_notifies_once() {
        let (client, server, mut client_rx, _server_rx) =
            connected_pair(Framing::pose_frames()).await;

        drop(server);
        match client_rx.recv().await {
            Some(ChannelEvent::Disconnected(_)) => {}
            other => panic!("expected disconnect, got {other:?}"),
        }
        // The reader has stopped; the queue drains to closed.
        assert!(client_rx.recv().await.is_none());
        drop(client);
    }
}
