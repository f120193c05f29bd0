//! Datagram (UDP) transport channel.
//!
//! The datagram channel is the session's data channel: every pose frame is
//! one packet, sent fire-and-forget. The network may drop or reorder
//! packets; the protocol carries no sequence numbers, so a lost frame is a
//! missed update, never an error. One received datagram becomes exactly one
//! payload event, no reassembly involved.

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::net::UdpSocket;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

use super::ChannelEvent;
use crate::core::ServiceEndpoint;
use crate::core::TransportError;
use crate::core::constants::MAX_DATAGRAM_SIZE;

/// One UDP socket, owned by the channel.
///
/// Two roles exist: [`bind`](Self::bind) opens a local port and receives
/// from any peer (the consumer side), [`connect`](Self::connect) binds an
/// ephemeral port and addresses one peer (the producer side). Both deliver
/// received datagrams as [`ChannelEvent::Payload`], one event per packet.
#[derive(Debug)]
pub struct DatagramChannel {
    socket: Arc<UdpSocket>,
    closed: Arc<AtomicBool>,
    reader: JoinHandle<()>,
    local_addr: SocketAddr,
}

impl DatagramChannel {
    /// Bind a receiving socket on all interfaces at `port` (0 picks an
    /// ephemeral port; [`local_addr`](Self::local_addr) reports it for the
    /// data-port hello).
    pub async fn bind(
        port: u16,
        events: mpsc::Sender<ChannelEvent>,
    ) -> Result<Self, TransportError> {
        let socket = UdpSocket::bind(("0.0.0.0", port)).await?;
        Self::from_socket(socket, events)
    }

    /// Bind an ephemeral socket and address one peer.
    pub async fn connect(
        endpoint: ServiceEndpoint,
        events: mpsc::Sender<ChannelEvent>,
    ) -> Result<Self, TransportError> {
        let bind_addr = if endpoint.host.is_ipv6() {
            ("::", 0)
        } else {
            ("0.0.0.0", 0)
        };
        let socket = UdpSocket::bind(bind_addr).await?;
        socket.connect(endpoint.socket_addr()).await?;
        Self::from_socket(socket, events)
    }

    fn from_socket(
        socket: UdpSocket,
        events: mpsc::Sender<ChannelEvent>,
    ) -> Result<Self, TransportError> {
        let local_addr = socket.local_addr()?;
        let socket = Arc::new(socket);
        let closed = Arc::new(AtomicBool::new(false));

        let reader_socket = Arc::clone(&socket);
        let reader_closed = Arc::clone(&closed);
        let reader = tokio::spawn(async move {
            let mut buf = vec![0u8; MAX_DATAGRAM_SIZE];
            loop {
                let result = reader_socket.recv_from(&mut buf).await;
                if reader_closed.load(Ordering::SeqCst) {
                    return;
                }
                match result {
                    Ok((len, _from)) => {
                        let payload = buf[..len].to_vec();
                        if events.send(ChannelEvent::Payload(payload)).await.is_err() {
                            return;
                        }
                    }
                    Err(e) => {
                        debug!(error = %e, "datagram receive failed");
                        let _ = events.send(ChannelEvent::Disconnected(e.into())).await;
                        return;
                    }
                }
            }
        });

        Ok(Self {
            socket,
            closed,
            reader,
            local_addr,
        })
    }

    /// Send one payload as one datagram to the connected peer.
    ///
    /// Fire-and-forget: delivery is not acknowledged. Fails with
    /// [`TransportError::ChannelClosed`] once the channel has been closed.
    pub async fn send(&self, bytes: &[u8]) -> Result<(), TransportError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(TransportError::ChannelClosed);
        }
        self.socket.send(bytes).await?;
        Ok(())
    }

    /// Send one payload as one datagram to an explicit address.
    pub async fn send_to(&self, bytes: &[u8], addr: SocketAddr) -> Result<(), TransportError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(TransportError::ChannelClosed);
        }
        self.socket.send_to(bytes, addr).await?;
        Ok(())
    }

    /// Release the socket. Idempotent; no events are delivered afterward.
    pub fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        self.reader.abort();
    }

    /// True once [`close`](Self::close) has been called.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Local socket address.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }
}

impl Drop for DatagramChannel {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::constants::EVENT_QUEUE_DEPTH;
    use crate::core::TransportKind;
    use std::time::Duration;

    fn endpoint_for(addr: SocketAddr) -> ServiceEndpoint {
        ServiceEndpoint::new("127.0.0.1".parse().unwrap(), addr.port(), TransportKind::Datagram)
    }

    #[tokio::test]
    async fn test_one_datagram_one_payload() {
        let (rx_tx, mut rx_events) = mpsc::channel(EVENT_QUEUE_DEPTH);
        let receiver = DatagramChannel::bind(0, rx_tx).await.unwrap();

        let (tx_tx, _tx_events) = mpsc::channel(EVENT_QUEUE_DEPTH);
        let sender = DatagramChannel::connect(endpoint_for(receiver.local_addr()), tx_tx)
            .await
            .unwrap();

        sender.send(b"first").await.unwrap();
        sender.send(b"second").await.unwrap();

        match rx_events.recv().await {
            Some(ChannelEvent::Payload(payload)) => assert_eq!(payload, b"first"),
            other => panic!("expected payload, got {other:?}"),
        }
        match rx_events.recv().await {
            Some(ChannelEvent::Payload(payload)) => assert_eq!(payload, b"second"),
            other => panic!("expected payload, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_send_after_close_fails() {
        let (events, mut rx) = mpsc::channel(EVENT_QUEUE_DEPTH);
        let channel = DatagramChannel::bind(0, events).await.unwrap();
        let addr = channel.local_addr();

        channel.close();
        channel.close(); // idempotent

        assert!(matches!(
            channel.send_to(b"late", addr).await,
            Err(TransportError::ChannelClosed)
        ));

        // No events after close: senders are gone, the queue just ends.
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_send_to_without_connect() {
        let (rx_tx, mut rx_events) = mpsc::channel(EVENT_QUEUE_DEPTH);
        let receiver = DatagramChannel::bind(0, rx_tx).await.unwrap();

        let (tx_tx, _tx_events) = mpsc::channel(EVENT_QUEUE_DEPTH);
        let sender = DatagramChannel::bind(0, tx_tx).await.unwrap();

        sender
            .send_to(b"hello", receiver.local_addr())
            .await
            .unwrap();

        match rx_events.recv().await {
            Some(ChannelEvent::Payload(payload)) => assert_eq!(payload, b"hello"),
            other => panic!("expected payload, got {other:?}"),
        }
    }
}
