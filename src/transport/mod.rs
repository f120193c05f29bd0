//! PoseLink - Transport Layer
//!
//! Owns the sockets and turns connect/read/write/disconnect into payload
//! events. It provides:
//!
//! - **Endpoints**: [`ServiceEndpoint`] produced by discovery, consumed here
//! - **Stream reassembly**: [`FrameBuffer`] and [`Framing`] for re-framing TCP
//! - **Control channel**: [`StreamChannel`] / [`StreamListener`] (reliable, ordered)
//! - **Data channel**: [`DatagramChannel`] (low-latency, lossy)
//!
//! # Architecture
//!
//! The transport layer sits between the sockets and the frame codec. It
//! owns exactly one socket per channel and remains agnostic to the payload
//! contents; framing is its only knowledge of the wire format.
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │           Session Layer                 │
//! ├─────────────────────────────────────────┤
//! │           Frame Codec                   │
//! ├─────────────────────────────────────────┤
//! │         Transport Layer                 │  ← this module
//! │   channels, framing, payload events     │
//! ├─────────────────────────────────────────┤
//! │            TCP / UDP                    │
//! └─────────────────────────────────────────┘
//! ```
//!
//! None of the public operations block the caller: connects resolve as
//! futures, sends enqueue, and received payloads arrive on an event queue
//! handed in at construction. Payload order is preserved per channel;
//! nothing is guaranteed between channels.

mod datagram;
mod framing;
mod stream;

pub use datagram::DatagramChannel;
pub use framing::{FrameBuffer, Framing};
pub use stream::{StreamChannel, StreamListener};

// Endpoints live in `core` (they are plain data); re-exported here because
// this layer is their consumer.
pub use crate::core::{ServiceEndpoint, TransportKind};

use crate::core::TransportError;

/// Event delivered by a channel to its owner.
#[derive(Debug)]
pub enum ChannelEvent {
    /// One raw payload: one datagram, or one reassembled stream unit.
    Payload(Vec<u8>),
    /// The channel hit an I/O error and has stopped. Emitted at most once;
    /// the channel does not reconnect itself.
    Disconnected(TransportError),
}
