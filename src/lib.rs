//! # PoseLink Protocol
//!
//! PoseLink streams real-time hand-pose data (3D position, 3D orientation,
//! per-finger flexion) from a sensor-side producer to a remote renderer
//! over a local network. It provides:
//!
//! - **Zero configuration**: mDNS/DNS-SD discovery, no pre-known addresses
//! - **Latency**: fixed 44-byte binary frames over a lossy UDP data channel
//! - **Deltas**: JSON text frames for partial field updates over TCP
//! - **Resilience**: a malformed frame costs itself, never the stream;
//!   disconnects retry with bounded backoff
//! - **Decoupling**: consumers implement one three-method sink capability
//!   and never see a socket
//!
//! ## Feature Flags
//!
//! - `transport` (default): stream/datagram channels and re-framing
//! - `discovery` (default): mDNS browse/advertise
//! - `session` (default): the session controller tying both together
//!
//! ## Modules
//!
//! - [`core`]: pose data model, sink trait, constants, errors (always included)
//! - [`codec`]: binary and text frame codec (always included)
//! - [`transport`]: transport channels (requires `transport` feature)
//! - [`discovery`]: discovery agent (requires `discovery` feature)
//! - [`session`]: session controller (requires `session` feature)
//!
//! ## Example Usage
//!
//! ```rust
//! use poselink::codec::FrameCodec;
//! use poselink::core::{Finger, HandPose, PoseEvent, PoseSink, Vec3};
//!
//! // Implement the sink your renderer (or recorder) exposes.
//! struct Printer;
//!
//! impl PoseSink for Printer {
//!     fn set_location(&mut self, location: Vec3) {
//!         println!("location: {location:?}");
//!     }
//!
//!     fn set_rotation(&mut self, rotation: Vec3) {
//!         println!("rotation: {rotation:?}");
//!     }
//!
//!     fn set_finger_flexion(&mut self, finger: Finger, factor: f32) {
//!         println!("{finger:?}: {factor}");
//!     }
//! }
//!
//! // Decode a frame and feed the sink.
//! let codec = FrameCodec::new();
//! let pose = HandPose::new(
//!     Vec3::new(0.0, 1.0, 0.0),
//!     Vec3::new(0.0, 90.0, 0.0),
//!     [0.0, 0.2, 0.4, 0.6, 0.8],
//! );
//! let frame = codec.encode_binary(&pose);
//!
//! let mut sink = Printer;
//! match codec.decode_binary(&frame) {
//!     Ok(event) => event.apply_to(&mut sink),
//!     Err(e) => eprintln!("dropped frame: {e}"),
//! }
//! # assert_eq!(codec.decode_binary(&frame).unwrap(), PoseEvent::Full(pose));
//! ```
//!
//! A connected deployment uses the [`session`] module instead of driving
//! the codec by hand: `SessionController::start(config, sink)` browses for
//! the peer, maintains both channels, and invokes the sink per decoded
//! event.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

// Core module (always included)
pub mod core;

// Frame codec (always included)
pub mod codec;

// Transport layer (feature-gated)
#[cfg(feature = "transport")]
#[cfg_attr(docsrs, doc(cfg(feature = "transport")))]
pub mod transport;

// Service discovery (feature-gated)
#[cfg(feature = "discovery")]
#[cfg_attr(docsrs, doc(cfg(feature = "discovery")))]
pub mod discovery;

// Session layer (feature-gated)
#[cfg(feature = "session")]
#[cfg_attr(docsrs, doc(cfg(feature = "session")))]
pub mod session;

/// Prelude module for convenient imports.
pub mod prelude {
    // Core types and the sink capability
    pub use crate::core::*;

    // Codec entry points
    pub use crate::codec::{FrameCodec, decode_binary, decode_text, encode_binary, encode_text};

    // Transport types (when enabled); endpoints come with `core`
    #[cfg(feature = "transport")]
    pub use crate::transport::{
        ChannelEvent, DatagramChannel, FrameBuffer, Framing, StreamChannel, StreamListener,
    };

    // Discovery types (when enabled)
    #[cfg(feature = "discovery")]
    pub use crate::discovery::{DiscoveryAgent, DiscoveryEvent};

    // Session types (when enabled)
    #[cfg(feature = "session")]
    pub use crate::session::{
        ConnectionState, RetryPolicy, SessionConfig, SessionController, SessionNotice, SessionRole,
    };
}

// Re-export commonly used items at crate root
pub use crate::codec::FrameCodec;
pub use crate::core::{
    DecodeError, Finger, HandPose, PoseDelta, PoseEvent, PoseSink, PoselinkError, ServiceEndpoint,
    TransportKind, Vec3,
};

#[cfg(feature = "session")]
pub use session::{ConnectionState, SessionConfig, SessionController};
