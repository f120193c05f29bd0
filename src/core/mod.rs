//! Core types, traits, constants, and errors.
//!
//! Always compiled, regardless of feature selection. Everything here is
//! network-agnostic: the pose data model, the sink capability the consumer
//! implements, the protocol constants, and the error taxonomy shared by the
//! codec, transport, discovery, and session layers.

pub mod constants;
mod endpoint;
mod error;
mod pose;
mod traits;

pub use constants::{
    DEFAULT_CONTROL_PORT, DEFAULT_SERVICE_TYPE, FINGER_COUNT, POSE_FRAME_FLOATS, POSE_FRAME_SIZE,
};
pub use endpoint::{ServiceEndpoint, TransportKind};
pub use error::{DecodeError, DiscoveryError, PoselinkError, SessionError, TransportError};
pub use pose::{Finger, HandPose, PoseDelta, PoseEvent, Vec3};
pub use traits::{NullSink, PoseSink};
