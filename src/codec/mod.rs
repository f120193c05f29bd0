//! Frame codec: raw bytes to semantic pose events.
//!
//! The codec is a pure transcoder with no network awareness and no state,
//! safe to invoke concurrently from every channel. Two wire formats exist:
//!
//! - **Binary** ([`decode_binary`]): a fixed 44-byte layout, always a full
//!   pose. Carried on the low-latency data channel.
//! - **Text** ([`decode_text`]): a JSON object with optional keys, the only
//!   format that supports partial updates. Carried on the control channel.
//!
//! Decoding never panics across this boundary; every failure is a typed
//! [`DecodeError`](crate::core::DecodeError), and the policy everywhere in
//! this crate is to drop the offending frame and keep the stream alive.

mod binary;
mod text;

pub use binary::{decode_binary, encode_binary};
pub use text::{KEY_FINGERS, KEY_LOCATION, KEY_ROTATION, decode_text, encode_text};

use crate::core::constants::POSE_FRAME_SIZE;
use crate::core::{DecodeError, PoseEvent};

/// Stateless pose frame codec.
///
/// All methods are also available as free functions in this module; the
/// struct exists so a caller can hold "the codec" as an explicit component
/// and hand it to whatever owns the channels.
#[derive(Debug, Default, Clone, Copy)]
pub struct FrameCodec;

impl FrameCodec {
    /// Create a codec.
    pub const fn new() -> Self {
        Self
    }

    /// Decode a binary pose frame. See [`decode_binary`].
    pub fn decode_binary(&self, data: &[u8]) -> Result<PoseEvent, DecodeError> {
        decode_binary(data)
    }

    /// Decode a text pose frame. See [`decode_text`].
    pub fn decode_text(&self, data: &[u8]) -> Result<PoseEvent, DecodeError> {
        decode_text(data)
    }

    /// Decode a payload of unknown format.
    ///
    /// The wire protocol has no format discriminator: both frame kinds may
    /// arrive on the same channel. This method infers the format from the
    /// payload length, exactly 44 bytes is parsed as binary and everything
    /// else as text. The inference is inherently fragile: a 44-byte text
    /// frame is misread as binary garbage. Callers that control both ends
    /// should route formats onto separate channels (as the session layer
    /// does) or call the explicit methods.
    pub fn decode(&self, data: &[u8]) -> Result<PoseEvent, DecodeError> {
        if data.len() == POSE_FRAME_SIZE {
            decode_binary(data)
        } else {
            decode_text(data)
        }
    }

    /// Encode a full pose as a binary frame. See [`encode_binary`].
    pub fn encode_binary(&self, pose: &crate::core::HandPose) -> [u8; POSE_FRAME_SIZE] {
        encode_binary(pose)
    }

    /// Encode a partial update as a text frame. See [`encode_text`].
    pub fn encode_text(&self, delta: &crate::core::PoseDelta) -> String {
        encode_text(delta)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{HandPose, Vec3};

    #[test]
    fn test_infers_binary_by_length() {
        let codec = FrameCodec::new();
        let pose = HandPose::new(Vec3::new(1.0, 2.0, 3.0), Vec3::ZERO, [0.5; 5]);
        let frame = codec.encode_binary(&pose);

        assert_eq!(codec.decode(&frame).unwrap(), PoseEvent::Full(pose));
    }

    #[test]
    fn test_infers_text_for_other_lengths() {
        let codec = FrameCodec::new();
        let event = codec.decode(br#"{"location": [9.0, 0.0, 0.0]}"#).unwrap();
        match event {
            PoseEvent::Delta(delta) => {
                assert_eq!(delta.location, Some(Vec3::new(9.0, 0.0, 0.0)))
            }
            other => panic!("expected delta, got {other:?}"),
        }
    }

    #[test]
    fn test_malformed_frame_is_an_error_not_a_panic() {
        let codec = FrameCodec::new();
        assert!(codec.decode(&[0u8; 45]).is_err());
        assert!(codec.decode(&[]).is_err());
    }
}
