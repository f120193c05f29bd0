//! Binary pose frame layout.
//!
//! One frame is 11 consecutive little-endian IEEE-754 `f32` values, 44
//! bytes total, in the fixed order:
//!
//! ```text
//! +0   location.x, location.y, location.z
//! +12  rotation.x, rotation.y, rotation.z   (pitch/yaw/roll, degrees)
//! +24  flexion[thumb, index, middle, ring, pinky]
//! ```
//!
//! No header, no version byte, no checksum. Binary frames are always full
//! updates; the partial-update path is the text format.

use crate::core::constants::{FINGER_COUNT, POSE_FRAME_FLOATS, POSE_FRAME_SIZE};
use crate::core::{DecodeError, HandPose, PoseEvent, Vec3};

/// Decode one binary pose frame.
///
/// Any payload that is not exactly [`POSE_FRAME_SIZE`] bytes is rejected
/// with [`DecodeError::MalformedLength`].
pub fn decode_binary(data: &[u8]) -> Result<PoseEvent, DecodeError> {
    if data.len() != POSE_FRAME_SIZE {
        return Err(DecodeError::malformed_length(data.len()));
    }

    let mut floats = [0.0f32; POSE_FRAME_FLOATS];
    for (slot, chunk) in floats.iter_mut().zip(data.chunks_exact(4)) {
        *slot = f32::from_le_bytes(chunk.try_into().unwrap());
    }

    let mut flexion = [0.0f32; FINGER_COUNT];
    flexion.copy_from_slice(&floats[6..11]);

    Ok(PoseEvent::Full(HandPose::new(
        Vec3::new(floats[0], floats[1], floats[2]),
        Vec3::new(floats[3], floats[4], floats[5]),
        flexion,
    )))
}

/// Encode a pose as one binary frame.
pub fn encode_binary(pose: &HandPose) -> [u8; POSE_FRAME_SIZE] {
    let mut frame = [0u8; POSE_FRAME_SIZE];
    let floats = [
        pose.location.x,
        pose.location.y,
        pose.location.z,
        pose.rotation.x,
        pose.rotation.y,
        pose.rotation.z,
        pose.flexion[0],
        pose.flexion[1],
        pose.flexion[2],
        pose.flexion[3],
        pose.flexion[4],
    ];
    for (chunk, value) in frame.chunks_exact_mut(4).zip(floats) {
        chunk.copy_from_slice(&value.to_le_bytes());
    }
    frame
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_pose() -> HandPose {
        HandPose::new(
            Vec3::new(1.5, -2.25, 0.125),
            Vec3::new(45.0, -90.0, 180.0),
            [0.0, 0.25, 0.5, 0.75, 1.0],
        )
    }

    #[test]
    fn test_encode_decode_roundtrip() {
        let pose = sample_pose();
        let frame = encode_binary(&pose);
        assert_eq!(frame.len(), POSE_FRAME_SIZE);

        let event = decode_binary(&frame).unwrap();
        assert_eq!(event, PoseEvent::Full(pose));
    }

    #[test]
    fn test_decode_rejects_every_other_length() {
        for len in [0, 1, 20, 43, 45, 88] {
            let data = vec![0u8; len];
            let result = decode_binary(&data);
            assert_eq!(
                result,
                Err(DecodeError::MalformedLength {
                    expected: POSE_FRAME_SIZE,
                    actual: len
                }),
                "length {len} must be rejected"
            );
        }
    }

    #[test]
    fn test_decode_field_order() {
        let mut frame = [0u8; POSE_FRAME_SIZE];
        // location.z is the third float
        frame[8..12].copy_from_slice(&7.0f32.to_le_bytes());
        // pinky flexion is the last float
        frame[40..44].copy_from_slice(&0.9f32.to_le_bytes());

        match decode_binary(&frame).unwrap() {
            PoseEvent::Full(pose) => {
                assert_eq!(pose.location.z, 7.0);
                assert_eq!(pose.flexion[4], 0.9);
            }
            other => panic!("expected full pose, got {other:?}"),
        }
    }

    #[test]
    fn test_binary_frames_are_always_full() {
        let frame = encode_binary(&HandPose::default());
        assert!(matches!(
            decode_binary(&frame).unwrap(),
            PoseEvent::Full(_)
        ));
    }
}
