//! Hand pose data model.
//!
//! A [`HandPose`] is the full state of one tracked hand: where it is, how it
//! is oriented, and how far each finger is bent. Poses are transient values;
//! the codec produces one per received frame and the sink consumes it
//! immediately. Nothing in this crate retains them.

use serde::{Deserialize, Serialize};

use super::constants::FINGER_COUNT;

/// A 3-component float vector (x, y, z).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec3 {
    /// X component.
    pub x: f32,
    /// Y component.
    pub y: f32,
    /// Z component.
    pub z: f32,
}

impl Vec3 {
    /// Create a vector from its components.
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// The zero vector.
    pub const ZERO: Vec3 = Vec3::new(0.0, 0.0, 0.0);

    /// Components as an array in x, y, z order.
    pub const fn to_array(self) -> [f32; 3] {
        [self.x, self.y, self.z]
    }

    /// Build a vector from an x, y, z array.
    pub const fn from_array(a: [f32; 3]) -> Self {
        Self::new(a[0], a[1], a[2])
    }
}

impl From<[f32; 3]> for Vec3 {
    fn from(a: [f32; 3]) -> Self {
        Self::from_array(a)
    }
}

/// One of the five tracked fingers.
///
/// The discriminant order is fixed by the binary wire layout: flexion
/// factors appear on the wire as thumb, index, middle, ring, pinky.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Finger {
    /// Thumb (wire index 0).
    Thumb = 0,
    /// Index finger (wire index 1).
    Index = 1,
    /// Middle finger (wire index 2).
    Middle = 2,
    /// Ring finger (wire index 3).
    Ring = 3,
    /// Pinky (wire index 4).
    Pinky = 4,
}

impl Finger {
    /// All fingers in wire order.
    pub const ALL: [Finger; FINGER_COUNT] = [
        Finger::Thumb,
        Finger::Index,
        Finger::Middle,
        Finger::Ring,
        Finger::Pinky,
    ];

    /// Wire index of this finger (0..=4).
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Finger for a wire index, if in range.
    pub const fn from_index(index: usize) -> Option<Finger> {
        match index {
            0 => Some(Finger::Thumb),
            1 => Some(Finger::Index),
            2 => Some(Finger::Middle),
            3 => Some(Finger::Ring),
            4 => Some(Finger::Pinky),
            _ => None,
        }
    }

    /// Lowercase name used as the key in the text wire format.
    pub const fn wire_name(self) -> &'static str {
        match self {
            Finger::Thumb => "thumb",
            Finger::Index => "index",
            Finger::Middle => "middle",
            Finger::Ring => "ring",
            Finger::Pinky => "pinky",
        }
    }

    /// Finger for a text-format key, if recognized.
    pub fn from_wire_name(name: &str) -> Option<Finger> {
        match name {
            "thumb" => Some(Finger::Thumb),
            "index" => Some(Finger::Index),
            "middle" => Some(Finger::Middle),
            "ring" => Some(Finger::Ring),
            "pinky" => Some(Finger::Pinky),
            _ => None,
        }
    }
}

/// A complete hand pose: location, orientation, and all five flexion factors.
///
/// `rotation` is Euler pitch/yaw/roll about the x, y, and z axes, in
/// degrees. Flexion factors are nominally in `[0.0, 1.0]` (0 = extended,
/// 1 = fully bent) but are carried through undamped; clamping is the sink's
/// decision.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HandPose {
    /// Hand location.
    pub location: Vec3,
    /// Hand orientation as pitch/yaw/roll, degrees.
    pub rotation: Vec3,
    /// Flexion factor per finger, indexed by [`Finger::index`].
    pub flexion: [f32; FINGER_COUNT],
}

impl HandPose {
    /// Create a pose from its parts.
    pub const fn new(location: Vec3, rotation: Vec3, flexion: [f32; FINGER_COUNT]) -> Self {
        Self {
            location,
            rotation,
            flexion,
        }
    }

    /// Flexion factor of one finger.
    pub const fn flexion_of(&self, finger: Finger) -> f32 {
        self.flexion[finger.index()]
    }
}

impl Default for HandPose {
    fn default() -> Self {
        Self::new(Vec3::ZERO, Vec3::ZERO, [0.0; FINGER_COUNT])
    }
}

/// A partial pose update: only the present fields changed.
///
/// Produced by the text wire format, where any subset of keys may appear.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PoseDelta {
    /// New location, if it changed.
    pub location: Option<Vec3>,
    /// New rotation, if it changed.
    pub rotation: Option<Vec3>,
    /// New flexion factor per finger, where changed.
    pub flexion: [Option<f32>; FINGER_COUNT],
}

impl PoseDelta {
    /// True if no field is present.
    pub fn is_empty(&self) -> bool {
        self.location.is_none() && self.rotation.is_none() && self.flexion.iter().all(Option::is_none)
    }

    /// Set one finger's flexion factor.
    pub fn with_flexion(mut self, finger: Finger, factor: f32) -> Self {
        self.flexion[finger.index()] = Some(factor);
        self
    }
}

impl From<HandPose> for PoseDelta {
    fn from(pose: HandPose) -> Self {
        let mut flexion = [None; FINGER_COUNT];
        for (slot, factor) in flexion.iter_mut().zip(pose.flexion) {
            *slot = Some(factor);
        }
        Self {
            location: Some(pose.location),
            rotation: Some(pose.rotation),
            flexion,
        }
    }
}

/// One decoded wire message.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PoseEvent {
    /// A full pose; every field is present.
    Full(HandPose),
    /// A partial update; only the present fields changed.
    Delta(PoseDelta),
}

impl PoseEvent {
    /// Dispatch the present fields to a sink.
    ///
    /// A `Full` event invokes every sink operation; a `Delta` invokes only
    /// the operations whose field is present.
    pub fn apply_to<S: super::traits::PoseSink + ?Sized>(&self, sink: &mut S) {
        match self {
            PoseEvent::Full(pose) => {
                sink.set_location(pose.location);
                sink.set_rotation(pose.rotation);
                for finger in Finger::ALL {
                    sink.set_finger_flexion(finger, pose.flexion_of(finger));
                }
            }
            PoseEvent::Delta(delta) => {
                if let Some(location) = delta.location {
                    sink.set_location(location);
                }
                if let Some(rotation) = delta.rotation {
                    sink.set_rotation(rotation);
                }
                for finger in Finger::ALL {
                    if let Some(factor) = delta.flexion[finger.index()] {
                        sink.set_finger_flexion(finger, factor);
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_finger_index_roundtrip() {
        for finger in Finger::ALL {
            assert_eq!(Finger::from_index(finger.index()), Some(finger));
        }
        assert_eq!(Finger::from_index(5), None);
    }

    #[test]
    fn test_finger_wire_name_roundtrip() {
        for finger in Finger::ALL {
            assert_eq!(Finger::from_wire_name(finger.wire_name()), Some(finger));
        }
        assert_eq!(Finger::from_wire_name("palm"), None);
    }

    #[test]
    fn test_delta_is_empty() {
        let delta = PoseDelta::default();
        assert!(delta.is_empty());

        let delta = delta.with_flexion(Finger::Ring, 0.5);
        assert!(!delta.is_empty());
    }

    #[test]
    fn test_delta_from_full_pose() {
        let pose = HandPose::new(
            Vec3::new(1.0, 2.0, 3.0),
            Vec3::new(10.0, 20.0, 30.0),
            [0.1, 0.2, 0.3, 0.4, 0.5],
        );
        let delta = PoseDelta::from(pose);
        assert_eq!(delta.location, Some(pose.location));
        assert_eq!(delta.rotation, Some(pose.rotation));
        assert!(delta.flexion.iter().all(Option::is_some));
    }
}
