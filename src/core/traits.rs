//! Core traits for the PoseLink protocol.
//!
//! The sink trait is the crate's single outward interface: rendering,
//! recording, and playback layers implement it and are injected at session
//! construction. The core never learns what a sink does with the values.

use super::pose::{Finger, Vec3};

/// Consumer of decoded pose updates.
///
/// The session controller invokes exactly the operations whose field is
/// present in a decoded event: a full frame drives all three, a delta only
/// the changed ones. Calls arrive serialized from the session's driver task.
///
/// Flexion factors are delivered unclamped; implementations that need the
/// nominal `[0.0, 1.0]` range must clamp themselves.
///
/// # Example
///
/// ```
/// use poselink::core::{Finger, PoseSink, Vec3};
///
/// struct LogSink;
///
/// impl PoseSink for LogSink {
///     fn set_location(&mut self, location: Vec3) {
///         println!("hand at {location:?}");
///     }
///
///     fn set_rotation(&mut self, rotation: Vec3) {
///         println!("hand rotated to {rotation:?}");
///     }
///
///     fn set_finger_flexion(&mut self, finger: Finger, factor: f32) {
///         println!("{finger:?} flexed to {factor}");
///     }
/// }
/// ```
pub trait PoseSink: Send + 'static {
    /// The hand moved to `location`.
    fn set_location(&mut self, location: Vec3);

    /// The hand rotated to `rotation` (pitch/yaw/roll, degrees).
    fn set_rotation(&mut self, rotation: Vec3);

    /// One finger's flexion factor changed.
    fn set_finger_flexion(&mut self, finger: Finger, factor: f32);
}

/// Sink that discards every update.
///
/// Useful as a placeholder while wiring a session and in tests that only
/// exercise connectivity.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl PoseSink for NullSink {
    fn set_location(&mut self, _location: Vec3) {}

    fn set_rotation(&mut self, _rotation: Vec3) {}

    fn set_finger_flexion(&mut self, _finger: Finger, _factor: f32) {}
}
