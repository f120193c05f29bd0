//! Protocol constants.
//!
//! Frame layout values are fixed by the wire format and MUST NOT be changed.
//! Timing values are defaults; the session layer accepts overrides through
//! its configuration.

use std::time::Duration;

// =============================================================================
// POSE FRAME LAYOUT
// =============================================================================

/// Number of tracked fingers.
pub const FINGER_COUNT: usize = 5;

/// Floats per binary pose frame: location(3) + rotation(3) + flexion(5).
pub const POSE_FRAME_FLOATS: usize = 11;

/// Binary pose frame size in bytes (11 x f32, little-endian, no header).
pub const POSE_FRAME_SIZE: usize = POSE_FRAME_FLOATS * 4;

/// Delimiter terminating each text frame on the control channel.
pub const TEXT_FRAME_DELIMITER: u8 = b'\n';

// =============================================================================
// SERVICE DISCOVERY
// =============================================================================

/// Default DNS-SD service type advertised by a pose producer or consumer.
pub const DEFAULT_SERVICE_TYPE: &str = "_handpose._tcp.local.";

/// TXT property carrying the advertiser's protocol version.
pub const PROP_VERSION: &str = "version";

/// Default control channel port for the advertising side.
pub const DEFAULT_CONTROL_PORT: u16 = 15999;

/// Report a discovery timeout after this long without a resolved peer.
pub const DISCOVERY_TIMEOUT: Duration = Duration::from_secs(10);

// =============================================================================
// TRANSPORT
// =============================================================================

/// Receive buffer size for one datagram.
pub const MAX_DATAGRAM_SIZE: usize = 65535;

/// Stream read buffer size.
pub const STREAM_READ_BUFFER_SIZE: usize = 4096;

/// Channel connect timeout.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Depth of a channel's inbound event queue.
pub const EVENT_QUEUE_DEPTH: usize = 256;

/// Depth of a channel's outbound send queue.
pub const SEND_QUEUE_DEPTH: usize = 64;

// =============================================================================
// SESSION RETRY POLICY
// =============================================================================

/// Reconnect attempts before the session fails terminally.
pub const MAX_RECONNECT_ATTEMPTS: u32 = 5;

/// Backoff before the first reconnect attempt.
pub const INITIAL_BACKOFF: Duration = Duration::from_millis(500);

/// Backoff multiplier between consecutive attempts.
pub const BACKOFF_MULTIPLIER: u32 = 2;

/// Ceiling on the reconnect backoff.
pub const MAX_BACKOFF: Duration = Duration::from_secs(8);
