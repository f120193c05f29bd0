//! Error types for the PoseLink protocol.
//!
//! The taxonomy mirrors the recovery policy: a [`DecodeError`] only ever
//! costs the offending frame, a [`TransportError`] ends one channel, and a
//! session reaches its terminal failed state only after the reconnect
//! budget is spent.

use thiserror::Error;

use super::constants::POSE_FRAME_SIZE;

/// Errors that can occur when decoding a wire frame.
///
/// Never fatal: the caller drops the frame and the stream continues.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// Binary payload is not exactly one pose frame.
    #[error("malformed frame length: expected {expected} bytes, got {actual}")]
    MalformedLength {
        /// Required frame size ([`POSE_FRAME_SIZE`]).
        expected: usize,
        /// Actual payload size.
        actual: usize,
    },

    /// A recognized text key holds a value of the wrong type or arity.
    #[error("invalid field: {0}")]
    InvalidField(String),

    /// Text payload is not a UTF-8 JSON object.
    #[error("malformed text frame: {0}")]
    MalformedText(String),
}

impl DecodeError {
    /// Build a `MalformedLength` for a payload of `actual` bytes.
    pub fn malformed_length(actual: usize) -> Self {
        DecodeError::MalformedLength {
            expected: POSE_FRAME_SIZE,
            actual,
        }
    }
}

/// Errors in the transport layer.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Underlying socket I/O failed.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// Connection attempt did not complete in time.
    #[error("connect timed out")]
    ConnectTimeout,

    /// Channel was closed locally; no further sends are accepted.
    #[error("channel closed")]
    ChannelClosed,

    /// Listener was closed before a peer connected.
    #[error("listener closed")]
    ListenerClosed,
}

/// Errors in the discovery layer.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// The mDNS daemon failed to start or execute a command.
    #[error("mdns daemon error: {0}")]
    Daemon(String),

    /// Service type string is not valid DNS-SD syntax.
    #[error("invalid service type: {0}")]
    InvalidServiceType(String),
}

/// Errors in the session layer.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Discovery failed to start.
    #[error("discovery error: {0}")]
    Discovery(#[from] DiscoveryError),

    /// Transport failed outside the retry path.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// The controller has already been stopped.
    #[error("session stopped")]
    Stopped,
}

/// Top-level PoseLink errors.
#[derive(Debug, Error)]
pub enum PoselinkError {
    /// Decode error.
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),

    /// Transport error.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// Discovery error.
    #[error("discovery error: {0}")]
    Discovery(#[from] DiscoveryError),

    /// Session error.
    #[error("session error: {0}")]
    Session(#[from] SessionError),

    /// I/O error.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_malformed_length_carries_frame_size() {
        let err = DecodeError::malformed_length(20);
        assert_eq!(
            err,
            DecodeError::MalformedLength {
                expected: POSE_FRAME_SIZE,
                actual: 20
            }
        );
    }

    #[test]
    fn test_io_errors_convert_up_the_taxonomy() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        let err: TransportError = io.into();
        let top: PoselinkError = err.into();
        assert!(matches!(top, PoselinkError::Transport(TransportError::Io(_))));
    }
}
