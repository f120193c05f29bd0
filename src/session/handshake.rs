//! Data-port hello.
//!
//! The advertised service only names the control port; the data channel's
//! port is negotiated in-band. Immediately after the control channel is
//! established, the receiving side writes one newline-terminated JSON
//! hello naming the UDP port its data channel is bound to, and the
//! producer streams binary pose frames there.

use serde::{Deserialize, Serialize};

use crate::core::DecodeError;
use crate::core::constants::TEXT_FRAME_DELIMITER;

/// First message on the control channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataHello {
    /// UDP port the sender of the hello receives pose frames on.
    pub data_port: u16,
}

impl DataHello {
    /// Encode as one delimited control-channel unit.
    pub fn encode(&self) -> Vec<u8> {
        let mut bytes = serde_json::to_vec(self).expect("hello serializes");
        bytes.push(TEXT_FRAME_DELIMITER);
        bytes
    }

    /// Decode from one control-channel unit (delimiter already stripped).
    pub fn decode(bytes: &[u8]) -> Result<Self, DecodeError> {
        serde_json::from_slice(bytes).map_err(|e| DecodeError::MalformedText(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hello_roundtrip() {
        let hello = DataHello { data_port: 40123 };
        let mut encoded = hello.encode();
        assert_eq!(encoded.pop(), Some(TEXT_FRAME_DELIMITER));
        assert_eq!(DataHello::decode(&encoded).unwrap(), hello);
    }

    #[test]
    fn test_hello_rejects_junk() {
        assert!(DataHello::decode(b"{\"port\": 1}").is_err());
        assert!(DataHello::decode(b"binary \x00 garbage").is_err());
    }
}
