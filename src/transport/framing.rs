//! Stream reassembly.
//!
//! TCP does not preserve message boundaries, so the stream channel buffers
//! incoming bytes and re-frames them before anything reaches the codec.
//! Datagram channels never need this; one datagram is one payload.

use crate::core::constants::POSE_FRAME_SIZE;

/// How a byte stream is cut into payload units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Framing {
    /// Every unit is exactly this many bytes. The binary pose frame's fixed
    /// 44-byte length is what makes this mode workable without a header.
    FixedLength(usize),
    /// Units are terminated by this byte (which is stripped). Empty units
    /// are discarded, so `\r\n` line endings and keep-alive blank lines are
    /// tolerated.
    Delimiter(u8),
}

impl Framing {
    /// Fixed-length framing sized for one binary pose frame.
    pub const fn pose_frames() -> Self {
        Framing::FixedLength(POSE_FRAME_SIZE)
    }

    /// Newline-delimited framing for text frames.
    pub const fn lines() -> Self {
        Framing::Delimiter(b'\n')
    }
}

/// Reassembly buffer for one stream channel.
///
/// Feed it whatever the socket produced; it emits each complete unit
/// separately, in arrival order, and keeps any partial remainder buffered
/// for the next read.
#[derive(Debug)]
pub struct FrameBuffer {
    framing: Framing,
    pending: Vec<u8>,
}

impl FrameBuffer {
    /// Create a buffer with the given framing.
    pub fn new(framing: Framing) -> Self {
        Self {
            framing,
            pending: Vec::new(),
        }
    }

    /// The framing mode in effect.
    pub fn framing(&self) -> Framing {
        self.framing
    }

    /// Bytes buffered awaiting completion of the next unit.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Absorb freshly read bytes and return every now-complete unit.
    pub fn push(&mut self, bytes: &[u8]) -> Vec<Vec<u8>> {
        self.pending.extend_from_slice(bytes);
        let mut complete = Vec::new();

        match self.framing {
            Framing::FixedLength(size) => {
                if size == 0 {
                    return complete;
                }
                while self.pending.len() >= size {
                    let unit: Vec<u8> = self.pending.drain(..size).collect();
                    complete.push(unit);
                }
            }
            Framing::Delimiter(delimiter) => {
                while let Some(pos) = self.pending.iter().position(|&b| b == delimiter) {
                    let mut unit: Vec<u8> = self.pending.drain(..=pos).collect();
                    unit.pop(); // strip the delimiter
                    if !unit.is_empty() {
                        complete.push(unit);
                    }
                }
            }
        }

        complete
    }

    /// Discard any buffered partial unit.
    pub fn clear(&mut self) {
        self.pending.clear();
    }
}
