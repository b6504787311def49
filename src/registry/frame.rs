//! Interleaved frame type shared by the demultiplexer, the keyframe cache and
//! the broadcaster.

use bytes::{BufMut, Bytes, BytesMut};

use crate::protocol::constants::{INTERLEAVED_HEADER_SIZE, INTERLEAVED_MARKER};

/// One interleaved RTP/RTCP frame, header included
///
/// ```text
/// +------+---------+----------------+-----------------+
/// | 0x24 | channel | length (BE16)  | payload         |
/// +------+---------+----------------+-----------------+
/// ```
///
/// `data` holds the full `4 + length` bytes, which is exactly what gets
/// cached and written to subscribers. Cloning only bumps the `Bytes`
/// reference count, so fan-out never copies the payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterleavedFrame {
    /// Interleaved channel number
    pub channel: u8,
    /// Framed unit (header + payload)
    pub data: Bytes,
}

impl InterleavedFrame {
    /// Wrap an already framed unit. The caller guarantees `data` starts with
    /// a valid 4-byte interleaved header.
    pub(crate) fn from_framed(channel: u8, data: Bytes) -> Self {
        Self { channel, data }
    }

    /// Frame a payload for the given channel
    ///
    /// Payloads longer than `u16::MAX` cannot be expressed and are truncated
    /// by the length field; callers build frames from parsed input only.
    pub fn new(channel: u8, payload: &[u8]) -> Self {
        let mut buf = BytesMut::with_capacity(INTERLEAVED_HEADER_SIZE + payload.len());
        buf.put_u8(INTERLEAVED_MARKER);
        buf.put_u8(channel);
        buf.put_u16(payload.len() as u16);
        buf.put_slice(payload);
        Self {
            channel,
            data: buf.freeze(),
        }
    }

    /// RTP/RTCP payload without the interleaved header
    pub fn payload(&self) -> Bytes {
        self.data.slice(INTERLEAVED_HEADER_SIZE..)
    }

    /// Size of the framed unit in bytes
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_frame_layout() {
        let frame = InterleavedFrame::new(2, &[0xAA, 0xBB, 0xCC]);
        assert_eq!(&frame.data[..], &[0x24, 2, 0x00, 0x03, 0xAA, 0xBB, 0xCC]);
        assert_eq!(frame.len(), 7);
        assert_eq!(&frame.payload()[..], &[0xAA, 0xBB, 0xCC]);
    }

    #[test]
    fn test_clone_shares_buffer() {
        let frame = InterleavedFrame::new(0, &[1; 64]);
        let copy = frame.clone();
        assert_eq!(frame.data.as_ptr(), copy.data.as_ptr());
    }
}
