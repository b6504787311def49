//! RTP fixed header (RFC 3550 §5.1)
//!
//! ```text
//!  0                   1                   2                   3
//!  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |V=2|P|X|  CC   |M|     PT      |       sequence number         |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |                           timestamp                           |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |                             SSRC                              |
//! +=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+
//! |                     CSRC list (CC × 4 bytes)                  |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |   extension header (X): profile(16) | length in words(16) ...  |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! ```
//!
//! The relay forwards packets untouched; parsing exists only to locate the
//! payload for keyframe detection.

use bytes::{Buf, Bytes};

const FIXED_HEADER_SIZE: usize = 12;
const RTP_VERSION: u8 = 2;

/// RTP parse failures
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RtpError {
    #[error("RTP packet too short")]
    TooShort,

    #[error("unsupported RTP version {0}")]
    UnsupportedVersion(u8),

    #[error("invalid RTP padding")]
    InvalidPadding,
}

/// A parsed RTP packet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RtpPacket {
    pub marker: bool,
    pub payload_type: u8,
    pub sequence: u16,
    pub timestamp: u32,
    pub ssrc: u32,
    /// Media payload (CSRCs, extension and padding stripped)
    pub payload: Bytes,
}

impl RtpPacket {
    /// Parse an RTP packet
    pub fn parse(data: Bytes) -> Result<Self, RtpError> {
        if data.len() < FIXED_HEADER_SIZE {
            return Err(RtpError::TooShort);
        }

        let mut buf = &data[..];
        let b0 = buf.get_u8();
        let b1 = buf.get_u8();

        let version = b0 >> 6;
        if version != RTP_VERSION {
            return Err(RtpError::UnsupportedVersion(version));
        }
        let padding = b0 & 0x20 != 0;
        let extension = b0 & 0x10 != 0;
        let csrc_count = (b0 & 0x0F) as usize;

        let sequence = buf.get_u16();
        let timestamp = buf.get_u32();
        let ssrc = buf.get_u32();

        let mut offset = FIXED_HEADER_SIZE + csrc_count * 4;
        if data.len() < offset {
            return Err(RtpError::TooShort);
        }

        if extension {
            if data.len() < offset + 4 {
                return Err(RtpError::TooShort);
            }
            let words = u16::from_be_bytes([data[offset + 2], data[offset + 3]]) as usize;
            offset += 4 + words * 4;
            if data.len() < offset {
                return Err(RtpError::TooShort);
            }
        }

        let mut end = data.len();
        if padding {
            let pad = data[end - 1] as usize;
            if pad == 0 || offset + pad > end {
                return Err(RtpError::InvalidPadding);
            }
            end -= pad;
        }

        Ok(Self {
            marker: b1 & 0x80 != 0,
            payload_type: b1 & 0x7F,
            sequence,
            timestamp,
            ssrc,
            payload: data.slice(offset..end),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(b0: u8, b1: u8) -> Vec<u8> {
        let mut pkt = vec![b0, b1, 0x12, 0x34];
        pkt.extend_from_slice(&0x0001_0203u32.to_be_bytes());
        pkt.extend_from_slice(&0xDEAD_BEEFu32.to_be_bytes());
        pkt
    }

    #[test]
    fn test_parse_basic() {
        let mut pkt = header(0x80, 0xE0);
        pkt.extend_from_slice(&[0x65, 0x88, 0x84]);

        let rtp = RtpPacket::parse(Bytes::from(pkt)).unwrap();
        assert!(rtp.marker);
        assert_eq!(rtp.payload_type, 96);
        assert_eq!(rtp.sequence, 0x1234);
        assert_eq!(rtp.timestamp, 0x0001_0203);
        assert_eq!(rtp.ssrc, 0xDEAD_BEEF);
        assert_eq!(&rtp.payload[..], &[0x65, 0x88, 0x84]);
    }

    #[test]
    fn test_parse_csrc_extension_padding() {
        // CC=1, X=1, P=1
        let mut pkt = header(0x80 | 0x20 | 0x10 | 0x01, 0x60);
        pkt.extend_from_slice(&[0, 0, 0, 1]); // CSRC
        pkt.extend_from_slice(&[0xBE, 0xDE, 0x00, 0x01]); // extension, 1 word
        pkt.extend_from_slice(&[1, 2, 3, 4]);
        pkt.extend_from_slice(&[0x67, 0x42]); // payload
        pkt.extend_from_slice(&[0, 0, 3]); // 3 bytes padding

        let rtp = RtpPacket::parse(Bytes::from(pkt)).unwrap();
        assert_eq!(&rtp.payload[..], &[0x67, 0x42]);
        assert!(!rtp.marker);
    }

    #[test]
    fn test_too_short() {
        assert_eq!(
            RtpPacket::parse(Bytes::from_static(&[0x80, 0x60, 0x00])),
            Err(RtpError::TooShort)
        );

        // CC=3 but no CSRCs
        let pkt = header(0x83, 0x60);
        assert_eq!(RtpPacket::parse(Bytes::from(pkt)), Err(RtpError::TooShort));
    }

    #[test]
    fn test_bad_version() {
        let pkt = header(0x40, 0x60);
        assert_eq!(
            RtpPacket::parse(Bytes::from(pkt)),
            Err(RtpError::UnsupportedVersion(1))
        );
    }

    #[test]
    fn test_bad_padding() {
        let mut pkt = header(0xA0, 0x60);
        pkt.extend_from_slice(&[0x41, 9]);
        assert_eq!(
            RtpPacket::parse(Bytes::from(pkt)),
            Err(RtpError::InvalidPadding)
        );
    }
}
