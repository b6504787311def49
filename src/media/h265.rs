//! H.265/HEVC RTP payload inspection (RFC 7798)
//!
//! Payloads start with a two-byte NAL header:
//! ```text
//! +---------------+---------------+
//! |F|   Type    |  LayerId  | TID |
//! +---------------+---------------+
//! ```
//!
//! Packetization types: 48 aggregation packet (`[size(16) | NAL]*`),
//! 49 fragmentation unit with an FU header `|S|E| FuType |` at byte 2.

use super::keyframe::KeyframeBoundary;

const AGGREGATION_PACKET: u8 = 48;
const FRAGMENTATION_UNIT: u8 = 49;

const VPS: u8 = 32;
const SPS: u8 = 33;

/// BLA_W_LP ..= CRA_NUT
const IRAP: std::ops::RangeInclusive<u8> = 16..=21;

fn nal_type(byte: u8) -> u8 {
    (byte >> 1) & 0x3F
}

/// Classify one H.265 RTP payload
pub fn classify(payload: &[u8]) -> KeyframeBoundary {
    let Some(&first) = payload.first() else {
        return KeyframeBoundary::None;
    };

    match nal_type(first) {
        AGGREGATION_PACKET => {
            // [PayloadHdr(2)][size(2)][first NAL header...]
            match payload.get(4) {
                Some(&nal) => classify_type(nal_type(nal)),
                None => KeyframeBoundary::None,
            }
        }
        FRAGMENTATION_UNIT => match payload.get(2) {
            Some(&fu) if fu & 0x80 != 0 => classify_type(fu & 0x3F),
            _ => KeyframeBoundary::None,
        },
        t => classify_type(t),
    }
}

fn classify_type(t: u8) -> KeyframeBoundary {
    match t {
        VPS | SPS => KeyframeBoundary::ParameterSets,
        t if IRAP.contains(&t) => KeyframeBoundary::KeyframeStart,
        _ => KeyframeBoundary::None,
    }
}
