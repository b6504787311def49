//! H.264/AVC RTP payload inspection (RFC 6184)
//!
//! Every RTP payload starts with a one-byte NAL header:
//! ```text
//! +---------------+
//! |0|1|2|3|4|5|6|7|
//! +-+-+-+-+-+-+-+-+
//! |F|NRI|  Type   |
//! +---------------+
//! ```
//!
//! Type 1-23 is a single NAL unit. Packetization adds:
//! - 24: STAP-A, aggregation of `[size(16) | NAL]*` after the header
//! - 28: FU-A, fragment with an FU header `|S|E|R| Type |` at byte 1

use super::keyframe::KeyframeBoundary;

/// Single-time aggregation packet
const STAP_A: u8 = 24;
/// Fragmentation unit
const FU_A: u8 = 28;

/// NAL unit type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NaluType {
    /// Non-IDR slice
    Slice = 1,
    /// Slice data partition A
    SlicePartA = 2,
    /// Slice data partition B
    SlicePartB = 3,
    /// Slice data partition C
    SlicePartC = 4,
    /// IDR slice (keyframe)
    Idr = 5,
    /// Supplemental enhancement information
    Sei = 6,
    /// Sequence parameter set
    Sps = 7,
    /// Picture parameter set
    Pps = 8,
    /// Access unit delimiter
    Aud = 9,
    /// End of sequence
    EndSeq = 10,
    /// End of stream
    EndStream = 11,
    /// Filler data
    Filler = 12,
}

impl NaluType {
    pub fn from_byte(b: u8) -> Option<Self> {
        match b & 0x1F {
            1 => Some(NaluType::Slice),
            2 => Some(NaluType::SlicePartA),
            3 => Some(NaluType::SlicePartB),
            4 => Some(NaluType::SlicePartC),
            5 => Some(NaluType::Idr),
            6 => Some(NaluType::Sei),
            7 => Some(NaluType::Sps),
            8 => Some(NaluType::Pps),
            9 => Some(NaluType::Aud),
            10 => Some(NaluType::EndSeq),
            11 => Some(NaluType::EndStream),
            12 => Some(NaluType::Filler),
            _ => None,
        }
    }

    pub fn is_keyframe(&self) -> bool {
        matches!(self, NaluType::Idr)
    }

    /// SPS only; a PPS always follows its SPS inside the same group
    pub fn opens_parameter_sets(&self) -> bool {
        matches!(self, NaluType::Sps)
    }
}

/// Classify one H.264 RTP payload
pub fn classify(payload: &[u8]) -> KeyframeBoundary {
    let Some(&header) = payload.first() else {
        return KeyframeBoundary::None;
    };

    match header & 0x1F {
        STAP_A => {
            // First aggregated NAL: [size(2)][nal header]
            match payload.get(3) {
                Some(&nal) => classify_nal(nal),
                None => KeyframeBoundary::None,
            }
        }
        FU_A => match payload.get(1) {
            Some(&fu) if fu & 0x80 != 0 => classify_nal(fu),
            _ => KeyframeBoundary::None,
        },
        _ => classify_nal(header),
    }
}

fn classify_nal(byte: u8) -> KeyframeBoundary {
    match NaluType::from_byte(byte) {
        Some(t) if t.opens_parameter_sets() => KeyframeBoundary::ParameterSets,
        Some(t) if t.is_keyframe() => KeyframeBoundary::KeyframeStart,
        _ => KeyframeBoundary::None,
    }
}
