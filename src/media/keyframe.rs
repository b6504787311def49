//! Keyframe cache for late-joiner support
//!
//! When a subscriber starts playing an existing stream it needs to receive:
//! 1. The parameter sets (SPS/PPS, or VPS/SPS/PPS for H.265)
//! 2. The most recent keyframe
//! 3. Every frame since that keyframe, video and audio alike
//!
//! The cache holds exactly that: the framed interleaved units published since
//! the last keyframe boundary, in arrival order. Replaying them lets the
//! decoder start immediately instead of waiting for the next IDR.

use std::collections::VecDeque;

use crate::registry::frame::InterleavedFrame;

use super::{h264, h265};
use super::rtp::RtpPacket;

/// What an inbound video payload means for the cache
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyframeBoundary {
    /// Not a boundary: append to the current group
    None,
    /// Parameter sets: open a new group unless parameter sets already
    /// opened the current one (VPS, SPS, PPS arrive back to back)
    ParameterSets,
    /// IDR/IRAP slice: open a new group unless parameter sets already opened
    /// it or it belongs to the picture that opened it
    KeyframeStart,
}

/// Video codecs whose RTP payloads can be inspected for keyframes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyframeCodec {
    H264,
    H265,
}

impl KeyframeCodec {
    /// Map an `a=rtpmap` encoding name. Anything else is never cached.
    pub fn from_name(codec: &str) -> Option<Self> {
        match codec.to_ascii_uppercase().as_str() {
            "H264" => Some(Self::H264),
            "H265" | "HEVC" => Some(Self::H265),
            _ => None,
        }
    }

    /// Classify an RTP packet (interleaved header already stripped)
    ///
    /// Packets that fail to parse are not boundaries.
    pub fn classify(&self, rtp: bytes::Bytes) -> KeyframeBoundary {
        let packet = match RtpPacket::parse(rtp) {
            Ok(packet) => packet,
            Err(e) => {
                tracing::trace!(error = %e, "Video frame is not RTP");
                return KeyframeBoundary::None;
            }
        };
        match self {
            Self::H264 => h264::classify(&packet.payload),
            Self::H265 => h265::classify(&packet.payload),
        }
    }
}

/// Frames since the last keyframe boundary
#[derive(Debug, Default)]
pub struct KeyframeCache {
    frames: VecDeque<InterleavedFrame>,
    /// Oldest frames are dropped beyond this
    max_frames: Option<usize>,
    /// Current group was opened by parameter sets, no IDR seen yet
    awaiting_keyframe: bool,
    /// RTP timestamp of the keyframe picture that opened the current group
    keyframe_timestamp: Option<u32>,
    /// Total bytes currently held
    size: usize,
}

impl KeyframeCache {
    /// Unbounded cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Cache holding at most `max_frames` frames (`None` = unbounded)
    pub fn with_max_frames(max_frames: Option<usize>) -> Self {
        Self {
            max_frames,
            ..Self::default()
        }
    }

    /// Add a frame, resetting first if it begins a new keyframe group
    pub fn push(&mut self, frame: InterleavedFrame, boundary: KeyframeBoundary) {
        match boundary {
            KeyframeBoundary::ParameterSets => {
                if !self.awaiting_keyframe {
                    self.clear();
                    self.awaiting_keyframe = true;
                }
            }
            KeyframeBoundary::KeyframeStart => {
                let timestamp = rtp_timestamp(&frame);
                let same_picture = timestamp.is_some() && timestamp == self.keyframe_timestamp;
                if !self.awaiting_keyframe && !same_picture {
                    self.clear();
                }
                self.awaiting_keyframe = false;
                self.keyframe_timestamp = timestamp;
            }
            KeyframeBoundary::None => {}
        }

        if self.max_frames == Some(0) {
            return;
        }
        if let Some(max) = self.max_frames {
            while self.frames.len() >= max {
                if let Some(old) = self.frames.pop_front() {
                    self.size -= old.len();
                }
            }
        }

        self.size += frame.len();
        self.frames.push_back(frame);
    }

    /// Drop all frames
    pub fn clear(&mut self) {
        self.frames.clear();
        self.size = 0;
        self.awaiting_keyframe = false;
        self.keyframe_timestamp = None;
    }

    /// Cached frames, oldest first
    pub fn frames(&self) -> impl Iterator<Item = &InterleavedFrame> {
        self.frames.iter()
    }

    /// Number of cached frames
    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    /// Total cached bytes
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

fn rtp_timestamp(frame: &InterleavedFrame) -> Option<u32> {
    RtpPacket::parse(frame.payload()).ok().map(|p| p.timestamp)
}
