//! Media handling for the relay
//!
//! This module provides:
//! - SDP parsing and per-track metadata
//! - RTP header parsing
//! - H.264 / H.265 keyframe detection on RTP payloads
//! - The keyframe cache for late-joiner support

pub mod h264;
pub mod h265;
pub mod keyframe;
pub mod rtp;
pub mod sdp;
pub mod track;

pub use keyframe::{KeyframeBoundary, KeyframeCache, KeyframeCodec};
pub use rtp::{RtpError, RtpPacket};
pub use sdp::{MediaDescription, RtpMap, SessionDescription};
pub use track::{MediaTracks, Track, TrackKind};
