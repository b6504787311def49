//! Per-track metadata derived from a session description
//!
//! A session knows at most one video and one audio track. SETUP binds
//! interleaved channels to whichever track its URL names, and the publisher's
//! video channel is the one inspected for keyframes.

use super::keyframe::KeyframeCodec;
use super::sdp::SessionDescription;
use crate::protocol::request::last_segment;
use crate::protocol::transport::InterleavedChannels;

/// Track kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackKind {
    Video,
    Audio,
}

/// One media track
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Track {
    /// `a=control` identifier (may be a bare token or a full URL)
    pub control: Option<String>,
    /// Encoding name from `a=rtpmap`
    pub codec: Option<String>,
    pub clock_rate: Option<u32>,
    pub payload_type: Option<u8>,
    /// Bound by SETUP
    pub rtp_channel: Option<u8>,
    pub rtcp_channel: Option<u8>,
}

impl Track {
    /// Whether a SETUP URL's trailing segment names this track
    pub fn matches_control(&self, segment: &str) -> bool {
        match self.control.as_deref() {
            Some(control) if !segment.is_empty() => {
                control == segment || last_segment(control) == segment
            }
            _ => false,
        }
    }

    pub fn bind(&mut self, channels: InterleavedChannels) {
        self.rtp_channel = Some(channels.rtp);
        self.rtcp_channel = channels.rtcp;
    }

    pub fn keyframe_codec(&self) -> Option<KeyframeCodec> {
        self.codec.as_deref().and_then(KeyframeCodec::from_name)
    }
}

/// Video and audio track of a session
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MediaTracks {
    pub video: Option<Track>,
    pub audio: Option<Track>,
}

impl MediaTracks {
    /// Derive tracks from SDP text
    ///
    /// Absent or malformed input yields no tracks.
    pub fn from_sdp(text: &str) -> Self {
        let sdp = SessionDescription::parse(text);
        let track = |kind: &str| {
            sdp.first(kind).map(|media| {
                let rtp = media.primary_rtp();
                Track {
                    control: media.control.clone(),
                    codec: rtp.as_ref().map(|r| r.codec.clone()),
                    clock_rate: rtp.as_ref().map(|r| r.rate),
                    payload_type: rtp.as_ref().map(|r| r.payload),
                    rtp_channel: None,
                    rtcp_channel: None,
                }
            })
        };

        Self {
            video: track("video"),
            audio: track("audio"),
        }
    }

    /// Bind channels to the track named by `segment`, video first
    pub fn bind(&mut self, segment: &str, channels: InterleavedChannels) -> Option<TrackKind> {
        if let Some(video) = self.video.as_mut().filter(|t| t.matches_control(segment)) {
            video.bind(channels);
            return Some(TrackKind::Video);
        }
        if let Some(audio) = self.audio.as_mut().filter(|t| t.matches_control(segment)) {
            audio.bind(channels);
            return Some(TrackKind::Audio);
        }
        None
    }

    /// Video RTP channel and codec, when both are known and the codec can be
    /// inspected for keyframes
    pub fn keyframe_source(&self) -> Option<(u8, KeyframeCodec)> {
        let video = self.video.as_ref()?;
        Some((video.rtp_channel?, video.keyframe_codec()?))
    }

    /// Clear channel bindings, keeping codec metadata
    pub fn without_bindings(&self) -> Self {
        let strip = |t: &Track| Track {
            rtp_channel: None,
            rtcp_channel: None,
            ..t.clone()
        };
        Self {
            video: self.video.as_ref().map(strip),
            audio: self.audio.as_ref().map(strip),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.video.is_none() && self.audio.is_none()
    }
}
