//! SDP (RFC 8866) extraction
//!
//! The relay never rewrites a session description: the publisher's SDP is
//! stored verbatim and replayed to subscribers. What it needs from the SDP
//! is per-track metadata, used to recognise SETUP targets and to decide
//! whether video frames can be inspected for keyframes.
//!
//! ```text
//! m=video 0 RTP/AVP 96                ← media block: kind + payload formats
//! a=rtpmap:96 H264/90000              ← codec / clock rate
//! a=control:streamid=0                ← SETUP target for this track
//! ```
//!
//! Parsing is lenient: lines it does not understand are ignored, and
//! anything unusable yields empty metadata rather than an error.

/// One `a=rtpmap` entry (or a static payload type)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RtpMap {
    pub payload: u8,
    pub codec: String,
    pub rate: u32,
}

/// One `m=` block
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MediaDescription {
    /// `video`, `audio`, `application`, ...
    pub kind: String,
    /// Payload format list from the `m=` line
    pub formats: Vec<u8>,
    /// `a=control` value, if present
    pub control: Option<String>,
    /// `a=rtpmap` entries in order of appearance
    pub rtp: Vec<RtpMap>,
}

/// Parsed session description (only the parts the relay uses)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionDescription {
    pub media: Vec<MediaDescription>,
}

impl SessionDescription {
    /// Parse SDP text
    pub fn parse(text: &str) -> Self {
        let mut media: Vec<MediaDescription> = Vec::new();

        for line in text.lines() {
            let line = line.trim_end_matches('\r');
            let Some((kind, value)) = line.split_once('=') else {
                continue;
            };

            match kind {
                "m" => media.push(parse_media_line(value)),
                "a" => {
                    // Session-level attributes (before any m=) are ignored
                    let Some(current) = media.last_mut() else {
                        continue;
                    };
                    if let Some(control) = value.strip_prefix("control:") {
                        current.control = Some(control.trim().to_string());
                    } else if let Some(map) = value.strip_prefix("rtpmap:") {
                        if let Some(rtp) = parse_rtpmap(map) {
                            current.rtp.push(rtp);
                        }
                    }
                }
                _ => {}
            }
        }

        Self { media }
    }

    /// First media block of the given kind
    ///
    /// Later blocks of the same kind are ignored; one video and one audio
    /// track are relayed per path.
    pub fn first(&self, kind: &str) -> Option<&MediaDescription> {
        self.media.iter().find(|m| m.kind == kind)
    }
}

impl MediaDescription {
    /// Codec of the block: first `a=rtpmap`, falling back to the static
    /// RTP/AVP table for the first listed format
    pub fn primary_rtp(&self) -> Option<RtpMap> {
        self.rtp
            .first()
            .cloned()
            .or_else(|| self.formats.first().and_then(|pt| static_payload(*pt)))
    }
}

/// `m=<kind> <port> <proto> <fmt> ...`
fn parse_media_line(value: &str) -> MediaDescription {
    let mut parts = value.split_whitespace();
    let kind = parts.next().unwrap_or_default().to_string();
    let formats = parts.skip(2).filter_map(|f| f.parse::<u8>().ok()).collect();

    MediaDescription {
        kind,
        formats,
        control: None,
        rtp: Vec::new(),
    }
}

/// `<pt> <codec>/<rate>[/<channels>]`
fn parse_rtpmap(value: &str) -> Option<RtpMap> {
    let (payload, encoding) = value.trim().split_once(char::is_whitespace)?;
    let payload = payload.parse::<u8>().ok()?;
    let mut encoding = encoding.trim().split('/');
    let codec = encoding.next()?.to_string();
    let rate = encoding.next().and_then(|r| r.parse::<u32>().ok())?;

    Some(RtpMap {
        payload,
        codec,
        rate,
    })
}

/// Static payload types (RFC 3551 §6) that are commonly sent without rtpmap
fn static_payload(payload: u8) -> Option<RtpMap> {
    let (codec, rate) = match payload {
        0 => ("PCMU", 8000),
        8 => ("PCMA", 8000),
        14 => ("MPA", 90000),
        26 => ("JPEG", 90000),
        32 => ("MPV", 90000),
        33 => ("MP2T", 90000),
        34 => ("H263", 90000),
        _ => return None,
    };
    Some(RtpMap {
        payload,
        codec: codec.to_string(),
        rate,
    })
}
