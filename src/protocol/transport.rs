//! `Transport` header handling for interleaved TCP delivery
//!
//! ```text
//! Transport: RTP/AVP/TCP;unicast;interleaved=0-1
//! ```
//!
//! Only the `interleaved=<rtp>[-<rtcp>]` parameter matters to the relay. The
//! rest of the header is echoed back to the client untouched.

/// Channel pair negotiated by SETUP
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InterleavedChannels {
    /// Channel carrying RTP
    pub rtp: u8,
    /// Channel carrying RTCP, when the client asked for one
    pub rtcp: Option<u8>,
}

impl InterleavedChannels {
    /// Find the `interleaved=` parameter in a Transport header value
    ///
    /// ```
    /// use rtsp_relay::protocol::transport::InterleavedChannels;
    ///
    /// let ch = InterleavedChannels::parse("RTP/AVP/TCP;unicast;interleaved=2-3").unwrap();
    /// assert_eq!((ch.rtp, ch.rtcp), (2, Some(3)));
    ///
    /// assert!(InterleavedChannels::parse("RTP/AVP;unicast;client_port=8000-8001").is_none());
    /// ```
    pub fn parse(header: &str) -> Option<Self> {
        let start = header.find("interleaved=")? + "interleaved=".len();
        let value = &header[start..];

        let (rtp, rest) = split_digits(value);
        let rtp = rtp.parse::<u8>().ok()?;

        let rtcp = rest
            .strip_prefix('-')
            .map(split_digits)
            .and_then(|(digits, _)| digits.parse::<u8>().ok());

        Some(Self { rtp, rtcp })
    }
}

/// Split leading ASCII digits off `s`
fn split_digits(s: &str) -> (&str, &str) {
    let end = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
    s.split_at(end)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_pair() {
        let ch = InterleavedChannels::parse("RTP/AVP/TCP;unicast;interleaved=2-3").unwrap();
        assert_eq!(ch.rtp, 2);
        assert_eq!(ch.rtcp, Some(3));
    }

    #[test]
    fn test_parse_single_channel() {
        let ch = InterleavedChannels::parse("RTP/AVP/TCP;interleaved=4;mode=record").unwrap();
        assert_eq!(ch.rtp, 4);
        assert_eq!(ch.rtcp, None);
    }

    #[test]
    fn test_parse_in_middle() {
        let ch = InterleavedChannels::parse("RTP/AVP/TCP;interleaved=0-1;mode=record").unwrap();
        assert_eq!((ch.rtp, ch.rtcp), (0, Some(1)));
    }

    #[test]
    fn test_missing_or_invalid() {
        assert!(InterleavedChannels::parse("RTP/AVP;unicast;client_port=5000-5001").is_none());
        assert!(InterleavedChannels::parse("RTP/AVP/TCP;interleaved=").is_none());
        assert!(InterleavedChannels::parse("RTP/AVP/TCP;interleaved=300-301").is_none());
    }

    #[test]
    fn test_bad_rtcp_channel_dropped() {
        let ch = InterleavedChannels::parse("RTP/AVP/TCP;interleaved=6-x").unwrap();
        assert_eq!((ch.rtp, ch.rtcp), (6, None));
    }
}
