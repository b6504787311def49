//! RTSP response builder
//!
//! ```text
//! RTSP/1.0 200 OK\r\n
//! CSeq: 2\r\n
//! Session: 1A2B3C4D\r\n
//! Content-Length: 142\r\n
//! \r\n
//! v=0\r\n...
//! ```
//!
//! Headers are written in insertion order. The body is written as raw bytes,
//! never re-encoded, so an SDP replayed to a subscriber stays byte-identical
//! to what the publisher announced.

use bytes::{BufMut, Bytes, BytesMut};

use super::constants::{HEADER_CONTENT_LENGTH, RTSP_VERSION};

/// An RTSP response under construction
#[must_use]
#[derive(Debug, Clone)]
pub struct RtspResponse {
    pub status_code: u16,
    pub reason: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<Bytes>,
}

impl RtspResponse {
    pub fn new(status_code: u16, reason: &str) -> Self {
        Self {
            status_code,
            reason: reason.to_string(),
            headers: Vec::new(),
            body: None,
        }
    }

    /// 200 OK
    pub fn ok() -> Self {
        Self::new(200, "OK")
    }

    /// 404 Not Found, the path has no publisher
    pub fn not_found() -> Self {
        Self::new(404, "Not Found")
    }

    /// 406 Not Acceptable, the path already has a publisher
    pub fn not_acceptable() -> Self {
        Self::new(406, "Not Acceptable")
    }

    /// 455 Method Not Valid in This State (RFC 2326 §7.1.1)
    pub fn method_not_valid() -> Self {
        Self::new(455, "Method Not Valid in This State")
    }

    /// Replace status code and reason, keeping headers
    pub fn status(mut self, status_code: u16, reason: &str) -> Self {
        self.status_code = status_code;
        self.reason = reason.to_string();
        self
    }

    pub fn header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.push((name.to_string(), value.into()));
        self
    }

    /// Add a header only when a value is present
    pub fn header_opt(self, name: &str, value: Option<&str>) -> Self {
        match value {
            Some(value) => self.header(name, value),
            None => self,
        }
    }

    /// Attach a body. `Content-Length` is added when serializing.
    pub fn body(mut self, body: Bytes) -> Self {
        self.body = Some(body);
        self
    }

    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Serialize to wire format
    pub fn serialize(&self) -> Bytes {
        let body_len = self.body.as_ref().map_or(0, |b| b.len());
        let mut out = BytesMut::with_capacity(128 + body_len);

        out.put_slice(
            format!("{} {} {}\r\n", RTSP_VERSION, self.status_code, self.reason).as_bytes(),
        );
        for (name, value) in &self.headers {
            out.put_slice(format!("{}: {}\r\n", name, value).as_bytes());
        }
        if let Some(body) = &self.body {
            if self.get_header(HEADER_CONTENT_LENGTH).is_none() {
                out.put_slice(format!("{}: {}\r\n", HEADER_CONTENT_LENGTH, body.len()).as_bytes());
            }
            out.put_slice(b"\r\n");
            out.put_slice(body);
        } else {
            out.put_slice(b"\r\n");
        }

        out.freeze()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serialize_without_body() {
        let resp = RtspResponse::ok()
            .header("CSeq", "1")
            .header("Session", "abc");
        let wire = resp.serialize();
        assert_eq!(&wire[..], b"RTSP/1.0 200 OK\r\nCSeq: 1\r\nSession: abc\r\n\r\n");
    }

    #[test]
    fn test_serialize_with_body() {
        let resp = RtspResponse::ok()
            .header("CSeq", "2")
            .body(Bytes::from_static(b"v=0\r\n"));
        let wire = resp.serialize();
        assert_eq!(
            &wire[..],
            b"RTSP/1.0 200 OK\r\nCSeq: 2\r\nContent-Length: 5\r\n\r\nv=0\r\n"
        );
    }

    #[test]
    fn test_body_bytes_untouched() {
        let body = Bytes::from_static(&[0xE2, 0x82, 0xAC, b'\r', b'\n']);
        let resp = RtspResponse::ok().body(body.clone());
        let wire = resp.serialize();
        assert!(wire.ends_with(&body));
        assert!(wire.windows(19).any(|w| w == b"Content-Length: 5\r\n"));
    }

    #[test]
    fn test_status_override_keeps_headers() {
        let resp = RtspResponse::ok().header("CSeq", "7").status(406, "Not Acceptable");
        assert_eq!(resp.status_code, 406);
        assert_eq!(resp.get_header("cseq"), Some("7"));
        assert!(resp.serialize().starts_with(b"RTSP/1.0 406 Not Acceptable\r\n"));
    }

    #[test]
    fn test_header_opt() {
        let resp = RtspResponse::ok()
            .header_opt("Range", None)
            .header_opt("Transport", Some("RTP/AVP/TCP;interleaved=0-1"));
        assert!(resp.get_header("Range").is_none());
        assert_eq!(resp.get_header("Transport"), Some("RTP/AVP/TCP;interleaved=0-1"));
    }
}
