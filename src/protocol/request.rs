//! RTSP request parsing
//!
//! ```text
//! Method SP Request-URI SP RTSP-Version CRLF
//! *(Header: Value CRLF)
//! CRLF
//! [body]
//! ```
//!
//! Parsing is lenient: the version token is not validated, and header lines
//! without a colon are skipped instead of failing the whole message. The
//! demultiplexer hands over only complete heads, so there is no partial-input
//! case here.

use std::fmt;

use bytes::Bytes;

use super::constants::{HEADER_CONTENT_LENGTH, HEADER_CSEQ};

/// RTSP method token
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Method {
    Options,
    Announce,
    Describe,
    Setup,
    Play,
    Record,
    Pause,
    Teardown,
    GetParameter,
    SetParameter,
    /// Anything else, kept verbatim
    Other(String),
}

impl Method {
    /// Parse a method token. Method names are case-sensitive (RFC 2326 §6.1).
    pub fn parse(token: &str) -> Self {
        match token {
            "OPTIONS" => Method::Options,
            "ANNOUNCE" => Method::Announce,
            "DESCRIBE" => Method::Describe,
            "SETUP" => Method::Setup,
            "PLAY" => Method::Play,
            "RECORD" => Method::Record,
            "PAUSE" => Method::Pause,
            "TEARDOWN" => Method::Teardown,
            "GET_PARAMETER" => Method::GetParameter,
            "SET_PARAMETER" => Method::SetParameter,
            other => Method::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Method::Options => "OPTIONS",
            Method::Announce => "ANNOUNCE",
            Method::Describe => "DESCRIBE",
            Method::Setup => "SETUP",
            Method::Play => "PLAY",
            Method::Record => "RECORD",
            Method::Pause => "PAUSE",
            Method::Teardown => "TEARDOWN",
            Method::GetParameter => "GET_PARAMETER",
            Method::SetParameter => "SET_PARAMETER",
            Method::Other(token) => token,
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Header map with unique names
///
/// Names keep the spelling of their last occurrence. Lookups and
/// replacement are case-insensitive (RFC 2326 §4.2), and a repeated name
/// replaces the earlier value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    entries: Vec<(String, String)>,
}

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a header
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self
            .entries
            .iter_mut()
            .find(|(key, _)| key.eq_ignore_ascii_case(&name))
        {
            Some(entry) => *entry = (name, value),
            None => self.entries.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// A parsed RTSP request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RtspRequest {
    pub method: Method,
    /// Request-URI exactly as sent
    pub uri: String,
    /// Version token, not validated
    pub version: String,
    pub headers: Headers,
    /// Body of `Content-Length` bytes, if any
    pub body: Option<Bytes>,
}

impl RtspRequest {
    /// Parse a request head (request line and header lines, terminator
    /// included or not). Never fails; malformed header lines are skipped.
    pub fn parse_head(head: &str) -> Self {
        let mut lines = head
            .split("\r\n")
            .flat_map(|l| l.split('\n'))
            .skip_while(|l| l.trim().is_empty());

        let request_line = lines.next().unwrap_or_default();
        let mut parts = request_line.split_whitespace();
        let method = Method::parse(parts.next().unwrap_or_default());
        let uri = parts.next().unwrap_or_default().to_string();
        let version = parts.next().unwrap_or_default().to_string();

        let mut headers = Headers::new();
        for line in lines {
            if line.is_empty() {
                break;
            }
            match line.split_once(':') {
                Some((name, value)) => headers.insert(name.trim(), value.trim()),
                None => {
                    tracing::debug!(line, "Skipping malformed header line");
                }
            }
        }

        Self {
            method,
            uri,
            version,
            headers,
            body: None,
        }
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)
    }

    /// The CSeq header, echoed on every response (RFC 2326 §12.17)
    pub fn cseq(&self) -> Option<&str> {
        self.header(HEADER_CSEQ)
    }

    /// Declared body length. Missing, zero or unparsable values mean no body.
    pub fn content_length(&self) -> Option<usize> {
        let raw = self.header(HEADER_CONTENT_LENGTH)?;
        match raw.trim().parse::<usize>() {
            Ok(0) => None,
            Ok(len) => Some(len),
            Err(_) => {
                tracing::warn!(value = raw, "Ignoring unparsable Content-Length");
                None
            }
        }
    }

    /// Body decoded as text (lossy)
    pub fn body_text(&self) -> Option<String> {
        self.body
            .as_ref()
            .map(|b| String::from_utf8_lossy(b).into_owned())
    }

    /// Stream path derived from the request URI
    pub fn path(&self) -> String {
        uri_path(&self.uri)
    }

    /// Last `/`-separated segment of the request URI
    pub fn control_segment(&self) -> &str {
        last_segment(&self.uri)
    }
}

/// Path component of an RTSP URL, query included
///
/// `rtsp://host:554/live/cam?x=1` gives `/live/cam?x=1`. A URL without a path
/// maps to `/`. Input that is already a path is returned unchanged.
pub fn uri_path(uri: &str) -> String {
    let uri = uri.split('#').next().unwrap_or_default();
    let rest = match uri.find("://") {
        Some(pos) => &uri[pos + 3..],
        None => return if uri.is_empty() { "/".into() } else { uri.into() },
    };
    match rest.find(['/', '?']) {
        Some(pos) if rest[pos..].starts_with('/') => rest[pos..].to_string(),
        Some(pos) => format!("/{}", &rest[pos..]),
        None => "/".to_string(),
    }
}

/// Text after the last `/`
pub fn last_segment(uri: &str) -> &str {
    match uri.rfind('/') {
        Some(pos) => &uri[pos + 1..],
        None => uri,
    }
}
