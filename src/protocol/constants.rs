//! Wire constants for RTSP and interleaved RTP

/// First byte of an interleaved binary frame (`$`, RFC 2326 §10.12)
pub const INTERLEAVED_MARKER: u8 = 0x24;

/// Marker + channel + 16-bit big-endian length
pub const INTERLEAVED_HEADER_SIZE: usize = 4;

/// Terminates the head of every RTSP message
pub const HEADER_TERMINATOR: &[u8] = b"\r\n\r\n";

/// Protocol version written on every response status line
pub const RTSP_VERSION: &str = "RTSP/1.0";

/// Methods advertised in the `Public` header of an OPTIONS response
pub const PUBLIC_METHODS: &str = "DESCRIBE, SETUP, TEARDOWN, PLAY, PAUSE, OPTIONS, ANNOUNCE, RECORD";

/// Default RTSP port (RFC 2326 §3.2)
pub const DEFAULT_RTSP_PORT: u16 = 554;

pub const HEADER_CSEQ: &str = "CSeq";
pub const HEADER_SESSION: &str = "Session";
pub const HEADER_CONTENT_LENGTH: &str = "Content-Length";
pub const HEADER_CONTENT_TYPE: &str = "Content-Type";
pub const HEADER_TRANSPORT: &str = "Transport";
pub const HEADER_RANGE: &str = "Range";
pub const HEADER_PUBLIC: &str = "Public";

/// MIME type of a session description body
pub const SDP_CONTENT_TYPE: &str = "application/sdp";
