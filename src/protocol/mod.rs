//! RTSP wire protocol
//!
//! - [`demux`]: splits one TCP byte stream into RTSP requests and
//!   interleaved frames
//! - [`request`] / [`response`]: RTSP message types
//! - [`transport`]: `Transport` header channel negotiation
//!
//! ## Supported methods
//!
//! | Method    | Effect                                              |
//! |-----------|-----------------------------------------------------|
//! | OPTIONS   | lists methods                                       |
//! | ANNOUNCE  | session becomes the publisher of a path             |
//! | DESCRIBE  | session becomes a subscriber, receives the SDP      |
//! | SETUP     | binds interleaved channels to a track               |
//! | PLAY      | replays the keyframe cache, joins the fan-out       |
//! | TEARDOWN  | closes the connection                               |
//!
//! RECORD, PAUSE and anything else are answered with a plain 200.

pub mod constants;
pub mod demux;
pub mod request;
pub mod response;
pub mod transport;

pub use demux::{Demuxer, Packet};
pub use request::{Headers, Method, RtspRequest};
pub use response::RtspResponse;
pub use transport::InterleavedChannels;
