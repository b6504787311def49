//! Incremental demultiplexer for a mixed RTSP / interleaved RTP byte stream
//!
//! A single TCP connection carries both text RTSP messages and binary
//! interleaved frames (RFC 2326 §10.12). The two are told apart by the first
//! byte of each unit:
//!
//! ```text
//! 0x24 ch len_hi len_lo <payload ...>          interleaved frame
//! <anything else> ... \r\n\r\n [body]          RTSP message
//! ```
//!
//! Bytes arrive in arbitrary chunks, so the parser is an explicit state
//! machine over one growable buffer. Each state declares how many buffered
//! bytes it needs before it can advance. [`Demuxer::next_packet`] either
//! advances and returns a packet, or returns `None` when it is waiting for
//! more input; the caller reads from the socket and tries again. Nothing here
//! blocks or sleeps.
//!
//! The emitted sequence depends only on the bytes, never on how they were
//! chunked.

use bytes::BytesMut;

use super::constants::{HEADER_TERMINATOR, INTERLEAVED_HEADER_SIZE, INTERLEAVED_MARKER};
use super::request::RtspRequest;
use crate::registry::InterleavedFrame;

/// One demultiplexed unit
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Packet {
    /// RTSP request (head plus optional body)
    Request(RtspRequest),
    /// Interleaved binary frame
    Frame(InterleavedFrame),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum State {
    /// Between units, need the first byte to classify
    Start,
    /// Saw the marker, need the 4-byte frame header
    FrameHeader,
    /// Need the whole `4 + len` byte frame
    FramePayload { channel: u8, len: usize },
    /// Accumulating an RTSP head; `scanned` bytes hold no terminator
    Head { scanned: usize },
    /// Head parsed, need `len` body bytes
    Body { request: Box<RtspRequest>, len: usize },
}

/// Resumable parser over a receive buffer
#[derive(Debug)]
pub struct Demuxer {
    buffer: BytesMut,
    state: State,
}

impl Demuxer {
    /// Create a demuxer with the default initial capacity (64KB)
    pub fn new() -> Self {
        Self::with_capacity(64 * 1024)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: BytesMut::with_capacity(capacity),
            state: State::Start,
        }
    }

    /// Append received bytes
    pub fn extend(&mut self, data: &[u8]) {
        self.buffer.extend_from_slice(data);
    }

    /// Receive buffer with at least `additional` bytes of spare capacity,
    /// for reading from a socket directly into it
    pub fn read_buffer(&mut self, additional: usize) -> &mut BytesMut {
        self.buffer.reserve(additional);
        &mut self.buffer
    }

    /// Bytes currently held in the receive buffer
    #[cfg(test)]
    fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Total bytes the current state needs buffered before it can advance
    fn required(&self) -> usize {
        match &self.state {
            State::Start => 1,
            State::FrameHeader => INTERLEAVED_HEADER_SIZE,
            State::FramePayload { len, .. } => INTERLEAVED_HEADER_SIZE + len,
            State::Head { scanned } => scanned + 1,
            State::Body { len, .. } => *len,
        }
    }

    /// Advance as far as buffered bytes allow and return the next packet
    ///
    /// Returns `None` when more input is needed. Call repeatedly until it
    /// returns `None` after every read.
    pub fn next_packet(&mut self) -> Option<Packet> {
        loop {
            if self.buffer.len() < self.required() {
                return None;
            }

            match std::mem::replace(&mut self.state, State::Start) {
                State::Start => {
                    // Stray line breaks between messages
                    if matches!(self.buffer[0], b'\r' | b'\n') {
                        let _ = self.buffer.split_to(1);
                        continue;
                    }
                    self.state = if self.buffer[0] == INTERLEAVED_MARKER {
                        State::FrameHeader
                    } else {
                        State::Head { scanned: 0 }
                    };
                }
                State::FrameHeader => {
                    let channel = self.buffer[1];
                    let len = u16::from_be_bytes([self.buffer[2], self.buffer[3]]) as usize;
                    self.state = State::FramePayload { channel, len };
                }
                State::FramePayload { channel, len } => {
                    let data = self.buffer.split_to(INTERLEAVED_HEADER_SIZE + len).freeze();
                    tracing::trace!(channel, len, "Interleaved frame");
                    return Some(Packet::Frame(InterleavedFrame::from_framed(channel, data)));
                }
                State::Head { scanned } => {
                    // Back up so a terminator split across reads is still found
                    let from = scanned.saturating_sub(HEADER_TERMINATOR.len() - 1);
                    match find_terminator(&self.buffer[from..]) {
                        Some(pos) => {
                            let head_len = from + pos + HEADER_TERMINATOR.len();
                            let head = self.buffer.split_to(head_len);
                            let request = RtspRequest::parse_head(&String::from_utf8_lossy(&head));
                            match request.content_length() {
                                Some(len) => {
                                    self.state = State::Body {
                                        request: Box::new(request),
                                        len,
                                    };
                                }
                                None => return Some(Packet::Request(request)),
                            }
                        }
                        None => {
                            self.state = State::Head {
                                scanned: self.buffer.len(),
                            };
                            return None;
                        }
                    }
                }
                State::Body { mut request, len } => {
                    request.body = Some(self.buffer.split_to(len).freeze());
                    return Some(Packet::Request(*request));
                }
            }
        }
    }
}

impl Default for Demuxer {
    fn default() -> Self {
        Self::new()
    }
}

impl Iterator for Demuxer {
    type Item = Packet;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_packet()
    }
}

fn find_terminator(haystack: &[u8]) -> Option<usize> {
    haystack
        .windows(HEADER_TERMINATOR.len())
        .position(|w| w == HEADER_TERMINATOR)
}
