//! Error types for the relay
//!
//! Protocol violations inside a single RTSP message are tolerated by the
//! parser and never show up here. Registry rejections become status codes in
//! the method handler. What remains are the failures that end a session.

/// Top-level error type
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Socket or listener failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The session's transport went away (writer failed, idle timeout, ...)
    #[error("transport closed: {0}")]
    Transport(String),
}

/// Convenience alias for `Result<T, Error>`
pub type Result<T> = std::result::Result<T, Error>;
