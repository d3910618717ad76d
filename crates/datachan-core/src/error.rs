//! Error types for datachan-core.

use thiserror::Error;

/// Main error type for data channel operations.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error from underlying system calls.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Transport layer error.
    #[error("transport error: {message}")]
    Transport { message: String },

    /// The transport endpoint was closed.
    #[error("connection closed")]
    ConnectionClosed,

    /// Codec error while encoding an outbound message.
    #[error("codec error: {message}")]
    Codec { message: String },

    /// Inbound control message could not be decoded.
    #[error("malformed message: {message}")]
    MalformedMessage { message: String },

    /// Inbound control message broke the stream id allocation rules.
    #[error("protocol violation: {message}")]
    ProtocolViolation { message: String },

    /// Text payload was not valid UTF-8.
    #[error("invalid UTF-8 payload: {0}")]
    Encoding(#[from] std::str::Utf8Error),

    /// No stream ids of the local parity are left.
    #[error("stream ids exhausted")]
    IdsExhausted,

    /// Bounded outbound queue is full.
    #[error("outbound queue full")]
    QueueFull,
}

impl Error {
    /// Returns true if this error only affects a single inbound message.
    ///
    /// The dispatch loop drops the offending message and keeps running.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Error::MalformedMessage { .. } | Error::ProtocolViolation { .. } | Error::Encoding(_)
        )
    }

    /// Returns true if the transport is gone and the manager can't continue.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Error::Transport { .. } | Error::ConnectionClosed | Error::Io(_)
        )
    }
}

/// Convenience result type for data channel operations.
pub type Result<T> = std::result::Result<T, Error>;
