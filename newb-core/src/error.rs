//! Newb error types
//!
//! Error handling for transport I/O and protocol stack events.

use std::io;
use thiserror::Error;

/// Main error type for newb operations
#[derive(Error, Debug)]
pub enum NewbError {
    /// IO error during socket operations
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Stream transport read returned zero bytes
    #[error("Peer closed the connection")]
    PeerClosed,

    /// A layer was handed fewer bytes than its header needs
    #[error("Malformed header: need {need} bytes, have {have}")]
    MalformedHeader { need: usize, have: usize },

    /// An event produced nothing to deliver (deferred frame, stale
    /// duplicate, or a timeout with no matching pending entry)
    #[error("No message to deliver")]
    UnexpectedMessage,

    /// A header writer appended the wrong number of bytes
    #[error("Header writer appended {wrote} bytes, expected {expected}")]
    HeaderSize { expected: usize, wrote: usize },

    /// Invalid endpoint address
    #[error("Endpoint error: {0}")]
    Endpoint(String),
}

/// Result type alias for newb operations
pub type Result<T> = std::result::Result<T, NewbError>;

impl NewbError {
    /// Create an endpoint error with a message
    pub fn endpoint(msg: impl Into<String>) -> Self {
        Self::Endpoint(msg.into())
    }

    /// Check if this error is recoverable
    ///
    /// An `UnexpectedMessage` only means the current event delivered
    /// nothing; the connection stays usable and later events may still
    /// deliver. Transient IO conditions count as recoverable too.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Io(e) => matches!(
                e.kind(),
                io::ErrorKind::Interrupted
                    | io::ErrorKind::WouldBlock
                    | io::ErrorKind::TimedOut
            ),
            Self::UnexpectedMessage => true,
            _ => false,
        }
    }

    /// Check if this is a connection error
    #[must_use]
    pub const fn is_connection_error(&self) -> bool {
        matches!(self, Self::PeerClosed)
    }
}
