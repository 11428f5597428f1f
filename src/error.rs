//! Error taxonomy for the relay protocol layer.
//!
//! Fetch failures never show up here: the fetch gateway turns them into
//! diagnostic pages before they reach a session.

use std::io;

use thiserror::Error;

/// Errors surfaced by connections, sessions and the client connector.
#[derive(Debug, Error)]
pub enum RelayError {
    /// Accept, connect, read or write failed on the underlying stream.
    #[error("transport error: {0}")]
    Transport(#[source] io::Error),

    /// The platform refused access to the transport.
    #[error("permission denied: {0}")]
    Permission(#[source] io::Error),

    /// `send_and_receive` was called without an open connection.
    #[error("not connected")]
    NotConnected,
}

impl RelayError {
    /// Returns true if the error was caused by the peer closing its stream.
    pub fn is_eof(&self) -> bool {
        matches!(self, RelayError::Transport(e) if e.kind() == io::ErrorKind::UnexpectedEof)
    }
}

impl From<io::Error> for RelayError {
    fn from(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::PermissionDenied => RelayError::Permission(err),
            _ => RelayError::Transport(err),
        }
    }
}

pub type Result<T> = std::result::Result<T, RelayError>;
