use tokio::io::BufStream;

use crate::error::{RelayError, Result};
use crate::protocol::frame;
use crate::transport::DuplexStream;

/// Lifecycle of a connection.
///
/// `Connecting` is only reachable through [`Connection::connecting`]; once a
/// connection has been closed it stays closed and a new one must be made.
pub enum ConnectionState<S> {
    Closed,
    Connecting,
    Open(BufStream<S>),
}

/// Observable phase of a [`Connection`], without the stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Closed,
    Connecting,
    Open,
}

/// Exclusively owned duplex stream plus its lifecycle state.
///
/// Any I/O failure closes the connection before the error is returned.
pub struct Connection<S> {
    peer: String,
    state: ConnectionState<S>,
}

impl<S: DuplexStream> Connection<S> {
    pub fn closed(peer: impl Into<String>) -> Self {
        Self {
            peer: peer.into(),
            state: ConnectionState::Closed,
        }
    }

    pub fn connecting(peer: impl Into<String>) -> Self {
        Self {
            peer: peer.into(),
            state: ConnectionState::Connecting,
        }
    }

    /// Wraps a stream that is already connected, as handed out by `accept`.
    pub fn open(peer: impl Into<String>, stream: S) -> Self {
        Self {
            peer: peer.into(),
            state: ConnectionState::Open(BufStream::new(stream)),
        }
    }

    /// Moves a `Connecting` connection to `Open`.
    ///
    /// Fails with `NotConnected` from any other state; the stream is dropped.
    pub fn establish(&mut self, stream: S) -> Result<()> {
        match self.state {
            ConnectionState::Connecting => {
                self.state = ConnectionState::Open(BufStream::new(stream));
                Ok(())
            }
            _ => Err(RelayError::NotConnected),
        }
    }

    pub fn peer(&self) -> &str {
        &self.peer
    }

    pub fn phase(&self) -> Phase {
        match self.state {
            ConnectionState::Closed => Phase::Closed,
            ConnectionState::Connecting => Phase::Connecting,
            ConnectionState::Open(_) => Phase::Open,
        }
    }

    pub fn is_open(&self) -> bool {
        self.phase() == Phase::Open
    }

    /// Releases the stream. Returns true if the connection was open.
    pub fn close(&mut self) -> bool {
        let was_open = self.is_open();
        self.state = ConnectionState::Closed;
        if was_open {
            tracing::debug!(peer = %self.peer, "Connection closed");
        }
        was_open
    }

    fn stream(&mut self) -> Result<&mut BufStream<S>> {
        match &mut self.state {
            ConnectionState::Open(stream) => Ok(stream),
            _ => Err(RelayError::NotConnected),
        }
    }

    fn check<T>(&mut self, res: std::io::Result<T>) -> Result<T> {
        res.map_err(|e| {
            self.close();
            RelayError::from(e)
        })
    }

    /// Reads the next request. `Ok(None)` means the peer closed cleanly; the
    /// connection is closed in that case too.
    pub async fn read_request(&mut self) -> Result<Option<String>> {
        let res = frame::read_request(self.stream()?).await;
        let url = self.check(res)?;
        if url.is_none() {
            self.close();
        }
        Ok(url)
    }

    pub async fn write_request(&mut self, url: &str) -> Result<()> {
        let res = frame::write_request(self.stream()?, url).await;
        self.check(res)
    }

    pub async fn read_response(&mut self) -> Result<String> {
        let res = frame::read_response(self.stream()?).await;
        self.check(res)
    }

    pub async fn write_response(&mut self, body: &str) -> Result<()> {
        let res = frame::write_response(self.stream()?, body).await;
        self.check(res)
    }
}
