//! Duplex-stream transport capability.
//!
//! The relay only needs an ordered, reliable byte stream between two peers
//! and a way to listen for such streams under a well-known service
//! identifier. The hosting platform supplies the concrete implementation:
//!
//! - **`tcp`**: TCP sockets standing in for the radio serial link
//! - **`memory`**: in-process duplex pipes, used for loopback and tests
//!
//! Transports are passed explicitly to the acceptor and the connector.

use std::fmt;
use std::future::Future;
use std::io;

use serde::{Deserialize, Serialize};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::watch;
use uuid::Uuid;

pub mod memory;
pub mod tcp;

pub use memory::{MemoryListener, MemoryTransport};
pub use tcp::{TcpServiceListener, TcpTransport};

/// Identifier a listener publishes so a connector can find the relay service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ServiceId(pub Uuid);

/// Serial-port-profile service the relay listens under.
pub const SERIAL_PORT_SERVICE: ServiceId =
    ServiceId(Uuid::from_u128(0x00001101_0000_1000_8000_00805f9b34fb));

impl Default for ServiceId {
    fn default() -> Self {
        SERIAL_PORT_SERVICE
    }
}

impl fmt::Display for ServiceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<Uuid> for ServiceId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

/// A connected duplex byte stream.
pub trait DuplexStream: AsyncRead + AsyncWrite + Unpin + Send + 'static {}

impl<T> DuplexStream for T where T: AsyncRead + AsyncWrite + Unpin + Send + 'static {}

/// Listening endpoint bound under a service identifier.
pub trait Listener: Send + Sync + 'static {
    type Stream: DuplexStream;

    /// Waits for the next incoming stream. Returns the stream and a label
    /// describing the remote peer.
    fn accept(&self) -> impl Future<Output = io::Result<(Self::Stream, String)>> + Send;

    /// Closes the endpoint. A pending `accept` returns an error right away,
    /// and so does every later one. Closing twice is a no-op.
    fn close(&self);
}

/// Platform capability to listen for and open duplex streams.
pub trait Transport: Send + Sync + 'static {
    type Stream: DuplexStream;
    type Listener: Listener<Stream = Self::Stream>;

    fn bind(&self, service: ServiceId) -> impl Future<Output = io::Result<Self::Listener>> + Send;

    fn connect(
        &self,
        peer: &str,
        service: ServiceId,
    ) -> impl Future<Output = io::Result<Self::Stream>> + Send;
}

/// Error a closed listener hands back from `accept`.
pub(crate) fn listener_closed() -> io::Error {
    io::Error::new(io::ErrorKind::ConnectionAborted, "listener closed")
}

/// Resolves once the close flag is set, or once its sender is gone.
pub(crate) async fn wait_closed(closed: &mut watch::Receiver<bool>) {
    while !*closed.borrow_and_update() {
        if closed.changed().await.is_err() {
            return;
        }
    }
}
