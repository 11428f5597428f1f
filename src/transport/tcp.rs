//! TCP transport.
//!
//! TCP carries no service discovery, so the listener binds the configured
//! address for whatever service it is asked to publish and connectors dial
//! the peer's socket address directly.
//!
//! Closing a listener drops its socket, so the port stops completing
//! handshakes as soon as `close` returns.

use std::future::poll_fn;
use std::io;
use std::net::SocketAddr;
use std::sync::{Mutex, PoisonError};
use std::task::Poll;

use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;
use tracing::info;

use super::{listener_closed, wait_closed, Listener, ServiceId, Transport};

#[derive(Debug, Clone)]
pub struct TcpTransport {
    bind_addr: String,
}

impl TcpTransport {
    pub fn new(bind_addr: impl Into<String>) -> Self {
        Self {
            bind_addr: bind_addr.into(),
        }
    }
}

impl Transport for TcpTransport {
    type Stream = TcpStream;
    type Listener = TcpServiceListener;

    async fn bind(&self, service: ServiceId) -> io::Result<TcpServiceListener> {
        let inner = TcpListener::bind(&self.bind_addr).await?;
        let local_addr = inner.local_addr()?;
        info!(address = %local_addr, service = %service, "Listening");

        let (closed, _) = watch::channel(false);
        Ok(TcpServiceListener {
            inner: Mutex::new(Some(inner)),
            local_addr,
            closed,
        })
    }

    async fn connect(&self, peer: &str, service: ServiceId) -> io::Result<TcpStream> {
        tracing::debug!(peer, service = %service, "Dialing peer");
        let stream = TcpStream::connect(peer).await?;
        stream.set_nodelay(true)?;
        Ok(stream)
    }
}

pub struct TcpServiceListener {
    inner: Mutex<Option<TcpListener>>,
    local_addr: SocketAddr,
    closed: watch::Sender<bool>,
}

impl TcpServiceListener {
    /// Address the socket was bound to. Still answers after `close`.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    // The lock is only held while polling, never across an await.
    async fn accept_socket(&self) -> io::Result<(TcpStream, SocketAddr)> {
        poll_fn(|cx| {
            let inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
            match inner.as_ref() {
                Some(listener) => listener.poll_accept(cx),
                None => Poll::Ready(Err(listener_closed())),
            }
        })
        .await
    }
}

impl Listener for TcpServiceListener {
    type Stream = TcpStream;

    async fn accept(&self) -> io::Result<(TcpStream, String)> {
        let mut closed = self.closed.subscribe();

        tokio::select! {
            biased;

            _ = wait_closed(&mut closed) => Err(listener_closed()),

            res = self.accept_socket() => {
                let (stream, peer) = res?;
                stream.set_nodelay(true)?;
                Ok((stream, peer.to_string()))
            }
        }
    }

    fn close(&self) {
        self.closed.send_replace(true);
        let socket = self.inner.lock().unwrap_or_else(PoisonError::into_inner).take();
        if socket.is_some() {
            info!(address = %self.local_addr, "Listener closed");
        }
    }
}
