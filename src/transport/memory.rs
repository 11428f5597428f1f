//! In-process transport backed by `tokio::io::duplex` pipes.
//!
//! Listeners register under their service identifier in a shared registry;
//! `connect` hands the far end of a fresh pipe to the registered listener.

use std::collections::HashMap;
use std::io;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use tokio::io::DuplexStream;
use tokio::sync::{mpsc, watch};

use super::{listener_closed, wait_closed, Listener, ServiceId, Transport};

/// Per-direction buffer of each pipe.
const PIPE_CAPACITY: usize = 64 * 1024;

type Incoming = (DuplexStream, String);
type Registry = Arc<Mutex<HashMap<ServiceId, mpsc::UnboundedSender<Incoming>>>>;

/// Transport whose peers live in the same process. Clones share one registry.
#[derive(Debug, Clone, Default)]
pub struct MemoryTransport {
    registry: Registry,
    next_pipe: Arc<AtomicU64>,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Transport for MemoryTransport {
    type Stream = DuplexStream;
    type Listener = MemoryListener;

    async fn bind(&self, service: ServiceId) -> io::Result<MemoryListener> {
        let mut registry = self.registry.lock().unwrap_or_else(PoisonError::into_inner);

        if registry.get(&service).is_some_and(|tx| !tx.is_closed()) {
            return Err(io::Error::new(
                io::ErrorKind::AddrInUse,
                format!("service {service} already bound"),
            ));
        }

        let (tx, rx) = mpsc::unbounded_channel();
        registry.insert(service, tx.clone());
        tracing::debug!(service = %service, "Memory listener bound");

        let (closed, _) = watch::channel(false);
        Ok(MemoryListener {
            service,
            registry: self.registry.clone(),
            registration: tx,
            incoming: tokio::sync::Mutex::new(rx),
            closed,
        })
    }

    async fn connect(&self, peer: &str, service: ServiceId) -> io::Result<DuplexStream> {
        let refused = || {
            io::Error::new(
                io::ErrorKind::ConnectionRefused,
                format!("no listener for service {service} at {peer}"),
            )
        };

        let tx = self
            .registry
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&service)
            .cloned()
            .ok_or_else(refused)?;

        let (local, remote) = tokio::io::duplex(PIPE_CAPACITY);
        let id = self.next_pipe.fetch_add(1, Ordering::Relaxed);
        tx.send((remote, format!("memory-{id}")))
            .map_err(|_| refused())?;

        Ok(local)
    }
}

pub struct MemoryListener {
    service: ServiceId,
    registry: Registry,
    registration: mpsc::UnboundedSender<Incoming>,
    incoming: tokio::sync::Mutex<mpsc::UnboundedReceiver<Incoming>>,
    closed: watch::Sender<bool>,
}

impl Listener for MemoryListener {
    type Stream = DuplexStream;

    async fn accept(&self) -> io::Result<(DuplexStream, String)> {
        let mut closed = self.closed.subscribe();

        tokio::select! {
            biased;

            _ = wait_closed(&mut closed) => Err(listener_closed()),

            next = async { self.incoming.lock().await.recv().await } => {
                next.ok_or_else(listener_closed)
            }
        }
    }

    fn close(&self) {
        if self.closed.send_replace(true) {
            return;
        }

        let mut registry = self.registry.lock().unwrap_or_else(PoisonError::into_inner);
        // A newer listener may have taken over the service.
        if registry.get(&self.service).is_some_and(|tx| tx.same_channel(&self.registration)) {
            registry.remove(&self.service);
        }
    }
}

impl Drop for MemoryListener {
    fn drop(&mut self) {
        self.close();
    }
}
