//! Connection acceptor.
//!
//! Binds the relay service, accepts connections and spawns one session task
//! per connection. Stopping flips the running flag and closes the listening
//! endpoint, which wakes the pending accept; that wake-up is a normal
//! shutdown, not a fault. Any other accept error ends the loop for good.
//! Sessions already spawned are unaffected either way.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::error::Result;
use crate::fetch::Fetch;
use crate::observer::{SharedHtml, SharedStatus};
use crate::protocol::Connection;
use crate::server::session::ServerSession;
use crate::transport::{Listener, ServiceId, Transport, SERIAL_PORT_SERVICE};

pub struct Acceptor<T, F> {
    transport: T,
    service: ServiceId,
    fetcher: Arc<F>,
    status: SharedStatus,
    html: SharedHtml,
}

impl<T: Transport, F: Fetch> Acceptor<T, F> {
    pub fn new(transport: T, fetcher: F, status: SharedStatus, html: SharedHtml) -> Self {
        Self {
            transport,
            service: SERIAL_PORT_SERVICE,
            fetcher: Arc::new(fetcher),
            status,
            html,
        }
    }

    pub fn with_service(mut self, service: ServiceId) -> Self {
        self.service = service;
        self
    }

    /// Binds the service and spawns the accept loop.
    ///
    /// A bind failure is reported to the status observer and returned; no
    /// task is spawned in that case.
    pub async fn start(self) -> Result<AcceptorHandle<T::Listener>> {
        let listener = match self.transport.bind(self.service).await {
            Ok(listener) => Arc::new(listener),
            Err(e) => {
                error!(service = %self.service, error = %e, "Failed to bind service");
                self.status.on_status(&format!("Failed to start server: {e}"));
                return Err(e.into());
            }
        };

        info!(service = %self.service, "Relay server started");
        self.status.on_status("Server listening for connections");

        let running = Arc::new(AtomicBool::new(true));
        let task = tokio::spawn(accept_loop(
            listener.clone(),
            running.clone(),
            self.fetcher,
            self.status,
            self.html,
        ));

        Ok(AcceptorHandle {
            running,
            listener,
            task,
        })
    }
}

async fn accept_loop<L, F>(
    listener: Arc<L>,
    running: Arc<AtomicBool>,
    fetcher: Arc<F>,
    status: SharedStatus,
    html: SharedHtml,
) where
    L: Listener,
    F: Fetch,
{
    while running.load(Ordering::SeqCst) {
        status.on_status("Waiting for connections...");

        let (stream, peer) = match listener.accept().await {
            Ok(accepted) => accepted,
            Err(e) => {
                if running.load(Ordering::SeqCst) {
                    error!(error = %e, "Accept failed, no longer listening");
                    status.on_status(&format!("Connection error: {e}"));
                } else {
                    debug!("Listener closed, leaving accept loop");
                }
                break;
            }
        };

        info!("Accepted connection from {}", peer);
        status.on_status(&format!("Client connected: {peer}"));

        let mut session = ServerSession::new(
            Connection::open(peer.clone(), stream),
            fetcher.clone(),
            status.clone(),
            html.clone(),
        );
        // The session logs and reports its own failure.
        tokio::spawn(async move {
            let _ = session.run().await;
        });
    }

    listener.close();
    status.on_status("Server stopped");
}

/// Controls a running accept loop.
pub struct AcceptorHandle<L> {
    running: Arc<AtomicBool>,
    listener: Arc<L>,
    task: JoinHandle<()>,
}

impl<L: Listener> AcceptorHandle<L> {
    pub fn listener(&self) -> &L {
        &self.listener
    }

    /// True until the accept loop has exited.
    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }

    /// Requests shutdown. Returns immediately; use [`join`](Self::join) to
    /// wait for the loop to exit.
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
        self.listener.close();
    }

    /// Waits for the accept loop to exit.
    pub async fn join(self) {
        if let Err(e) = self.task.await {
            error!(error = %e, "Accept loop task failed");
        }
    }
}
