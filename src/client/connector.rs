use tracing::{debug, info, warn};

use crate::error::{RelayError, Result};
use crate::observer::SharedStatus;
use crate::protocol::{Connection, Phase};
use crate::transport::{ServiceId, Transport, SERIAL_PORT_SERVICE};

/// Holds one outbound connection and exchanges one request at a time on it.
///
/// Every operation takes `&mut self`, so a request cannot be issued while
/// another one is still waiting for its response. A failed exchange closes
/// the connection; callers must `connect` again before the next request.
pub struct ClientConnector<T: Transport> {
    transport: T,
    service: ServiceId,
    status: SharedStatus,
    connection: Connection<T::Stream>,
}

impl<T: Transport> ClientConnector<T> {
    pub fn new(transport: T, status: SharedStatus) -> Self {
        Self {
            transport,
            service: SERIAL_PORT_SERVICE,
            status,
            connection: Connection::closed(""),
        }
    }

    pub fn with_service(mut self, service: ServiceId) -> Self {
        self.service = service;
        self
    }

    pub fn is_connected(&self) -> bool {
        self.connection.is_open()
    }

    pub fn phase(&self) -> Phase {
        self.connection.phase()
    }

    /// Opens a fresh connection to `peer`, replacing any previous one.
    pub async fn connect(&mut self, peer: &str) -> Result<()> {
        if self.connection.close() {
            debug!(peer = %self.connection.peer(), "Dropping previous connection");
        }

        self.connection = Connection::connecting(peer);
        self.status.on_status(&format!("Connecting to {peer}..."));

        match self.transport.connect(peer, self.service).await {
            Ok(stream) => {
                self.connection.establish(stream)?;
                info!(peer, service = %self.service, "Connected");
                self.status.on_status(&format!("Connected to {peer}."));
                Ok(())
            }
            Err(e) => {
                self.connection.close();
                let err = RelayError::from(e);
                warn!(peer, error = %err, "Connection failed");
                self.status.on_status(&format!("Connection to {peer} failed: {err}"));
                Err(err)
            }
        }
    }

    /// Sends `url` and waits for the complete response body.
    ///
    /// Fails with [`RelayError::NotConnected`] without touching the stream
    /// when no connection is open.
    pub async fn send_and_receive(&mut self, url: &str) -> Result<String> {
        if !self.connection.is_open() {
            self.status.on_status("Error: no active connection.");
            return Err(RelayError::NotConnected);
        }

        debug!(peer = %self.connection.peer(), url, "Sending request");
        self.status.on_status(&format!("Sending URL: {url}. Waiting for response..."));

        if let Err(e) = self.connection.write_request(url).await {
            return Err(self.exchange_failed(e));
        }

        match self.connection.read_response().await {
            Ok(body) => {
                debug!(url, length = body.len(), "Response received");
                self.status.on_status("Response received.");
                Ok(body)
            }
            Err(e) => Err(self.exchange_failed(e)),
        }
    }

    fn exchange_failed(&mut self, err: RelayError) -> RelayError {
        self.connection.close();
        warn!(peer = %self.connection.peer(), error = %err, "Exchange failed, connection closed");
        self.status.on_status(&format!("Communication error: {err}"));
        err
    }

    /// Closes the connection. Safe to call at any time, any number of times.
    pub fn disconnect(&mut self) {
        if self.connection.close() {
            self.status.on_status(&format!("Disconnected from {}.", self.connection.peer()));
        }
    }
}
