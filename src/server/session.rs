use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::error::Result;
use crate::fetch::Fetch;
use crate::observer::{SharedHtml, SharedStatus};
use crate::protocol::Connection;
use crate::transport::DuplexStream;

pub enum SessionState {
    AwaitRequest,
    Fetching(String),
    Responding { url: String, body: String },
    Closed,
}

/// Serves requests on one accepted connection until it closes.
///
/// Sessions share nothing with each other; the only outward channel is the
/// pair of observers.
pub struct ServerSession<S, F> {
    conn: Connection<S>,
    fetcher: Arc<F>,
    status: SharedStatus,
    html: SharedHtml,
    state: SessionState,
    served: u64,
}

impl<S: DuplexStream, F: Fetch> ServerSession<S, F> {
    pub fn new(conn: Connection<S>, fetcher: Arc<F>, status: SharedStatus, html: SharedHtml) -> Self {
        Self {
            conn,
            fetcher,
            status,
            html,
            state: SessionState::AwaitRequest,
            served: 0,
        }
    }

    /// Number of responses written so far.
    pub fn served(&self) -> u64 {
        self.served
    }

    pub fn is_closed(&self) -> bool {
        matches!(self.state, SessionState::Closed)
    }

    /// Runs the request loop. Returns `Ok` when the peer closed the stream
    /// and `Err` when an I/O operation failed. The connection is released
    /// either way.
    pub async fn run(&mut self) -> Result<()> {
        let outcome = self.drive().await;

        self.state = SessionState::Closed;
        self.conn.close();

        let peer = self.conn.peer().to_string();
        if let Err(e) = &outcome {
            warn!(peer = %peer, error = %e, "Session ended with error");
            self.status.on_status(&format!("Error serving {peer}: {e}"));
        }
        info!(peer = %peer, served = self.served, "Session closed");
        self.status.on_status(&format!("Client {peer} disconnected"));

        outcome
    }

    async fn drive(&mut self) -> Result<()> {
        loop {
            self.state = match std::mem::replace(&mut self.state, SessionState::Closed) {
                SessionState::AwaitRequest => match self.conn.read_request().await? {
                    Some(url) => SessionState::Fetching(url),
                    None => {
                        debug!(peer = %self.conn.peer(), "Peer closed the stream");
                        SessionState::Closed
                    }
                },

                SessionState::Fetching(url) => {
                    debug!(peer = %self.conn.peer(), url = %url, "Request received");
                    self.status.on_status(&format!("Requesting: {url}"));

                    let body = self.fetcher.fetch(&url).await;
                    self.html.on_html(&body);

                    SessionState::Responding { url, body }
                }

                SessionState::Responding { url, body } => {
                    self.conn.write_response(&body).await?;
                    self.served += 1;

                    debug!(peer = %self.conn.peer(), url = %url, bytes = body.len(), "Response sent");
                    self.status.on_status(&format!("Response sent for: {url}"));

                    SessionState::AwaitRequest
                }

                SessionState::Closed => return Ok(()),
            };
        }
    }
}
