//! Status and HTML observers.
//!
//! Sessions and connectors report progress only through these callbacks.
//! Implementations are called synchronously from the reporting task and must
//! return quickly.

use std::sync::Arc;

use tokio::sync::mpsc;

/// Receives human-readable status messages (connects, errors, disconnects).
pub trait StatusObserver: Send + Sync + 'static {
    fn on_status(&self, message: &str);
}

/// Receives every page body the server is about to send back.
pub trait HtmlObserver: Send + Sync + 'static {
    fn on_html(&self, html: &str);
}

pub type SharedStatus = Arc<dyn StatusObserver>;
pub type SharedHtml = Arc<dyn HtmlObserver>;

impl<F> StatusObserver for F
where
    F: Fn(&str) + Send + Sync + 'static,
{
    fn on_status(&self, message: &str) {
        self(message)
    }
}

impl<F> HtmlObserver for F
where
    F: Fn(&str) + Send + Sync + 'static,
{
    fn on_html(&self, html: &str) {
        self(html)
    }
}

/// Forwards observer events to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogObserver;

impl StatusObserver for LogObserver {
    fn on_status(&self, message: &str) {
        tracing::info!(status = %message, "Relay status");
    }
}

impl HtmlObserver for LogObserver {
    fn on_html(&self, html: &str) {
        tracing::debug!(length = html.len(), "Page ready for delivery");
    }
}

/// Pushes observer events into an unbounded channel.
///
/// Lets the owner of a session consume its events from another task without
/// sharing any state with it. Sends never block; events sent after the
/// receiver is dropped are discarded.
#[derive(Debug, Clone)]
pub struct ChannelObserver {
    tx: mpsc::UnboundedSender<String>,
}

impl ChannelObserver {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl StatusObserver for ChannelObserver {
    fn on_status(&self, message: &str) {
        let _ = self.tx.send(message.to_string());
    }
}

impl HtmlObserver for ChannelObserver {
    fn on_html(&self, html: &str) {
        let _ = self.tx.send(html.to_string());
    }
}

/// Discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullObserver;

impl StatusObserver for NullObserver {
    fn on_status(&self, _message: &str) {}
}

impl HtmlObserver for NullObserver {
    fn on_html(&self, _html: &str) {}
}
