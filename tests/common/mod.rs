#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use btrelay::fetch::Fetch;
use btrelay::observer::{HtmlObserver, StatusObserver};

/// Returns the same page for every URL and counts calls.
pub struct StaticFetcher {
    page: &'static str,
    calls: AtomicUsize,
}

impl StaticFetcher {
    pub fn new(page: &'static str) -> Self {
        Self {
            page,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Fetch for StaticFetcher {
    async fn fetch(&self, _url: &str) -> String {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.page.to_string()
    }
}

/// Wraps the URL in a paragraph, after a delay that depends on the URL
/// length so concurrent requests finish out of order.
pub struct EchoFetcher;

impl Fetch for EchoFetcher {
    async fn fetch(&self, url: &str) -> String {
        let delay = 10 + (url.len() as u64 % 7) * 15;
        tokio::time::sleep(Duration::from_millis(delay)).await;
        format!("<p>{url}</p>")
    }
}

/// Keeps every observed message.
#[derive(Default)]
pub struct Recorder {
    messages: Mutex<Vec<String>>,
}

impl Recorder {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().unwrap().clone()
    }

    pub fn saw(&self, needle: &str) -> bool {
        self.messages().iter().any(|m| m.contains(needle))
    }
}

impl StatusObserver for Recorder {
    fn on_status(&self, message: &str) {
        self.messages.lock().unwrap().push(message.to_string());
    }
}

impl HtmlObserver for Recorder {
    fn on_html(&self, html: &str) {
        self.messages.lock().unwrap().push(html.to_string());
    }
}
