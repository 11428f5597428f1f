//! HTTP fetching for relayed requests.
//!
//! Every outcome of a fetch is a page: failures are rendered into a
//! diagnostic document, so the session always has something to send back.

use std::error::Error as StdError;
use std::future::Future;
use std::io;
use std::sync::Arc;

use reqwest::header::{self, HeaderMap, HeaderValue};
use thiserror::Error;
use tracing::{info, warn};
use url::Url;

use crate::config::FetchConfig;
use crate::fetch::error_page;
use crate::protocol::frame::normalize_lines;

/// Turns a URL into a page body. Implementations never fail.
pub trait Fetch: Send + Sync + 'static {
    fn fetch(&self, url: &str) -> impl Future<Output = String> + Send;
}

impl<F: Fetch> Fetch for Arc<F> {
    fn fetch(&self, url: &str) -> impl Future<Output = String> + Send {
        self.as_ref().fetch(url)
    }
}

#[derive(Debug, Error)]
pub(crate) enum FetchError {
    #[error("could not resolve host")]
    Resolve,

    #[error("connection refused")]
    Refused,

    #[error("timed out")]
    Timeout,

    #[error("server answered with status {0}")]
    Status(u16),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    #[error("{0}")]
    Other(String),
}

impl FetchError {
    fn title(&self) -> String {
        match self {
            FetchError::Resolve => "Host not found".to_string(),
            FetchError::Refused => "Connection refused".to_string(),
            FetchError::Timeout => "Connection timed out".to_string(),
            FetchError::Status(code) => format!("HTTP error {code}"),
            FetchError::InvalidUrl(_) => "Invalid URL".to_string(),
            FetchError::Other(_) => "Failed to fetch page".to_string(),
        }
    }

    fn explanation(&self) -> String {
        match self {
            FetchError::Resolve => "The website could not be found.".to_string(),
            FetchError::Refused => "The website refused the connection.".to_string(),
            FetchError::Timeout => "The website took too long to respond.".to_string(),
            FetchError::Status(code) => format!("The server responded with status code {code}."),
            FetchError::InvalidUrl(reason) => format!("The address is not a valid URL: {reason}."),
            FetchError::Other(reason) => format!("Error: {reason}"),
        }
    }

    pub(crate) fn render(&self, url: &str) -> String {
        error_page::render(&self.title(), &self.explanation(), url)
    }
}

fn chain_mentions(err: &(dyn StdError + 'static), needles: &[&str]) -> bool {
    let text = err.to_string().to_ascii_lowercase();
    needles.iter().any(|n| text.contains(n))
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            return FetchError::Timeout;
        }

        let mut source = err.source();
        while let Some(cause) = source {
            if let Some(io_err) = cause.downcast_ref::<io::Error>() {
                match io_err.kind() {
                    io::ErrorKind::ConnectionRefused => return FetchError::Refused,
                    io::ErrorKind::TimedOut => return FetchError::Timeout,
                    _ => {}
                }
            }
            if chain_mentions(cause, &["dns error", "failed to lookup address", "name or service not known"]) {
                return FetchError::Resolve;
            }
            if chain_mentions(cause, &["connection refused"]) {
                return FetchError::Refused;
            }
            source = cause.source();
        }

        FetchError::Other(err.to_string())
    }
}

/// Fetches pages over HTTP(S) with `reqwest`.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(config: &FetchConfig) -> reqwest::Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::ACCEPT,
            HeaderValue::from_static("text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8"),
        );
        headers.insert(
            header::ACCEPT_LANGUAGE,
            HeaderValue::from_static("en-US,en;q=0.8,es;q=0.6"),
        );
        headers.insert(header::ACCEPT_ENCODING, HeaderValue::from_static("identity"));
        headers.insert(header::CONNECTION, HeaderValue::from_static("close"));

        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .default_headers(headers)
            .connect_timeout(config.connect_timeout())
            .read_timeout(config.read_timeout())
            .build()?;

        Ok(Self { client })
    }

    async fn try_fetch(&self, url: &str) -> Result<String, FetchError> {
        let parsed = Url::parse(url).map_err(|e| FetchError::InvalidUrl(e.to_string()))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(FetchError::InvalidUrl(format!(
                "unsupported scheme `{}`",
                parsed.scheme()
            )));
        }

        let response = self.client.get(parsed).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let bytes = response.bytes().await?;
        Ok(normalize_lines(&String::from_utf8_lossy(&bytes)))
    }
}

impl Fetch for HttpFetcher {
    async fn fetch(&self, url: &str) -> String {
        match self.try_fetch(url).await {
            Ok(body) => {
                info!(url, length = body.len(), "Page fetched");
                body
            }
            Err(e) => {
                warn!(url, error = %e, "Fetch failed, serving diagnostic page");
                e.render(url)
            }
        }
    }
}
