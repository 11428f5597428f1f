//! Runtime configuration.
//!
//! Read from the YAML file named by `RELAY_CONFIG` when set, otherwise from
//! individual environment variables. Anything left out falls back to the
//! defaults below.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::transport::ServiceId;

pub const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:8080";
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (compatible; btrelay/0.1; +page relay over serial link)";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    Parse(#[from] serde_yaml::Error),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Accept connections and fetch pages for them.
    #[default]
    Server,
    /// Connect to a server and send it URLs.
    Client,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    pub connect_timeout_secs: u64,
    pub read_timeout_secs: u64,
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: 10,
            read_timeout_secs: 15,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl FetchConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_secs(self.read_timeout_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub mode: Mode,
    pub listen_addr: String,
    pub peer_addr: String,
    pub service_id: ServiceId,
    pub fetch: FetchConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            mode: Mode::Server,
            listen_addr: DEFAULT_LISTEN_ADDR.to_string(),
            peer_addr: DEFAULT_LISTEN_ADDR.to_string(),
            service_id: ServiceId::default(),
            fetch: FetchConfig::default(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self, ConfigError> {
        match std::env::var("RELAY_CONFIG") {
            Ok(path) => Self::from_file(path),
            Err(_) => Ok(Self::from_vars(|key| std::env::var(key).ok())),
        }
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    pub fn from_yaml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// Builds a config from environment-style variables looked up by `var`.
    pub fn from_vars(var: impl Fn(&str) -> Option<String>) -> Self {
        let mut cfg = Self::default();

        if let Some(mode) = var("RELAY_MODE") {
            cfg.mode = match mode.to_ascii_lowercase().as_str() {
                "client" => Mode::Client,
                "server" => Mode::Server,
                other => {
                    tracing::warn!(mode = other, "Unknown RELAY_MODE, running as server");
                    Mode::Server
                }
            };
        }
        if let Some(addr) = var("LISTEN") {
            cfg.listen_addr = addr;
        }
        if let Some(addr) = var("PEER") {
            cfg.peer_addr = addr;
        }
        if let Some(secs) = var("FETCH_CONNECT_TIMEOUT_SECS").and_then(|v| v.parse().ok()) {
            cfg.fetch.connect_timeout_secs = secs;
        }
        if let Some(secs) = var("FETCH_READ_TIMEOUT_SECS").and_then(|v| v.parse().ok()) {
            cfg.fetch.read_timeout_secs = secs;
        }
        if let Some(ua) = var("FETCH_USER_AGENT") {
            cfg.fetch.user_agent = ua;
        }

        cfg
    }
}
