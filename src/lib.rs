//! btrelay - page relay over a serial-style duplex link
//!
//! One peer accepts connections and fetches the URLs it is sent; the other
//! holds a single connection and requests pages one at a time.

pub mod client;
pub mod config;
pub mod error;
pub mod fetch;
pub mod observer;
pub mod protocol;
pub mod server;
pub mod transport;

pub use error::{RelayError, Result};
