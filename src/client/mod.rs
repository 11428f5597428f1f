//! Requesting side of the relay.

pub mod connector;

pub use connector::ClientConnector;
