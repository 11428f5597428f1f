//! Relay wire protocol.
//!
//! - **`frame`**: line-delimited request and response framing
//! - **`connection`**: an owned duplex stream and its lifecycle state
//!
//! # Wire format
//!
//! ```text
//! client → server   https://example.com\n
//! server → client   <!DOCTYPE html>\n
//!                   ...\n
//!                   </html>\n
//!                   <END_OF_HTML>\n
//! ```
//!
//! Requests and responses strictly alternate on a connection.
//!
//! # Connection lifecycle
//!
//! ```text
//!   Closed ──► Connecting ──► Open ──► Closed
//!                  │                     ▲
//!                  └──── connect fails ──┘
//! ```
//!
//! A closed connection is never reopened.

pub mod connection;
pub mod frame;

pub use connection::{Connection, ConnectionState, Phase};
pub use frame::SENTINEL;
