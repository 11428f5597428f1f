//! Accepting side of the relay.
//!
//! - **`listener`**: binds the service and spawns a session per connection
//! - **`session`**: the per-connection request/response state machine
//!
//! # Session state machine
//!
//! ```text
//!        ┌────────────────┐
//!        │  AwaitRequest  │ ← Read one URL line
//!        └───────┬────────┘
//!                │ URL received          (end of stream → Closed)
//!                ▼
//!        ┌────────────────┐
//!        │    Fetching    │ ← HTTP GET, never fails
//!        └───────┬────────┘
//!                │ Page ready
//!                ▼
//!        ┌────────────────┐
//!        │   Responding   │ ← Write page + sentinel, flush
//!        └───────┬────────┘
//!                │ Sent                  (write error → Closed)
//!                └─► AwaitRequest
//! ```

pub mod listener;
pub mod session;

pub use listener::{Acceptor, AcceptorHandle};
pub use session::{ServerSession, SessionState};
