//! The editor bridge — the only stateful part of the host.
//!
//! Everything above this module is static glue; the bridge owns the TCP
//! channel to the editor process and the policy around it.
//!
//! | Module | Role |
//! |--------|------|
//! | `codec` | length-prefixed JSON frames — encode requests, decode replies |
//! | `connection` | the single TCP connection: lazy dial, invalidate, disconnect |
//! | `dispatch` | `send_command` — timeout, error classes, zero internal retries |
//! | `error` | the three-class `EditorError` taxonomy |
//!
//! Per connection instance the lifecycle is unestablished → connecting →
//! ready → closed. Closed is terminal for the instance; the manager dials a
//! fresh one on the next acquire.

pub mod codec;
pub mod connection;
pub mod dispatch;
pub mod error;

// ─── Flat re-exports ──────────────────────────────────────────────────────────

pub use codec::EditorReply;
pub use connection::{Connection, ConnectionGuard, ConnectionManager};
pub use dispatch::CommandDispatcher;
pub use error::EditorError;
