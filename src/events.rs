//! Typed connection events, broadcast to every listener registered on a
//! [`crate::client::Client`].
//!
//! The event taxonomy is closed, so it is modeled as a tagged enum instead
//! of a string-keyed emitter: callers match exhaustively rather than
//! subscribing to named channels that can typo silently.

use std::sync::Arc;

use crate::error::Error;
use crate::proto::ServerInfo;

#[derive(Debug, Clone)]
pub enum Event {
    /// First successful handshake on this client.
    Connect { url: String, info: Arc<ServerInfo> },
    /// A handshake completed after a prior disconnect.
    Reconnect { url: String, info: Arc<ServerInfo> },
    /// A reconnect attempt is about to be dialed.
    Reconnecting { attempt: u32 },
    /// The transport dropped; reconnect may or may not follow.
    Disconnect { url: String },
    /// Terminal: no further events will be emitted on this client.
    Close,
    /// A fatal or surfaced-but-recoverable error.
    Error(Arc<Error>),
    /// A non-fatal `-ERR 'Permissions Violation ...'` frame.
    PermissionError(Arc<Error>),
    Subscribe { sid: u64, subject: String, queue: Option<String> },
    Unsubscribe { sid: u64, subject: String, queue: Option<String> },
    ServersChanged { added: Vec<String>, deleted: Vec<String> },
    PingTimer,
    PingCount(u32),
    /// The engine yielded the read loop back to the runtime mid-batch.
    Yield,
}
