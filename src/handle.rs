//! Per-subscription and per-request handles returned to callers.
//!
//! Both types are thin wrappers around an [`EngineHandle`] plus the receive
//! half of the channel the engine delivers messages on; neither owns any
//! protocol state itself.

use std::time::Duration;

use tokio::sync::mpsc;

use crate::engine::{Command, EngineHandle};
use crate::error::{Error, Result};
use crate::proto::Message;
use crate::subscription::Sid;

/// A live subscription. Messages arrive over an unbounded channel fed by the
/// engine task; receiving is async and does not block the connection.
pub struct Subscription {
    handle: EngineHandle,
    sid: Sid,
    rx: mpsc::UnboundedReceiver<Message>,
}

impl Subscription {
    pub(crate) fn new(handle: EngineHandle, sid: Sid, rx: mpsc::UnboundedReceiver<Message>) -> Self {
        Subscription { handle, sid, rx }
    }

    pub fn sid(&self) -> Sid {
        self.sid
    }

    /// Waits for the next message. Returns `None` once the subscription has
    /// been removed (by `unsubscribe`, by max-delivery exhaustion, by
    /// timeout, or because the connection closed).
    pub async fn next(&mut self) -> Option<Message> {
        self.rx.recv().await
    }

    /// Non-blocking variant of [`Subscription::next`].
    pub fn try_next(&mut self) -> Option<Message> {
        self.rx.try_recv().ok()
    }

    /// Cancels immediately: the server stops delivering as soon as it
    /// processes the `UNSUB`, and the local entry is removed right away.
    pub fn unsubscribe(&self) -> Result<()> {
        self.handle
            .send(Command::Unsubscribe { sid: self.sid, max: None })
            .map_err(|_| Error::ConnClosed)
    }

    /// Lets up to `max` more messages arrive (counted from the
    /// subscription's lifetime total, not from now) before auto-removing.
    pub fn unsubscribe_after(&self, max: u64) -> Result<()> {
        self.handle
            .send(Command::Unsubscribe { sid: self.sid, max: Some(max) })
            .map_err(|_| Error::ConnClosed)
    }

    /// Per-subscription drain: sends `UNSUB`, waits for the flush barrier,
    /// then removes the local entry. Messages already in flight when the
    /// server processes the `UNSUB` may still arrive before this resolves.
    pub async fn drain(&self) -> Result<()> {
        let (resp_tx, resp_rx) = tokio::sync::oneshot::channel();
        self.handle
            .send(Command::DrainSub { sid: self.sid, resp: resp_tx })
            .map_err(|_| Error::ConnClosed)?;
        resp_rx.await.map_err(|_| Error::ConnClosed)?
    }

    /// Arms a watchdog: if no message arrives within `dur` of this call,
    /// the subscription is torn down and `next()` observes end-of-stream.
    pub fn set_timeout(&self, dur: Duration) -> Result<()> {
        self.handle
            .send(Command::SetSubTimeout { sid: self.sid, dur })
            .map_err(|_| Error::ConnClosed)
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        let _ = self.handle.send(Command::Unsubscribe { sid: self.sid, max: None });
    }
}

/// A multi-reply request in progress. Dropping it cancels routing for any
/// further replies that arrive after the drop (the shared inbox
/// subscription itself is left alone — it serves every outstanding
/// request on the connection).
pub struct RequestStream {
    handle: EngineHandle,
    token: String,
    rx: mpsc::UnboundedReceiver<Result<Message>>,
}

impl RequestStream {
    pub(crate) fn new(handle: EngineHandle, token: String, rx: mpsc::UnboundedReceiver<Result<Message>>) -> Self {
        RequestStream { handle, token, rx }
    }

    /// Waits for the next reply, a timeout, or end-of-stream (`None`, once
    /// `max` replies have arrived or the connection has closed).
    pub async fn recv(&mut self) -> Option<Result<Message>> {
        self.rx.recv().await
    }
}

impl Drop for RequestStream {
    fn drop(&mut self) {
        let _ = self.handle.send(Command::CancelRequest { token: std::mem::take(&mut self.token) });
    }
}
