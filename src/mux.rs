//! Multiplexed request/reply layer.
//!
//! A single wildcard inbox subscription (`_INBOX.<token>.*`) services
//! arbitrarily many in-flight `request` calls; replies are routed to the
//! right caller by the trailing token rather than by a dedicated
//! subscription per request. Deliberately kept separate from
//! [`crate::subscription::SubscriptionRegistry`]: this is a private
//! dispatcher keyed by token substring, not a subject-matched fan-out.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use tokio::sync::mpsc;

use crate::error::{Error, Result};
use crate::proto::Message;
use crate::subscription::Sid;

struct PendingRequest {
    tx: mpsc::UnboundedSender<Result<Message>>,
    received: u64,
    max: u64,
    timeout_at: Option<Instant>,
}

pub struct MuxLayer {
    base: Option<String>,
    sid: Option<Sid>,
    pending: HashMap<String, PendingRequest>,
}

impl MuxLayer {
    pub fn new() -> Self {
        MuxLayer { base: None, sid: None, pending: HashMap::new() }
    }

    pub fn is_initialized(&self) -> bool {
        self.sid.is_some()
    }

    pub fn sid(&self) -> Option<Sid> {
        self.sid
    }

    /// The `base*` subject last returned by `ensure_initialized`, if any —
    /// used to re-issue `SUB` for the mux inbox after a reconnect.
    pub fn wildcard_subject(&self) -> Option<String> {
        self.base.as_ref().map(|base| format!("{base}*"))
    }

    /// Creates the inbox base on first use and returns the wildcard subject
    /// to `SUB`. Returns `None` once already initialized; the engine only
    /// needs to subscribe once per connection lifetime.
    pub fn ensure_initialized(&mut self) -> Option<String> {
        if self.base.is_some() {
            return None;
        }
        let base = format!("_INBOX.{}.", crate::nuid::next());
        let wildcard = format!("{base}*");
        self.base = Some(base);
        Some(wildcard)
    }

    pub fn set_sid(&mut self, sid: Sid) {
        self.sid = Some(sid);
    }

    /// Allocates a fresh token and pending-request entry, returning the
    /// reply subject to publish with and a receiver for the (possibly
    /// several) replies.
    pub fn new_request(
        &mut self,
        max: u64,
        timeout: Option<Duration>,
    ) -> (String, mpsc::UnboundedReceiver<Result<Message>>) {
        let base = self.base.as_deref().expect("ensure_initialized must run before new_request");
        let token = crate::nuid::next();
        let reply_subject = format!("{base}{token}");
        let (tx, rx) = mpsc::unbounded_channel();
        self.pending.insert(
            token,
            PendingRequest {
                tx,
                received: 0,
                max,
                timeout_at: timeout.map(|d| Instant::now() + d),
            },
        );
        (reply_subject, rx)
    }

    /// Routes an inbound message whose subject falls under the inbox base
    /// to its pending request, if still live. Returns `true` when the
    /// message belonged to this mux (regardless of whether a live pending
    /// entry was found for its token) so the caller can distinguish "this
    /// was mine" from "route elsewhere".
    pub fn dispatch(&mut self, msg: Message) -> bool {
        let Some(base) = &self.base else { return false };
        let Some(token) = msg.subject.strip_prefix(base.as_str()) else { return false };
        let token = token.to_owned();

        if let Some(entry) = self.pending.get_mut(&token) {
            entry.received += 1;
            let exhausted = entry.received >= entry.max;
            let _ = entry.tx.send(Ok(msg));
            if exhausted {
                self.pending.remove(&token);
            }
        }
        true
    }

    /// Advisory cancellation: removes the pending entry without touching
    /// the shared mux subscription, which lives until the connection
    /// closes.
    pub fn cancel(&mut self, token: &str) {
        self.pending.remove(token);
    }

    pub fn expire_timeouts(&mut self, now: Instant) -> Vec<String> {
        let expired: Vec<String> = self
            .pending
            .iter()
            .filter_map(|(token, e)| e.timeout_at.filter(|at| *at <= now).map(|_| token.clone()))
            .collect();
        for token in &expired {
            if let Some(entry) = self.pending.remove(token) {
                let _ = entry.tx.send(Err(Error::ReqTimeout));
            }
        }
        expired
    }

    pub fn next_timeout_deadline(&self) -> Option<Instant> {
        self.pending.values().filter_map(|e| e.timeout_at).min()
    }

    /// Fails every outstanding request with `ConnClosed` and clears
    /// pending state; the mux subscription itself is torn down by the
    /// engine along with the rest of the subscription set.
    pub fn clear(&mut self) {
        for (_, entry) in self.pending.drain() {
            let _ = entry.tx.send(Err(Error::ConnClosed));
        }
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }
}

impl Default for MuxLayer {
    fn default() -> Self {
        Self::new()
    }
}
