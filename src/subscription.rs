//! Subscription registry and dispatch.
//!
//! Delivery hands the already-decoded wire `Message` to subscriber code
//! over an mpsc channel rather than invoking a callback in-process, so a
//! panicking or slow handler runs on its own task and can never corrupt
//! engine state.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use tokio::sync::mpsc;

use crate::proto::Message;

pub type Sid = u64;

pub(crate) struct SubEntry {
    pub subject: String,
    pub queue: Option<String>,
    pub tx: mpsc::UnboundedSender<Message>,
    pub received: u64,
    pub max: Option<u64>,
    pub timeout: Option<Duration>,
    pub timeout_at: Option<Instant>,
    pub draining: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryOutcome {
    Delivered,
    /// Max reached; caller should write `UNSUB <sid>` and drop the entry.
    DeliveredAndExhausted,
    /// No subscriber was registered for this sid (already cancelled).
    Dropped,
}

pub struct SubscriptionRegistry {
    next_sid: Sid,
    subs: HashMap<Sid, SubEntry>,
}

impl SubscriptionRegistry {
    pub fn new() -> Self {
        SubscriptionRegistry { next_sid: 1, subs: HashMap::new() }
    }

    pub fn allocate_sid(&mut self) -> Sid {
        let sid = self.next_sid;
        self.next_sid += 1;
        sid
    }

    pub fn insert(
        &mut self,
        sid: Sid,
        subject: String,
        queue: Option<String>,
        max: Option<u64>,
        tx: mpsc::UnboundedSender<Message>,
    ) {
        self.subs.insert(
            sid,
            SubEntry {
                subject,
                queue,
                tx,
                received: 0,
                max,
                timeout: None,
                timeout_at: None,
                draining: false,
            },
        );
    }

    pub fn remove(&mut self, sid: Sid) -> bool {
        self.subs.remove(&sid).is_some()
    }

    pub fn contains(&self, sid: Sid) -> bool {
        self.subs.contains_key(&sid)
    }

    pub fn set_timeout(&mut self, sid: Sid, d: Duration) {
        if let Some(e) = self.subs.get_mut(&sid) {
            e.timeout = Some(d);
            e.timeout_at = Some(Instant::now() + d);
        }
    }

    pub fn set_draining(&mut self, sid: Sid) {
        if let Some(e) = self.subs.get_mut(&sid) {
            e.draining = true;
        }
    }

    pub fn is_draining(&self, sid: Sid) -> bool {
        self.subs.get(&sid).map(|e| e.draining).unwrap_or(false)
    }

    pub fn subject_of(&self, sid: Sid) -> Option<(&str, Option<&str>)> {
        self.subs.get(&sid).map(|e| (e.subject.as_str(), e.queue.as_deref()))
    }

    pub fn iter_subjects(&self) -> impl Iterator<Item = (Sid, &str, Option<&str>)> {
        self.subs.iter().map(|(sid, e)| (*sid, e.subject.as_str(), e.queue.as_deref()))
    }

    pub fn len(&self) -> usize {
        self.subs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subs.is_empty()
    }

    pub fn sids(&self) -> Vec<Sid> {
        self.subs.keys().copied().collect()
    }

    /// Delivers `msg` to the subscriber for `msg.sid`: bumps the received
    /// count, cancels any armed timeout (arrival satisfies liveness), and
    /// reports whether the max-count was reached so the caller can emit
    /// `UNSUB` and drop the entry.
    pub fn dispatch(&mut self, msg: Message) -> DeliveryOutcome {
        let sid = msg.sid;
        let Some(entry) = self.subs.get_mut(&sid) else {
            return DeliveryOutcome::Dropped;
        };
        entry.received += 1;
        entry.timeout_at = None;
        let exhausted = entry.max.map(|m| entry.received >= m).unwrap_or(false);
        let send_failed = entry.tx.send(msg).is_err();

        if send_failed {
            self.subs.remove(&sid);
            return DeliveryOutcome::Dropped;
        }
        if exhausted {
            self.subs.remove(&sid);
            DeliveryOutcome::DeliveredAndExhausted
        } else {
            DeliveryOutcome::Delivered
        }
    }

    /// Returns sids whose watchdog timeout has elapsed as of `now`, and
    /// removes them from the registry (the caller is responsible for
    /// notifying the subscriber via a `SubTimeout` error and writing
    /// `UNSUB`).
    pub fn expire_timeouts(&mut self, now: Instant) -> Vec<Sid> {
        let expired: Vec<Sid> = self
            .subs
            .iter()
            .filter_map(|(sid, e)| e.timeout_at.filter(|at| *at <= now).map(|_| *sid))
            .collect();
        for sid in &expired {
            if let Some(entry) = self.subs.remove(sid) {
                drop(entry); // sender drop signals end-of-stream to the subscriber
            }
        }
        expired
    }

    pub fn next_timeout_deadline(&self) -> Option<Instant> {
        self.subs.values().filter_map(|e| e.timeout_at).min()
    }

    /// Drops every live subscriber when the connection closes. Dropping the
    /// sender closes the channel, which the subscriber observes as
    /// end-of-stream; callers that want an explicit `ConnClosed` error
    /// delivered first should do so before calling this.
    pub fn clear(&mut self) -> Vec<Sid> {
        let sids: Vec<Sid> = self.subs.keys().copied().collect();
        self.subs.clear();
        sids
    }
}

impl Default for SubscriptionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
