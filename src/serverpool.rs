//! Server pool: endpoint list, rotation, and gossip reconciliation.

use rand::seq::SliceRandom;
use std::collections::VecDeque;
use std::time::Instant;

use crate::options::DEFAULT_URL;

#[derive(Debug, Clone)]
pub struct Endpoint {
    pub url: String,
    pub did_connect: bool,
    pub implicit: bool,
    pub reconnects: u32,
    pub last_connect: Option<Instant>,
}

impl Endpoint {
    fn explicit(url: String) -> Self {
        Endpoint {
            url,
            did_connect: false,
            implicit: false,
            reconnects: 0,
            last_connect: None,
        }
    }

    fn implicit(url: String) -> Self {
        Endpoint {
            url,
            did_connect: false,
            implicit: true,
            reconnects: 0,
            last_connect: None,
        }
    }
}

/// Ordered circular list of endpoints with randomization and gossip-driven
/// membership reconciliation.
#[derive(Debug)]
pub struct ServerPool {
    endpoints: VecDeque<Endpoint>,
}

/// Result of reconciling the pool against an INFO frame's `connect_urls`.
#[derive(Debug, Default, Clone)]
pub struct ServerUpdate {
    pub added: Vec<String>,
    pub deleted: Vec<String>,
}

impl ServerPool {
    /// Builds the pool: an explicit first
    /// URL is rotated to the head (or prepended if absent from `servers`);
    /// with no URLs at all, the default local endpoint is used; when
    /// `randomize` is set, non-explicit (i.e. all initially, since none are
    /// implicit yet) members are shuffled, explicit-first url aside.
    pub fn new(first_url: Option<&str>, mut servers: Vec<String>, randomize: bool) -> Self {
        if servers.is_empty() {
            servers.push(DEFAULT_URL.to_owned());
        }

        let mut rng = rand::thread_rng();
        if randomize {
            servers.shuffle(&mut rng);
        }

        let mut endpoints: VecDeque<Endpoint> = servers.into_iter().map(Endpoint::explicit).collect();

        if let Some(first) = first_url {
            if let Some(pos) = endpoints.iter().position(|e| e.url == first) {
                let e = endpoints.remove(pos).unwrap();
                endpoints.push_front(e);
            } else {
                endpoints.push_front(Endpoint::explicit(first.to_owned()));
            }
        }

        ServerPool { endpoints }
    }

    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }

    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    pub fn current(&self) -> Option<&Endpoint> {
        self.endpoints.front()
    }

    pub fn current_mut(&mut self) -> Option<&mut Endpoint> {
        self.endpoints.front_mut()
    }

    /// Rotates the head to the tail and returns the new head.
    pub fn select_server(&mut self) -> Option<&Endpoint> {
        if let Some(front) = self.endpoints.pop_front() {
            self.endpoints.push_back(front);
        }
        self.endpoints.front()
    }

    /// Removes the current (head) endpoint from the pool entirely, e.g.
    /// when an implicit peer stops being reachable and is not re-gossiped.
    pub fn remove_current_server(&mut self) {
        self.endpoints.pop_front();
    }

    /// Reconciles implicit membership against a freshly received INFO's
    /// `connect_urls`. Neither `added` nor `deleted` will ever contain the
    /// current endpoint: gossip must never
    /// evict the peer we are presently connected to.
    pub fn process_server_update(&mut self, connect_urls: &[String]) -> ServerUpdate {
        let mut update = ServerUpdate::default();
        let current_url = self.current().map(|e| e.url.clone());

        for url in connect_urls {
            if Some(url) == current_url.as_ref() {
                continue;
            }
            if !self.endpoints.iter().any(|e| &e.url == url) {
                self.endpoints.push_back(Endpoint::implicit(url.clone()));
                update.added.push(url.clone());
            }
        }

        let mut to_remove = Vec::new();
        for (idx, e) in self.endpoints.iter().enumerate() {
            if e.implicit && Some(&e.url) != current_url.as_ref() && !connect_urls.contains(&e.url) {
                to_remove.push(idx);
            }
        }
        for idx in to_remove.into_iter().rev() {
            let removed = self.endpoints.remove(idx).unwrap();
            update.deleted.push(removed.url);
        }

        update
    }

    pub fn mark_connected(&mut self) {
        if let Some(e) = self.endpoints.front_mut() {
            e.did_connect = true;
            e.last_connect = Some(Instant::now());
            e.reconnects = 0;
        }
    }

    pub fn bump_reconnects(&mut self) -> u32 {
        if let Some(e) = self.endpoints.front_mut() {
            e.reconnects += 1;
            e.reconnects
        } else {
            0
        }
    }
}
