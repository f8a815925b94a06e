//! The protocol engine: the single task that owns the transport, both byte
//! buffers, the subscription registry, the mux layer, the server pool, and
//! the pongs queue for the lifetime of one logical connection.
//!
//! Driven as a `tokio::select!` actor loop rather than a reader/writer
//! thread pair: commands arrive over an unbounded mpsc channel, inbound
//! bytes arrive from the transport, and a ping ticker and an optional
//! reconnect-backoff timer round out the select set. Every branch borrows
//! only the engine field it needs, so the loop holds no lock.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use bytes::{Bytes, BytesMut};
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::time::{interval, sleep, sleep_until, Instant as TokioInstant, MissedTickBehavior};
use tracing::{debug, info, instrument, trace, warn};

use crate::buffer::ChainedBuffer;
use crate::endpoint_url;
use crate::error::{Error, Result};
use crate::events::Event;
use crate::mux::MuxLayer;
use crate::options::ConnectOptions;
use crate::payload::Payload;
use crate::proto::{self, Message, Parser, ServerErr, ServerErrKind, ServerInfo, ServerOp};
use crate::subscription::{DeliveryOutcome, Sid, SubscriptionRegistry};
use crate::transport::Transport;

const READ_CHUNK: usize = 64 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConnState {
    Dialing,
    Handshaking,
    Connected,
    Draining,
    Closed,
}

enum QueuedWrite {
    Sub { sid: Sid, subject: String, queue: Option<String> },
    Unsub { sid: Sid, max: Option<u64> },
    Pub { subject: String, reply: Option<String>, payload: Bytes },
    Ping { cb: Option<oneshot::Sender<Result<()>>> },
}

impl QueuedWrite {
    fn encode(&self) -> Bytes {
        match self {
            QueuedWrite::Sub { sid, subject, queue } => match queue {
                Some(q) => Bytes::from(format!("SUB {subject} {q} {sid}\r\n")),
                None => Bytes::from(format!("SUB {subject} {sid}\r\n")),
            },
            QueuedWrite::Unsub { sid, max } => match max {
                Some(m) => Bytes::from(format!("UNSUB {sid} {m}\r\n")),
                None => Bytes::from(format!("UNSUB {sid}\r\n")),
            },
            QueuedWrite::Pub { subject, reply, payload } => {
                let head = match reply {
                    Some(r) => format!("PUB {subject} {r} {}\r\n", payload.len()),
                    None => format!("PUB {subject} {}\r\n", payload.len()),
                };
                let mut buf = BytesMut::with_capacity(head.len() + payload.len() + 2);
                buf.extend_from_slice(head.as_bytes());
                buf.extend_from_slice(payload);
                buf.extend_from_slice(b"\r\n");
                buf.freeze()
            }
            QueuedWrite::Ping { .. } => Bytes::from_static(b"PING\r\n"),
        }
    }
}

/// Commands the public facade sends to the engine task.
pub enum Command {
    Publish {
        subject: String,
        reply: Option<String>,
        payload: Payload,
    },
    Subscribe {
        subject: String,
        queue: Option<String>,
        max: Option<u64>,
        tx: mpsc::UnboundedSender<Message>,
        resp: oneshot::Sender<Result<Sid>>,
    },
    Unsubscribe {
        sid: Sid,
        max: Option<u64>,
    },
    SetSubTimeout {
        sid: Sid,
        dur: Duration,
    },
    DrainSub {
        sid: Sid,
        resp: oneshot::Sender<Result<()>>,
    },
    Request {
        subject: String,
        payload: Payload,
        max: u64,
        timeout: Option<Duration>,
        resp: oneshot::Sender<Result<(String, mpsc::UnboundedReceiver<Result<Message>>)>>,
    },
    CancelRequest {
        token: String,
    },
    Flush {
        resp: oneshot::Sender<Result<()>>,
    },
    Drain {
        resp: oneshot::Sender<Result<()>>,
    },
    Close {
        resp: oneshot::Sender<()>,
    },
    /// Re-injected once the drain's unsub-flush PONG has been dispatched;
    /// never sent by the public facade. See `do_drain`.
    ContinueConnDrain {
        resp: oneshot::Sender<Result<()>>,
    },
    /// Re-injected once the drain's stop-publish-flush PONG has been
    /// dispatched.
    ContinueConnDrainFinal {
        resp: oneshot::Sender<Result<()>>,
    },
    /// Re-injected once a single subscription's drain-flush PONG has been
    /// dispatched. See `do_drain_sub`.
    ContinueSubDrain {
        sid: Sid,
        resp: oneshot::Sender<Result<()>>,
    },
}

/// A lightweight, cloneable handle the client facade and subscription
/// handles use to talk to the engine task.
#[derive(Clone)]
pub struct EngineHandle {
    cmd_tx: mpsc::UnboundedSender<Command>,
    events_tx: broadcast::Sender<Event>,
}

impl EngineHandle {
    pub fn send(&self, cmd: Command) -> std::result::Result<(), Command> {
        self.cmd_tx.send(cmd).map_err(|e| e.0)
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<Event> {
        self.events_tx.subscribe()
    }
}

fn validate_subject(subject: &str) -> Result<()> {
    if subject.is_empty() || subject.chars().any(|c| c.is_whitespace()) {
        return Err(Error::BadSubject(subject.to_owned()));
    }
    Ok(())
}

pub struct Engine {
    cmd_rx: mpsc::UnboundedReceiver<Command>,
    cmd_tx: mpsc::UnboundedSender<Command>,
    transport: Transport,
    pool: crate::serverpool::ServerPool,
    parser: Parser,
    inbound: ChainedBuffer,
    queue: VecDeque<QueuedWrite>,
    pongs: VecDeque<Option<oneshot::Sender<Result<()>>>>,
    subs: SubscriptionRegistry,
    mux: MuxLayer,
    opts: ConnectOptions,
    events_tx: broadcast::Sender<Event>,
    info: Option<Arc<ServerInfo>>,
    state: ConnState,
    missed_pongs: u32,
    reconnects_since_connect: u32,
    first_connect: bool,
    user_closed: bool,
    no_publish: bool,
    reconnect_deadline: Option<TokioInstant>,
    connect_resp: Option<oneshot::Sender<Result<Arc<ServerInfo>>>>,
}

impl Engine {
    /// Spawns the engine task and returns a handle plus a result future for
    /// the initial handshake (resolved once, then dropped).
    pub fn spawn(opts: ConnectOptions) -> (EngineHandle, oneshot::Receiver<Result<Arc<ServerInfo>>>) {
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let (events_tx, _) = broadcast::channel(1024);
        let (connect_tx, connect_rx) = oneshot::channel();

        let pool = crate::serverpool::ServerPool::new(None, opts.servers.clone(), !opts.no_randomize);
        let control_line_limit = opts.control_line_limit;
        let payload_mode = opts.payload;
        let encoding = opts.encoding;

        let engine = Engine {
            cmd_rx,
            cmd_tx: cmd_tx.clone(),
            transport: Transport::new(),
            pool,
            parser: Parser::new(control_line_limit, payload_mode, encoding),
            inbound: ChainedBuffer::new(),
            queue: VecDeque::new(),
            pongs: VecDeque::new(),
            subs: SubscriptionRegistry::new(),
            mux: MuxLayer::new(),
            opts,
            events_tx: events_tx.clone(),
            info: None,
            state: ConnState::Dialing,
            missed_pongs: 0,
            reconnects_since_connect: 0,
            first_connect: true,
            user_closed: false,
            no_publish: false,
            reconnect_deadline: None,
            connect_resp: Some(connect_tx),
        };

        tokio::spawn(engine.run());

        (EngineHandle { cmd_tx, events_tx }, connect_rx)
    }

    #[instrument(skip(self))]
    async fn run(mut self) {
        if let Err(e) = self.dial_and_handshake().await {
            warn!(error = %e, "initial connect failed");
            if self.opts.wait_on_first_connect {
                self.schedule_reconnect();
            } else {
                if let Some(resp) = self.connect_resp.take() {
                    let _ = resp.send(Err(e));
                }
                return;
            }
        }

        let mut read_buf = vec![0u8; READ_CHUNK];
        let mut ping_ticker = interval(self.opts.ping_interval.max(Duration::from_millis(1)));
        ping_ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ping_ticker.reset();

        loop {
            if self.state == ConnState::Closed {
                break;
            }

            let connected = self.transport.is_connected();
            let want_reconnect_timer = self.reconnect_deadline.is_some();
            let deadline = self.reconnect_deadline.unwrap_or_else(TokioInstant::now);

            let timeout_deadline = self.next_timeout_deadline();
            let want_timeout_timer = timeout_deadline.is_some();
            let timeout_sleep = timeout_deadline
                .map(|d| d.saturating_duration_since(std::time::Instant::now()))
                .unwrap_or_default();

            tokio::select! {
                cmd = self.cmd_rx.recv() => {
                    match cmd {
                        Some(cmd) => self.handle_command(cmd).await,
                        None => { self.do_close(false).await; break; }
                    }
                }
                res = self.transport.read(&mut read_buf), if connected => {
                    match res {
                        Ok(0) => self.on_transport_broken().await,
                        Ok(n) => {
                            self.inbound.fill(Bytes::copy_from_slice(&read_buf[..n]));
                            if let Err(e) = self.process_inbound().await {
                                warn!(error = %e, "protocol error, dropping connection");
                                self.on_transport_broken().await;
                            }
                        }
                        Err(e) => {
                            debug!(error = %e, "read error");
                            self.on_transport_broken().await;
                        }
                    }
                }
                _ = ping_ticker.tick(), if self.state == ConnState::Connected => {
                    self.heartbeat_tick().await;
                }
                _ = sleep_until(deadline), if want_reconnect_timer => {
                    self.reconnect_deadline = None;
                    self.attempt_reconnect().await;
                }
                _ = sleep(timeout_sleep), if want_timeout_timer => {
                    self.timeout_tick().await;
                }
            }
        }

        self.subs.clear();
        self.mux.clear();
        let _ = self.events_tx.send(Event::Close);
    }

    // ---- command handling ----

    async fn handle_command(&mut self, cmd: Command) {
        match cmd {
            Command::Publish { subject, reply, payload } => {
                if let Err(e) = self.do_publish(subject, reply, payload).await {
                    let _ = self.events_tx.send(Event::Error(Arc::new(e)));
                }
            }
            Command::Subscribe { subject, queue, max, tx, resp } => {
                let result = self.do_subscribe(subject, queue, max, tx).await;
                let _ = resp.send(result);
            }
            Command::Unsubscribe { sid, max } => {
                self.do_unsubscribe(sid, max).await;
            }
            Command::SetSubTimeout { sid, dur } => {
                self.subs.set_timeout(sid, dur);
            }
            Command::DrainSub { sid, resp } => {
                self.do_drain_sub(sid, resp).await;
            }
            Command::Request { subject, payload, max, timeout, resp } => {
                let result = self.do_request(subject, payload, max, timeout).await;
                let _ = resp.send(result);
            }
            Command::CancelRequest { token } => {
                self.mux.cancel(&token);
            }
            Command::Flush { resp } => {
                self.do_flush(resp).await;
            }
            Command::Drain { resp } => {
                self.do_drain(resp).await;
            }
            Command::Close { resp } => {
                self.do_close(true).await;
                let _ = resp.send(());
            }
            Command::ContinueConnDrain { resp } => {
                self.continue_conn_drain(resp).await;
            }
            Command::ContinueConnDrainFinal { resp } => {
                self.continue_conn_drain_final(resp).await;
            }
            Command::ContinueSubDrain { sid, resp } => {
                self.continue_sub_drain(sid, resp).await;
            }
        }
    }

    async fn do_publish(&mut self, subject: String, reply: Option<String>, payload: Payload) -> Result<()> {
        if self.no_publish {
            return Err(Error::ConnDraining);
        }
        if self.state == ConnState::Closed {
            return Err(Error::ConnClosed);
        }
        validate_subject(&subject)?;
        if let Some(r) = &reply {
            validate_subject(r)?;
        }
        self.queue.push_back(QueuedWrite::Pub { subject, reply, payload: payload.encode() });
        self.flush_queue().await;
        Ok(())
    }

    async fn do_subscribe(
        &mut self,
        subject: String,
        queue: Option<String>,
        max: Option<u64>,
        tx: mpsc::UnboundedSender<Message>,
    ) -> Result<Sid> {
        if self.state == ConnState::Draining {
            return Err(Error::ConnDraining);
        }
        if self.state == ConnState::Closed {
            return Err(Error::ConnClosed);
        }
        validate_subject(&subject)?;
        let sid = self.subs.allocate_sid();
        self.subs.insert(sid, subject.clone(), queue.clone(), max, tx);
        self.queue.push_back(QueuedWrite::Sub { sid, subject: subject.clone(), queue: queue.clone() });
        self.flush_queue().await;
        let _ = self.events_tx.send(Event::Subscribe { sid, subject, queue });
        Ok(sid)
    }

    async fn do_unsubscribe(&mut self, sid: Sid, max: Option<u64>) {
        match max {
            None | Some(0) => {
                if let Some((subject, queue)) = self.subs.subject_of(sid).map(|(s, q)| (s.to_owned(), q.map(|s| s.to_owned()))) {
                    self.subs.remove(sid);
                    self.queue.push_back(QueuedWrite::Unsub { sid, max: None });
                    self.flush_queue().await;
                    let _ = self.events_tx.send(Event::Unsubscribe { sid, subject, queue });
                }
            }
            Some(m) => {
                self.queue.push_back(QueuedWrite::Unsub { sid, max: Some(m) });
                self.flush_queue().await;
            }
        }
    }

    async fn do_drain_sub(&mut self, sid: Sid, resp: oneshot::Sender<Result<()>>) {
        if !self.subs.contains(sid) {
            let _ = resp.send(Err(Error::SubClosed));
            return;
        }
        self.subs.set_draining(sid);
        self.queue.push_back(QueuedWrite::Unsub { sid, max: None });
        let rx = self.flush_barrier().await;
        self.spawn_after_flush(rx, move || Command::ContinueSubDrain { sid, resp });
    }

    /// Resumes after the PONG for `do_drain_sub`'s unsub-flush has been
    /// dispatched by the `ServerOp::Pong` arm, never while the select loop
    /// is blocked waiting for it.
    async fn continue_sub_drain(&mut self, sid: Sid, resp: oneshot::Sender<Result<()>>) {
        if let Some((subject, queue)) = self.subs.subject_of(sid).map(|(s, q)| (s.to_owned(), q.map(|s| s.to_owned()))) {
            self.subs.remove(sid);
            let _ = self.events_tx.send(Event::Unsubscribe { sid, subject, queue });
        }
        let _ = resp.send(Ok(()));
    }

    async fn do_request(
        &mut self,
        subject: String,
        payload: Payload,
        max: u64,
        timeout: Option<Duration>,
    ) -> Result<(String, mpsc::UnboundedReceiver<Result<Message>>)> {
        if self.state == ConnState::Draining {
            return Err(Error::ConnDraining);
        }
        validate_subject(&subject)?;
        if let Some(wildcard) = self.mux.ensure_initialized() {
            let sid = self.subs.allocate_sid();
            self.mux.set_sid(sid);
            self.queue.push_back(QueuedWrite::Sub { sid, subject: wildcard, queue: None });
        }
        let (reply_subject, rx) = self.mux.new_request(max.max(1), timeout);
        let token = reply_subject
            .rsplit('.')
            .next()
            .unwrap_or_default()
            .to_owned();
        self.queue.push_back(QueuedWrite::Pub {
            subject,
            reply: Some(reply_subject),
            payload: payload.encode(),
        });
        self.flush_queue().await;
        Ok((token, rx))
    }

    async fn do_flush(&mut self, resp: oneshot::Sender<Result<()>>) {
        if self.state == ConnState::Closed {
            let _ = resp.send(Err(Error::ConnClosed));
            return;
        }
        self.queue.push_back(QueuedWrite::Ping { cb: Some(resp) });
        self.flush_queue().await;
    }

    /// Queues a PING and flushes it, returning a receiver that resolves
    /// once the matching PONG is dispatched. Unlike `do_flush`, the caller
    /// does not await the receiver itself — that would block the select
    /// loop's own `cmd` arm against the `transport.read` arm that delivers
    /// the PONG. Callers instead hand the receiver to `spawn_after_flush`.
    async fn flush_barrier(&mut self) -> oneshot::Receiver<Result<()>> {
        let (tx, rx) = oneshot::channel();
        if self.state == ConnState::Closed {
            let _ = tx.send(Err(Error::ConnClosed));
            return rx;
        }
        self.queue.push_back(QueuedWrite::Ping { cb: Some(tx) });
        self.flush_queue().await;
        rx
    }

    /// Spawns a detached task that waits for a flush barrier off the select
    /// loop, then re-injects `make_cmd()` through the engine's own command
    /// channel so the continuation runs on a later loop iteration.
    fn spawn_after_flush(&self, rx: oneshot::Receiver<Result<()>>, make_cmd: impl FnOnce() -> Command + Send + 'static) {
        let cmd_tx = self.cmd_tx.clone();
        tokio::spawn(async move {
            let _ = rx.await;
            let _ = cmd_tx.send(make_cmd());
        });
    }

    async fn do_drain(&mut self, resp: oneshot::Sender<Result<()>>) {
        if self.state == ConnState::Draining || self.state == ConnState::Closed {
            let _ = resp.send(Ok(()));
            return;
        }
        self.state = ConnState::Draining;
        let sids = self.subs.sids();
        for sid in sids {
            self.subs.set_draining(sid);
            self.queue.push_back(QueuedWrite::Unsub { sid, max: None });
        }
        let rx = self.flush_barrier().await;
        self.spawn_after_flush(rx, move || Command::ContinueConnDrain { resp });
    }

    /// Resumes once the unsub-flush PONG has dispatched: stops accepting
    /// new publishes and starts the second flush barrier.
    async fn continue_conn_drain(&mut self, resp: oneshot::Sender<Result<()>>) {
        self.no_publish = true;
        let rx = self.flush_barrier().await;
        self.spawn_after_flush(rx, move || Command::ContinueConnDrainFinal { resp });
    }

    /// Resumes once the stop-publish-flush PONG has dispatched: the queue
    /// is now known empty of anything draining needed to wait on, so the
    /// connection can close.
    async fn continue_conn_drain_final(&mut self, resp: oneshot::Sender<Result<()>>) {
        self.do_close(true).await;
        let _ = resp.send(Ok(()));
    }

    async fn do_close(&mut self, by_user: bool) {
        if self.state == ConnState::Closed {
            return;
        }
        self.user_closed = by_user;
        self.state = ConnState::Closed;
        self.reconnect_deadline = None;

        for cb in self.pongs.drain(..).flatten() {
            let _ = cb.send(Err(Error::ConnClosed));
        }
        for item in self.queue.drain(..) {
            if let QueuedWrite::Ping { cb: Some(cb) } = item {
                let _ = cb.send(Err(Error::ConnClosed));
            }
        }
        self.transport.destroy();
    }

    // ---- inbound processing ----

    #[instrument(skip(self))]
    async fn process_inbound(&mut self) -> Result<()> {
        let start = std::time::Instant::now();
        loop {
            let ops = self.parser.feed(&mut self.inbound)?;
            if ops.is_empty() {
                break;
            }
            for op in ops {
                self.dispatch_op(op).await?;
            }
            if let Some(yield_time) = self.opts.yield_time {
                if start.elapsed() >= yield_time {
                    let _ = self.events_tx.send(Event::Yield);
                    tokio::task::yield_now().await;
                }
            }
        }
        Ok(())
    }

    async fn dispatch_op(&mut self, op: ServerOp) -> Result<()> {
        match op {
            ServerOp::Ping => {
                // Latency-sensitive: write the PONG reply immediately
                // rather than waiting for the next coalesced batch.
                let _ = self.transport.write_all(b"PONG\r\n").await;
            }
            ServerOp::Pong => {
                self.missed_pongs = 0;
                if let Some(cb) = self.pongs.pop_front() {
                    if self.state == ConnState::Handshaking {
                        self.complete_handshake().await;
                    }
                    if let Some(cb) = cb {
                        let _ = cb.send(Ok(()));
                    }
                }
            }
            ServerOp::Ok => {}
            ServerOp::Err(err) => self.handle_server_err(err).await,
            ServerOp::Info(info) => self.handle_info(info).await?,
            ServerOp::Message(msg) => self.handle_message(msg).await,
        }
        Ok(())
    }

    async fn handle_message(&mut self, msg: Message) {
        if self.mux.dispatch(msg.clone()) {
            return;
        }
        let sid = msg.sid;
        if let DeliveryOutcome::DeliveredAndExhausted = self.subs.dispatch(msg) {
            self.queue.push_back(QueuedWrite::Unsub { sid, max: None });
            self.flush_queue().await;
        }
    }

    async fn handle_server_err(&mut self, err: ServerErr) {
        match err.kind {
            ServerErrKind::Perm => {
                let _ = self.events_tx.send(Event::PermissionError(Arc::new(Error::PermissionsViolation(err.text))));
            }
            ServerErrKind::Auth => {
                let e = Error::AuthorizationViolation(err.text);
                let _ = self.events_tx.send(Event::Error(Arc::new(e)));
                self.on_transport_broken().await;
            }
            ServerErrKind::Protocol => {
                let e = Error::ProtocolError(err.text);
                let _ = self.events_tx.send(Event::Error(Arc::new(e)));
                self.on_transport_broken().await;
            }
        }
    }

    async fn handle_info(&mut self, info: ServerInfo) -> Result<()> {
        let update = self.pool.process_server_update(&info.connect_urls);
        if !update.added.is_empty() || !update.deleted.is_empty() {
            let _ = self.events_tx.send(Event::ServersChanged { added: update.added, deleted: update.deleted });
        }
        self.info = Some(Arc::new(info));

        if self.state == ConnState::Dialing {
            self.state = ConnState::Handshaking;
            self.send_handshake_burst().await?;
        }
        Ok(())
    }

    // ---- connect / handshake ----

    #[instrument(skip(self))]
    async fn dial_and_handshake(&mut self) -> Result<()> {
        self.state = ConnState::Dialing;
        let Some(endpoint) = self.pool.current() else {
            return Err(Error::ConnError { url: String::new(), source: std::io::Error::new(std::io::ErrorKind::NotFound, "empty server pool") });
        };
        let url = endpoint.url.clone();
        let parsed = endpoint_url::parse(&url)?;

        self.transport.connect(&parsed.host, parsed.port, self.opts.dial_timeout).await?;
        info!(url = %url, "transport connected, awaiting INFO");

        // The first INFO frame drives the rest of the handshake from
        // `handle_info`/`complete_handshake`; wait here for that to finish
        // by reading until the state leaves Dialing/Handshaking.
        let mut read_buf = vec![0u8; READ_CHUNK];
        loop {
            match self.state {
                ConnState::Connected => return Ok(()),
                ConnState::Closed => return Err(Error::ConnClosed),
                _ => {}
            }
            let n = tokio::time::timeout(self.opts.dial_timeout, self.transport.read(&mut read_buf))
                .await
                .map_err(|_| Error::ConnTimeout { url: url.clone() })?
                .map_err(|e| Error::ConnError { url: url.clone(), source: e })?;
            if n == 0 {
                return Err(Error::ConnError {
                    url: url.clone(),
                    source: std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "connection closed during handshake"),
                });
            }
            self.inbound.fill(Bytes::copy_from_slice(&read_buf[..n]));
            self.process_inbound().await?;
        }
    }

    fn resolve_tls(&self, info: &ServerInfo) -> Result<Option<Arc<rustls::ClientConfig>>> {
        use crate::options::TlsMode;
        match (&self.opts.tls, info.tls_required) {
            (TlsMode::Disabled, true) => Err(Error::SecureConnRequired),
            (TlsMode::Enabled(_), false) => Err(Error::NonSecureConnRequired),
            (TlsMode::Enabled(cfg), true) => Ok(Some(cfg.clone())),
            (TlsMode::Unspecified, true) => Err(Error::TlsError(
                "server requires TLS but no client TLS configuration was provided".into(),
            )),
            (TlsMode::Disabled, false) | (TlsMode::Unspecified, false) => Ok(None),
        }
    }

    async fn send_handshake_burst(&mut self) -> Result<()> {
        let info = self.info.clone().expect("INFO must be set before handshake burst");

        if let Some(cfg) = self.resolve_tls(&info)? {
            let endpoint = self.pool.current().expect("pool non-empty during handshake");
            let parsed = endpoint_url::parse(&endpoint.url)?;
            self.transport.upgrade_tls(cfg, &parsed.host).await?;
        }

        let endpoint = self.pool.current().expect("pool non-empty during handshake");
        let parsed = endpoint_url::parse(&endpoint.url)?;
        let url_creds = parsed.user.clone().map(|u| (u, parsed.pass.clone()));

        let connect_payload = proto::build_connect(&info, &self.opts, url_creds)?;
        let connect_json = serde_json::to_string(&connect_payload)?;

        let mut burst = BytesMut::new();
        burst.extend_from_slice(format!("CONNECT {connect_json}\r\n").as_bytes());
        for (sid, subject, queue) in self.subs.iter_subjects().map(|(s, subj, q)| (s, subj.to_owned(), q.map(|q| q.to_owned()))).collect::<Vec<_>>() {
            match queue {
                Some(q) => burst.extend_from_slice(format!("SUB {subject} {q} {sid}\r\n").as_bytes()),
                None => burst.extend_from_slice(format!("SUB {subject} {sid}\r\n").as_bytes()),
            }
        }
        if let (Some(mux_sid), Some(wildcard)) = (self.mux.sid(), self.mux.wildcard_subject()) {
            burst.extend_from_slice(format!("SUB {wildcard} {mux_sid}\r\n").as_bytes());
        }
        burst.extend_from_slice(b"PING\r\n");

        self.transport.write_all(&burst).await?;
        self.pongs.push_back(None);
        Ok(())
    }

    async fn complete_handshake(&mut self) {
        self.state = ConnState::Connected;
        self.missed_pongs = 0;
        self.pool.mark_connected();
        let info = self.info.clone();

        if self.first_connect {
            self.first_connect = false;
            if let Some(resp) = self.connect_resp.take() {
                let _ = resp.send(Ok(info.clone().unwrap_or_default()));
            }
            let _ = self.events_tx.send(Event::Connect {
                url: self.pool.current().map(|e| e.url.clone()).unwrap_or_default(),
                info: info.unwrap_or_default(),
            });
        } else {
            let _ = self.events_tx.send(Event::Reconnect {
                url: self.pool.current().map(|e| e.url.clone()).unwrap_or_default(),
                info: info.unwrap_or_default(),
            });
        }
        self.reconnects_since_connect = 0;
        self.flush_queue().await;
    }

    // ---- reconnect / disconnect ----

    async fn on_transport_broken(&mut self) {
        if self.state == ConnState::Closed {
            return;
        }
        let url = self.pool.current().map(|e| e.url.clone()).unwrap_or_default();
        self.transport.destroy();
        let _ = self.events_tx.send(Event::Disconnect { url });

        for cb in self.pongs.drain(..).flatten() {
            let _ = cb.send(Err(Error::StaleConnection));
        }
        self.queue.retain(|item| matches!(item, QueuedWrite::Pub { .. } | QueuedWrite::Ping { .. }));

        if self.user_closed || !self.opts.reconnect {
            self.do_close(self.user_closed).await;
            return;
        }
        if self.opts.max_reconnect_attempts >= 0 && self.reconnects_since_connect as i64 >= self.opts.max_reconnect_attempts {
            self.do_close(false).await;
            return;
        }
        self.schedule_reconnect();
    }

    fn schedule_reconnect(&mut self) {
        self.reconnects_since_connect += 1;
        let _ = self.events_tx.send(Event::Reconnecting { attempt: self.reconnects_since_connect });

        let next = self.pool.select_server();
        let base = match next {
            Some(e) if e.did_connect => self.opts.reconnect_time_wait,
            _ => Duration::from_millis(0),
        };
        let jitter = jittered(self.opts.reconnect_jitter);
        self.reconnect_deadline = Some(TokioInstant::now() + base + jitter);
        self.state = ConnState::Dialing;
    }

    async fn attempt_reconnect(&mut self) {
        self.pool.bump_reconnects();
        if let Err(e) = self.dial_and_handshake().await {
            debug!(error = %e, "reconnect attempt failed");
            self.on_transport_broken().await;
        }
    }

    // ---- heartbeat ----

    async fn heartbeat_tick(&mut self) {
        if self.missed_pongs >= self.opts.max_ping_out {
            warn!("stale connection detected, reconnecting");
            let _ = self.events_tx.send(Event::Error(Arc::new(Error::StaleConnection)));
            self.on_transport_broken().await;
            return;
        }
        self.missed_pongs += 1;
        let _ = self.events_tx.send(Event::PingTimer);
        let _ = self.events_tx.send(Event::PingCount(self.missed_pongs));
        self.queue.push_back(QueuedWrite::Ping { cb: None });
        self.flush_queue().await;
    }

    // ---- request / subscription timeouts ----

    fn next_timeout_deadline(&self) -> Option<std::time::Instant> {
        match (self.subs.next_timeout_deadline(), self.mux.next_timeout_deadline()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, None) => a,
            (None, b) => b,
        }
    }

    /// Expires both watchdog kinds due at or before now. Sub timeouts push
    /// a broker-side `UNSUB` (mirroring the max-exhaustion path in
    /// `handle_message`) and surface `Error::SubTimeout` over the events
    /// channel, since the per-subscription delivery channel carries bare
    /// `Message`s and cannot carry an explicit error. Request timeouts are
    /// fully handled inside `mux.expire_timeouts`, which resolves each
    /// pending request's own channel directly.
    async fn timeout_tick(&mut self) {
        let now = std::time::Instant::now();
        for sid in self.subs.expire_timeouts(now) {
            self.queue.push_back(QueuedWrite::Unsub { sid, max: None });
            let _ = self.events_tx.send(Event::Error(Arc::new(Error::SubTimeout)));
        }
        self.mux.expire_timeouts(now);
        self.flush_queue().await;
    }

    // ---- write coalescing ----

    async fn flush_queue(&mut self) {
        if self.queue.is_empty() || !self.transport.is_connected() {
            return;
        }
        let mut buf = BytesMut::new();
        let mut drained = Vec::with_capacity(self.queue.len());
        while let Some(item) = self.queue.pop_front() {
            buf.extend_from_slice(&item.encode());
            drained.push(item);
            if buf.len() >= self.opts.flush_threshold {
                break;
            }
        }

        match self.transport.write_all(&buf).await {
            Ok(()) => {
                for item in drained {
                    if let QueuedWrite::Ping { cb } = item {
                        self.pongs.push_back(cb);
                    }
                }
                trace!(bytes = buf.len(), "flushed outbound batch");
            }
            Err(e) => {
                for item in drained.into_iter().rev() {
                    self.queue.push_front(item);
                }
                warn!(error = %e, "write failed");
                self.on_transport_broken().await;
            }
        }
    }
}

fn jittered(max: Duration) -> Duration {
    if max.is_zero() {
        return max;
    }
    let millis = rand::random::<u64>() % (max.as_millis() as u64 + 1);
    Duration::from_millis(millis)
}
