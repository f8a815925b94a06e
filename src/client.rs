//! Public facade over the engine task.
//!
//! `Client` is a thin, cloneable handle: every method composes a
//! [`crate::engine::Command`], sends it over the engine's mpsc channel, and
//! awaits a oneshot response. All actual protocol state lives on the engine
//! task; nothing here is shared mutable state.

use std::time::Duration;

use tokio::sync::{broadcast, mpsc, oneshot};

use crate::engine::{Command, Engine, EngineHandle};
use crate::error::{Error, Result};
use crate::events::Event;
use crate::handle::{RequestStream, Subscription};
use crate::options::ConnectOptions;
use crate::payload::Payload;
use crate::proto::ServerInfo;
use std::sync::Arc;

/// A connected client. Clones share the same underlying engine task and
/// connection; dropping every clone does not by itself close the
/// connection (call [`Client::close`] explicitly, or drop the last
/// clone and let the engine observe the channel close).
#[derive(Clone)]
pub struct Client {
    handle: EngineHandle,
}

impl Client {
    /// Dials the first reachable server in `opts`, completes the handshake,
    /// and returns once connected (or fails immediately unless
    /// [`ConnectOptions::wait_on_first_connect`] was set).
    pub async fn connect(opts: ConnectOptions) -> Result<Self> {
        let (handle, connect_rx) = Engine::spawn(opts);
        let _info: Arc<ServerInfo> = connect_rx.await.map_err(|_| Error::ConnClosed)??;
        Ok(Client { handle })
    }

    fn send(&self, cmd: Command) -> Result<()> {
        self.handle.send(cmd).map_err(|_| Error::ConnClosed)
    }

    /// Publishes `payload` on `subject` with no reply-to subject set.
    pub async fn publish(&self, subject: impl Into<String>, payload: impl Into<Payload>) -> Result<()> {
        self.publish_with_reply(subject, None::<String>, payload).await
    }

    pub async fn publish_with_reply(
        &self,
        subject: impl Into<String>,
        reply: Option<impl Into<String>>,
        payload: impl Into<Payload>,
    ) -> Result<()> {
        self.send(Command::Publish {
            subject: subject.into(),
            reply: reply.map(Into::into),
            payload: payload.into(),
        })
    }

    pub async fn subscribe(&self, subject: impl Into<String>) -> Result<Subscription> {
        self.subscribe_inner(subject.into(), None, None).await
    }

    pub async fn queue_subscribe(&self, subject: impl Into<String>, queue: impl Into<String>) -> Result<Subscription> {
        self.subscribe_inner(subject.into(), Some(queue.into()), None).await
    }

    /// Subscribes with an upfront max-delivery count; the subscription is
    /// auto-removed (both locally and on the server, via `UNSUB <sid> <max>`)
    /// once `max` messages have been delivered.
    pub async fn subscribe_with_max(&self, subject: impl Into<String>, max: u64) -> Result<Subscription> {
        self.subscribe_inner(subject.into(), None, Some(max)).await
    }

    async fn subscribe_inner(&self, subject: String, queue: Option<String>, max: Option<u64>) -> Result<Subscription> {
        let (tx, rx) = mpsc::unbounded_channel();
        let (resp_tx, resp_rx) = oneshot::channel();
        self.send(Command::Subscribe { subject, queue, max, tx, resp: resp_tx })?;
        let sid = resp_rx.await.map_err(|_| Error::ConnClosed)??;
        Ok(Subscription::new(self.handle.clone(), sid, rx))
    }

    /// Sends a request and waits for exactly one reply, subject to
    /// `timeout` (falling back to no timeout when `None`).
    pub async fn request(
        &self,
        subject: impl Into<String>,
        payload: impl Into<Payload>,
        timeout: Option<Duration>,
    ) -> Result<crate::proto::Message> {
        let mut stream = self.request_stream(subject, payload, 1, timeout).await?;
        match stream.recv().await {
            Some(res) => res,
            None => Err(Error::ConnClosed),
        }
    }

    /// Sends a request expecting up to `max` replies (0 meaning unbounded),
    /// returning a stream rather than a single reply.
    pub async fn request_stream(
        &self,
        subject: impl Into<String>,
        payload: impl Into<Payload>,
        max: u64,
        timeout: Option<Duration>,
    ) -> Result<RequestStream> {
        let (resp_tx, resp_rx) = oneshot::channel();
        self.send(Command::Request {
            subject: subject.into(),
            payload: payload.into(),
            max,
            timeout,
            resp: resp_tx,
        })?;
        let (token, rx) = resp_rx.await.map_err(|_| Error::ConnClosed)??;
        Ok(RequestStream::new(self.handle.clone(), token, rx))
    }

    /// Round-trips a PING/PONG through the engine's write queue, resolving
    /// once every frame queued before this call has been flushed to the
    /// socket and acknowledged.
    pub async fn flush(&self) -> Result<()> {
        let (resp_tx, resp_rx) = oneshot::channel();
        self.send(Command::Flush { resp: resp_tx })?;
        resp_rx.await.map_err(|_| Error::ConnClosed)?
    }

    /// Unsubscribes every live subscription, flushes, stops publishing, and
    /// closes the connection — in that order, so in-flight replies have a
    /// chance to arrive before the socket goes away.
    pub async fn drain(&self) -> Result<()> {
        let (resp_tx, resp_rx) = oneshot::channel();
        self.send(Command::Drain { resp: resp_tx })?;
        resp_rx.await.map_err(|_| Error::ConnClosed)?
    }

    /// Closes the connection immediately without draining.
    pub async fn close(&self) -> Result<()> {
        let (resp_tx, resp_rx) = oneshot::channel();
        self.send(Command::Close { resp: resp_tx })?;
        resp_rx.await.map_err(|_| Error::ConnClosed)
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<Event> {
        self.handle.subscribe_events()
    }
}
