//! Async client for a text-based publish/subscribe and request/reply
//! broker protocol (NATS-shaped: `INFO`/`CONNECT`/`SUB`/`UNSUB`/`PUB`/`MSG`/
//! `PING`/`PONG`/`+OK`/`-ERR` control lines, optional TLS upgrade,
//! string-delimited subjects, wildcard inbox-based request/reply).
//!
//! The connection is driven by a single background task (see
//! [`engine`]) reachable through the cloneable [`Client`] facade. Calling
//! code never touches the socket, the parser, or the subscription registry
//! directly — every operation is a message sent to that task.
//!
//! ```no_run
//! use brokerlink::{Client, ConnectOptions};
//!
//! # async fn run() -> brokerlink::Result<()> {
//! let client = Client::connect(ConnectOptions::new().with_server("nats://localhost:4222")).await?;
//! let mut sub = client.subscribe("greetings").await?;
//! client.publish("greetings", "hello").await?;
//! if let Some(msg) = sub.next().await {
//!     println!("{:?}", msg.payload.as_bytes());
//! }
//! # Ok(())
//! # }
//! ```

mod buffer;
mod client;
mod endpoint_url;
mod engine;
mod error;
mod events;
mod handle;
mod mux;
mod nuid;
mod options;
mod payload;
mod proto;
mod serverpool;
mod subscription;
mod transport;

pub use client::Client;
pub use error::{Error, Result};
pub use events::Event;
pub use handle::{RequestStream, Subscription};
pub use options::{ConnectOptions, CredentialSource, NonceSigner, PayloadMode, TextEncoding, TlsMode};
pub use payload::Payload;
pub use proto::{Message, ServerInfo};
pub use subscription::Sid;
