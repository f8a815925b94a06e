//! TCP socket with TLS upgrade.
//!
//! The engine owns a `Transport` exclusively and drives it from the same
//! task that processes commands and inbound bytes, so there is no internal
//! locking here: single ownership already guarantees the
//! single-writer/single-reader contract, unlike a Mutex-serialized
//! transport built for a multi-caller accept loop.

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use rustls_pki_types::ServerName;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::{lookup_host, TcpStream};
use tokio::time::timeout;
use tokio_rustls::TlsConnector;

use crate::error::{Error, Result};

/// Marker trait tying together the bounds needed to box either a plain or
/// TLS-wrapped stream behind one dynamically-dispatched type.
pub trait AsyncReadWrite: AsyncRead + AsyncWrite + Unpin + Send {}
impl<T: AsyncRead + AsyncWrite + Unpin + Send> AsyncReadWrite for T {}

pub struct Transport {
    conn: Option<Box<dyn AsyncReadWrite>>,
    peer_addr: Option<SocketAddr>,
}

impl Transport {
    pub fn new() -> Self {
        Transport { conn: None, peer_addr: None }
    }

    pub fn is_connected(&self) -> bool {
        self.conn.is_some()
    }

    pub fn peer_addr(&self) -> Option<SocketAddr> {
        self.peer_addr
    }

    /// Resolves `host:port` (possibly to several addresses) and connects to
    /// the first one that accepts within `dial_timeout`, per the
    /// "multiple-address-per-host" resolution behavior.
    pub async fn connect(&mut self, host: &str, port: u16, dial_timeout: Duration) -> Result<()> {
        let hostport = format!("{host}:{port}");
        let addrs = timeout(dial_timeout, lookup_host(hostport.clone()))
            .await
            .map_err(|_| Error::ConnTimeout { url: hostport.clone() })?
            .map_err(|e| Error::ConnError { url: hostport.clone(), source: e })?;

        let mut last_err: Option<io::Error> = None;
        for addr in addrs {
            match timeout(dial_timeout, TcpStream::connect(addr)).await {
                Ok(Ok(stream)) => {
                    let _ = stream.set_nodelay(true);
                    self.peer_addr = stream.peer_addr().ok();
                    self.conn = Some(Box::new(stream));
                    return Ok(());
                }
                Ok(Err(e)) => last_err = Some(e),
                Err(_) => {
                    return Err(Error::ConnTimeout { url: hostport });
                }
            }
        }
        Err(Error::ConnError {
            url: hostport,
            source: last_err.unwrap_or_else(|| io::Error::new(io::ErrorKind::NotFound, "no addresses resolved")),
        })
    }

    /// Wraps the live plain socket with TLS, consuming and replacing the
    /// connection in place.
    pub async fn upgrade_tls(&mut self, client_config: Arc<rustls::ClientConfig>, sni_host: &str) -> Result<()> {
        let stream = self
            .conn
            .take()
            .ok_or_else(|| Error::TlsError("cannot upgrade a transport with no active connection".into()))?;
        // `TlsConnector` requires a concrete `TcpStream`-like type only in
        // that it needs `AsyncRead + AsyncWrite + Unpin`; our boxed trait
        // object already satisfies that.
        let connector = TlsConnector::from(client_config);
        let server_name = ServerName::try_from(sni_host.to_owned())
            .map_err(|e| Error::TlsError(format!("invalid server name {sni_host:?}: {e}")))?;
        let tls_stream = connector
            .connect(server_name, stream)
            .await
            .map_err(|e| Error::TlsError(e.to_string()))?;
        self.conn = Some(Box::new(tls_stream));
        Ok(())
    }

    /// Cancel-safe: safe to race inside `tokio::select!` against other
    /// branches without losing bytes already read into `buf` (per
    /// `AsyncReadExt::read`'s documented cancellation contract).
    pub async fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match &mut self.conn {
            Some(conn) => conn.read(buf).await,
            None => Err(io::Error::new(io::ErrorKind::NotConnected, "transport not connected")),
        }
    }

    pub async fn write_all(&mut self, bytes: &[u8]) -> io::Result<()> {
        match &mut self.conn {
            Some(conn) => conn.write_all(bytes).await,
            None => Err(io::Error::new(io::ErrorKind::NotConnected, "transport not connected")),
        }
    }

    /// Tears down the socket. Idempotent.
    pub fn destroy(&mut self) {
        self.conn = None;
        self.peer_addr = None;
    }
}

impl Default for Transport {
    fn default() -> Self {
        Self::new()
    }
}
