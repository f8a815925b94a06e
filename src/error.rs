//! Closed-set error taxonomy exposed to callers.
//!
//! Every variant here corresponds to an error code a caller can match on;
//! the set is intentionally closed rather than left open with a catch-all
//! "other" bucket, so downstream code can exhaustively handle connection
//! lifecycle events.

use std::io;

/// Result alias used throughout the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    // --- Authentication / authorization ---
    #[error("bad authentication: {0}")]
    BadAuthentication(String),
    #[error("authorization violation: {0}")]
    AuthorizationViolation(String),
    #[error("permissions violation: {0}")]
    PermissionsViolation(String),
    #[error("server requested signed nonce but no signing callback is configured")]
    SignatureRequired,
    #[error("server requested signed nonce but neither an nkey nor a user JWT is configured")]
    NkeyOrJwtRequired,
    #[error("configured nonce signer is not callable")]
    NonceSignerNotFunc,
    #[error("invalid or unreadable credentials: {0}")]
    BadCreds(String),
    #[error("invalid nkey seed: {0}")]
    BadNkeySeed(String),

    // --- TLS ---
    #[error("server requires a secure connection but TLS is disabled")]
    SecureConnRequired,
    #[error("TLS is enabled but the server did not request a secure connection")]
    NonSecureConnRequired,
    #[error("server requires a verified client certificate but none is configured")]
    ClientCertRequired,
    #[error("TLS error: {0}")]
    TlsError(String),

    // --- Connection lifecycle ---
    #[error("failed to connect to {url}: {source}")]
    ConnError { url: String, source: io::Error },
    #[error("connection closed")]
    ConnClosed,
    #[error("connection is draining")]
    ConnDraining,
    #[error("connection attempt to {url} timed out")]
    ConnTimeout { url: String },
    #[error("stale connection: missed too many PONGs")]
    StaleConnection,

    // --- Protocol & payload ---
    #[error("protocol error: {0}")]
    ProtocolError(String),
    #[error("invalid JSON payload: {0}")]
    BadJson(#[from] serde_json::Error),
    #[error("malformed MSG control line: {0}")]
    BadMsg(String),
    #[error("malformed reply subject: {0}")]
    BadReply(String),
    #[error("invalid subject: {0}")]
    BadSubject(String),
    #[error("invalid payload encoding: {0}")]
    InvalidEncoding(String),
    #[error("no-echo requested but server protocol version does not support it")]
    NoEchoNotSupported,

    // --- Subscriptions & requests ---
    #[error("subscription closed")]
    SubClosed,
    #[error("subscription is draining")]
    SubDraining,
    #[error("subscription timed out waiting for a message")]
    SubTimeout,
    #[error("request timed out waiting for a reply")]
    ReqTimeout,

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl Error {
    /// Stable string code for programmatic matching by callers.
    pub fn code(&self) -> &'static str {
        match self {
            Error::BadAuthentication(_) => "BAD_AUTHENTICATION",
            Error::AuthorizationViolation(_) => "AUTHORIZATION_VIOLATION",
            Error::PermissionsViolation(_) => "PERMISSIONS_VIOLATION",
            Error::SignatureRequired => "SIGNATURE_REQUIRED",
            Error::NkeyOrJwtRequired => "NKEY_OR_JWT_REQ",
            Error::NonceSignerNotFunc => "NONCE_SIGNER_NOTFUNC",
            Error::BadCreds(_) => "BAD_CREDS",
            Error::BadNkeySeed(_) => "BAD_NKEY_SEED",
            Error::SecureConnRequired => "SECURE_CONN_REQ",
            Error::NonSecureConnRequired => "NON_SECURE_CONN_REQ",
            Error::ClientCertRequired => "CLIENT_CERT_REQ",
            Error::TlsError(_) => "OPENSSL_ERR",
            Error::ConnError { .. } => "CONN_ERR",
            Error::ConnClosed => "CONN_CLOSED",
            Error::ConnDraining => "CONN_DRAINING",
            Error::ConnTimeout { .. } => "CONN_TIMEOUT",
            Error::StaleConnection => "STALE_CONNECTION",
            Error::ProtocolError(_) => "NATS_PROTOCOL_ERR",
            Error::BadJson(_) => "BAD_JSON",
            Error::BadMsg(_) => "BAD_MSG",
            Error::BadReply(_) => "BAD_REPLY",
            Error::BadSubject(_) => "BAD_SUBJECT",
            Error::InvalidEncoding(_) => "INVALID_ENCODING",
            Error::NoEchoNotSupported => "NO_ECHO_NOT_SUPPORTED",
            Error::SubClosed => "SUB_CLOSED",
            Error::SubDraining => "SUB_DRAINING",
            Error::SubTimeout => "SUB_TIMEOUT",
            Error::ReqTimeout => "REQ_TIMEOUT",
            Error::Io(_) => "IO_ERR",
        }
    }

    /// True for errors that are non-fatal: surfaced but the connection
    /// stays up. Currently just permission violations.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Error::PermissionsViolation(_))
    }
}

