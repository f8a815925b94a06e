//! Client configuration.

use std::sync::Arc;
use std::time::Duration;

/// How inbound message payloads are decoded before being handed to a
/// subscription callback. Outbound publishes are encoded per the variant
/// of [`crate::Payload`] passed in, independent of this setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadMode {
    Binary,
    String,
    Json,
}

impl Default for PayloadMode {
    fn default() -> Self {
        PayloadMode::Binary
    }
}

/// Byte-to-`String` decoding used when [`PayloadMode::String`] is active.
/// Irrelevant for `Binary` and `Json` modes, which never go through this
/// step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextEncoding {
    /// Reject (with a decode error attached, not an abort) bytes that
    /// aren't valid UTF-8.
    Utf8,
    /// ISO-8859-1: every byte maps directly to the Unicode scalar value of
    /// the same number, so decoding never fails.
    Latin1,
}

impl Default for TextEncoding {
    fn default() -> Self {
        TextEncoding::Utf8
    }
}

/// TLS posture requested by the caller.
#[derive(Clone, Default)]
pub enum TlsMode {
    /// No client preference; upgrade iff the server's INFO requires it.
    #[default]
    Unspecified,
    /// Refuse to upgrade even if the server requires TLS.
    Disabled,
    /// Always upgrade before the handshake, using the given client config.
    Enabled(Arc<rustls::ClientConfig>),
}

impl std::fmt::Debug for TlsMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TlsMode::Unspecified => write!(f, "Unspecified"),
            TlsMode::Disabled => write!(f, "Disabled"),
            TlsMode::Enabled(_) => write!(f, "Enabled(..)"),
        }
    }
}

/// A zero-arg or cached credential value: either a literal string or a
/// callback invoked each time a CONNECT frame is composed (e.g. a JWT
/// refreshed out of band).
#[derive(Clone)]
pub enum CredentialSource {
    Literal(String),
    Callback(Arc<dyn Fn() -> String + Send + Sync>),
}

impl std::fmt::Debug for CredentialSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CredentialSource::Literal(_) => write!(f, "Literal(..)"),
            CredentialSource::Callback(_) => write!(f, "Callback(..)"),
        }
    }
}

impl CredentialSource {
    pub fn resolve(&self) -> String {
        match self {
            CredentialSource::Literal(s) => s.clone(),
            CredentialSource::Callback(f) => f(),
        }
    }
}

impl From<&str> for CredentialSource {
    fn from(s: &str) -> Self {
        CredentialSource::Literal(s.to_owned())
    }
}

impl From<String> for CredentialSource {
    fn from(s: String) -> Self {
        CredentialSource::Literal(s)
    }
}

/// Signs a server-issued nonce with the caller's private key, returning raw
/// signature bytes (the engine base64-encodes them). Credential parsing and
/// key material live entirely outside this crate; only the callback
/// boundary is specified here.
pub type NonceSigner = Arc<dyn Fn(&[u8]) -> Vec<u8> + Send + Sync>;

/// Connection-level configuration. Constructed via [`ConnectOptions::new`]
/// and the `with_*` builder methods, a plain hand-written builder rather
/// than a derive-macro one (no optional fields are exotic enough to need
/// one).
#[derive(Clone, Debug)]
pub struct ConnectOptions {
    pub(crate) servers: Vec<String>,
    pub(crate) no_randomize: bool,
    pub(crate) reconnect: bool,
    pub(crate) reconnect_time_wait: Duration,
    pub(crate) reconnect_jitter: Duration,
    pub(crate) max_reconnect_attempts: i64,
    pub(crate) ping_interval: Duration,
    pub(crate) max_ping_out: u32,
    pub(crate) wait_on_first_connect: bool,
    pub(crate) dial_timeout: Duration,
    pub(crate) yield_time: Option<Duration>,
    pub(crate) no_echo: bool,
    pub(crate) name: Option<String>,
    pub(crate) user: Option<CredentialSource>,
    pub(crate) pass: Option<CredentialSource>,
    pub(crate) token: Option<CredentialSource>,
    pub(crate) nkey: Option<String>,
    pub(crate) user_jwt: Option<CredentialSource>,
    pub(crate) nonce_signer: Option<NonceSigner>,
    pub(crate) tls: TlsMode,
    pub(crate) payload: PayloadMode,
    pub(crate) encoding: TextEncoding,
    pub(crate) flush_threshold: usize,
    pub(crate) control_line_limit: usize,
}

impl Default for ConnectOptions {
    fn default() -> Self {
        ConnectOptions {
            servers: Vec::new(),
            no_randomize: false,
            reconnect: true,
            reconnect_time_wait: Duration::from_millis(2_000),
            reconnect_jitter: Duration::from_millis(100),
            max_reconnect_attempts: 60,
            ping_interval: Duration::from_secs(2 * 60),
            max_ping_out: 2,
            wait_on_first_connect: false,
            dial_timeout: Duration::from_secs(20),
            yield_time: None,
            no_echo: false,
            name: None,
            user: None,
            pass: None,
            token: None,
            nkey: None,
            user_jwt: None,
            nonce_signer: None,
            tls: TlsMode::default(),
            payload: PayloadMode::default(),
            encoding: TextEncoding::default(),
            flush_threshold: 64 * 1024,
            control_line_limit: 1024 * 1024,
        }
    }
}

impl ConnectOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_server(mut self, url: impl Into<String>) -> Self {
        self.servers.push(url.into());
        self
    }

    pub fn with_servers<I, S>(mut self, urls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.servers.extend(urls.into_iter().map(Into::into));
        self
    }

    pub fn no_randomize(mut self, value: bool) -> Self {
        self.no_randomize = value;
        self
    }

    pub fn reconnect(mut self, value: bool) -> Self {
        self.reconnect = value;
        self
    }

    pub fn reconnect_time_wait(mut self, d: Duration) -> Self {
        self.reconnect_time_wait = d;
        self
    }

    pub fn reconnect_jitter(mut self, d: Duration) -> Self {
        self.reconnect_jitter = d;
        self
    }

    pub fn max_reconnect_attempts(mut self, n: i64) -> Self {
        self.max_reconnect_attempts = n;
        self
    }

    pub fn ping_interval(mut self, d: Duration) -> Self {
        self.ping_interval = d;
        self
    }

    pub fn max_ping_out(mut self, n: u32) -> Self {
        self.max_ping_out = n;
        self
    }

    pub fn wait_on_first_connect(mut self, value: bool) -> Self {
        self.wait_on_first_connect = value;
        self
    }

    pub fn dial_timeout(mut self, d: Duration) -> Self {
        self.dial_timeout = d;
        self
    }

    pub fn yield_time(mut self, d: Duration) -> Self {
        self.yield_time = Some(d);
        self
    }

    pub fn no_echo(mut self, value: bool) -> Self {
        self.no_echo = value;
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn user_pass(mut self, user: impl Into<CredentialSource>, pass: impl Into<CredentialSource>) -> Self {
        self.user = Some(user.into());
        self.pass = Some(pass.into());
        self
    }

    pub fn token(mut self, token: impl Into<CredentialSource>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn nkey(mut self, nkey: impl Into<String>) -> Self {
        self.nkey = Some(nkey.into());
        self
    }

    pub fn user_jwt(mut self, jwt: impl Into<CredentialSource>) -> Self {
        self.user_jwt = Some(jwt.into());
        self
    }

    pub fn nonce_signer(mut self, signer: NonceSigner) -> Self {
        self.nonce_signer = Some(signer);
        self
    }

    pub fn tls(mut self, mode: TlsMode) -> Self {
        self.tls = mode;
        self
    }

    pub fn payload(mut self, mode: PayloadMode) -> Self {
        self.payload = mode;
        self
    }

    /// Decoding used for [`PayloadMode::String`] payloads; ignored by the
    /// other two modes.
    pub fn encoding(mut self, encoding: TextEncoding) -> Self {
        self.encoding = encoding;
        self
    }
}

pub(crate) const CLIENT_LANG: &str = "rust";
pub(crate) const CLIENT_VERSION: &str = env!("CARGO_PKG_VERSION");
pub(crate) const DEFAULT_URL: &str = "nats://localhost:4222";
pub(crate) const PROTOCOL_VERSION: u8 = 1;
