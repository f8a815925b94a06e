//! Message payload representation.

use bytes::Bytes;

/// The decoded/encoded shape of a message body. Inbound messages are
/// decoded into the variant matching the client's configured
/// [`crate::options::PayloadMode`]; outbound publishes encode whichever
/// variant the caller constructs, independent of that setting.
#[derive(Debug, Clone)]
pub enum Payload {
    Binary(Bytes),
    Text(String),
    Json(serde_json::Value),
}

impl Payload {
    pub fn encode(&self) -> Bytes {
        match self {
            Payload::Binary(b) => b.clone(),
            Payload::Text(s) => Bytes::copy_from_slice(s.as_bytes()),
            Payload::Json(v) => Bytes::from(serde_json::to_vec(v).unwrap_or_default()),
        }
    }

    pub fn as_bytes(&self) -> Bytes {
        self.encode()
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Payload::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }
}

impl From<&str> for Payload {
    fn from(s: &str) -> Self {
        Payload::Text(s.to_owned())
    }
}

impl From<String> for Payload {
    fn from(s: String) -> Self {
        Payload::Text(s)
    }
}

impl From<Bytes> for Payload {
    fn from(b: Bytes) -> Self {
        Payload::Binary(b)
    }
}

impl From<Vec<u8>> for Payload {
    fn from(b: Vec<u8>) -> Self {
        Payload::Binary(Bytes::from(b))
    }
}

impl From<serde_json::Value> for Payload {
    fn from(v: serde_json::Value) -> Self {
        Payload::Json(v)
    }
}
