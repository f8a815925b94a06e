//! `INFO` payload sent by the server on connect and on gossip updates.

use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServerInfo {
    #[serde(default)]
    pub server_id: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub proto: i64,
    #[serde(default)]
    pub max_payload: u64,
    #[serde(default)]
    pub tls_required: bool,
    #[serde(default)]
    pub tls_verify: bool,
    #[serde(default)]
    pub nonce: Option<String>,
    #[serde(default)]
    pub connect_urls: Vec<String>,
}

impl ServerInfo {
    /// `echo` is only honorable on protocol version >= 1.
    pub fn echo_supported(&self) -> bool {
        self.proto >= 1
    }
}
