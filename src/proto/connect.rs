//! `CONNECT` payload construction.

use base64::Engine;
use serde::Serialize;

use crate::error::{Error, Result};
use crate::options::{ConnectOptions, CLIENT_LANG, CLIENT_VERSION, PROTOCOL_VERSION};
use crate::proto::info::ServerInfo;

#[derive(Debug, Serialize)]
pub struct ConnectPayload {
    pub verbose: bool,
    pub pedantic: bool,
    pub lang: &'static str,
    pub version: &'static str,
    pub protocol: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pass: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub echo: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sig: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jwt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nkey: Option<String>,
}

/// Builds the CONNECT payload for the given `info`/`opts`, applying the
/// nonce-signing and credential-precedence rules. The TLS upgrade itself is
/// decided separately, before this payload is serialized onto the wire.
pub fn build_connect(info: &ServerInfo, opts: &ConnectOptions, url_creds: Option<(String, Option<String>)>) -> Result<ConnectPayload> {
    if info.nonce.is_some() && opts.nonce_signer.is_none() {
        return Err(Error::SignatureRequired);
    }
    if info.nonce.is_some() && opts.nkey.is_none() && opts.user_jwt.is_none() {
        return Err(Error::NkeyOrJwtRequired);
    }

    let echo = if opts.no_echo {
        if !info.echo_supported() {
            return Err(Error::NoEchoNotSupported);
        }
        Some(false)
    } else {
        None
    };

    let (mut user, mut pass) = (
        opts.user.as_ref().map(|c| c.resolve()),
        opts.pass.as_ref().map(|c| c.resolve()),
    );
    let mut auth_token = opts.token.as_ref().map(|c| c.resolve());

    if user.is_none() && auth_token.is_none() {
        if let Some((u, p)) = url_creds {
            if let Some(p) = p {
                user = Some(u);
                pass = Some(p);
            } else {
                auth_token = Some(u);
            }
        }
    }

    let sig = match (&info.nonce, &opts.nonce_signer) {
        (Some(nonce), Some(signer)) => {
            let sig_bytes = signer(nonce.as_bytes());
            Some(base64::engine::general_purpose::STANDARD.encode(sig_bytes))
        }
        _ => None,
    };

    Ok(ConnectPayload {
        verbose: false,
        pedantic: false,
        lang: CLIENT_LANG,
        version: CLIENT_VERSION,
        protocol: PROTOCOL_VERSION,
        name: opts.name.clone(),
        user,
        pass,
        auth_token,
        echo,
        sig,
        jwt: opts.user_jwt.as_ref().map(|c| c.resolve()),
        nkey: opts.nkey.clone(),
    })
}
