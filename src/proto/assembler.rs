//! Message payload decoder.
//!
//! Decodes the raw frame bytes accumulated by the parser's `AwaitingPayload`
//! state into the shape the client's [`PayloadMode`] calls for. A JSON
//! decode failure does not abort the stream — the message is delivered as
//! raw bytes with an attached error string instead.

use bytes::Bytes;

use crate::options::{PayloadMode, TextEncoding};
use crate::payload::Payload;

pub fn decode_payload(mode: PayloadMode, encoding: TextEncoding, raw: Bytes) -> (Payload, Option<String>) {
    match mode {
        PayloadMode::Binary => (Payload::Binary(raw), None),
        PayloadMode::String => match encoding {
            TextEncoding::Utf8 => match std::str::from_utf8(&raw) {
                Ok(s) => (Payload::Text(s.to_owned()), None),
                Err(e) => (Payload::Binary(raw), Some(format!("invalid UTF-8: {e}"))),
            },
            // Every byte 0x00-0xFF is a valid Latin-1 codepoint, so this
            // branch never fails to decode.
            TextEncoding::Latin1 => {
                let s: String = raw.iter().map(|&b| b as char).collect();
                (Payload::Text(s), None)
            }
        },
        PayloadMode::Json => match serde_json::from_slice::<serde_json::Value>(&raw) {
            Ok(v) => (Payload::Json(v), None),
            Err(e) => (Payload::Binary(raw), Some(format!("invalid JSON: {e}"))),
        },
    }
}
