//! Incremental wire parser.
//!
//! A hand-rolled scanner rather than a regex-based line matcher: the verb
//! is recognized from its first bytes and the remainder is split on
//! whitespace directly against the buffer slice.

use bytes::{Bytes, BytesMut};

use crate::buffer::ChainedBuffer;
use crate::error::{Error, Result};
use crate::options::{PayloadMode, TextEncoding};
use crate::payload::Payload;
use crate::proto::assembler::decode_payload;
use crate::proto::info::ServerInfo;

const CRLF: &[u8] = b"\r\n";

#[derive(Debug, Clone)]
pub struct MsgHeader {
    pub subject: String,
    pub sid: u64,
    pub reply: Option<String>,
    pub size: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerErrKind {
    Auth,
    Perm,
    Protocol,
}

#[derive(Debug, Clone)]
pub struct ServerErr {
    pub kind: ServerErrKind,
    pub text: String,
}

#[derive(Debug, Clone)]
pub struct Message {
    pub subject: String,
    pub sid: u64,
    pub reply: Option<String>,
    pub payload: Payload,
    /// Populated when `payload_mode == Json` and decoding failed; the
    /// stream is not aborted, the message is delivered with this error
    /// attached instead.
    pub json_error: Option<String>,
}

#[derive(Debug, Clone)]
pub enum ServerOp {
    Info(ServerInfo),
    Ping,
    Pong,
    Ok,
    Err(ServerErr),
    Message(Message),
}

#[derive(Debug)]
enum State {
    AwaitingControl,
    AwaitingPayload {
        header: MsgHeader,
        needed: usize,
        acc: BytesMut,
    },
}

enum Step {
    Produced(ServerOp),
    Continue,
    NeedMore,
}

#[derive(Debug)]
pub struct Parser {
    state: State,
    control_line_limit: usize,
    payload_mode: PayloadMode,
    encoding: TextEncoding,
}

impl Parser {
    pub fn new(control_line_limit: usize, payload_mode: PayloadMode, encoding: TextEncoding) -> Self {
        Parser {
            state: State::AwaitingControl,
            control_line_limit,
            payload_mode,
            encoding,
        }
    }

    /// Drains as many complete server operations as `buf` currently makes
    /// available, leaving any partial line/payload in place for the next
    /// call once more bytes have arrived.
    pub fn feed(&mut self, buf: &mut ChainedBuffer) -> Result<Vec<ServerOp>> {
        let mut ops = Vec::new();
        loop {
            let awaiting_payload = matches!(self.state, State::AwaitingPayload { .. });
            let step = if awaiting_payload {
                self.advance_payload(buf)?
            } else {
                self.advance_control(buf)?
            };
            match step {
                Step::Produced(op) => ops.push(op),
                Step::Continue => {}
                Step::NeedMore => break,
            }
        }
        Ok(ops)
    }

    fn advance_control(&mut self, buf: &mut ChainedBuffer) -> Result<Step> {
        match buf.find(CRLF) {
            Some(pos) => {
                if pos > self.control_line_limit {
                    return Err(Error::ProtocolError(format!(
                        "control line of {pos} bytes exceeds {}-byte limit",
                        self.control_line_limit
                    )));
                }
                let line = buf.drain(Some(pos));
                buf.advance(2); // consume CRLF
                match self.parse_control_line(&line)? {
                    Some(op) => Ok(Step::Produced(op)),
                    None => Ok(Step::Continue),
                }
            }
            None => {
                if buf.len() > self.control_line_limit {
                    return Err(Error::ProtocolError(format!(
                        "control line exceeds {}-byte limit with no terminator",
                        self.control_line_limit
                    )));
                }
                Ok(Step::NeedMore)
            }
        }
    }

    fn advance_payload(&mut self, buf: &mut ChainedBuffer) -> Result<Step> {
        let complete = {
            let State::AwaitingPayload { needed, acc, .. } = &mut self.state else {
                unreachable!("advance_payload called outside AwaitingPayload state")
            };
            if acc.len() < *needed {
                let remaining = *needed - acc.len();
                let take = remaining.min(buf.len());
                if take == 0 {
                    return Ok(Step::NeedMore);
                }
                let chunk = buf.drain(Some(take));
                acc.extend_from_slice(&chunk);
            }
            acc.len() >= *needed
        };
        if !complete {
            return Ok(Step::NeedMore);
        }
        let State::AwaitingPayload { header, acc, .. } = std::mem::replace(&mut self.state, State::AwaitingControl) else {
            unreachable!()
        };
        Ok(Step::Produced(self.finish_message(header, acc)?))
    }

    fn finish_message(&self, header: MsgHeader, mut acc: BytesMut) -> Result<ServerOp> {
        // Strip the trailing CRLF that terminates the payload frame.
        let total = acc.len();
        acc.truncate(total.saturating_sub(2));
        let raw = acc.freeze();
        let (payload, json_error) = decode_payload(self.payload_mode, self.encoding, raw);
        Ok(ServerOp::Message(Message {
            subject: header.subject,
            sid: header.sid,
            reply: header.reply,
            payload,
            json_error,
        }))
    }

    fn parse_control_line(&mut self, line: &[u8]) -> Result<Option<ServerOp>> {
        if line.is_empty() {
            return Ok(None);
        }
        let verb_end = line.iter().position(|b| b.is_ascii_whitespace()).unwrap_or(line.len());
        let verb = &line[..verb_end];

        if verb.eq_ignore_ascii_case(b"msg") {
            let header = parse_msg_header(&line[verb_end..])?;
            let needed = header.size + 2;
            self.state = State::AwaitingPayload {
                header,
                needed,
                acc: BytesMut::with_capacity(needed),
            };
            Ok(None)
        } else if verb.eq_ignore_ascii_case(b"+ok") {
            Ok(Some(ServerOp::Ok))
        } else if verb.eq_ignore_ascii_case(b"-err") {
            let text = extract_quoted(&line[verb_end..]).unwrap_or_default();
            let lower = text.to_ascii_lowercase();
            let kind = if lower.contains("authorization violation") {
                ServerErrKind::Auth
            } else if lower.contains("permissions violation") {
                ServerErrKind::Perm
            } else {
                ServerErrKind::Protocol
            };
            Ok(Some(ServerOp::Err(ServerErr { kind, text })))
        } else if verb.eq_ignore_ascii_case(b"ping") {
            Ok(Some(ServerOp::Ping))
        } else if verb.eq_ignore_ascii_case(b"pong") {
            Ok(Some(ServerOp::Pong))
        } else if verb.eq_ignore_ascii_case(b"info") {
            let json = &line[verb_end..];
            let json = std::str::from_utf8(json).map_err(|_| Error::ProtocolError("INFO payload is not valid UTF-8".into()))?;
            let info: ServerInfo = serde_json::from_str(json.trim())?;
            Ok(Some(ServerOp::Info(info)))
        } else {
            Err(Error::ProtocolError(format!(
                "unrecognized control verb {:?}",
                String::from_utf8_lossy(verb)
            )))
        }
    }
}

fn parse_msg_header(rest: &[u8]) -> Result<MsgHeader> {
    let text = std::str::from_utf8(rest)
        .map_err(|_| Error::BadMsg("MSG header is not valid UTF-8".into()))?
        .trim();
    let fields: Vec<&str> = text.split_ascii_whitespace().collect();
    let (subject, sid, reply, size) = match fields.as_slice() {
        [subject, sid, size] => (*subject, *sid, None, *size),
        [subject, sid, reply, size] => (*subject, *sid, Some(*reply), *size),
        _ => return Err(Error::BadMsg(format!("expected 3 or 4 fields, got {}", fields.len()))),
    };
    if subject.is_empty() {
        return Err(Error::BadSubject("empty subject in MSG".into()));
    }
    let sid: u64 = sid.parse().map_err(|_| Error::BadMsg(format!("invalid sid {sid:?}")))?;
    let size: usize = size.parse().map_err(|_| Error::BadMsg(format!("invalid size {size:?}")))?;
    Ok(MsgHeader {
        subject: subject.to_owned(),
        sid,
        reply: reply.map(|s| s.to_owned()),
        size,
    })
}

/// Extracts the text between the first pair of single quotes, as used by
/// `-ERR '<text>'` frames.
fn extract_quoted(s: &[u8]) -> Option<String> {
    let text = std::str::from_utf8(s).ok()?;
    let start = text.find('\'')? + 1;
    let end = text[start..].find('\'')? + start;
    Some(text[start..end].to_owned())
}
