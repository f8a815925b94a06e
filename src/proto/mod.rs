//! Wire protocol: control-line scanner, message assembler, INFO/CONNECT
//! JSON shapes.

pub mod assembler;
pub mod connect;
pub mod info;
pub mod parser;

pub use connect::{build_connect, ConnectPayload};
pub use info::ServerInfo;
pub use parser::{Message, Parser, ServerErr, ServerErrKind, ServerOp};
