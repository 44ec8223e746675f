//! Wire protocol for chatgate.
//!
//! This crate defines the "language" legacy chat clients speak with the
//! gateway:
//!
//! - **Decoding** ([`LineDecoder`]): reassembles newline-terminated lines
//!   from arbitrary read chunks, keeping partial lines across reads.
//! - **Commands** ([`Command`]): splits one decoded line into a verb and
//!   its argument remainder.
//! - **Replies** ([`Line`], [`ReplyCode`]): formats numeric replies and
//!   relayed messages into wire lines.
//! - **Errors** ([`ProtocolError`], [`DecodeError`]): the `(code, message)`
//!   failure value every dispatch path reduces to, and what can go wrong
//!   while decoding.
//!
//! # Architecture
//!
//! The protocol layer sits between transport (raw bytes) and the gateway
//! (sessions and channels). It doesn't know about connections or players.
//!
//! ```text
//! Transport (bytes) → Protocol (lines, commands, replies) → Gateway (sessions)
//! ```

mod codec;
mod command;
mod error;
mod reply;
mod types;

pub use codec::{LineDecoder, DEFAULT_MAX_LINE_LEN};
pub use command::{split_trailing, strip_colon, Command};
pub use error::{DecodeError, ProtocolError};
pub use reply::{Line, ReplyCode};
pub use types::PlayerId;
