//! Reply encoding: turning structured replies into wire lines.
//!
//! Every line the gateway sends has the same shape:
//!
//! ```text
//! :<source> <command> <param> <param> ... :<trailing text>
//! ```
//!
//! - Numeric replies use the gateway's name as the source and a three-digit
//!   code as the command (`:gate 332 alice #osu :Welcome!`).
//! - Relayed events use the acting player's name as the source and a verb
//!   as the command (`:alice PRIVMSG #osu :hi`).
//!
//! [`Line`] is a small builder for both. It never fails: characters that
//! would break framing (CR, LF) are replaced before encoding, so a chat
//! message can't smuggle extra lines onto another client's wire.

use std::fmt;

/// A numeric reply code, rendered zero-padded to three digits.
///
/// A newtype rather than an enum because the legacy protocol reuses some
/// numbers for unrelated conditions (404 is both "cannot send to channel"
/// and "incorrect username"), and clients only ever see the number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ReplyCode(pub u16);

impl ReplyCode {
    pub const RPL_WELCOME: Self = Self(1);
    pub const RPL_YOURHOST: Self = Self(2);
    pub const RPL_LUSERCLIENT: Self = Self(251);
    pub const RPL_LIST: Self = Self(322);
    pub const RPL_LISTEND: Self = Self(323);
    pub const RPL_NOTOPIC: Self = Self(331);
    pub const RPL_TOPIC: Self = Self(332);
    pub const RPL_NAMREPLY: Self = Self(353);
    pub const RPL_ENDOFNAMES: Self = Self(366);
    pub const RPL_MOTD: Self = Self(372);
    pub const RPL_MOTDSTART: Self = Self(375);
    pub const RPL_ENDOFMOTD: Self = Self(376);

    pub const ERR_NOSUCHNICK: Self = Self(401);
    pub const ERR_NOSUCHCHANNEL: Self = Self(403);
    pub const ERR_CANNOTSENDTOCHAN: Self = Self(404);
    /// Legacy clients expect 404 for a rejected login name.
    pub const ERR_INCORRECTUSERNAME: Self = Self(404);
    pub const ERR_UNKNOWNCOMMAND: Self = Self(421);
    pub const ERR_NOTONCHANNEL: Self = Self(442);
    pub const ERR_NOTREGISTERED: Self = Self(451);
    pub const ERR_NEEDMOREPARAMS: Self = Self(461);
    pub const ERR_PASSWDMISMATCH: Self = Self(464);
    pub const ERR_CHANOPRIVSNEEDED: Self = Self(482);

    /// Returns the raw numeric value.
    pub fn as_u16(self) -> u16 {
        self.0
    }
}

impl fmt::Display for ReplyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:03}", self.0)
    }
}

/// One outbound protocol line, built fluently and encoded once.
///
/// ```rust
/// use chatgate_protocol::{Line, ReplyCode};
///
/// let line = Line::numeric("gate", ReplyCode::RPL_TOPIC)
///     .param("alice")
///     .param("#osu")
///     .trailing("Welcome!");
/// assert_eq!(line.encode(), ":gate 332 alice #osu :Welcome!");
///
/// let relay = Line::new("alice", "PRIVMSG").param("#osu").trailing("hi");
/// assert_eq!(relay.encode(), ":alice PRIVMSG #osu :hi");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    source: String,
    command: String,
    params: Vec<String>,
    trailing: Option<String>,
}

impl Line {
    /// Starts a line with a named command (`JOIN`, `PRIVMSG`, `PONG`...).
    pub fn new(source: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            command: command.into(),
            params: Vec::new(),
            trailing: None,
        }
    }

    /// Starts a numeric reply line.
    pub fn numeric(source: impl Into<String>, code: ReplyCode) -> Self {
        Self::new(source, code.to_string())
    }

    /// Appends a middle parameter. Spaces would split it on the client
    /// side, so they are replaced along with CR/LF.
    pub fn param(mut self, param: impl AsRef<str>) -> Self {
        let cleaned: String = param
            .as_ref()
            .chars()
            .map(|c| if matches!(c, ' ' | '\r' | '\n') { '_' } else { c })
            .collect();
        self.params.push(cleaned);
        self
    }

    /// Sets the trailing parameter (the part after ` :`).
    pub fn trailing(mut self, text: impl AsRef<str>) -> Self {
        self.trailing = Some(sanitize(text.as_ref()));
        self
    }

    /// The command or zero-padded numeric.
    pub fn command(&self) -> &str {
        &self.command
    }

    /// Encodes the line without its terminator.
    pub fn encode(&self) -> String {
        let mut out = String::with_capacity(64);
        out.push(':');
        out.push_str(&sanitize(&self.source));
        out.push(' ');
        out.push_str(&self.command);
        for param in &self.params {
            out.push(' ');
            out.push_str(param);
        }
        if let Some(trailing) = &self.trailing {
            out.push_str(" :");
            out.push_str(trailing);
        }
        out
    }

    /// Encodes the line with its `\r\n` terminator, ready for the wire.
    pub fn to_wire(&self) -> Vec<u8> {
        let mut bytes = self.encode().into_bytes();
        bytes.extend_from_slice(b"\r\n");
        bytes
    }
}

impl fmt::Display for Line {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

/// Replaces line terminators so one logical line stays one wire line.
fn sanitize(text: &str) -> String {
    text.replace(&['\r', '\n'][..], " ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reply_code_display_is_zero_padded() {
        assert_eq!(ReplyCode::RPL_WELCOME.to_string(), "001");
        assert_eq!(ReplyCode::RPL_YOURHOST.to_string(), "002");
        assert_eq!(ReplyCode::ERR_NOTREGISTERED.to_string(), "451");
    }

    #[test]
    fn test_numeric_line_without_trailing() {
        let line = Line::numeric("gate", ReplyCode::RPL_LISTEND).param("alice");
        assert_eq!(line.encode(), ":gate 323 alice");
    }

    #[test]
    fn test_relay_line_with_trailing() {
        let line = Line::new("bob", "PART").trailing("#lobby");
        assert_eq!(line.encode(), ":bob PART :#lobby");
    }

    #[test]
    fn test_trailing_may_be_empty() {
        let line = Line::new("bob", "QUIT").trailing("");
        assert_eq!(line.encode(), ":bob QUIT :");
    }

    #[test]
    fn test_to_wire_appends_crlf() {
        let line = Line::new("gate", "PONG").trailing("gate");
        assert_eq!(line.to_wire(), b":gate PONG :gate\r\n");
    }

    #[test]
    fn test_trailing_newlines_cannot_inject_lines() {
        let line = Line::new("mallory", "PRIVMSG")
            .param("#osu")
            .trailing("hi\r\n:gate 001 victim :pwned");
        let encoded = line.encode();
        assert!(!encoded.contains('\n'));
        assert!(!encoded.contains('\r'));
    }

    #[test]
    fn test_param_spaces_are_replaced() {
        let line = Line::new("gate", "NOTICE").param("two words");
        assert_eq!(line.encode(), ":gate NOTICE two_words");
    }

    #[test]
    fn test_display_matches_encode() {
        let line = Line::numeric("gate", ReplyCode::RPL_TOPIC)
            .param("a")
            .trailing("t");
        assert_eq!(line.to_string(), line.encode());
    }
}
