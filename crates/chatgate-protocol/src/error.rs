//! Error types for the protocol layer.
//!
//! Two very different things can go wrong at this layer:
//!
//! - A line can't be decoded at all ([`DecodeError`]). Those are swallowed
//!   at the decode boundary: logged, skipped, and the read loop continues.
//! - A decoded command violates a protocol precondition
//!   ([`ProtocolError`]). Those become exactly one numeric reply line sent
//!   back to the offending client. The connection stays open.

use std::fmt;

use crate::{Line, ReplyCode};

/// Errors produced while turning raw bytes into lines.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    /// The line is not valid UTF-8.
    #[error("line is not valid UTF-8 ({len} bytes)")]
    InvalidUtf8 { len: usize },

    /// A partial line grew past the configured limit without a terminator.
    /// The decoder discards it up to the next terminator.
    #[error("line exceeds {max} bytes")]
    LineTooLong { max: usize },
}

/// A protocol-level failure: a reply code plus a human-readable message.
///
/// This is the only structured failure the dispatcher understands. Every
/// precondition violation (not registered, not a member, not an operator,
/// unknown command) and every lookup failure (unknown channel, unknown
/// credential) is expressed as one of these and rendered with
/// [`to_line`](Self::to_line).
///
/// `subject` is the optional middle parameter the legacy replies carry
/// (the offending verb or channel name), e.g.
/// `:gate 403 #nowhere :No such channel`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub struct ProtocolError {
    code: ReplyCode,
    subject: Option<String>,
    message: String,
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.subject {
            Some(subject) => {
                write!(f, "{} {} :{}", self.code, subject, self.message)
            }
            None => write!(f, "{} :{}", self.code, self.message),
        }
    }
}

impl ProtocolError {
    /// Creates an error with a code and free-text message.
    pub fn new(code: ReplyCode, message: impl Into<String>) -> Self {
        Self {
            code,
            subject: None,
            message: message.into(),
        }
    }

    /// Attaches the subject parameter (verb, channel, or nick).
    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    /// The numeric reply code.
    pub fn code(&self) -> ReplyCode {
        self.code
    }

    /// The subject parameter, if any.
    pub fn subject(&self) -> Option<&str> {
        self.subject.as_deref()
    }

    /// The free-text message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Renders the error as a reply line from `server`.
    pub fn to_line(&self, server: &str) -> Line {
        let line = Line::numeric(server, self.code);
        let line = match &self.subject {
            Some(subject) => line.param(subject),
            None => line,
        };
        line.trailing(&self.message)
    }

    // -- Constructors for the reply codes dispatch produces ---------------

    pub fn not_registered() -> Self {
        Self::new(ReplyCode::ERR_NOTREGISTERED, "You have not registered")
    }

    pub fn unknown_command(verb: &str) -> Self {
        Self::new(ReplyCode::ERR_UNKNOWNCOMMAND, "Unknown Command!")
            .with_subject(verb)
    }

    pub fn need_more_params(verb: &str) -> Self {
        Self::new(ReplyCode::ERR_NEEDMOREPARAMS, "Not enough parameters")
            .with_subject(verb)
    }

    pub fn incorrect_password() -> Self {
        Self::new(ReplyCode::ERR_PASSWDMISMATCH, "Incorrect password")
            .with_subject("PASS")
    }

    pub fn incorrect_username() -> Self {
        Self::new(ReplyCode::ERR_INCORRECTUSERNAME, "Incorrect username")
            .with_subject("PLAYER")
    }

    pub fn restricted_login() -> Self {
        Self::new(
            ReplyCode::ERR_INCORRECTUSERNAME,
            "You can't login in restricted mode",
        )
        .with_subject("PLAYER")
    }

    pub fn no_such_channel(channel: &str) -> Self {
        Self::new(ReplyCode::ERR_NOSUCHCHANNEL, "No such channel")
            .with_subject(channel)
    }

    pub fn not_on_channel(channel: &str) -> Self {
        Self::new(ReplyCode::ERR_NOTONCHANNEL, "You're not on that channel")
            .with_subject(channel)
    }

    pub fn not_channel_operator(channel: &str) -> Self {
        Self::new(
            ReplyCode::ERR_CHANOPRIVSNEEDED,
            "You're not a channel operator",
        )
        .with_subject(channel)
    }

    pub fn cannot_send_to_channel(channel: &str) -> Self {
        Self::new(
            ReplyCode::ERR_CANNOTSENDTOCHAN,
            "Cannot send message to the channel",
        )
        .with_subject(channel)
    }
}
