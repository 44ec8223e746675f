//! Unified error types for the gateway.

use chatgate_channel::ChannelError;
use chatgate_protocol::ProtocolError;
use chatgate_session::SessionError;
use chatgate_transport::TransportError;

use crate::ConfigError;

/// Top-level error that wraps all crate-specific errors.
///
/// When using the `chatgate` facade crate, you deal with this single
/// error type instead of importing errors from each sub-crate.
/// The `#[from]` attribute on each variant auto-generates `From` impls,
/// so the `?` operator converts sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// A transport-level error (bind, accept, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The player store failed.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// A channel registry operation failed.
    #[error(transparent)]
    Channel(#[from] ChannelError),

    /// The configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// What a command handler can fail with.
///
/// The dispatcher inspects this exactly once per command:
///
/// - `Reply` → format the error as one reply line to the caller
/// - `Malformed` → log at `warn`, reply nothing
/// - `Session` → the player store failed; log at `error`, reply nothing
///
/// None of them close the connection.
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error(transparent)]
    Reply(#[from] ProtocolError),

    #[error("malformed command: {0}")]
    Malformed(String),

    #[error(transparent)]
    Session(#[from] SessionError),
}

impl From<ChannelError> for CommandError {
    fn from(err: ChannelError) -> Self {
        Self::Reply(err.into())
    }
}

#[cfg(test)]
mod tests {
    use chatgate_protocol::{PlayerId, ReplyCode};

    use super::*;

    #[test]
    fn test_from_transport_error() {
        let err = TransportError::ConnectionClosed("gone".into());
        let gateway_err: GatewayError = err.into();
        assert!(matches!(gateway_err, GatewayError::Transport(_)));
        assert!(gateway_err.to_string().contains("gone"));
    }

    #[test]
    fn test_from_session_error() {
        let err = SessionError::Unavailable("db down".into());
        let gateway_err: GatewayError = err.into();
        assert!(matches!(gateway_err, GatewayError::Session(_)));
    }

    #[test]
    fn test_from_channel_error() {
        let err = ChannelError::NotFound("#x".into());
        let gateway_err: GatewayError = err.into();
        assert!(matches!(gateway_err, GatewayError::Channel(_)));
    }

    #[test]
    fn test_command_error_from_channel_error_is_reply() {
        let err: CommandError = ChannelError::NotMember(PlayerId(1), "#x".into()).into();
        match err {
            CommandError::Reply(reply) => {
                assert_eq!(reply.code(), ReplyCode::ERR_NOTONCHANNEL)
            }
            other => panic!("expected Reply, got {other:?}"),
        }
    }
}
