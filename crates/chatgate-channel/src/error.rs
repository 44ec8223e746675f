//! Error types for the channel layer.

use chatgate_protocol::{PlayerId, ProtocolError};

/// Errors that can occur during channel operations.
///
/// Every variant is a recoverable, per-command failure. The gateway turns
/// them into a single reply line through the `From` impl below.
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    /// The channel does not exist, or the caller may not see it.
    #[error("channel {0} not found")]
    NotFound(String),

    /// The player is not a member of this channel.
    #[error("player {0} not in channel {1}")]
    NotMember(PlayerId, String),

    /// The player is not one of the channel's moderators.
    #[error("player {0} does not moderate channel {1}")]
    NotModerator(PlayerId, String),

    /// The player may not post to this channel.
    #[error("player {0} cannot send to channel {1}")]
    CannotSend(PlayerId, String),

    /// A channel with this name is already registered.
    #[error("channel {0} already exists")]
    AlreadyExists(String),
}

impl From<ChannelError> for ProtocolError {
    fn from(err: ChannelError) -> Self {
        match err {
            ChannelError::NotFound(name) | ChannelError::AlreadyExists(name) => {
                ProtocolError::no_such_channel(&name)
            }
            ChannelError::NotMember(_, name) => ProtocolError::not_on_channel(&name),
            ChannelError::NotModerator(_, name) => {
                ProtocolError::not_channel_operator(&name)
            }
            ChannelError::CannotSend(_, name) => {
                ProtocolError::cannot_send_to_channel(&name)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use chatgate_protocol::ReplyCode;

    use super::*;

    #[test]
    fn test_into_protocol_error_maps_reply_codes() {
        let cases = [
            (ChannelError::NotFound("#a".into()), ReplyCode::ERR_NOSUCHCHANNEL),
            (
                ChannelError::NotMember(PlayerId(1), "#a".into()),
                ReplyCode::ERR_NOTONCHANNEL,
            ),
            (
                ChannelError::NotModerator(PlayerId(1), "#a".into()),
                ReplyCode::ERR_CHANOPRIVSNEEDED,
            ),
            (
                ChannelError::CannotSend(PlayerId(1), "#a".into()),
                ReplyCode::ERR_CANNOTSENDTOCHAN,
            ),
        ];
        for (err, code) in cases {
            let proto: ProtocolError = err.into();
            assert_eq!(proto.code(), code);
            assert_eq!(proto.subject(), Some("#a"));
        }
    }
}
