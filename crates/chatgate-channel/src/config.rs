//! Channel configuration.

use chatgate_protocol::PlayerId;
use chatgate_session::Privileges;
use serde::{Deserialize, Serialize};

/// Settings for one registered channel.
///
/// Static channels come from configuration at startup; ephemeral ones
/// (match lobbies) are built on the fly by the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelConfig {
    /// Display name, including the sigil (`#osu`).
    pub name: String,

    /// Initial topic. Empty means "no topic".
    #[serde(default)]
    pub topic: String,

    /// A player may read (see, join, list) the channel if they hold at
    /// least one of these flags.
    #[serde(default = "default_read_privileges")]
    pub read_privileges: Privileges,

    /// Players allowed to change the topic.
    #[serde(default)]
    pub moderators: Vec<PlayerId>,

    /// Ephemeral channels are removed once the last member parts.
    #[serde(default)]
    pub ephemeral: bool,
}

fn default_read_privileges() -> Privileges {
    Privileges::UNRESTRICTED
}

impl ChannelConfig {
    /// A public, persistent channel with the given name and topic.
    pub fn new(name: impl Into<String>, topic: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            topic: topic.into(),
            read_privileges: default_read_privileges(),
            moderators: Vec::new(),
            ephemeral: false,
        }
    }

    pub fn read_privileges(mut self, privileges: Privileges) -> Self {
        self.read_privileges = privileges;
        self
    }

    pub fn moderator(mut self, id: PlayerId) -> Self {
        self.moderators.push(id);
        self
    }

    pub fn ephemeral(mut self) -> Self {
        self.ephemeral = true;
        self
    }
}

/// The channels every gateway starts with.
pub fn default_channels() -> Vec<ChannelConfig> {
    vec![
        ChannelConfig::new("#osu", "General discussion."),
        ChannelConfig::new("#lobby", "Multiplayer lobby discussion room."),
        ChannelConfig::new("#announce", "Exemplary performance and public announcements."),
        ChannelConfig::new("#staff", "Staff discussion.").read_privileges(Privileges::STAFF),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_channels_names() {
        let names: Vec<_> = default_channels().into_iter().map(|c| c.name).collect();
        assert_eq!(names, ["#osu", "#lobby", "#announce", "#staff"]);
    }

    #[test]
    fn test_default_staff_channel_is_staff_only() {
        let staff = default_channels()
            .into_iter()
            .find(|c| c.name == "#staff")
            .expect("#staff configured");
        assert_eq!(staff.read_privileges, Privileges::STAFF);
        assert!(!staff.ephemeral);
    }

    #[test]
    fn test_builder_methods() {
        let c = ChannelConfig::new("#multi_1", "")
            .moderator(PlayerId(4))
            .ephemeral();
        assert_eq!(c.moderators, vec![PlayerId(4)]);
        assert!(c.ephemeral);
        assert_eq!(c.read_privileges, Privileges::UNRESTRICTED);
    }
}
