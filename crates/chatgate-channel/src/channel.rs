//! A single chat channel: name, topic, moderators, and ordered members.
//!
//! A `Channel` is plain data. It has no lock of its own and never talks
//! to the network; the [`ChannelRegistry`](crate::ChannelRegistry) owns
//! every channel and serializes all mutations. Outside this crate a
//! channel is read-only, so membership can only change through the
//! registry (which also keeps the player → channels index in sync).

use std::collections::HashSet;
use std::sync::Arc;

use chatgate_protocol::PlayerId;
use chatgate_session::{Player, Privileges};

use crate::ChannelConfig;

/// A named group of players with a topic and a moderator set.
#[derive(Debug, Clone)]
pub struct Channel {
    name: String,
    topic: String,
    read_privileges: Privileges,
    moderators: HashSet<PlayerId>,
    /// Members in join order. Membership is unique by player ID.
    members: Vec<Arc<Player>>,
    ephemeral: bool,
}

impl Channel {
    pub(crate) fn from_config(config: ChannelConfig) -> Self {
        Self {
            name: config.name,
            topic: config.topic,
            read_privileges: config.read_privileges,
            moderators: config.moderators.into_iter().collect(),
            members: Vec::new(),
            ephemeral: config.ephemeral,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The current topic. Empty means no topic has been set.
    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn is_ephemeral(&self) -> bool {
        self.ephemeral
    }

    /// Returns `true` if a player holding `privileges` may see this channel.
    pub fn can_read(&self, privileges: Privileges) -> bool {
        privileges.intersects(self.read_privileges)
    }

    pub fn is_moderator(&self, player_id: PlayerId) -> bool {
        self.moderators.contains(&player_id)
    }

    pub fn is_member(&self, player_id: PlayerId) -> bool {
        self.members.iter().any(|p| p.id() == player_id)
    }

    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Members in join order.
    pub fn members(&self) -> &[Arc<Player>] {
        &self.members
    }

    /// Member nicks in join order.
    pub fn member_names(&self) -> Vec<&str> {
        self.members.iter().map(|p| p.nick()).collect()
    }

    /// Adds a member. Returns `false` if they were already in.
    pub(crate) fn add_member(&mut self, player: Arc<Player>) -> bool {
        if self.is_member(player.id()) {
            return false;
        }
        self.members.push(player);
        true
    }

    /// Removes a member. Returns `false` if they weren't in.
    pub(crate) fn remove_member(&mut self, player_id: PlayerId) -> bool {
        let before = self.members.len();
        self.members.retain(|p| p.id() != player_id);
        self.members.len() != before
    }

    pub(crate) fn set_topic(&mut self, topic: impl Into<String>) {
        self.topic = topic.into();
    }
}
