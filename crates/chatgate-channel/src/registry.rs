//! Channel registry: creates, tracks, and routes players to channels.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

use chatgate_protocol::PlayerId;
use chatgate_session::Player;
use parking_lot::Mutex;

use crate::{lobby_channel_name, Channel, ChannelConfig, ChannelError, MatchId};

/// Result of a successful [`ChannelRegistry::join`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinOutcome {
    /// The player was added to the channel.
    Joined,
    /// The player was already a member; nothing changed.
    AlreadyMember,
}

/// Result of a successful [`ChannelRegistry::part`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartOutcome {
    /// The player left; the channel is still registered.
    Left,
    /// The player left an ephemeral channel and it was removed, empty.
    LeftAndRemoved,
}

/// Owns every channel and tracks which channels each player is in.
///
/// Channel names are matched case-insensitively. The registry itself is
/// not thread-safe; share it through [`SharedChannels`], which puts the
/// whole registry under a single lock.
#[derive(Debug, Default)]
pub struct ChannelRegistry {
    /// Channels keyed by lowercase name.
    channels: BTreeMap<String, Channel>,

    /// Maps each player to the (lowercase) names of the channels they're in.
    /// Always mirrors the member lists of `channels`.
    memberships: HashMap<PlayerId, BTreeSet<String>>,
}

fn key(name: &str) -> String {
    name.to_lowercase()
}

impl ChannelRegistry {
    /// Creates a new, empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry seeded with `configs`. Duplicate names are
    /// skipped with a warning.
    pub fn from_configs(configs: impl IntoIterator<Item = ChannelConfig>) -> Self {
        let mut registry = Self::new();
        for config in configs {
            if let Err(e) = registry.create(config) {
                tracing::warn!(error = %e, "skipping channel config");
            }
        }
        registry
    }

    /// Registers a new channel.
    pub fn create(&mut self, config: ChannelConfig) -> Result<&Channel, ChannelError> {
        let k = key(&config.name);
        if self.channels.contains_key(&k) {
            return Err(ChannelError::AlreadyExists(config.name));
        }
        tracing::info!(channel = %config.name, ephemeral = config.ephemeral, "channel created");
        Ok(&*self.channels.entry(k).or_insert(Channel::from_config(config)))
    }

    pub fn get(&self, name: &str) -> Option<&Channel> {
        self.channels.get(&key(name))
    }

    /// All channels, ordered by name.
    pub fn channels(&self) -> impl Iterator<Item = &Channel> {
        self.channels.values()
    }

    /// Removes a channel, dropping it from every member's channel set.
    pub fn remove(&mut self, name: &str) -> Option<Channel> {
        let k = key(name);
        let channel = self.channels.remove(&k)?;
        for member in channel.members() {
            self.forget_membership(member.id(), &k);
        }
        tracing::info!(channel = %channel.name(), "channel removed");
        Some(channel)
    }

    /// Adds a player to a channel.
    ///
    /// A channel the player's privileges can't read is reported as
    /// [`ChannelError::NotFound`], same as one that doesn't exist.
    /// Joining twice is not an error and changes nothing.
    pub fn join(
        &mut self,
        player: &Arc<Player>,
        name: &str,
    ) -> Result<JoinOutcome, ChannelError> {
        let k = key(name);
        let channel = self
            .channels
            .get_mut(&k)
            .filter(|c| c.can_read(player.privileges()))
            .ok_or_else(|| ChannelError::NotFound(name.to_string()))?;

        if !channel.add_member(Arc::clone(player)) {
            return Ok(JoinOutcome::AlreadyMember);
        }
        self.memberships.entry(player.id()).or_default().insert(k);
        tracing::debug!(player = %player, channel = %name, "joined channel");
        Ok(JoinOutcome::Joined)
    }

    /// Removes a player from a channel.
    ///
    /// An ephemeral channel left with no members is removed from the
    /// registry. Static channels stay registered even when empty.
    pub fn part(
        &mut self,
        player_id: PlayerId,
        name: &str,
    ) -> Result<PartOutcome, ChannelError> {
        let k = key(name);
        let channel = self
            .channels
            .get_mut(&k)
            .ok_or_else(|| ChannelError::NotFound(name.to_string()))?;

        if !channel.remove_member(player_id) {
            return Err(ChannelError::NotMember(player_id, name.to_string()));
        }
        let remove = channel.is_ephemeral() && channel.is_empty();
        self.forget_membership(player_id, &k);
        tracing::debug!(%player_id, channel = %name, "parted channel");

        if remove {
            self.remove(&k);
            return Ok(PartOutcome::LeftAndRemoved);
        }
        Ok(PartOutcome::Left)
    }

    /// Changes a channel's topic. Only moderators may do this.
    pub fn set_topic(
        &mut self,
        player_id: PlayerId,
        name: &str,
        topic: &str,
    ) -> Result<&Channel, ChannelError> {
        let channel = self
            .channels
            .get_mut(&key(name))
            .ok_or_else(|| ChannelError::NotFound(name.to_string()))?;
        if !channel.is_moderator(player_id) {
            return Err(ChannelError::NotModerator(player_id, name.to_string()));
        }
        channel.set_topic(topic);
        tracing::info!(%player_id, channel = %name, "topic changed");
        Ok(&*channel)
    }

    /// Checks that a player may post to a channel.
    pub fn check_can_send(&self, player_id: PlayerId, name: &str) -> Result<&Channel, ChannelError> {
        let channel = self
            .get(name)
            .ok_or_else(|| ChannelError::NotFound(name.to_string()))?;
        if !channel.is_member(player_id) {
            return Err(ChannelError::CannotSend(player_id, name.to_string()));
        }
        Ok(channel)
    }

    pub fn is_member(&self, player_id: PlayerId, name: &str) -> bool {
        self.get(name).is_some_and(|c| c.is_member(player_id))
    }

    /// Channels the player is in, ordered by name.
    pub fn channels_of(&self, player_id: PlayerId) -> Vec<&Channel> {
        self.memberships
            .get(&player_id)
            .into_iter()
            .flatten()
            .filter_map(|k| self.channels.get(k))
            .collect()
    }

    /// Removes a player from every channel they're in.
    ///
    /// Returns the channels they left, as they looked just before the
    /// removal (so callers can still notify the remaining members).
    pub fn leave_all(&mut self, player_id: PlayerId) -> Vec<Channel> {
        let Some(keys) = self.memberships.remove(&player_id) else {
            return Vec::new();
        };
        let mut left = Vec::with_capacity(keys.len());
        for k in keys {
            let Some(channel) = self.channels.get_mut(&k) else {
                continue;
            };
            let before = channel.clone();
            channel.remove_member(player_id);
            if channel.is_ephemeral() && channel.is_empty() {
                self.remove(&k);
            }
            left.push(before);
        }
        left
    }

    /// Returns the chat channel of a match, creating it if needed.
    ///
    /// The first player to show up becomes its moderator.
    pub fn ensure_lobby_channel(&mut self, match_id: MatchId, host: PlayerId) -> &Channel {
        let name = lobby_channel_name(match_id);
        let k = key(&name);
        if !self.channels.contains_key(&k) {
            tracing::info!(%match_id, channel = %name, "lobby channel created");
        }
        self.channels.entry(k).or_insert_with(|| {
            Channel::from_config(ChannelConfig::new(name, "").moderator(host).ephemeral())
        })
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    fn forget_membership(&mut self, player_id: PlayerId, k: &str) {
        if let Some(set) = self.memberships.get_mut(&player_id) {
            set.remove(k);
            if set.is_empty() {
                self.memberships.remove(&player_id);
            }
        }
    }
}

// ---------------------------------------------------------------------------
// SharedChannels
// ---------------------------------------------------------------------------

/// A [`ChannelRegistry`] shared between connection tasks.
///
/// Every operation runs inside [`with`](Self::with) under one mutex, so
/// joins, parts and topic changes are serialized across all channels and
/// every read sees a consistent snapshot. The closure must not await;
/// fanout that happens inside it only enqueues.
///
/// Cloning is cheap (an `Arc` bump).
#[derive(Debug, Clone, Default)]
pub struct SharedChannels {
    inner: Arc<Mutex<ChannelRegistry>>,
}

impl SharedChannels {
    pub fn new(registry: ChannelRegistry) -> Self {
        Self {
            inner: Arc::new(Mutex::new(registry)),
        }
    }

    /// Runs `f` with exclusive access to the registry.
    pub fn with<R>(&self, f: impl FnOnce(&mut ChannelRegistry) -> R) -> R {
        f(&mut self.inner.lock())
    }
}
