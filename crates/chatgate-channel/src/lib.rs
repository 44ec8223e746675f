//! Channels for chatgate.
//!
//! A channel is a named group of players with a topic and a moderator
//! set. The gateway reads and mutates channels only through the
//! [`ChannelRegistry`], which keeps channel member lists and each
//! player's channel set in sync.
//!
//! # Key types
//!
//! - [`Channel`]: one channel's name, topic, moderators and members
//! - [`ChannelRegistry`]: creates/removes channels, routes joins and parts
//! - [`SharedChannels`]: the registry behind one lock, shared by all
//!   connections
//! - [`ChannelConfig`]: settings for a static or ephemeral channel
//! - [`MatchLobby`]: what the gateway asks of the multiplayer subsystem

mod channel;
mod config;
mod error;
mod lobby;
mod registry;

pub use channel::Channel;
pub use config::{default_channels, ChannelConfig};
pub use error::ChannelError;
pub use lobby::{lobby_channel_name, MatchId, MatchLobby, MemoryLobby};
pub use registry::{ChannelRegistry, JoinOutcome, PartOutcome, SharedChannels};
