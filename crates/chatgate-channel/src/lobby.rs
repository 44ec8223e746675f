//! The multiplayer lobby collaborator.
//!
//! Matches themselves live in another subsystem. The gateway only needs to
//! know which match a player is in (so `!mp close` / `!mp make` can find
//! the match's chat channel) and to take a player out of a match.
//!
//! Each match gets an ephemeral channel named `#multi_<id>`; the registry
//! creates it on demand with
//! [`ensure_lobby_channel`](crate::ChannelRegistry::ensure_lobby_channel).

use std::collections::HashMap;
use std::fmt;

use chatgate_protocol::PlayerId;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

/// Unique identifier for a multiplayer match.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct MatchId(pub u64);

impl fmt::Display for MatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "M-{}", self.0)
    }
}

/// The chat channel name for a match.
///
/// ```rust
/// use chatgate_channel::{lobby_channel_name, MatchId};
///
/// assert_eq!(lobby_channel_name(MatchId(12)), "#multi_12");
/// ```
pub fn lobby_channel_name(id: MatchId) -> String {
    format!("#multi_{}", id.0)
}

/// What the gateway asks of the match subsystem.
///
/// Calls are synchronous and short: they may run while the channel
/// registry lock is held.
pub trait MatchLobby: Send + Sync + 'static {
    /// The match the player is currently in, if any.
    fn current_match(&self, player: PlayerId) -> Option<MatchId>;

    /// Takes the player out of their match. Returns the match they left.
    fn leave_match(&self, player: PlayerId) -> Option<MatchId>;

    /// The chat channel of the player's current match, if any.
    fn current_match_channel_name(&self, player: PlayerId) -> Option<String> {
        self.current_match(player).map(lobby_channel_name)
    }
}

/// In-memory [`MatchLobby`]: a player → match table.
#[derive(Debug, Default)]
pub struct MemoryLobby {
    matches: Mutex<HashMap<PlayerId, MatchId>>,
}

impl MemoryLobby {
    pub fn new() -> Self {
        Self::default()
    }

    /// Puts a player into a match, replacing any previous one.
    pub fn assign(&self, player: PlayerId, match_id: MatchId) {
        self.matches.lock().insert(player, match_id);
    }
}

impl MatchLobby for MemoryLobby {
    fn current_match(&self, player: PlayerId) -> Option<MatchId> {
        self.matches.lock().get(&player).copied()
    }

    fn leave_match(&self, player: PlayerId) -> Option<MatchId> {
        let left = self.matches.lock().remove(&player);
        if let Some(match_id) = left {
            tracing::debug!(%player, %match_id, "player left match");
        }
        left
    }
}
