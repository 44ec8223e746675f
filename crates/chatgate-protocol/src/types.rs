//! Identity types shared by every layer above the protocol.

use serde::{Deserialize, Serialize};

use std::fmt;

/// A unique identifier for a player.
///
/// Newtype over the persistence layer's numeric id, so a `PlayerId` can't be
/// confused with a connection id or a match id. Serializes as the bare
/// number (`#[serde(transparent)]`).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct PlayerId(pub u64);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P-{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_player_id_display() {
        assert_eq!(PlayerId(42).to_string(), "P-42");
    }

    #[test]
    fn test_player_id_ordering_follows_inner_value() {
        assert!(PlayerId(1) < PlayerId(2));
    }
}
