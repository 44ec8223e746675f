//! Player identity: the data the gateway reads about a logged-in player.
//!
//! A [`Player`] is owned by the core session layer. The gateway never
//! builds one from client input; it receives them from a
//! [`PlayerStore`](crate::PlayerStore) and shares them behind `Arc`.

use std::fmt;
use std::ops::BitOr;

use chatgate_protocol::PlayerId;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Privileges
// ---------------------------------------------------------------------------

/// Privilege flags, as a bit set.
///
/// Channels gate read access on these (see `Channel::can_read` in the
/// channel crate). The bit layout matches the persistence store so values
/// can be copied over verbatim.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Privileges(pub u32);

impl Privileges {
    /// No flags at all. A player without `UNRESTRICTED` is restricted.
    pub const NONE: Self = Self(0);
    pub const UNRESTRICTED: Self = Self(1 << 0);
    pub const VERIFIED: Self = Self(1 << 1);
    pub const WHITELISTED: Self = Self(1 << 2);
    pub const SUPPORTER: Self = Self(1 << 4);
    pub const PREMIUM: Self = Self(1 << 5);
    pub const ALUMNI: Self = Self(1 << 7);
    pub const TOURNEY_MANAGER: Self = Self(1 << 10);
    pub const NOMINATOR: Self = Self(1 << 11);
    pub const MODERATOR: Self = Self(1 << 12);
    pub const ADMINISTRATOR: Self = Self(1 << 13);
    pub const DEVELOPER: Self = Self(1 << 14);

    /// Anyone who moderates: moderators, administrators, developers.
    pub const STAFF: Self =
        Self(Self::MODERATOR.0 | Self::ADMINISTRATOR.0 | Self::DEVELOPER.0);

    /// What a freshly registered, verified player gets.
    pub const DEFAULT_PLAYER: Self = Self(Self::UNRESTRICTED.0 | Self::VERIFIED.0);

    /// Returns `true` if every flag in `other` is set.
    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Returns `true` if at least one flag in `other` is set.
    pub fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl BitOr for Privileges {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

// ---------------------------------------------------------------------------
// Player
// ---------------------------------------------------------------------------

/// A player as seen by the gateway.
///
/// `safe_name` is the normalized form used for lookups
/// ([`make_safe_name`]); `name` is the display name and `nick` is that
/// name as it appears on the wire ([`make_nick`]).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Player {
    id: PlayerId,
    name: String,
    nick: String,
    safe_name: String,
    privileges: Privileges,
}

impl Player {
    /// Creates a player, deriving the safe name from `name`.
    pub fn new(id: PlayerId, name: impl Into<String>, privileges: Privileges) -> Self {
        let name = name.into();
        Self {
            id,
            safe_name: make_safe_name(&name),
            nick: make_nick(&name),
            name,
            privileges,
        }
    }

    pub fn id(&self) -> PlayerId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The single-token form used as a message source and in name lists.
    pub fn nick(&self) -> &str {
        &self.nick
    }

    pub fn safe_name(&self) -> &str {
        &self.safe_name
    }

    pub fn privileges(&self) -> Privileges {
        self.privileges
    }

    /// Restricted players may not log in through the gateway.
    pub fn is_restricted(&self) -> bool {
        !self.privileges.contains(Privileges::UNRESTRICTED)
    }

    pub fn is_staff(&self) -> bool {
        self.privileges.intersects(Privileges::STAFF)
    }

    /// Returns a copy with different privileges (used when the core layer
    /// restricts or promotes a player).
    pub fn with_privileges(&self, privileges: Privileges) -> Self {
        Self {
            privileges,
            ..self.clone()
        }
    }
}

impl fmt::Display for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{} ({})>", self.name, self.id.0)
    }
}

/// Normalizes a display name for lookups: lowercase, spaces become
/// underscores, surrounding whitespace dropped.
///
/// ```rust
/// use chatgate_session::make_safe_name;
///
/// assert_eq!(make_safe_name("Cookie Monster"), "cookie_monster");
/// ```
pub fn make_safe_name(name: &str) -> String {
    name.trim().to_lowercase().replace(' ', "_")
}

/// Renders a display name as one protocol token: spaces become
/// underscores, case is kept.
///
/// ```rust
/// use chatgate_session::make_nick;
///
/// assert_eq!(make_nick("Cookie Monster"), "Cookie_Monster");
/// ```
pub fn make_nick(name: &str) -> String {
    name.trim().replace(' ', "_")
}
