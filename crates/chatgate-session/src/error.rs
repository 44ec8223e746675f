//! Error types for the session layer.

/// Errors raised by a [`PlayerStore`](crate::PlayerStore) implementation.
///
/// A credential that simply doesn't match anyone is *not* an error: the
/// store answers `Ok(None)` and the gateway turns that into an
/// "incorrect username" reply. These variants cover the store itself
/// failing.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The backing store could not be reached or returned garbage.
    #[error("player store unavailable: {0}")]
    Unavailable(String),

    /// A presence update was rejected by the core session layer.
    #[error("presence update failed for {player}: {reason}")]
    Presence { player: String, reason: String },

    /// A player with this name already exists.
    #[error("player name {0:?} is already taken")]
    NameTaken(String),
}
