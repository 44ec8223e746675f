//! The authentication/persistence collaborator.
//!
//! The gateway doesn't store players or check credentials itself. It talks
//! to the core session layer through [`PlayerStore`]: resolve a token,
//! look a player up by name, announce presence, log out.
//!
//! # Why a trait?
//!
//! The real store sits on a database and a cache shared with the rest of
//! the service. Tests and the demo binary use
//! [`MemoryPlayerStore`](crate::MemoryPlayerStore). The gateway is generic
//! over the store, so neither side changes when the other does.
//!
//! Lookups against the store are the only points (besides socket I/O)
//! where a connection's task may suspend, which is why the methods return
//! futures.

use std::future::Future;
use std::sync::Arc;

use crate::{Player, SessionError};

/// Resolves credentials and tracks presence in the core session layer.
///
/// # Trait bounds
///
/// - `Send + Sync` → shared by every connection task.
/// - `'static` → lives as long as the server.
/// - Returned futures are `Send` so connection tasks can be spawned onto
///   the multi-threaded runtime.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
///
/// use chatgate_protocol::PlayerId;
/// use chatgate_session::{Player, PlayerStore, Privileges, SessionError};
///
/// /// Everyone is "guest", regardless of token.
/// struct GuestStore;
///
/// impl PlayerStore for GuestStore {
///     async fn resolve_credential(
///         &self,
///         _token: &str,
///     ) -> Result<Option<Arc<Player>>, SessionError> {
///         Ok(Some(Arc::new(Player::new(
///             PlayerId(1),
///             "guest",
///             Privileges::DEFAULT_PLAYER,
///         ))))
///     }
///
///     async fn lookup_player_by_name(
///         &self,
///         _safe_name: &str,
///     ) -> Result<Option<Arc<Player>>, SessionError> {
///         Ok(None)
///     }
///
///     async fn mark_online(&self, _player: &Arc<Player>) -> Result<(), SessionError> {
///         Ok(())
///     }
///
///     async fn logout(&self, _player: &Player) -> Result<(), SessionError> {
///         Ok(())
///     }
///
///     fn online_count(&self) -> usize {
///         0
///     }
/// }
/// ```
pub trait PlayerStore: Send + Sync + 'static {
    /// Resolves a gateway credential token to its player.
    ///
    /// Returns `Ok(None)` if no player owns the token.
    fn resolve_credential(
        &self,
        token: &str,
    ) -> impl Future<Output = Result<Option<Arc<Player>>, SessionError>> + Send;

    /// Looks up a player by normalized name (online or not).
    fn lookup_player_by_name(
        &self,
        safe_name: &str,
    ) -> impl Future<Output = Result<Option<Arc<Player>>, SessionError>> + Send;

    /// Registers the player as online and announces their presence to the
    /// rest of the service.
    fn mark_online(
        &self,
        player: &Arc<Player>,
    ) -> impl Future<Output = Result<(), SessionError>> + Send;

    /// Removes the player from the online set.
    fn logout(
        &self,
        player: &Player,
    ) -> impl Future<Output = Result<(), SessionError>> + Send;

    /// Number of players currently online, for the welcome banner.
    fn online_count(&self) -> usize;
}
