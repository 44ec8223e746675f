//! In-memory [`PlayerStore`] for development and tests.
//!
//! Holds registered players, their credential tokens, and the online set.
//! Presence announcements that the real core layer would fan out to game
//! clients are queued in `presence` so tests can observe them.
//!
//! # Concurrency note
//!
//! All state sits behind one `parking_lot::Mutex`. Every operation is a
//! short, non-suspending critical section, so the lock is never held across
//! an `.await`.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;

use chatgate_protocol::PlayerId;
use parking_lot::Mutex;
use rand::Rng;

use crate::{make_safe_name, Player, PlayerStore, Privileges, SessionError};

#[derive(Default)]
struct Inner {
    next_id: u64,
    /// Players keyed by safe name.
    players: HashMap<String, Arc<Player>>,
    /// Credential token → safe name.
    tokens: HashMap<String, String>,
    online: HashSet<PlayerId>,
    /// Presence announcements, oldest first.
    presence: VecDeque<PlayerId>,
}

/// A [`PlayerStore`] that lives entirely in memory.
#[derive(Default)]
pub struct MemoryPlayerStore {
    inner: Mutex<Inner>,
}

impl MemoryPlayerStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a player and issues a fresh credential token for them.
    ///
    /// # Errors
    /// [`SessionError::NameTaken`] if the safe name is already registered.
    pub fn register(
        &self,
        name: &str,
        privileges: Privileges,
    ) -> Result<(Arc<Player>, String), SessionError> {
        let safe = make_safe_name(name);
        let mut inner = self.inner.lock();
        if inner.players.contains_key(&safe) {
            return Err(SessionError::NameTaken(name.to_string()));
        }
        inner.next_id += 1;
        let player = Arc::new(Player::new(PlayerId(inner.next_id), name, privileges));
        let token = generate_token();
        inner.tokens.insert(token.clone(), safe.clone());
        inner.players.insert(safe, Arc::clone(&player));
        tracing::info!(player = %player, "player registered");
        Ok((player, token))
    }

    /// Replaces a player's privileges (e.g. restricting them).
    ///
    /// Returns the updated player, or `None` if the name is unknown.
    pub fn set_privileges(
        &self,
        name: &str,
        privileges: Privileges,
    ) -> Option<Arc<Player>> {
        let mut inner = self.inner.lock();
        let entry = inner.players.get_mut(&make_safe_name(name))?;
        let updated = Arc::new(entry.with_privileges(privileges));
        *entry = Arc::clone(&updated);
        Some(updated)
    }

    pub fn is_online(&self, id: PlayerId) -> bool {
        self.inner.lock().online.contains(&id)
    }

    /// Drains the queued presence announcements.
    pub fn take_presence(&self) -> Vec<PlayerId> {
        self.inner.lock().presence.drain(..).collect()
    }
}

impl PlayerStore for MemoryPlayerStore {
    async fn resolve_credential(
        &self,
        token: &str,
    ) -> Result<Option<Arc<Player>>, SessionError> {
        let inner = self.inner.lock();
        Ok(inner
            .tokens
            .get(token)
            .and_then(|safe| inner.players.get(safe))
            .cloned())
    }

    async fn lookup_player_by_name(
        &self,
        safe_name: &str,
    ) -> Result<Option<Arc<Player>>, SessionError> {
        Ok(self.inner.lock().players.get(safe_name).cloned())
    }

    async fn mark_online(&self, player: &Arc<Player>) -> Result<(), SessionError> {
        let mut inner = self.inner.lock();
        inner.online.insert(player.id());
        inner.presence.push_back(player.id());
        tracing::debug!(player = %player, "presence announced");
        Ok(())
    }

    async fn logout(&self, player: &Player) -> Result<(), SessionError> {
        if self.inner.lock().online.remove(&player.id()) {
            tracing::info!(player = %player, "player logged out");
        }
        Ok(())
    }

    fn online_count(&self) -> usize {
        self.inner.lock().online.len()
    }
}

/// Generates a random 32-character hex string (128 bits of entropy).
fn generate_token() -> String {
    let mut rng = rand::rng();
    let bytes: [u8; 16] = rng.random();
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    //! Unit tests for `MemoryPlayerStore`, named
    //! `test_{function}_{scenario}_{expected}`.

    use super::*;

    fn store_with(name: &str) -> (MemoryPlayerStore, Arc<Player>, String) {
        let store = MemoryPlayerStore::new();
        let (player, token) = store
            .register(name, Privileges::DEFAULT_PLAYER)
            .expect("register");
        (store, player, token)
    }

    #[test]
    fn test_register_issues_hex_token() {
        let (_, _, token) = store_with("alice");
        assert_eq!(token.len(), 32);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_register_assigns_unique_ids_and_tokens() {
        let store = MemoryPlayerStore::new();
        let (a, ta) = store.register("a", Privileges::DEFAULT_PLAYER).unwrap();
        let (b, tb) = store.register("b", Privileges::DEFAULT_PLAYER).unwrap();
        assert_ne!(a.id(), b.id());
        assert_ne!(ta, tb);
    }

    #[test]
    fn test_register_duplicate_safe_name_returns_error() {
        let (store, _, _) = store_with("Some One");
        let result = store.register("some one", Privileges::DEFAULT_PLAYER);
        assert!(matches!(result, Err(SessionError::NameTaken(_))));
    }

    #[tokio::test]
    async fn test_resolve_credential_known_token_returns_player() {
        let (store, player, token) = store_with("alice");
        let found = store.resolve_credential(&token).await.unwrap();
        assert_eq!(found.map(|p| p.id()), Some(player.id()));
    }

    #[tokio::test]
    async fn test_resolve_credential_unknown_token_returns_none() {
        let (store, _, _) = store_with("alice");
        assert!(store.resolve_credential("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_lookup_player_by_name_uses_safe_name() {
        let (store, player, _) = store_with("Cookie Monster");
        let found = store.lookup_player_by_name("cookie_monster").await.unwrap();
        assert_eq!(found.map(|p| p.id()), Some(player.id()));
    }

    #[tokio::test]
    async fn test_mark_online_then_logout_tracks_online_set() {
        let (store, player, _) = store_with("alice");
        store.mark_online(&player).await.unwrap();
        assert!(store.is_online(player.id()));
        assert_eq!(store.online_count(), 1);
        assert_eq!(store.take_presence(), vec![player.id()]);

        store.logout(&player).await.unwrap();
        assert!(!store.is_online(player.id()));
        assert_eq!(store.online_count(), 0);
    }

    #[tokio::test]
    async fn test_set_privileges_is_seen_by_later_resolves() {
        let (store, _, token) = store_with("alice");
        store.set_privileges("alice", Privileges::NONE).expect("known name");
        let p = store.resolve_credential(&token).await.unwrap().unwrap();
        assert!(p.is_restricted());
    }
}
