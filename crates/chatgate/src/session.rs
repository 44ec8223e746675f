//! Per-connection handling: session state, read loop, writer, teardown.
//!
//! Each accepted connection gets its own Tokio task running
//! [`handle_connection`], plus a companion writer task. The flow is:
//!   1. Register the session in the live set
//!   2. Loop: read bytes → decode lines → dispatch each, in arrival order
//!   3. On peer close, I/O error or QUIT: tear down exactly once
//!      (leave channels, log out, flush and close)

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use chatgate_channel::MatchLobby;
use chatgate_protocol::{Line, LineDecoder, PlayerId};
use chatgate_session::{Player, PlayerStore};
use chatgate_transport::{Connection, ConnectionId, TcpConnection};
use parking_lot::{Mutex, RwLock};
use tokio::sync::Notify;

use crate::dispatch::dispatch;
use crate::gateway::GatewayState;
use crate::{GatewayError, OutboundQueue};

// ---------------------------------------------------------------------------
// SessionState
// ---------------------------------------------------------------------------

/// Where a session is in its lifecycle.
///
/// ```text
/// Unauthenticated ──PASS──► Authenticated ──► Closed
///        └───────────────────────────────────► Closed
/// ```
///
/// A session holds a player if and only if it is `Authenticated`.
#[derive(Debug, Clone)]
pub enum SessionState {
    Unauthenticated,
    Authenticated(Arc<Player>),
    Closed,
}

// ---------------------------------------------------------------------------
// ClientSession
// ---------------------------------------------------------------------------

/// One gateway-side endpoint: authentication state, player, and queue.
///
/// Shared between the connection's own tasks and every broadcaster, so
/// everything here is behind short, non-suspending locks or atomics.
#[derive(Debug)]
pub struct ClientSession {
    id: ConnectionId,
    peer: SocketAddr,
    state: Mutex<SessionState>,
    queue: OutboundQueue,
    last_activity: Mutex<Instant>,
    quit_announced: AtomicBool,
    closing: AtomicBool,
    shutdown: Notify,
}

impl ClientSession {
    pub fn new(id: ConnectionId, peer: SocketAddr) -> Self {
        Self {
            id,
            peer,
            state: Mutex::new(SessionState::Unauthenticated),
            queue: OutboundQueue::new(),
            last_activity: Mutex::new(Instant::now()),
            quit_announced: AtomicBool::new(false),
            closing: AtomicBool::new(false),
            shutdown: Notify::new(),
        }
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn peer(&self) -> SocketAddr {
        self.peer
    }

    pub fn state(&self) -> SessionState {
        self.state.lock().clone()
    }

    /// The logged-in player, if any.
    pub fn player(&self) -> Option<Arc<Player>> {
        match &*self.state.lock() {
            SessionState::Authenticated(player) => Some(Arc::clone(player)),
            _ => None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(*self.state.lock(), SessionState::Authenticated(_))
    }

    pub fn is_closed(&self) -> bool {
        matches!(*self.state.lock(), SessionState::Closed)
    }

    /// Binds the player. Only succeeds from `Unauthenticated`.
    pub(crate) fn authenticate(&self, player: Arc<Player>) -> bool {
        let mut state = self.state.lock();
        match *state {
            SessionState::Unauthenticated => {
                *state = SessionState::Authenticated(player);
                true
            }
            _ => false,
        }
    }

    /// Moves to `Closed`.
    ///
    /// Returns the previous state to the one caller that made the
    /// transition, `None` to everyone after it.
    pub(crate) fn close(&self) -> Option<SessionState> {
        let mut state = self.state.lock();
        match *state {
            SessionState::Closed => None,
            _ => Some(std::mem::replace(&mut *state, SessionState::Closed)),
        }
    }

    /// Enqueues one line for this session's peer.
    pub fn send(&self, line: &Line) -> bool {
        self.queue.push_line(line)
    }

    pub fn queue(&self) -> &OutboundQueue {
        &self.queue
    }

    pub(crate) fn touch(&self) {
        *self.last_activity.lock() = Instant::now();
    }

    pub fn last_activity(&self) -> Instant {
        *self.last_activity.lock()
    }

    /// Claims the right to announce this session's QUIT. `true` only once.
    pub(crate) fn claim_quit_announcement(&self) -> bool {
        !self.quit_announced.swap(true, Ordering::AcqRel)
    }

    /// Asks the read loop to stop after the current line.
    pub(crate) fn request_close(&self) {
        self.closing.store(true, Ordering::Release);
        self.shutdown.notify_one();
    }

    pub fn is_closing(&self) -> bool {
        self.closing.load(Ordering::Acquire)
    }

    async fn close_requested(&self) {
        if !self.is_closing() {
            self.shutdown.notified().await;
        }
    }
}

// ---------------------------------------------------------------------------
// SessionSet
// ---------------------------------------------------------------------------

/// Every live session, keyed by connection.
#[derive(Debug, Default)]
pub(crate) struct SessionSet {
    inner: RwLock<HashMap<ConnectionId, Arc<ClientSession>>>,
}

impl SessionSet {
    pub(crate) fn insert(&self, session: Arc<ClientSession>) {
        self.inner.write().insert(session.id(), session);
    }

    pub(crate) fn remove(&self, id: ConnectionId) -> Option<Arc<ClientSession>> {
        self.inner.write().remove(&id)
    }

    pub(crate) fn len(&self) -> usize {
        self.inner.read().len()
    }

    /// Returns `true` if any live session is logged in as `player_id`.
    pub(crate) fn holds_player(&self, player_id: PlayerId) -> bool {
        self.inner
            .read()
            .values()
            .any(|session| session.player().is_some_and(|p| p.id() == player_id))
    }

    /// Calls `f` with every authenticated session and its player.
    pub(crate) fn for_each_authenticated(
        &self,
        mut f: impl FnMut(&ClientSession, &Player),
    ) {
        for session in self.inner.read().values() {
            if let Some(player) = session.player() {
                f(session, &player);
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Connection handling
// ---------------------------------------------------------------------------

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection<S, L>(
    conn: TcpConnection,
    state: Arc<GatewayState<S, L>>,
) -> Result<(), GatewayError>
where
    S: PlayerStore,
    L: MatchLobby,
{
    let conn = Arc::new(conn);
    let session = Arc::new(ClientSession::new(conn.id(), conn.peer_addr()));
    let conn_id = session.id();
    state.sessions.insert(Arc::clone(&session));
    tracing::info!(%conn_id, peer = %session.peer(), "connection accepted");

    let writer = tokio::spawn(write_loop(Arc::clone(&conn), Arc::clone(&session)));

    let result = read_loop(&conn, &session, &state).await;

    teardown(&state, &session).await;
    if let Err(e) = writer.await {
        tracing::error!(%conn_id, error = %e, "writer task failed");
    }
    if let Err(e) = conn.close().await {
        tracing::debug!(%conn_id, error = %e, "close failed");
    }
    result
}

/// Reads, decodes and dispatches until the peer leaves or the session
/// is asked to close.
async fn read_loop<S, L>(
    conn: &TcpConnection,
    session: &ClientSession,
    state: &GatewayState<S, L>,
) -> Result<(), GatewayError>
where
    S: PlayerStore,
    L: MatchLobby,
{
    let conn_id = session.id();
    let mut decoder = LineDecoder::with_max_line_len(state.config.max_line_len);

    while !session.is_closing() {
        let data = tokio::select! {
            _ = session.close_requested() => break,
            received = conn.recv() => match received {
                Ok(Some(data)) => data,
                Ok(None) => {
                    tracing::debug!(%conn_id, "connection closed by peer");
                    break;
                }
                Err(e) => {
                    tracing::debug!(%conn_id, error = %e, "recv error");
                    return Err(e.into());
                }
            },
        };

        decoder.extend(&data);
        while let Some(next) = decoder.next_line() {
            match next {
                Ok(line) => {
                    if state.config.debug {
                        tracing::info!(%conn_id, %line, "received");
                    }
                    dispatch(state, session, &line).await;
                    if session.is_closing() {
                        break;
                    }
                }
                Err(e) => {
                    tracing::warn!(%conn_id, error = %e, "dropping undecodable line");
                }
            }
        }
    }
    Ok(())
}

/// Drains the session's queue to the socket until the queue closes.
async fn write_loop(conn: Arc<TcpConnection>, session: Arc<ClientSession>) {
    while let Some(batch) = session.queue().next_batch().await {
        if let Err(e) = conn.send(&batch).await {
            tracing::debug!(conn_id = %session.id(), error = %e, "write failed");
            session.request_close();
            break;
        }
    }
}

/// Releases everything the session holds. Runs its body at most once.
///
/// Lock order: channel registry → session set → session state.
pub(crate) async fn teardown<S, L>(state: &GatewayState<S, L>, session: &ClientSession)
where
    S: PlayerStore,
    L: MatchLobby,
{
    let Some(previous) = session.close() else {
        return;
    };
    let conn_id = session.id();
    state.sessions.remove(conn_id);

    if let SessionState::Authenticated(player) = previous {
        let announce = session.claim_quit_announcement();
        state.channels.with(|registry| {
            let left = registry.leave_all(player.id());
            if announce && !left.is_empty() {
                let line = Line::new(player.nick(), "QUIT").trailing("Connection closed");
                state.fanout_members(left.iter(), &line, Some(conn_id));
            }
        });
        if state.sessions.holds_player(player.id()) {
            tracing::debug!(%conn_id, %player, "player still connected elsewhere");
        } else if let Err(e) = state.store.logout(&player).await {
            tracing::error!(%conn_id, %player, error = %e, "logout failed");
        }
        tracing::info!(%conn_id, %player, "player disconnected");
    } else {
        tracing::info!(%conn_id, peer = %session.peer(), "anonymous client disconnected");
    }

    session.queue().close();
}

#[cfg(test)]
mod tests {
    use chatgate_session::Privileges;

    use super::*;

    fn session() -> ClientSession {
        ClientSession::new(ConnectionId::new(1), "127.0.0.1:4000".parse().unwrap())
    }

    fn player() -> Arc<Player> {
        Arc::new(Player::new(PlayerId(1), "alice", Privileges::DEFAULT_PLAYER))
    }

    #[test]
    fn test_new_session_is_unauthenticated() {
        let s = session();
        assert!(!s.is_authenticated());
        assert!(s.player().is_none());
    }

    #[test]
    fn test_authenticate_only_once() {
        let s = session();
        assert!(s.authenticate(player()));
        assert!(!s.authenticate(player()));
        assert_eq!(s.player().map(|p| p.id()), Some(PlayerId(1)));
    }

    #[test]
    fn test_close_transitions_once() {
        let s = session();
        s.authenticate(player());
        assert!(matches!(s.close(), Some(SessionState::Authenticated(_))));
        assert!(s.close().is_none());
        assert!(s.is_closed());
        assert!(s.player().is_none());
    }

    #[test]
    fn test_authenticate_after_close_fails() {
        let s = session();
        s.close();
        assert!(!s.authenticate(player()));
    }

    #[test]
    fn test_claim_quit_announcement_once() {
        let s = session();
        assert!(s.claim_quit_announcement());
        assert!(!s.claim_quit_announcement());
    }

    #[tokio::test]
    async fn test_close_requested_resolves_after_request() {
        let s = session();
        s.request_close();
        tokio::time::timeout(std::time::Duration::from_secs(1), s.close_requested())
            .await
            .expect("should resolve");
        assert!(s.is_closing());
    }
}
