//! In-memory harness for dispatcher tests: no sockets, just sessions whose
//! queues get drained and read back as lines.

use std::sync::Arc;

use chatgate_channel::{ChannelConfig, MemoryLobby};
use chatgate_protocol::PlayerId;
use chatgate_session::{MemoryPlayerStore, Player, Privileges};
use chatgate_transport::ConnectionId;

use crate::dispatch::dispatch;
use crate::gateway::GatewayState;
use crate::{ClientSession, GatewayConfig};

pub(crate) type TestState = GatewayState<MemoryPlayerStore, MemoryLobby>;

/// A gateway named `gate` with `#general` (topic `hello`, moderated by
/// player 1), `#random` (no topic) and a staff-only `#staff`.
pub(crate) fn state() -> TestState {
    let config = GatewayConfig {
        server_name: "gate".to_string(),
        channels: vec![
            ChannelConfig::new("#general", "hello").moderator(PlayerId(1)),
            ChannelConfig::new("#random", ""),
            ChannelConfig::new("#staff", "staff only").read_privileges(Privileges::STAFF),
        ],
        ..GatewayConfig::default()
    };
    GatewayState::new(config, MemoryPlayerStore::new(), MemoryLobby::new())
}

pub(crate) fn connect(state: &TestState, id: u64) -> Arc<ClientSession> {
    let session = Arc::new(ClientSession::new(
        ConnectionId::new(id),
        "10.0.0.1:5000".parse().unwrap(),
    ));
    state.sessions.insert(Arc::clone(&session));
    session
}

/// Registers `name`, logs a fresh session in, and discards the welcome.
pub(crate) async fn login(
    state: &TestState,
    id: u64,
    name: &str,
) -> (Arc<ClientSession>, Arc<Player>) {
    let (player, token) = state.store.register(name, Privileges::DEFAULT_PLAYER).unwrap();
    let session = connect(state, id);
    dispatch(state, &session, &format!("PASS {token}")).await;
    assert!(session.is_authenticated(), "{name} should be logged in");
    session.queue().drain();
    (session, player)
}

/// Everything queued on `session` since the last call, one entry per line.
pub(crate) fn lines(session: &ClientSession) -> Vec<String> {
    String::from_utf8(session.queue().drain())
        .unwrap()
        .split_terminator("\r\n")
        .map(str::to_string)
        .collect()
}

pub(crate) async fn send(state: &TestState, session: &ClientSession, line: &str) -> Vec<String> {
    dispatch(state, session, line).await;
    lines(session)
}
