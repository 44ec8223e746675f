//! Shared gateway state and the broadcast surface.
//!
//! [`GatewayState`] is what every connection task shares: config, the
//! collaborators, the channel registry and the live session set.
//! [`Gateway`] is the cheap, cloneable handle other parts of the service
//! use to push presence changes (joins, parts, messages) to chat clients.
//!
//! # Fanout
//!
//! A broadcast walks the live sessions and enqueues one line on each
//! authenticated session whose player matches (channel member, or name).
//! Enqueueing never waits on a socket. Channel broadcasts run while the
//! registry lock is held, so two broadcasts on the same channel reach
//! every queue in the order the registry accepted them.

use std::collections::HashSet;
use std::sync::Arc;

use chatgate_channel::{Channel, ChannelRegistry, MatchLobby, SharedChannels};
use chatgate_protocol::{Line, PlayerId};
use chatgate_session::{make_nick, make_safe_name, Player, PlayerStore};
use chatgate_transport::ConnectionId;

use crate::session::SessionSet;
use crate::GatewayConfig;

/// State shared by every connection task.
pub(crate) struct GatewayState<S, L> {
    pub(crate) config: GatewayConfig,
    pub(crate) store: S,
    pub(crate) lobby: L,
    pub(crate) channels: SharedChannels,
    pub(crate) sessions: SessionSet,
}

impl<S: PlayerStore, L: MatchLobby> GatewayState<S, L> {
    pub(crate) fn new(config: GatewayConfig, store: S, lobby: L) -> Self {
        let registry = ChannelRegistry::from_configs(config.channels.iter().cloned());
        Self {
            config,
            store,
            lobby,
            channels: SharedChannels::new(registry),
            sessions: SessionSet::default(),
        }
    }

    pub(crate) fn server_name(&self) -> &str {
        &self.config.server_name
    }

    /// Enqueues `line` on every authenticated session whose player passes
    /// `wants`, skipping `except`. Returns how many sessions got it.
    pub(crate) fn fanout(
        &self,
        line: &Line,
        except: Option<ConnectionId>,
        mut wants: impl FnMut(&Player) -> bool,
    ) -> usize {
        let mut delivered = 0;
        self.sessions.for_each_authenticated(|session, player| {
            if Some(session.id()) != except && wants(player) && session.send(line) {
                delivered += 1;
            }
        });
        delivered
    }

    /// Enqueues `line` on every session whose player is in `channel`.
    pub(crate) fn fanout_channel(
        &self,
        channel: &Channel,
        line: &Line,
        except: Option<ConnectionId>,
    ) -> usize {
        self.fanout(line, except, |player| channel.is_member(player.id()))
    }

    /// Enqueues `line` once on every session whose player shares at least
    /// one of `channels`.
    pub(crate) fn fanout_members<'c>(
        &self,
        channels: impl IntoIterator<Item = &'c Channel>,
        line: &Line,
        except: Option<ConnectionId>,
    ) -> usize {
        let members: HashSet<PlayerId> = channels
            .into_iter()
            .flat_map(|c| c.members().iter().map(|p| p.id()))
            .collect();
        self.fanout(line, except, |player| members.contains(&player.id()))
    }

    /// Enqueues `line` on every session logged in as `name`.
    pub(crate) fn fanout_name(&self, name: &str, line: &Line) -> usize {
        let safe = make_safe_name(name);
        self.fanout(line, None, |player| player.safe_name() == safe)
    }
}

/// Handle for pushing presence changes to connected chat clients.
///
/// Cloning is cheap (an `Arc` bump). Every method only enqueues and
/// returns the number of sessions that received the line.
pub struct Gateway<S, L> {
    state: Arc<GatewayState<S, L>>,
}

impl<S, L> Clone for Gateway<S, L> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
        }
    }
}

impl<S: PlayerStore, L: MatchLobby> Gateway<S, L> {
    pub(crate) fn new(state: Arc<GatewayState<S, L>>) -> Self {
        Self { state }
    }

    /// Tells the members of `channel` that `player` joined it.
    pub fn broadcast_join(&self, player: &Player, channel: &str) -> usize {
        self.broadcast_presence(player, "JOIN", channel)
    }

    /// Tells the members of `channel` that `player` left it.
    pub fn broadcast_part(&self, player: &Player, channel: &str) -> usize {
        self.broadcast_presence(player, "PART", channel)
    }

    /// Relays a chat message from elsewhere in the service.
    ///
    /// A `#`-target goes to every session of the channel's members,
    /// the sender's included; anything else goes to the sessions logged
    /// in as `target`.
    pub fn broadcast_message(&self, from: &str, target: &str, text: &str) -> usize {
        let state = &self.state;
        let line = Line::new(make_nick(from), "PRIVMSG").param(target).trailing(text);

        if target.starts_with('#') {
            state.channels.with(|registry| match registry.get(target) {
                Some(channel) => state.fanout_channel(channel, &line, None),
                None => {
                    tracing::debug!(channel = %target, "message for unknown channel dropped");
                    0
                }
            })
        } else {
            state.fanout_name(target, &line)
        }
    }

    /// The channel registry shared with the connection tasks.
    pub fn channels(&self) -> &SharedChannels {
        &self.state.channels
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.state.config
    }

    pub fn store(&self) -> &S {
        &self.state.store
    }

    pub fn lobby(&self) -> &L {
        &self.state.lobby
    }

    /// Number of live connections, authenticated or not.
    pub fn session_count(&self) -> usize {
        self.state.sessions.len()
    }

    fn broadcast_presence(&self, player: &Player, verb: &str, channel: &str) -> usize {
        let state = &self.state;
        state.channels.with(|registry| match registry.get(channel) {
            Some(ch) => {
                let line = Line::new(player.nick(), verb).trailing(ch.name());
                state.fanout_channel(ch, &line, None)
            }
            None => {
                tracing::debug!(%player, %channel, verb, "presence for unknown channel dropped");
                0
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{connect, lines, login, send, state};

    #[tokio::test]
    async fn test_broadcast_join_reaches_channel_members() {
        let state = Arc::new(state());
        let gateway = Gateway::new(Arc::clone(&state));
        let (alice, _) = login(&state, 1, "alice").await;
        let (bob, b) = login(&state, 2, "bob").await;
        let (carol, _) = login(&state, 3, "carol").await;
        send(&state, &alice, "JOIN #general").await;
        send(&state, &bob, "JOIN #general").await;
        lines(&alice);

        assert_eq!(gateway.broadcast_join(&b, "#general"), 2);
        assert_eq!(lines(&alice), vec![":bob JOIN :#general"]);
        assert_eq!(lines(&bob), vec![":bob JOIN :#general"]);
        assert!(lines(&carol).is_empty());
    }

    #[tokio::test]
    async fn test_broadcast_part_unknown_channel_reaches_nobody() {
        let state = Arc::new(state());
        let gateway = Gateway::new(Arc::clone(&state));
        let (alice, a) = login(&state, 1, "alice").await;
        assert_eq!(gateway.broadcast_part(&a, "#nowhere"), 0);
        assert!(lines(&alice).is_empty());
    }

    #[tokio::test]
    async fn test_broadcast_message_channel_reaches_sender_sessions_too() {
        let state = Arc::new(state());
        let gateway = Gateway::new(Arc::clone(&state));
        let (alice, _) = login(&state, 1, "alice").await;
        let (bob, _) = login(&state, 2, "bob").await;
        send(&state, &alice, "JOIN #general").await;
        send(&state, &bob, "JOIN #general").await;
        lines(&alice);

        assert_eq!(gateway.broadcast_message("alice", "#general", "from the web"), 2);
        assert_eq!(lines(&alice), vec![":alice PRIVMSG #general :from the web"]);
        assert_eq!(lines(&bob), vec![":alice PRIVMSG #general :from the web"]);
    }

    #[tokio::test]
    async fn test_broadcast_message_spaced_sender_is_one_token() {
        let state = Arc::new(state());
        let gateway = Gateway::new(Arc::clone(&state));
        let (bob, _) = login(&state, 1, "bob").await;
        send(&state, &bob, "JOIN #general").await;

        assert_eq!(gateway.broadcast_message("Web User", "#general", "hi"), 1);
        assert_eq!(lines(&bob), vec![":Web_User PRIVMSG #general :hi"]);
    }

    #[tokio::test]
    async fn test_broadcast_join_spaced_name_uses_nick() {
        let state = Arc::new(state());
        let gateway = Gateway::new(Arc::clone(&state));
        let (big, b) = login(&state, 1, "Big Bob").await;
        send(&state, &big, "JOIN #random").await;

        assert_eq!(gateway.broadcast_join(&b, "#random"), 1);
        assert_eq!(lines(&big), vec![":Big_Bob JOIN :#random"]);
    }

    #[tokio::test]
    async fn test_broadcast_message_direct_reaches_every_session_of_recipient() {
        let state = Arc::new(state());
        let gateway = Gateway::new(Arc::clone(&state));
        let (bob, b) = login(&state, 1, "bob").await;
        let second = connect(&state, 2);
        assert!(second.authenticate(b));

        assert_eq!(gateway.broadcast_message("alice", "Bob", "hey"), 2);
        assert_eq!(lines(&bob), vec![":alice PRIVMSG Bob :hey"]);
        assert_eq!(lines(&second), vec![":alice PRIVMSG Bob :hey"]);
    }

    #[tokio::test]
    async fn test_fanout_skips_unauthenticated_sessions() {
        let state = state();
        let anon = connect(&state, 1);
        let (alice, _) = login(&state, 2, "alice").await;
        let line = Line::new("gate", "NOTICE").trailing("all");

        assert_eq!(state.fanout(&line, None, |_| true), 1);
        assert!(lines(&anon).is_empty());
        assert_eq!(lines(&alice), vec![":gate NOTICE :all"]);
    }

    #[tokio::test]
    async fn test_session_count_tracks_live_sessions() {
        let state = Arc::new(state());
        let gateway = Gateway::new(Arc::clone(&state));
        let _a = connect(&state, 1);
        let _b = connect(&state, 2);
        assert_eq!(gateway.session_count(), 2);
        assert_eq!(gateway.config().server_name, "gate");
    }
}
