//! Command handlers.
//!
//! Each handler either replies to the caller, mutates the channel registry
//! and fans lines out to other sessions, or asks the session to close.
//! Registry work happens inside one `SharedChannels::with` call per step,
//! so what a handler reads and what it broadcasts come from the same
//! snapshot.

use std::sync::Arc;

use chatgate_channel::{Channel, ChannelError, ChannelRegistry, JoinOutcome, MatchLobby, PartOutcome};
use chatgate_protocol::{split_trailing, strip_colon, Command, Line, ProtocolError, ReplyCode};
use chatgate_session::{make_safe_name, Player, PlayerStore, SessionError};

use crate::dispatch::Ctx;
use crate::gateway::GatewayState;
use crate::telemetry::CHAT_TARGET;
use crate::{ClientSession, CommandError};

// ---------------------------------------------------------------------------
// Login
// ---------------------------------------------------------------------------

/// `PASS <token>`: resolve the credential, go online, send the welcome.
///
/// A second `PASS` on a logged-in session is ignored.
pub(crate) async fn pass<S, L>(
    state: &GatewayState<S, L>,
    session: &ClientSession,
    command: &Command<'_>,
) -> Result<(), CommandError>
where
    S: PlayerStore,
    L: MatchLobby,
{
    if session.is_authenticated() {
        tracing::debug!(conn_id = %session.id(), "PASS after login ignored");
        return Ok(());
    }

    let token = command
        .first_arg()
        .ok_or_else(ProtocolError::incorrect_password)?;
    let player = state
        .store
        .resolve_credential(token)
        .await?
        .ok_or_else(ProtocolError::incorrect_username)?;
    if player.is_restricted() {
        return Err(ProtocolError::restricted_login().into());
    }

    state.store.mark_online(&player).await?;
    if !session.authenticate(Arc::clone(&player)) {
        return Ok(());
    }
    tracing::info!(conn_id = %session.id(), %player, peer = %session.peer(), "player logged in");

    send_welcome(state, session, &player);
    Ok(())
}

fn send_welcome<S: PlayerStore, L: MatchLobby>(
    state: &GatewayState<S, L>,
    session: &ClientSession,
    player: &Player,
) {
    let server = state.server_name();
    let nick = player.nick();
    let numeric = |code| Line::numeric(server, code).param(nick);

    session.send(
        &numeric(ReplyCode::RPL_WELCOME)
            .trailing(format!("Welcome to the Internet Relay Network, {nick}@{server}")),
    );
    session.send(
        &numeric(ReplyCode::RPL_YOURHOST)
            .trailing(format!("- Your host is {}", session.peer().ip())),
    );
    session.send(
        &numeric(ReplyCode::RPL_LUSERCLIENT)
            .trailing(format!("- There are {} users", state.store.online_count())),
    );
    session.send(
        &numeric(ReplyCode::RPL_MOTDSTART)
            .trailing(format!("- {server} Message of the day - ")),
    );
    for line in &state.config.motd {
        session.send(&numeric(ReplyCode::RPL_MOTD).trailing(line));
    }
    session.send(&numeric(ReplyCode::RPL_ENDOFMOTD).trailing("End of MOTD command"));
}

// ---------------------------------------------------------------------------
// Channel queries
// ---------------------------------------------------------------------------

/// `TOPIC <channel> [:<text>]`: read the topic, or set it as a moderator.
pub(crate) fn topic<S, L>(ctx: &Ctx<'_, S, L>, command: &Command<'_>) -> Result<(), CommandError>
where
    S: PlayerStore,
    L: MatchLobby,
{
    let (head, text) = split_trailing(command.args());
    let name = head
        .split(' ')
        .next()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ProtocolError::need_more_params("TOPIC"))?;

    ctx.state.channels.with(|registry| -> Result<(), CommandError> {
        match text {
            None => {
                let channel = visible(registry, name, &ctx.player)?;
                ctx.reply(topic_line(ctx, channel));
            }
            Some(text) => {
                visible(registry, name, &ctx.player)?;
                let channel = registry.set_topic(ctx.player.id(), name, text)?;
                let line = ctx.relay("TOPIC").param(channel.name()).trailing(channel.topic());
                ctx.state.fanout_channel(channel, &line, None);
                if !channel.is_member(ctx.player.id()) {
                    ctx.reply(line);
                }
            }
        }
        Ok(())
    })
}

/// `NAMES <channel>`: member list of a channel the caller is in.
pub(crate) fn names<S, L>(ctx: &Ctx<'_, S, L>, command: &Command<'_>) -> Result<(), CommandError>
where
    S: PlayerStore,
    L: MatchLobby,
{
    let name = command
        .first_arg()
        .ok_or_else(|| ProtocolError::need_more_params("NAMES"))?;

    ctx.state.channels.with(|registry| -> Result<(), CommandError> {
        let channel = visible(registry, name, &ctx.player)?;
        if !channel.is_member(ctx.player.id()) {
            return Err(ChannelError::NotMember(ctx.player.id(), name.to_string()).into());
        }
        send_names(ctx, channel);
        Ok(())
    })
}

/// `LIST`: every channel the caller may read.
pub(crate) fn list<S, L>(ctx: &Ctx<'_, S, L>) -> Result<(), CommandError>
where
    S: PlayerStore,
    L: MatchLobby,
{
    let privileges = ctx.player.privileges();
    ctx.state.channels.with(|registry| {
        for channel in registry.channels().filter(|c| c.can_read(privileges)) {
            let topic = match channel.topic() {
                "" => "No topic",
                topic => topic,
            };
            ctx.reply(
                ctx.numeric(ReplyCode::RPL_LIST)
                    .param(channel.name())
                    .param(channel.member_count().to_string())
                    .trailing(topic),
            );
        }
    });
    ctx.reply(ctx.numeric(ReplyCode::RPL_LISTEND).trailing("End of LIST"));
    Ok(())
}

// ---------------------------------------------------------------------------
// Membership
// ---------------------------------------------------------------------------

/// `JOIN <channel>` / `MP <channel>`.
pub(crate) fn join<S, L>(ctx: &Ctx<'_, S, L>, command: &Command<'_>) -> Result<(), CommandError>
where
    S: PlayerStore,
    L: MatchLobby,
{
    let name = command
        .first_arg()
        .ok_or_else(|| ProtocolError::need_more_params(command.verb()))?;
    join_channel(ctx, name)?;
    Ok(())
}

/// Adds the caller to `name`, announces it to the members (caller
/// included), then sends topic and names. Re-joining is silent.
fn join_channel<S, L>(ctx: &Ctx<'_, S, L>, name: &str) -> Result<(), ChannelError>
where
    S: PlayerStore,
    L: MatchLobby,
{
    ctx.state.channels.with(|registry| -> Result<(), ChannelError> {
        if registry.join(&ctx.player, name)? == JoinOutcome::AlreadyMember {
            return Ok(());
        }
        let channel = registry
            .get(name)
            .ok_or_else(|| ChannelError::NotFound(name.to_string()))?;

        let line = ctx.relay("JOIN").trailing(channel.name());
        ctx.state.fanout_channel(channel, &line, None);
        ctx.reply(topic_line(ctx, channel));
        send_names(ctx, channel);
        tracing::info!(player = %ctx.player, channel = %channel.name(), "joined channel");
        Ok(())
    })
}

/// `PART <channel>`.
pub(crate) fn part<S, L>(ctx: &Ctx<'_, S, L>, command: &Command<'_>) -> Result<(), CommandError>
where
    S: PlayerStore,
    L: MatchLobby,
{
    let name = command
        .first_arg()
        .ok_or_else(|| ProtocolError::need_more_params("PART"))?;
    part_channel(ctx, name)
}

/// Announces the part to every member (caller included), then removes
/// the caller. An ephemeral channel left empty goes away.
fn part_channel<S, L>(ctx: &Ctx<'_, S, L>, name: &str) -> Result<(), CommandError>
where
    S: PlayerStore,
    L: MatchLobby,
{
    let player_id = ctx.player.id();
    ctx.state.channels.with(|registry| -> Result<(), CommandError> {
        let channel = registry
            .get(name)
            .filter(|c| c.is_member(player_id) || c.can_read(ctx.player.privileges()))
            .ok_or_else(|| {
                ProtocolError::new(
                    ReplyCode::ERR_NOSUCHCHANNEL,
                    format!("No channel named {name} has been found"),
                )
                .with_subject(name)
            })?;
        if !channel.is_member(player_id) {
            return Err(ChannelError::NotMember(player_id, name.to_string()).into());
        }

        let line = ctx.relay("PART").trailing(channel.name());
        ctx.state.fanout_channel(channel, &line, None);

        if registry.part(player_id, name)? == PartOutcome::LeftAndRemoved {
            tracing::info!(channel = %name, "removed empty channel");
        }
        tracing::info!(player = %ctx.player, channel = %name, "parted channel");
        Ok(())
    })
}

// ---------------------------------------------------------------------------
// Messages
// ---------------------------------------------------------------------------

/// Outcome of routing one chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryStatus {
    Delivered,
    NoSuchChannel,
    NoSuchNick,
    NotRegistered,
}

impl DeliveryStatus {
    /// The legacy numeric status: `1` on success, otherwise the reply code.
    pub fn code(self) -> u16 {
        match self {
            Self::Delivered => 1,
            Self::NoSuchChannel => ReplyCode::ERR_NOSUCHCHANNEL.as_u16(),
            Self::NoSuchNick => ReplyCode::ERR_NOSUCHNICK.as_u16(),
            Self::NotRegistered => ReplyCode::ERR_NOTREGISTERED.as_u16(),
        }
    }
}

fn is_channel_target(target: &str) -> bool {
    target.starts_with('#') || target.starts_with('$')
}

/// Hands a message to the rest of the service and records it on the chat
/// log. An unknown recipient is a status, not an error.
pub(crate) async fn send_message<S, L>(
    state: &GatewayState<S, L>,
    from: Option<&Player>,
    to: &str,
    text: &str,
) -> Result<DeliveryStatus, SessionError>
where
    S: PlayerStore,
    L: MatchLobby,
{
    let Some(from) = from else {
        return Ok(DeliveryStatus::NotRegistered);
    };

    if is_channel_target(to) {
        if !state.channels.with(|registry| registry.get(to).is_some()) {
            return Ok(DeliveryStatus::NoSuchChannel);
        }
        tracing::info!(target: CHAT_TARGET, %from, channel = %to, %text, "channel message");
        return Ok(DeliveryStatus::Delivered);
    }

    match state.store.lookup_player_by_name(&make_safe_name(to)).await? {
        Some(recipient) => {
            tracing::info!(target: CHAT_TARGET, %from, to = %recipient, %text, "direct message");
            Ok(DeliveryStatus::Delivered)
        }
        None => Ok(DeliveryStatus::NoSuchNick),
    }
}

/// `PRIVMSG <target> :<text>`.
pub(crate) async fn privmsg<S, L>(
    ctx: &Ctx<'_, S, L>,
    command: &Command<'_>,
) -> Result<(), CommandError>
where
    S: PlayerStore,
    L: MatchLobby,
{
    let args = command.args().trim_start();
    if args.starts_with(':') {
        return Err(CommandError::Malformed(format!("PRIVMSG without target: {args}")));
    }
    let (target, text) = args
        .split_once(' ')
        .map(|(target, rest)| (target, strip_colon(rest.trim_start())))
        .filter(|(target, text)| !target.is_empty() && !text.is_empty())
        .ok_or_else(|| ProtocolError::need_more_params("PRIVMSG"))?;

    if text.starts_with("!mp close") {
        mp_close(ctx);
    }

    if is_channel_target(target) {
        let player_id = ctx.player.id();
        ctx.state
            .channels
            .with(|registry| registry.check_can_send(player_id, target).map(|_| ()))?;

        let status = send_message(ctx.state, Some(&ctx.player), target, text).await?;
        if status != DeliveryStatus::Delivered {
            return Err(ProtocolError::no_such_channel(target).into());
        }

        let line = ctx.relay("PRIVMSG").param(target).trailing(text);
        ctx.state.channels.with(|registry| {
            if let Some(channel) = registry.get(target) {
                ctx.state.fanout_channel(channel, &line, Some(ctx.session.id()));
            }
        });
        return Ok(());
    }

    let status = send_message(ctx.state, Some(&ctx.player), target, text).await?;
    if status == DeliveryStatus::NoSuchNick {
        tracing::debug!(player = %ctx.player, %target, code = status.code(), "message to unknown player");
    }

    if text.starts_with("!mp make") || text.starts_with("!mp_make") {
        mp_make(ctx);
    }

    let line = ctx.relay("PRIVMSG").param(target).trailing(text);
    ctx.state.fanout_name(target, &line);
    Ok(())
}

/// `!mp close`: part the caller's match channel and leave the match.
fn mp_close<S, L>(ctx: &Ctx<'_, S, L>)
where
    S: PlayerStore,
    L: MatchLobby,
{
    let player_id = ctx.player.id();
    let Some(channel) = ctx.state.lobby.current_match_channel_name(player_id) else {
        tracing::warn!(player = %ctx.player, "!mp close outside of a match");
        return;
    };

    ctx.reply(ctx.relay("PART").param(&channel).trailing("Match closed"));
    if let Err(e) = part_channel(ctx, &channel) {
        tracing::warn!(player = %ctx.player, %channel, error = %e, "!mp close could not part");
    }
    ctx.state.lobby.leave_match(player_id);
}

/// `!mp make`: make sure the match channel exists and join it.
fn mp_make<S, L>(ctx: &Ctx<'_, S, L>)
where
    S: PlayerStore,
    L: MatchLobby,
{
    let player_id = ctx.player.id();
    let Some(match_id) = ctx.state.lobby.current_match(player_id) else {
        tracing::warn!(player = %ctx.player, "!mp make outside of a match");
        ctx.reply(notice(ctx, "You're not in a match"));
        return;
    };

    let channel = ctx.state.channels.with(|registry| {
        registry
            .ensure_lobby_channel(match_id, player_id)
            .name()
            .to_string()
    });
    if let Err(e) = join_channel(ctx, &channel) {
        tracing::warn!(player = %ctx.player, %channel, error = %e, "!mp make could not join");
        ctx.reply(notice(ctx, &format!("Lobby {channel} doesn't exist")));
    }
}

// ---------------------------------------------------------------------------
// Connection
// ---------------------------------------------------------------------------

/// `QUIT [:<message>]`: tell everyone sharing a channel, then close.
///
/// Logout and channel cleanup happen in the session teardown.
pub(crate) fn quit<S, L>(ctx: &Ctx<'_, S, L>, command: &Command<'_>) -> Result<(), CommandError>
where
    S: PlayerStore,
    L: MatchLobby,
{
    let message = command.args().trim().trim_start_matches(':');
    if ctx.session.claim_quit_announcement() {
        let line = ctx.relay("QUIT").trailing(message);
        ctx.state.channels.with(|registry| {
            let channels = registry.channels_of(ctx.player.id());
            ctx.state.fanout_members(channels, &line, None);
        });
    }
    tracing::info!(player = %ctx.player, %message, "player quit");
    ctx.session.request_close();
    Ok(())
}

/// `PING`: refresh liveness and answer.
pub(crate) fn ping<S, L>(ctx: &Ctx<'_, S, L>) -> Result<(), CommandError>
where
    S: PlayerStore,
    L: MatchLobby,
{
    let server = ctx.state.server_name();
    ctx.reply(Line::new(server, "PONG").trailing(server));
    Ok(())
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Looks up a channel the player may see. Hidden channels are reported
/// as unknown.
fn visible<'r>(
    registry: &'r ChannelRegistry,
    name: &str,
    player: &Player,
) -> Result<&'r Channel, ChannelError> {
    registry
        .get(name)
        .filter(|c| c.is_member(player.id()) || c.can_read(player.privileges()))
        .ok_or_else(|| ChannelError::NotFound(name.to_string()))
}

fn topic_line<S: PlayerStore, L: MatchLobby>(ctx: &Ctx<'_, S, L>, channel: &Channel) -> Line {
    if channel.topic().is_empty() {
        ctx.numeric(ReplyCode::RPL_NOTOPIC)
            .param(channel.name())
            .trailing("No topic is set")
    } else {
        ctx.numeric(ReplyCode::RPL_TOPIC)
            .param(channel.name())
            .trailing(channel.topic())
    }
}

fn send_names<S: PlayerStore, L: MatchLobby>(ctx: &Ctx<'_, S, L>, channel: &Channel) {
    ctx.reply(
        ctx.numeric(ReplyCode::RPL_NAMREPLY)
            .param("=")
            .param(channel.name())
            .trailing(channel.member_names().join(" ")),
    );
    ctx.reply(
        ctx.numeric(ReplyCode::RPL_ENDOFNAMES)
            .param(channel.name())
            .trailing("End of NAMES list"),
    );
}

fn notice<S: PlayerStore, L: MatchLobby>(ctx: &Ctx<'_, S, L>, text: &str) -> Line {
    Line::new(ctx.state.server_name(), "NOTICE")
        .param(ctx.nick())
        .trailing(text)
}
