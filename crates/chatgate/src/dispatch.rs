//! Command dispatch: verb lookup, the registration gate, and the single
//! place where handler errors become replies or log records.

use std::sync::Arc;

use chatgate_channel::MatchLobby;
use chatgate_protocol::{Command, Line, ProtocolError, ReplyCode};
use chatgate_session::{Player, PlayerStore};

use crate::commands;
use crate::gateway::GatewayState;
use crate::{ClientSession, CommandError};

/// Every verb the gateway understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Verb {
    Pass,
    Cap,
    Topic,
    Names,
    List,
    Join,
    Mp,
    Part,
    Privmsg,
    Quit,
    Ping,
    Pong,
    Nick,
    User,
    Away,
}

const VERBS: &[(&str, Verb)] = &[
    ("PASS", Verb::Pass),
    ("CAP", Verb::Cap),
    ("TOPIC", Verb::Topic),
    ("NAMES", Verb::Names),
    ("LIST", Verb::List),
    ("JOIN", Verb::Join),
    ("MP", Verb::Mp),
    ("PART", Verb::Part),
    ("PRIVMSG", Verb::Privmsg),
    ("QUIT", Verb::Quit),
    ("PING", Verb::Ping),
    ("PONG", Verb::Pong),
    ("NICK", Verb::Nick),
    ("USER", Verb::User),
    ("AWAY", Verb::Away),
];

/// First words of HTTP request lines. Browsers and scanners hit the port
/// with these; they're logged and ignored.
const HTTP_PROBES: &[&str] = &["GET", "POST", "HEAD"];

impl Verb {
    /// Case-insensitive lookup.
    pub(crate) fn lookup(name: &str) -> Option<Self> {
        VERBS
            .iter()
            .find(|(verb, _)| verb.eq_ignore_ascii_case(name))
            .map(|&(_, verb)| verb)
    }

    /// Everything except login and capability negotiation needs a login.
    pub(crate) fn requires_registration(self) -> bool {
        !matches!(self, Self::Pass | Self::Cap)
    }
}

/// What a registered command handler works with.
pub(crate) struct Ctx<'a, S, L> {
    pub(crate) state: &'a GatewayState<S, L>,
    pub(crate) session: &'a ClientSession,
    pub(crate) player: Arc<Player>,
}

impl<S: PlayerStore, L: MatchLobby> Ctx<'_, S, L> {
    pub(crate) fn nick(&self) -> &str {
        self.player.nick()
    }

    /// `:<server> <code> <nick>`, ready for more params.
    pub(crate) fn numeric(&self, code: ReplyCode) -> Line {
        Line::numeric(self.state.server_name(), code).param(self.nick())
    }

    /// A line from the caller, as relayed to others (`:<nick> <VERB>`).
    pub(crate) fn relay(&self, verb: &str) -> Line {
        Line::new(self.nick(), verb)
    }

    pub(crate) fn reply(&self, line: Line) {
        self.session.send(&line);
    }
}

/// Runs one decoded line against the session.
///
/// Never fails: every handler error is turned into a reply line or a log
/// record here, and the connection stays open.
pub(crate) async fn dispatch<S, L>(
    state: &GatewayState<S, L>,
    session: &ClientSession,
    line: &str,
) where
    S: PlayerStore,
    L: MatchLobby,
{
    session.touch();
    let Some(command) = Command::parse(line) else {
        return;
    };
    let conn_id = session.id();

    match route(state, session, &command).await {
        Ok(()) => {}
        Err(CommandError::Reply(err)) => {
            tracing::debug!(%conn_id, verb = command.verb(), code = %err.code(), "command rejected");
            session.send(&err.to_line(state.server_name()));
        }
        Err(CommandError::Malformed(reason)) => {
            tracing::warn!(%conn_id, verb = command.verb(), %reason, "malformed command");
        }
        Err(CommandError::Session(e)) => {
            tracing::error!(%conn_id, verb = command.verb(), error = %e, "player store failed");
        }
    }
}

async fn route<S, L>(
    state: &GatewayState<S, L>,
    session: &ClientSession,
    command: &Command<'_>,
) -> Result<(), CommandError>
where
    S: PlayerStore,
    L: MatchLobby,
{
    if HTTP_PROBES.contains(&command.verb()) {
        tracing::warn!(conn_id = %session.id(), peer = %session.peer(), "HTTP request on chat port ignored");
        return Ok(());
    }

    let verb = Verb::lookup(command.verb())
        .ok_or_else(|| ProtocolError::unknown_command(command.verb()))?;

    if !verb.requires_registration() {
        return match verb {
            Verb::Pass => commands::pass(state, session, command).await,
            _ => Ok(()),
        };
    }

    let player = session.player().ok_or_else(ProtocolError::not_registered)?;
    let ctx = Ctx {
        state,
        session,
        player,
    };

    match verb {
        Verb::Topic => commands::topic(&ctx, command),
        Verb::Names => commands::names(&ctx, command),
        Verb::List => commands::list(&ctx),
        Verb::Join | Verb::Mp => commands::join(&ctx, command),
        Verb::Part => commands::part(&ctx, command),
        Verb::Privmsg => commands::privmsg(&ctx, command).await,
        Verb::Quit => commands::quit(&ctx, command),
        Verb::Ping => commands::ping(&ctx),
        Verb::Nick | Verb::User | Verb::Away | Verb::Pong => Ok(()),
        Verb::Pass | Verb::Cap => Ok(()),
    }
}
