//! Integration tests for the channel registry: membership, ephemeral
//! cleanup, topic permissions and visibility.

use std::sync::Arc;

use chatgate_channel::{
    default_channels, ChannelConfig, ChannelError, ChannelRegistry, JoinOutcome, MatchId,
    MatchLobby, MemoryLobby, PartOutcome, SharedChannels,
};
use chatgate_protocol::PlayerId;
use chatgate_session::{Player, Privileges};

fn player(id: u64, name: &str) -> Arc<Player> {
    Arc::new(Player::new(PlayerId(id), name, Privileges::DEFAULT_PLAYER))
}

fn staff(id: u64, name: &str) -> Arc<Player> {
    Arc::new(Player::new(
        PlayerId(id),
        name,
        Privileges::DEFAULT_PLAYER | Privileges::MODERATOR,
    ))
}

fn registry() -> ChannelRegistry {
    ChannelRegistry::from_configs(default_channels())
}

// =========================================================================
// Join
// =========================================================================

#[test]
fn test_join_twice_membership_grows_by_one() {
    let mut reg = registry();
    let alice = player(1, "alice");

    assert_eq!(reg.join(&alice, "#osu").unwrap(), JoinOutcome::Joined);
    assert_eq!(reg.join(&alice, "#osu").unwrap(), JoinOutcome::AlreadyMember);
    assert_eq!(reg.get("#osu").unwrap().member_count(), 1);
}

#[test]
fn test_join_unknown_channel_returns_not_found() {
    let mut reg = registry();
    let err = reg.join(&player(1, "alice"), "#nowhere").unwrap_err();
    assert!(matches!(err, ChannelError::NotFound(name) if name == "#nowhere"));
}

#[test]
fn test_join_unreadable_channel_looks_like_unknown() {
    let mut reg = registry();
    let err = reg.join(&player(1, "alice"), "#staff").unwrap_err();
    assert!(matches!(err, ChannelError::NotFound(_)));
    assert!(reg.join(&staff(2, "mod"), "#staff").is_ok());
}

// =========================================================================
// Part
// =========================================================================

#[test]
fn test_part_last_member_of_ephemeral_channel_removes_it() {
    let mut reg = registry();
    let alice = player(1, "alice");
    reg.ensure_lobby_channel(MatchId(5), alice.id());
    reg.join(&alice, "#multi_5").unwrap();

    assert_eq!(
        reg.part(alice.id(), "#multi_5").unwrap(),
        PartOutcome::LeftAndRemoved
    );
    assert!(reg.get("#multi_5").is_none());
}

#[test]
fn test_part_with_members_remaining_keeps_ephemeral_channel() {
    let mut reg = registry();
    let alice = player(1, "alice");
    let bob = player(2, "bob");
    reg.ensure_lobby_channel(MatchId(5), alice.id());
    reg.join(&alice, "#multi_5").unwrap();
    reg.join(&bob, "#multi_5").unwrap();

    assert_eq!(reg.part(alice.id(), "#multi_5").unwrap(), PartOutcome::Left);
    let ch = reg.get("#multi_5").expect("still registered");
    assert_eq!(ch.member_names(), vec!["bob"]);
}

#[test]
fn test_part_last_member_of_static_channel_keeps_it() {
    let mut reg = registry();
    let alice = player(1, "alice");
    reg.join(&alice, "#lobby").unwrap();
    assert_eq!(reg.part(alice.id(), "#lobby").unwrap(), PartOutcome::Left);
    assert!(reg.get("#lobby").is_some());
}

#[test]
fn test_part_non_member_returns_not_member() {
    let mut reg = registry();
    let err = reg.part(PlayerId(9), "#osu").unwrap_err();
    assert!(matches!(err, ChannelError::NotMember(PlayerId(9), _)));
}

// =========================================================================
// Topic / send
// =========================================================================

#[test]
fn test_set_topic_by_non_moderator_leaves_topic_unchanged() {
    let mut reg = registry();
    let err = reg.set_topic(PlayerId(1), "#osu", "hijacked").unwrap_err();
    assert!(matches!(err, ChannelError::NotModerator(..)));
    assert_eq!(reg.get("#osu").unwrap().topic(), "General discussion.");
}

#[test]
fn test_set_topic_by_moderator_updates_topic() {
    let mut reg = ChannelRegistry::from_configs([
        ChannelConfig::new("#mods", "old").moderator(PlayerId(1))
    ]);
    let ch = reg.set_topic(PlayerId(1), "#MODS", "new").unwrap();
    assert_eq!(ch.topic(), "new");
}

#[test]
fn test_check_can_send_requires_membership() {
    let mut reg = registry();
    let alice = player(1, "alice");
    assert!(matches!(
        reg.check_can_send(alice.id(), "#osu"),
        Err(ChannelError::CannotSend(..))
    ));
    reg.join(&alice, "#osu").unwrap();
    assert!(reg.check_can_send(alice.id(), "#osu").is_ok());
}

// =========================================================================
// Lobby + shared registry
// =========================================================================

#[test]
fn test_lobby_channel_for_current_match() {
    let lobby = MemoryLobby::new();
    let mut reg = registry();
    let alice = player(1, "alice");
    lobby.assign(alice.id(), MatchId(42));

    let match_id = lobby.current_match(alice.id()).expect("in a match");
    let name = reg.ensure_lobby_channel(match_id, alice.id()).name().to_string();
    reg.join(&alice, &name).unwrap();

    assert_eq!(lobby.current_match_channel_name(alice.id()), Some(name.clone()));
    assert!(reg.is_member(alice.id(), &name));
}

#[test]
fn test_shared_channels_concurrent_joins_are_serialized() {
    let shared = SharedChannels::new(registry());
    let handles: Vec<_> = (0..8)
        .map(|i| {
            let shared = shared.clone();
            std::thread::spawn(move || {
                let p = player(i, &format!("p{i}"));
                shared.with(|reg| reg.join(&p, "#osu").map(|_| ()))
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap().unwrap();
    }
    assert_eq!(shared.with(|reg| reg.get("#osu").unwrap().member_count()), 8);
}
