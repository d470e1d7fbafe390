//! Integration tests for room actors and the room manager.

use std::time::Duration;

use metaphora_protocol::{
    ClientAction, ConnectionId, ConnectionStatus, ErrorCode, JoinRequest, Phase, PlayerId, RoomId,
    RulesetKind, ServerEvent, ThemeChoice,
};
use metaphora_room::{RoomConfig, RoomError, RoomManager, close_idle};
use tokio::sync::mpsc;

// =========================================================================
// Helpers
// =========================================================================

type Inbox = mpsc::UnboundedReceiver<ServerEvent>;

fn manager(ruleset: RulesetKind) -> RoomManager {
    RoomManager::new(RoomConfig {
        ruleset,
        seed: Some(7),
        ..RoomConfig::default()
    })
}

fn conn(id: u64) -> ConnectionId {
    ConnectionId::new(id)
}

fn request(room: &str, name: &str) -> JoinRequest {
    JoinRequest {
        room_id: room.into(),
        name: name.into(),
        user_id: Some(PlayerId::new(name)),
    }
}

/// Joins `name` to `room` on `id` and returns the connection's inbox.
async fn join(mgr: &mut RoomManager, id: u64, room: &str, name: &str) -> Inbox {
    let (tx, rx) = mpsc::unbounded_channel();
    mgr.join(conn(id), request(room, name), tx).await.unwrap();
    rx
}

/// Routes an action and waits until the room has processed it.
async fn act(mgr: &RoomManager, id: u64, action: ClientAction) {
    let handle = mgr.route(conn(id)).unwrap();
    handle.send_action(conn(id), action).await.unwrap();
    handle.info().await.unwrap();
}

fn drain(rx: &mut Inbox) -> Vec<ServerEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

async fn phase(mgr: &RoomManager, room: &str) -> Phase {
    mgr.room_info(&RoomId::new(room)).await.unwrap().phase
}

// =========================================================================
// Joining
// =========================================================================

#[tokio::test]
async fn test_join_creates_room_and_syncs_joiner() {
    let mut mgr = manager(RulesetKind::Cooperative);
    let mut rx = join(&mut mgr, 1, "den", "host").await;

    assert_eq!(mgr.room_count(), 1);
    assert_eq!(mgr.room_of(conn(1)), Some(&RoomId::new("den")));

    let events = drain(&mut rx);
    let ServerEvent::RoomSync(sync) = &events[0] else {
        panic!("expected room:sync first, got {events:?}");
    };
    assert_eq!(sync.user_id, PlayerId::new("host"));
    assert_eq!(sync.public_state.host_id, PlayerId::new("host"));
    assert_eq!(sync.public_state.phase, Phase::Lobby);
    assert!(matches!(&events[1], ServerEvent::PlayerUpdate(players) if players.len() == 1));
}

#[tokio::test]
async fn test_join_generates_missing_user_id() {
    let mut mgr = manager(RulesetKind::Cooperative);
    let (tx, _rx) = mpsc::unbounded_channel();
    let req = JoinRequest {
        room_id: "den".into(),
        name: "Aki".into(),
        user_id: None,
    };

    let (room, player) = mgr.join(conn(1), req, tx).await.unwrap();

    assert_eq!(room, RoomId::new("den"));
    assert!(!player.as_str().is_empty());
}

#[tokio::test]
async fn test_invalid_join_creates_nothing() {
    let mut mgr = manager(RulesetKind::Cooperative);
    let (tx, _rx) = mpsc::unbounded_channel();

    let err = mgr.join(conn(1), request("den", " "), tx).await.unwrap_err();

    assert_eq!(err.code(), Some(ErrorCode::InvalidInput));
    assert_eq!(mgr.room_count(), 0);
    assert!(mgr.room_of(conn(1)).is_none());
}

#[tokio::test]
async fn test_second_player_is_announced() {
    let mut mgr = manager(RulesetKind::Cooperative);
    let mut host = join(&mut mgr, 1, "den", "host").await;
    drain(&mut host);

    let _guest = join(&mut mgr, 2, "den", "guest").await;

    let events = drain(&mut host);
    assert!(matches!(&events[..], [ServerEvent::PlayerUpdate(players)] if players.len() == 2));
    assert_eq!(mgr.room_count(), 1);
}

#[tokio::test]
async fn test_spectator_overflow_is_room_full() {
    let mut mgr = manager(RulesetKind::Cooperative);
    let _host = join(&mut mgr, 1, "den", "host").await;
    act(
        &mgr,
        1,
        ClientAction::UpdateSettings(metaphora_protocol::SettingsPatch {
            max_spectators: Some(0),
            ..Default::default()
        }),
    )
    .await;
    act(&mgr, 1, ClientAction::StartGame).await;

    let (tx, _rx) = mpsc::unbounded_channel();
    let err = mgr.join(conn(2), request("den", "late"), tx).await.unwrap_err();

    assert_eq!(err.code(), Some(ErrorCode::RoomFull));
    assert!(mgr.room_of(conn(2)).is_none());
}

// =========================================================================
// Routing and delivery
// =========================================================================

#[tokio::test]
async fn test_route_unknown_connection() {
    let mgr = manager(RulesetKind::Cooperative);
    let err = mgr.route(conn(9)).unwrap_err();
    assert!(matches!(err, RoomError::NotInRoom(_)));
    assert_eq!(err.code(), None);
}

#[tokio::test]
async fn test_rejection_goes_only_to_the_caller() {
    let mut mgr = manager(RulesetKind::Cooperative);
    let mut host = join(&mut mgr, 1, "den", "host").await;
    let mut guest = join(&mut mgr, 2, "den", "guest").await;
    drain(&mut host);
    drain(&mut guest);

    act(&mgr, 2, ClientAction::StartGame).await;

    let events = drain(&mut guest);
    assert!(matches!(&events[..], [ServerEvent::Error(e)] if e.code == ErrorCode::Forbidden));
    assert!(drain(&mut host).is_empty());
}

#[tokio::test]
async fn test_silent_rejection_sends_nothing() {
    let mut mgr = manager(RulesetKind::Cooperative);
    let mut host = join(&mut mgr, 1, "den", "host").await;
    drain(&mut host);

    act(&mgr, 1, ClientAction::SubmitDone).await;

    assert!(drain(&mut host).is_empty());
}

#[tokio::test]
async fn test_hands_are_private() {
    let mut mgr = manager(RulesetKind::Cooperative);
    let mut host = join(&mut mgr, 1, "den", "host").await;
    let mut guest = join(&mut mgr, 2, "den", "guest").await;
    drain(&mut host);
    drain(&mut guest);

    act(&mgr, 1, ClientAction::StartGame).await;

    for (inbox, me) in [(&mut host, "host"), (&mut guest, "guest")] {
        let events = drain(inbox);
        let hands: Vec<_> = events
            .iter()
            .filter_map(|e| match e {
                ServerEvent::HandUpdate(cards) => Some(cards),
                _ => None,
            })
            .collect();
        assert_eq!(hands.len(), 1, "{me} gets exactly one hand");
        assert!(hands[0].iter().all(|c| c.owner_id == PlayerId::new(me) && c.number.is_some()));

        let public = events.iter().find_map(|e| match e {
            ServerEvent::CardsPublicUpdate(cards) => Some(cards),
            _ => None,
        });
        assert!(public.unwrap().iter().all(|c| c.number.is_none()));
    }
}

// =========================================================================
// Presence
// =========================================================================

#[tokio::test]
async fn test_disconnect_marks_offline() {
    let mut mgr = manager(RulesetKind::Cooperative);
    let mut host = join(&mut mgr, 1, "den", "host").await;
    let _guest = join(&mut mgr, 2, "den", "guest").await;
    drain(&mut host);

    mgr.disconnect(conn(2)).await;
    mgr.room_info(&RoomId::new("den")).await.unwrap();

    assert!(mgr.room_of(conn(2)).is_none());
    let events = drain(&mut host);
    let [ServerEvent::PlayerUpdate(players)] = &events[..] else {
        panic!("expected one player:update, got {events:?}");
    };
    let guest = players.iter().find(|p| p.user_id == PlayerId::new("guest")).unwrap();
    assert_eq!(guest.status, ConnectionStatus::Offline);
}

#[tokio::test]
async fn test_reconnect_replaces_old_connection() {
    let mut mgr = manager(RulesetKind::Cooperative);
    let mut old = join(&mut mgr, 1, "den", "host").await;
    drain(&mut old);

    let mut new = join(&mut mgr, 3, "den", "host").await;
    let info = mgr.room_info(&RoomId::new("den")).await.unwrap();
    assert_eq!(info.player_count, 1);
    assert!(matches!(drain(&mut new).first(), Some(ServerEvent::RoomSync(s)) if s.user_id == PlayerId::new("host")));

    act(&mgr, 3, ClientAction::StartGame).await;
    assert!(drain(&mut old).is_empty(), "the retired connection hears nothing");
    assert!(!drain(&mut new).is_empty());
}

#[tokio::test]
async fn test_switching_rooms_leaves_the_old_one() {
    let mut mgr = manager(RulesetKind::Cooperative);
    let _first = join(&mut mgr, 1, "a", "aki").await;
    let _second = join(&mut mgr, 1, "b", "aki").await;

    assert_eq!(mgr.room_of(conn(1)), Some(&RoomId::new("b")));
    let old = mgr.snapshot(&RoomId::new("a"), None).await.unwrap();
    assert_eq!(old.players[0].status, ConnectionStatus::Offline);
    let info = mgr.room_info(&RoomId::new("a")).await.unwrap();
    assert_eq!(info.online_count, 0);
}

// =========================================================================
// Lifecycle
// =========================================================================

#[tokio::test]
async fn test_reap_idle_rooms() {
    let mut mgr = RoomManager::new(RoomConfig {
        idle_room_ttl: Duration::ZERO,
        ..RoomConfig::default()
    });
    let _busy = join(&mut mgr, 1, "busy", "host").await;
    let _quiet = join(&mut mgr, 2, "quiet", "host").await;
    mgr.disconnect(conn(2)).await;

    let reaped = mgr.reap_idle().await;

    assert_eq!(reaped, vec![RoomId::new("quiet")]);
    assert_eq!(mgr.room_ids(), vec![RoomId::new("busy")]);
    assert!(matches!(
        mgr.room_info(&RoomId::new("quiet")).await,
        Err(RoomError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_rejoining_a_reaped_room_recreates_it() {
    let mut mgr = RoomManager::new(RoomConfig {
        idle_room_ttl: Duration::ZERO,
        ..RoomConfig::default()
    });
    let _first = join(&mut mgr, 1, "den", "host").await;
    mgr.disconnect(conn(1)).await;
    mgr.reap_idle().await;

    let mut again = join(&mut mgr, 2, "den", "guest").await;

    let Some(ServerEvent::RoomSync(sync)) = drain(&mut again).into_iter().next() else {
        panic!("expected room:sync");
    };
    assert_eq!(sync.public_state.host_id, PlayerId::new("guest"));
}

#[tokio::test]
async fn test_close_idle_outside_the_manager_then_evict() {
    let mut mgr = RoomManager::new(RoomConfig {
        idle_room_ttl: Duration::ZERO,
        ..RoomConfig::default()
    });
    let _busy = join(&mut mgr, 1, "busy", "host").await;
    let _quiet = join(&mut mgr, 2, "quiet", "host").await;
    mgr.disconnect(conn(2)).await;

    // Only the handles are taken from the manager; rooms answer without it.
    let stopped = close_idle(mgr.handles()).await;
    let stopped_ids: Vec<&RoomId> = stopped.iter().map(|h| h.room_id()).collect();
    assert_eq!(stopped_ids, vec![&RoomId::new("quiet")]);

    assert_eq!(mgr.evict(&stopped), vec![RoomId::new("quiet")]);
    assert!(mgr.evict(&stopped).is_empty());
    assert_eq!(mgr.room_ids(), vec![RoomId::new("busy")]);
    assert!(mgr.route(conn(1)).is_ok());
}

#[tokio::test]
async fn test_join_ahead_of_idle_check_keeps_room() {
    let mut mgr = RoomManager::new(RoomConfig {
        idle_room_ttl: Duration::ZERO,
        ..RoomConfig::default()
    });
    let _first = join(&mut mgr, 1, "den", "host").await;
    mgr.disconnect(conn(1)).await;
    let handles = mgr.handles();

    let _back = join(&mut mgr, 2, "den", "host").await;

    assert!(close_idle(handles).await.is_empty());
    assert_eq!(mgr.room_count(), 1);
    assert_eq!(mgr.room_info(&RoomId::new("den")).await.unwrap().online_count, 1);
}

#[tokio::test]
async fn test_shutdown_all() {
    let mut mgr = manager(RulesetKind::Cooperative);
    let _a = join(&mut mgr, 1, "a", "host").await;
    let _b = join(&mut mgr, 2, "b", "host").await;
    let handle = mgr.route(conn(1)).unwrap();

    mgr.shutdown_all().await;

    assert_eq!(mgr.room_count(), 0);
    assert!(mgr.room_of(conn(1)).is_none());
    assert!(matches!(handle.info().await, Err(RoomError::Unavailable(_))));
}

// =========================================================================
// Deadlines
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_strict_expression_deadline_advances_phase() {
    let mut mgr = manager(RulesetKind::Strict);
    let _host = join(&mut mgr, 1, "den", "host").await;
    let mut guest = join(&mut mgr, 2, "den", "guest").await;
    act(&mgr, 1, ClientAction::StartGame).await;
    assert_eq!(phase(&mgr, "den").await, Phase::PlayingExpression);
    drain(&mut guest);

    tokio::time::sleep(Duration::from_secs(59)).await;
    assert_eq!(phase(&mgr, "den").await, Phase::PlayingExpression);

    tokio::time::sleep(Duration::from_secs(2)).await;
    assert_eq!(phase(&mgr, "den").await, Phase::PlayingSubmission);
    let events = drain(&mut guest);
    assert!(matches!(
        &events[..],
        [ServerEvent::RoomUpdate(patch)] if patch.phase == Some(Phase::PlayingSubmission)
    ));
}

#[tokio::test(start_paused = true)]
async fn test_strict_submission_deadline_ends_game() {
    let mut mgr = manager(RulesetKind::Strict);
    let _host = join(&mut mgr, 1, "den", "host").await;
    act(&mgr, 1, ClientAction::StartGame).await;

    tokio::time::sleep(Duration::from_secs(121)).await;

    assert_eq!(phase(&mgr, "den").await, Phase::Ended);
    let snapshot = mgr.snapshot(&RoomId::new("den"), None).await.unwrap();
    assert_eq!(snapshot.result_message.as_deref(), Some("TIME UP"));
}

#[tokio::test(start_paused = true)]
async fn test_paused_clock_does_not_expire() {
    let mut mgr = manager(RulesetKind::Cooperative);
    let _host = join(&mut mgr, 1, "den", "host").await;
    act(&mgr, 1, ClientAction::StartGame).await;
    let snapshot = mgr.snapshot(&RoomId::new("den"), None).await.unwrap();
    let theme_id = snapshot.theme_candidates[0].id.clone();
    act(
        &mgr,
        1,
        ClientAction::SelectTheme(ThemeChoice {
            theme_id: Some(theme_id),
            custom_theme: None,
        }),
    )
    .await;
    assert_eq!(phase(&mgr, "den").await, Phase::Playing);

    act(&mgr, 1, ClientAction::PauseTimer).await;
    tokio::time::sleep(Duration::from_secs(300)).await;
    assert_eq!(phase(&mgr, "den").await, Phase::Playing);

    act(&mgr, 1, ClientAction::ResumeTimer).await;
    tokio::time::sleep(Duration::from_secs(121)).await;
    assert_eq!(phase(&mgr, "den").await, Phase::Ended);
}
