//! The room aggregate and its single entry point.
//!
//! [`GameRoom`] owns everything about one room: players, the deck, the
//! cards in play, the phase, and the armed phase deadline. It never
//! sleeps and never reads a clock; callers pass `now` in Unix
//! milliseconds, and a room actor arms a real timer from [`GameRoom::timer`]
//! and calls [`GameRoom::on_timer`] when it fires.
//!
//! Every operation returns the events to deliver as `(Recipient, event)`
//! pairs, or a [`GameError`] describing why nothing changed.

mod lobby;
mod round;

use std::collections::HashMap;

use metaphora_protocol::{
    CardId, ClientAction, ConnectionId, ConnectionStatus, GameSettings, JoinRequest, Phase,
    PlayerId, Recipient, Role, RoomId, RoomPatch, RoomSnapshot, RoomSync, RulesetKind,
    ServerEvent, Theme,
};
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use tracing::info;

use crate::deck::{Deck, DeckPolicy};
use crate::model::{Card, PALETTE, Player, cap_text};
use crate::rules::Ruleset;
use crate::{GameError, projector};

/// Events produced by one operation.
pub type Outbound = Vec<(Recipient, ServerEvent)>;

/// Identifies one arming of the phase deadline.
///
/// The epoch increases every time a deadline is armed, so a timer that
/// fires after the room re-armed, paused, or reset no longer matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerToken {
    pub epoch: u64,
    pub phase: Phase,
}

/// The currently armed phase deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArmedTimer {
    pub token: TimerToken,
    /// Unix milliseconds.
    pub deadline_ms: u64,
    /// How far in the future the deadline was when armed.
    pub duration_ms: u64,
}

/// A join request that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Admission {
    pub room_id: RoomId,
    pub name: String,
    /// The client's durable id, or a freshly generated one.
    pub user_id: PlayerId,
}

impl Admission {
    /// Validates a raw `join` payload.
    pub fn from_request(req: JoinRequest) -> Result<Self, GameError> {
        let room_id = req.room_id.trim();
        let name = req.name.trim();
        if room_id.is_empty() || name.is_empty() {
            return Err(GameError::InvalidInput("roomId and name are required"));
        }
        let user_id = req
            .user_id
            .filter(|id| !id.as_str().trim().is_empty())
            .unwrap_or_else(PlayerId::generate);
        Ok(Self {
            room_id: RoomId::new(room_id),
            name: cap_text(name),
            user_id,
        })
    }
}

/// One room's complete state.
#[derive(Debug)]
pub struct GameRoom {
    pub(crate) id: RoomId,
    pub(crate) host: PlayerId,
    pub(crate) rules: Box<dyn Ruleset>,
    deck_policy: DeckPolicy,
    rng: StdRng,

    pub(crate) phase: Phase,
    pub(crate) phase_end_time: u64,
    pub(crate) settings: GameSettings,
    pub(crate) current_round: u32,
    pub(crate) current_hand_count: u32,
    pub(crate) success_count: u32,
    pub(crate) current_lifes: u32,
    pub(crate) result_message: Option<String>,
    pub(crate) result_invalid_card_ids: Vec<CardId>,
    pub(crate) theme: Theme,
    pub(crate) theme_candidates: Vec<Theme>,

    /// Join order.
    pub(crate) players: Vec<Player>,
    connections: HashMap<ConnectionId, PlayerId>,
    deck: Deck,
    pub(crate) cards: Vec<Card>,

    timer_epoch: u64,
    timer: Option<ArmedTimer>,
    pub(crate) paused_remaining_ms: Option<u64>,

    created_at: u64,
    last_activity_at: u64,
}

impl GameRoom {
    /// Creates an empty lobby. `host` becomes host once they join.
    pub fn new(
        id: RoomId,
        host: PlayerId,
        rules: Box<dyn Ruleset>,
        deck_policy: DeckPolicy,
        rng: StdRng,
        now: u64,
    ) -> Self {
        let settings = GameSettings::default();
        Self {
            id,
            host,
            rules,
            deck_policy,
            rng,
            phase: Phase::Lobby,
            phase_end_time: 0,
            settings,
            current_round: 1,
            current_hand_count: settings.initial_hand_count,
            success_count: 0,
            current_lifes: settings.max_lifes,
            result_message: None,
            result_invalid_card_ids: Vec::new(),
            theme: Theme::placeholder(),
            theme_candidates: Vec::new(),
            players: Vec::new(),
            connections: HashMap::new(),
            deck: Deck::default(),
            cards: Vec::new(),
            timer_epoch: 0,
            timer: None,
            paused_remaining_ms: None,
            created_at: now,
            last_activity_at: now,
        }
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    pub fn id(&self) -> &RoomId {
        &self.id
    }

    pub fn host(&self) -> &PlayerId {
        &self.host
    }

    pub fn ruleset(&self) -> RulesetKind {
        self.rules.kind()
    }

    pub fn deck_policy(&self) -> DeckPolicy {
        self.deck_policy
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Unix milliseconds; `0` while unbounded or paused.
    pub fn phase_end_time(&self) -> u64 {
        self.phase_end_time
    }

    pub fn settings(&self) -> &GameSettings {
        &self.settings
    }

    pub fn current_round(&self) -> u32 {
        self.current_round
    }

    pub fn current_hand_count(&self) -> u32 {
        self.current_hand_count
    }

    pub fn success_count(&self) -> u32 {
        self.success_count
    }

    pub fn current_lifes(&self) -> u32 {
        self.current_lifes
    }

    pub fn result_message(&self) -> Option<&str> {
        self.result_message.as_deref()
    }

    pub fn result_invalid_card_ids(&self) -> &[CardId] {
        &self.result_invalid_card_ids
    }

    pub fn theme(&self) -> &Theme {
        &self.theme
    }

    pub fn theme_candidates(&self) -> &[Theme] {
        &self.theme_candidates
    }

    /// All participants in join order.
    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn player(&self, id: &PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| &p.id == id)
    }

    /// The player currently joined through `conn`.
    pub fn player_for(&self, conn: ConnectionId) -> Option<&Player> {
        self.connections.get(&conn).and_then(|id| self.player(id))
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn deck(&self) -> &Deck {
        &self.deck
    }

    /// The deadline a room actor should have armed right now.
    pub fn timer(&self) -> Option<ArmedTimer> {
        self.timer
    }

    pub fn is_timer_paused(&self) -> bool {
        self.paused_remaining_ms.is_some()
    }

    pub fn created_at(&self) -> u64 {
        self.created_at
    }

    pub fn last_activity_at(&self) -> u64 {
        self.last_activity_at
    }

    pub fn online_count(&self) -> usize {
        self.players.iter().filter(|p| p.is_online()).count()
    }

    /// Nobody is online and nothing happened for at least `ttl_ms`.
    pub fn is_idle(&self, now: u64, ttl_ms: u64) -> bool {
        self.online_count() == 0 && now.saturating_sub(self.last_activity_at) >= ttl_ms
    }

    /// Full public state as `viewer` sees it.
    pub fn snapshot(&self, viewer: Option<&PlayerId>) -> RoomSnapshot {
        projector::snapshot(self, viewer)
    }

    // -----------------------------------------------------------------------
    // Presence
    // -----------------------------------------------------------------------

    /// Admits a new player or reconnects a known one on `conn`.
    ///
    /// New players hold cards only if they arrive in the lobby; anyone
    /// later watches as a spectator, up to `maxSpectators`.
    pub fn join(
        &mut self,
        conn: ConnectionId,
        admission: &Admission,
        now: u64,
    ) -> Result<Outbound, GameError> {
        let id = admission.user_id.clone();

        if let Some(index) = self.players.iter().position(|p| p.id == id) {
            self.release_connection(conn, &id, now);
            let player = &mut self.players[index];
            let previous = std::mem::replace(&mut player.connection, conn);
            player.status = ConnectionStatus::Online;
            player.name = admission.name.clone();
            player.last_active_at = now;
            if previous != conn {
                self.connections.remove(&previous);
            }
            info!(room_id = %self.id, player_id = %id, %conn, "player reconnected");
        } else {
            let role = if self.phase == Phase::Lobby {
                Role::Player
            } else {
                Role::Spectator
            };
            if role == Role::Spectator {
                let spectators = self
                    .players
                    .iter()
                    .filter(|p| p.role == Role::Spectator)
                    .count();
                if spectators >= self.settings.max_spectators as usize {
                    return Err(GameError::RoomFull(self.settings.max_spectators));
                }
            }
            self.release_connection(conn, &id, now);
            let color = self.pick_color();
            self.players.push(Player {
                id: id.clone(),
                connection: conn,
                name: admission.name.clone(),
                color,
                role,
                status: ConnectionStatus::Online,
                is_ready: false,
                is_submitted: false,
                vote: None,
                joined_at: now,
                last_active_at: now,
            });
            info!(room_id = %self.id, player_id = %id, %conn, ?role, "player joined");
        }

        self.connections.insert(conn, id.clone());
        self.last_activity_at = now;

        let sync = RoomSync {
            public_state: projector::snapshot(self, Some(&id)),
            my_hand: projector::hand(&self.cards, &id),
            user_id: id,
        };
        Ok(vec![
            (Recipient::Connection(conn), ServerEvent::RoomSync(sync)),
            self.player_update(),
        ])
    }

    /// Takes `conn` away from whichever other player it was bound to.
    fn release_connection(&mut self, conn: ConnectionId, keep: &PlayerId, now: u64) {
        if self.connections.get(&conn).is_none_or(|id| id == keep) {
            return;
        }
        if let Some(id) = self.connections.remove(&conn) {
            if let Some(player) = self.players.iter_mut().find(|p| p.id == id) {
                player.status = ConnectionStatus::Offline;
                player.last_active_at = now;
            }
            info!(room_id = %self.id, player_id = %id, %conn, "connection taken over by another player");
        }
    }

    /// Marks whoever is on `conn` offline. Unknown connections are ignored.
    pub fn disconnect(&mut self, conn: ConnectionId, now: u64) -> Outbound {
        let Some(id) = self.connections.remove(&conn) else {
            return Vec::new();
        };
        if let Some(player) = self.players.iter_mut().find(|p| p.id == id) {
            player.status = ConnectionStatus::Offline;
            player.last_active_at = now;
        }
        self.last_activity_at = now;
        info!(room_id = %self.id, player_id = %id, %conn, "player disconnected");
        vec![self.player_update()]
    }

    /// Applies one client action arriving on `conn`.
    pub fn apply(
        &mut self,
        conn: ConnectionId,
        action: ClientAction,
        now: u64,
    ) -> Result<Outbound, GameError> {
        let by = self
            .connections
            .get(&conn)
            .cloned()
            .ok_or(GameError::UnknownConnection(conn))?;
        self.last_activity_at = now;
        if let Some(player) = self.players.iter_mut().find(|p| p.id == by) {
            player.last_active_at = now;
        }

        match action {
            ClientAction::Join(_) => Err(GameError::ignored("join", "already in this room")),
            ClientAction::StartGame => self.start_game(&by, now),
            ClientAction::SelectTheme(choice) => self.select_theme(&by, choice, now),
            ClientAction::UpdateThemeText(text) => self.update_theme_text(&by, text),
            ClientAction::PauseTimer => self.pause_timer(&by, now),
            ClientAction::ResumeTimer => self.resume_timer(&by, now),
            ClientAction::SubmitMetaphor(clue) => self.submit_clue(&by, clue),
            ClientAction::MoveCard(mv) => self.move_card(&by, mv),
            ClientAction::SubmitDone => self.submit_done(&by, now),
            ClientAction::Vote(ballot) => self.vote(&by, ballot.choice, now),
            ClientAction::UpdateSettings(patch) => self.update_settings(&by, patch),
            ClientAction::UpdateColor(change) => self.update_color(&by, &change.color),
            ClientAction::ResetLobby => self.reset_lobby(&by),
        }
    }

    // -----------------------------------------------------------------------
    // Shared helpers
    // -----------------------------------------------------------------------

    fn require_host(&self, by: &PlayerId, action: &'static str) -> Result<(), GameError> {
        if by == &self.host {
            Ok(())
        } else {
            Err(GameError::Forbidden(action))
        }
    }

    fn player_index(&self, by: &PlayerId, action: &'static str) -> Result<usize, GameError> {
        self.players
            .iter()
            .position(|p| &p.id == by)
            .ok_or(GameError::ignored(action, "not in this room"))
    }

    fn active_count(&self) -> usize {
        self.players.iter().filter(|p| p.is_active()).count()
    }

    /// A palette color, preferring ones no active player uses yet.
    fn pick_color(&mut self) -> String {
        let free: Vec<&'static str> = PALETTE
            .iter()
            .copied()
            .filter(|c| !self.players.iter().any(|p| p.is_active() && p.color == *c))
            .collect();
        let pool: &[&str] = if free.is_empty() { &PALETTE } else { &free };
        pool.choose(&mut self.rng).copied().unwrap_or(PALETTE[0]).to_owned()
    }

    /// Enters `phase` and arms (or clears) its deadline.
    fn enter_phase(&mut self, phase: Phase, now: u64) {
        self.phase = phase;
        self.paused_remaining_ms = None;
        match self.rules.phase_limit(phase, &self.settings) {
            Some(secs) => self.arm(u64::from(secs) * 1000, now),
            None => self.disarm(),
        }
    }

    fn arm(&mut self, duration_ms: u64, now: u64) {
        self.timer_epoch += 1;
        let deadline_ms = now + duration_ms;
        self.timer = Some(ArmedTimer {
            token: TimerToken {
                epoch: self.timer_epoch,
                phase: self.phase,
            },
            deadline_ms,
            duration_ms,
        });
        self.phase_end_time = deadline_ms;
    }

    fn disarm(&mut self) {
        self.timer = None;
        self.phase_end_time = 0;
    }

    // -----------------------------------------------------------------------
    // Event builders
    // -----------------------------------------------------------------------

    fn player_update(&self) -> (Recipient, ServerEvent) {
        (
            Recipient::Room,
            ServerEvent::PlayerUpdate(projector::player_views(&self.players)),
        )
    }

    fn cards_update(&self) -> (Recipient, ServerEvent) {
        (
            Recipient::Room,
            ServerEvent::CardsPublicUpdate(projector::public_cards(&self.cards, self.phase, None)),
        )
    }

    fn hand_update(&self, owner: &PlayerId) -> (Recipient, ServerEvent) {
        (
            Recipient::Player(owner.clone()),
            ServerEvent::HandUpdate(projector::hand(&self.cards, owner)),
        )
    }

    fn room_update(patch: RoomPatch) -> (Recipient, ServerEvent) {
        (Recipient::Room, ServerEvent::RoomUpdate(patch))
    }

    /// Phase, deadline, and pause flag as they are now.
    fn phase_patch(&self) -> RoomPatch {
        RoomPatch {
            phase: Some(self.phase),
            phase_end_time: Some(self.phase_end_time),
            is_timer_paused: Some(self.is_timer_paused()),
            ..RoomPatch::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;

    use super::*;
    use crate::rules::for_kind;

    fn room() -> GameRoom {
        GameRoom::new(
            RoomId::new("r1"),
            PlayerId::new("host"),
            for_kind(RulesetKind::Cooperative),
            DeckPolicy::Recycle,
            StdRng::seed_from_u64(7),
            1_000,
        )
    }

    fn admit(name: &str) -> Admission {
        Admission {
            room_id: RoomId::new("r1"),
            name: name.into(),
            user_id: PlayerId::new(name),
        }
    }

    #[test]
    fn test_admission_requires_room_and_name() {
        let err = Admission::from_request(JoinRequest {
            room_id: "r1".into(),
            name: "  ".into(),
            user_id: None,
        })
        .unwrap_err();
        assert_eq!(err.code(), Some(metaphora_protocol::ErrorCode::InvalidInput));
    }

    #[test]
    fn test_admission_generates_missing_user_id() {
        let a = Admission::from_request(JoinRequest {
            room_id: "r1".into(),
            name: "Aki".into(),
            user_id: None,
        })
        .unwrap();
        assert!(!a.user_id.as_str().is_empty());
    }

    #[test]
    fn test_join_sends_sync_then_player_list() {
        let mut room = room();
        let out = room.join(ConnectionId::new(1), &admit("host"), 1_000).unwrap();
        assert!(matches!(
            &out[0],
            (Recipient::Connection(c), ServerEvent::RoomSync(sync)) if *c == ConnectionId::new(1) && sync.user_id == PlayerId::new("host")
        ));
        assert!(matches!(&out[1], (Recipient::Room, ServerEvent::PlayerUpdate(list)) if list.len() == 1));
    }

    #[test]
    fn test_reconnect_replaces_connection_without_duplicating() {
        let mut room = room();
        room.join(ConnectionId::new(1), &admit("host"), 1_000).unwrap();
        room.disconnect(ConnectionId::new(1), 2_000);
        assert_eq!(room.online_count(), 0);

        room.join(ConnectionId::new(2), &admit("host"), 3_000).unwrap();
        assert_eq!(room.players().len(), 1);
        assert_eq!(room.online_count(), 1);
        assert!(room.player_for(ConnectionId::new(1)).is_none());
        assert_eq!(room.player_for(ConnectionId::new(2)).unwrap().id, PlayerId::new("host"));
    }

    #[test]
    fn test_join_as_other_user_takes_connection_from_previous_player() {
        let mut room = room();
        room.join(ConnectionId::new(1), &admit("host"), 1_000).unwrap();
        room.join(ConnectionId::new(2), &admit("alice"), 1_000).unwrap();
        room.join(ConnectionId::new(2), &admit("bob"), 2_000).unwrap();

        let alice = room.player(&PlayerId::new("alice")).unwrap();
        assert_eq!(alice.status, ConnectionStatus::Offline);
        assert_eq!(room.online_count(), 2);
        assert_eq!(room.player_for(ConnectionId::new(2)).unwrap().id, PlayerId::new("bob"));

        room.disconnect(ConnectionId::new(1), 3_000);
        room.disconnect(ConnectionId::new(2), 3_000);
        assert_eq!(room.online_count(), 0);
        assert!(room.is_idle(3_010, 10));
    }

    #[test]
    fn test_rejected_spectator_keeps_current_player_online() {
        let mut room = room();
        room.join(ConnectionId::new(1), &admit("host"), 1_000).unwrap();
        room.join(ConnectionId::new(2), &admit("alice"), 1_000).unwrap();
        room.settings.max_spectators = 0;
        room.phase = Phase::Playing;

        let err = room.join(ConnectionId::new(2), &admit("bob"), 2_000).unwrap_err();
        assert!(matches!(err, GameError::RoomFull(0)));
        let alice = room.player(&PlayerId::new("alice")).unwrap();
        assert_eq!(alice.status, ConnectionStatus::Online);
        assert_eq!(room.player_for(ConnectionId::new(2)).unwrap().id, PlayerId::new("alice"));
    }

    #[test]
    fn test_new_players_prefer_unused_colors() {
        let mut room = room();
        for (i, name) in ["a", "b", "c", "d", "e", "f", "g", "h"].iter().enumerate() {
            room.join(ConnectionId::new(i as u64), &admit(name), 1_000).unwrap();
        }
        let mut colors: Vec<&str> = room.players().iter().map(|p| p.color.as_str()).collect();
        colors.sort_unstable();
        colors.dedup();
        assert_eq!(colors.len(), PALETTE.len());
    }

    #[test]
    fn test_unknown_connection_is_silent() {
        let mut room = room();
        let err = room.apply(ConnectionId::new(9), ClientAction::StartGame, 1_000).unwrap_err();
        assert!(matches!(err, GameError::UnknownConnection(_)));
        assert_eq!(err.code(), None);
    }

    #[test]
    fn test_idle_after_ttl_with_nobody_online() {
        let mut room = room();
        room.join(ConnectionId::new(1), &admit("host"), 1_000).unwrap();
        assert!(!room.is_idle(1_000_000, 10));
        room.disconnect(ConnectionId::new(1), 2_000);
        assert!(!room.is_idle(2_005, 10));
        assert!(room.is_idle(2_010, 10));
    }
}
