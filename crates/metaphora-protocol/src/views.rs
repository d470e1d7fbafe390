//! Audience-scoped views of a room.
//!
//! These are the shapes clients render. Nothing here carries a card number
//! unless the projector decided the viewer may see it, so a `CardView`
//! with `number: None` serializes without the field at all.

use serde::{Deserialize, Serialize};

use crate::{CardId, ConnectionStatus, Phase, PlayerId, Role, RoomId, RulesetKind, ThemeId, VoteChoice};

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

/// Per-room rule settings. Host-editable while the room is in the lobby.
///
/// Time limits are in seconds; `time_limit_game == 0` means the game clock
/// never runs out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameSettings {
    pub initial_hand_count: u32,
    pub max_lifes: u32,
    pub win_condition_count: u32,
    pub time_limit_game: u32,
    pub time_limit_expression: u32,
    pub time_limit_submission: u32,
    pub time_limit_voting: u32,
    pub max_spectators: u32,
}

impl Default for GameSettings {
    fn default() -> Self {
        Self {
            initial_hand_count: 1,
            max_lifes: 2,
            win_condition_count: 3,
            time_limit_game: 120,
            time_limit_expression: 60,
            time_limit_submission: 60,
            time_limit_voting: 30,
            max_spectators: 10,
        }
    }
}

/// A partial settings update. Absent fields stay unchanged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SettingsPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub initial_hand_count: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_lifes: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub win_condition_count: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_limit_game: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_limit_expression: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_limit_submission: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_limit_voting: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_spectators: Option<u32>,
}

// ---------------------------------------------------------------------------
// Theme
// ---------------------------------------------------------------------------

/// What the 1–100 scale means this round.
///
/// `editing_user_id` / `lock_expires_at` are reserved for an edit lock and
/// are carried through untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Theme {
    pub id: ThemeId,
    pub category: String,
    pub title: String,
    /// Example for the low end of the scale (1).
    pub scale_min: String,
    /// Example for the high end of the scale (100).
    pub scale_max: String,
    pub editing_user_id: Option<PlayerId>,
    pub lock_expires_at: Option<u64>,
}

impl Theme {
    /// The placeholder a room shows before any theme is chosen.
    pub fn placeholder() -> Self {
        Self {
            id: ThemeId::new("default"),
            category: "Default".into(),
            title: "Waiting for Theme...".into(),
            scale_min: "1".into(),
            scale_max: "100".into(),
            editing_user_id: None,
            lock_expires_at: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Players and cards
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerView {
    pub user_id: PlayerId,
    pub name: String,
    pub color: String,
    pub role: Role,
    pub status: ConnectionStatus,
    pub is_ready: bool,
    pub is_submitted: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vote: Option<VoteChoice>,
}

/// One card as some audience sees it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardView {
    pub id: CardId,
    pub owner_id: PlayerId,
    pub metaphor: String,
    /// `-1` while in the owner's hand, otherwise the table rank.
    pub order: i32,
    pub is_submitted: bool,
    /// Present only for the owner, or once numbers are revealed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number: Option<u8>,
}

// ---------------------------------------------------------------------------
// Room snapshot and deltas
// ---------------------------------------------------------------------------

/// Full public state of a room, as sent on join.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSnapshot {
    pub room_id: RoomId,
    pub host_id: PlayerId,
    pub ruleset: RulesetKind,
    pub phase: Phase,
    /// Unix milliseconds; `0` while unbounded or paused.
    pub phase_end_time: u64,
    pub is_timer_paused: bool,
    pub settings: GameSettings,
    pub current_round: u32,
    pub current_hand_count: u32,
    pub success_count: u32,
    pub current_lifes: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result_message: Option<String>,
    pub result_invalid_card_ids: Vec<CardId>,
    pub theme: Theme,
    pub theme_candidates: Vec<Theme>,
    pub players: Vec<PlayerView>,
    pub cards: Vec<CardView>,
}

/// A partial room update. Only the fields that changed are serialized.
///
/// `result_message` is doubly optional: `Some(None)` clears the message
/// on the client (serialized as `null`), `None` leaves it alone.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RoomPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phase: Option<Phase>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phase_end_time: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_timer_paused: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub settings: Option<GameSettings>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_round: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_hand_count: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub success_count: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_lifes: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result_message: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result_invalid_card_ids: Option<Vec<CardId>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub theme: Option<Theme>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub theme_candidates: Option<Vec<Theme>>,
}
