//! The inbound action catalogue and the outbound event catalogue.
//!
//! Every frame is one JSON object, adjacently tagged:
//!
//! ```text
//! { "event": "game:move_card", "data": { "cardId": "…", "index": 2 } }
//! { "event": "game:start" }
//! ```
//!
//! Actions without a payload omit `data`.

use serde::{Deserialize, Serialize};

use crate::{
    CardId, CardView, ErrorCode, PlayerId, PlayerView, RoomPatch, RoomSnapshot, SettingsPatch,
    ThemeId, VoteChoice,
};

// ---------------------------------------------------------------------------
// Client → server
// ---------------------------------------------------------------------------

/// Everything a client can ask the server to do.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum ClientAction {
    /// Enter (or re-enter) a room. Creates the room if it doesn't exist.
    #[serde(rename = "join")]
    Join(JoinRequest),

    #[serde(rename = "game:start")]
    StartGame,

    #[serde(rename = "game:select_theme")]
    SelectTheme(ThemeChoice),

    #[serde(rename = "game:update_theme_text")]
    UpdateThemeText(ThemeText),

    #[serde(rename = "game:pause_timer")]
    PauseTimer,

    #[serde(rename = "game:resume_timer")]
    ResumeTimer,

    #[serde(rename = "game:submit_metaphor")]
    SubmitMetaphor(ClueSubmission),

    #[serde(rename = "game:move_card")]
    MoveCard(CardMove),

    #[serde(rename = "game:submit_done")]
    SubmitDone,

    #[serde(rename = "vote")]
    Vote(Ballot),

    #[serde(rename = "room:update_settings")]
    UpdateSettings(SettingsPatch),

    #[serde(rename = "player:update_color")]
    UpdateColor(ColorChange),

    #[serde(rename = "admin:reset_lobby")]
    ResetLobby,
}

/// Payload of `join`.
///
/// Missing `roomId`/`name` decode as empty strings so the server can answer
/// with `INVALID_INPUT` instead of dropping the frame.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct JoinRequest {
    pub room_id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<PlayerId>,
}

/// Title and scale anchors, used both for custom themes and live edits.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ThemeText {
    pub title: String,
    pub scale_min: String,
    pub scale_max: String,
}

/// Payload of `game:select_theme`: a candidate id or a custom theme.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ThemeChoice {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub theme_id: Option<ThemeId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_theme: Option<ThemeText>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClueSubmission {
    pub card_id: CardId,
    #[serde(alias = "metaphor")]
    pub text: String,
}

/// Payload of `game:move_card`.
///
/// `index` (alias `order`) is a table rank, or `-1` to take the card back
/// into the owner's hand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardMove {
    pub card_id: CardId,
    #[serde(alias = "order")]
    pub index: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ballot {
    pub choice: VoteChoice,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorChange {
    pub color: String,
}

// ---------------------------------------------------------------------------
// Server → client
// ---------------------------------------------------------------------------

/// Everything the server sends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum ServerEvent {
    /// Unicast on join: full public state plus the joiner's hand.
    #[serde(rename = "room:sync")]
    RoomSync(RoomSync),

    #[serde(rename = "room:update")]
    RoomUpdate(RoomPatch),

    #[serde(rename = "player:update")]
    PlayerUpdate(Vec<PlayerView>),

    /// Table and hands as the room sees them (numbers hidden).
    #[serde(rename = "cards:public_update")]
    CardsPublicUpdate(Vec<CardView>),

    /// Every card with its number.
    #[serde(rename = "cards:reveal")]
    CardsReveal(Vec<CardView>),

    /// Unicast: the recipient's own cards.
    #[serde(rename = "hand:update")]
    HandUpdate(Vec<CardView>),

    #[serde(rename = "error")]
    Error(ErrorEvent),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSync {
    pub public_state: RoomSnapshot,
    pub my_hand: Vec<CardView>,
    pub user_id: PlayerId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorEvent {
    pub code: ErrorCode,
    pub message: String,
}
