//! Wire protocol for Metaphora.
//!
//! This crate defines the "language" that browser clients and the server
//! speak:
//!
//! - **Types** ([`PlayerId`], [`Phase`], [`ErrorCode`], [`Recipient`], …) —
//!   the shared vocabulary.
//! - **Messages** ([`ClientAction`], [`ServerEvent`]) — the inbound action
//!   catalogue and the outbound event catalogue.
//! - **Views** ([`RoomSnapshot`], [`CardView`], …) — audience-scoped shapes
//!   of a room. Which numbers end up in them is the game crate's call.
//! - **Codec** ([`Codec`], [`JsonCodec`]) — frames to values and back.
//!
//! ```text
//! Transport (bytes) → Protocol (ClientAction / ServerEvent) → Room actors
//! ```

mod codec;
mod error;
mod messages;
mod types;
mod views;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use messages::{
    Ballot, CardMove, ClientAction, ClueSubmission, ColorChange, ErrorEvent, JoinRequest,
    RoomSync, ServerEvent, ThemeChoice, ThemeText,
};
pub use types::{
    CardId, ConnectionId, ConnectionStatus, ErrorCode, Phase, PlayerId, Recipient, Role, RoomId,
    RulesetKind, ThemeId, VoteChoice,
};
pub use views::{
    CardView, GameSettings, PlayerView, RoomPatch, RoomSnapshot, SettingsPatch, Theme,
};
