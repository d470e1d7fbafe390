//! Core vocabulary shared by every layer: identifiers, phases, roles,
//! error codes, and message recipients.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// Declares a string newtype identifier.
///
/// All of these travel as plain JSON strings (`#[serde(transparent)]`), but
/// stay distinct types in Rust so a `CardId` can never be passed where a
/// `PlayerId` is expected.
macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            /// Wraps an existing identifier.
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Mints a fresh random (UUID v4) identifier.
            pub fn generate() -> Self {
                Self(Uuid::new_v4().to_string())
            }

            /// Borrows the raw identifier.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_owned())
            }
        }
    };
}

string_id!(
    /// Durable player identity. Supplied by the client (or minted on first
    /// join) and kept across reconnects, unlike [`ConnectionId`].
    PlayerId
);

string_id!(
    /// A room name chosen by whoever joins first.
    RoomId
);

string_id!(
    /// A dealt card. Fresh for every deal.
    CardId
);

string_id!(
    /// A theme from the static catalogue, or a host-supplied custom theme.
    ThemeId
);

/// Transient identifier of one live connection.
///
/// Assigned by the transport when a socket is accepted. A player who drops
/// and comes back gets a new `ConnectionId` but keeps their [`PlayerId`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Creates a `ConnectionId` from a raw `u64`.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the underlying `u64` value.
    pub fn into_inner(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Game vocabulary
// ---------------------------------------------------------------------------

/// The state-machine state of a room.
///
/// ```text
/// LOBBY → THEME_SELECTION → PLAYING ─────────────────────┐
///   │                                                    ├→ RESULT_REVEAL → RESULT_VOTING | ENDED
///   └──→ PLAYING_EXPRESSION → PLAYING_SUBMISSION ────────┘
/// ENDED → LOBBY (host reset)
/// ```
///
/// `THEME_SELECTION`/`PLAYING` belong to the cooperative rules and
/// `PLAYING_EXPRESSION`/`PLAYING_SUBMISSION` to the strict rules. A room
/// only ever visits one pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Phase {
    #[default]
    Lobby,
    ThemeSelection,
    Playing,
    PlayingExpression,
    PlayingSubmission,
    ResultReveal,
    ResultVoting,
    Ended,
}

impl Phase {
    /// Returns `true` if a new game may be started from this phase.
    pub fn accepts_start(self) -> bool {
        matches!(self, Self::Lobby | Self::Ended)
    }

    /// Returns `true` if every card number is public in this phase.
    pub fn reveals_numbers(self) -> bool {
        matches!(self, Self::ResultReveal | Self::Ended)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Lobby => "LOBBY",
            Self::ThemeSelection => "THEME_SELECTION",
            Self::Playing => "PLAYING",
            Self::PlayingExpression => "PLAYING_EXPRESSION",
            Self::PlayingSubmission => "PLAYING_SUBMISSION",
            Self::ResultReveal => "RESULT_REVEAL",
            Self::ResultVoting => "RESULT_VOTING",
            Self::Ended => "ENDED",
        };
        f.write_str(name)
    }
}

/// Whether a participant holds cards or only watches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Player,
    Spectator,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConnectionStatus {
    Online,
    Offline,
}

/// A ballot cast after a failed round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VoteChoice {
    /// Retry with the same hand size.
    Continue,
    /// Retry with one card fewer per player.
    Reduce,
}

/// Which rule variant a room plays under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RulesetKind {
    /// Free placement, theme selection, pausable game clock.
    #[default]
    Cooperative,
    /// Timed expression then submission phases, owner-only moves.
    Strict,
}

impl fmt::Display for RulesetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cooperative => f.write_str("COOPERATIVE"),
            Self::Strict => f.write_str("STRICT"),
        }
    }
}

/// Error codes reported to the initiating connection.
///
/// These are string enums on the wire (`"FORBIDDEN"`), never process exit
/// codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Caller is not the host.
    Forbidden,
    /// Action is not valid in the current phase.
    InvalidPhase,
    /// The deal would need more than the 100 cards in the deck.
    ConfigError,
    /// Caller still holds cards that are not on the table.
    CardsInHand,
    /// Another player already uses the requested color.
    ColorTaken,
    /// Required fields were missing or malformed.
    InvalidInput,
    /// No spectator slots left.
    RoomFull,
}

// ---------------------------------------------------------------------------
// Recipient — who should receive an event?
// ---------------------------------------------------------------------------

/// Audience of one outbound event.
///
/// The game state machine only knows players; the room actor resolves
/// `Player` to that player's current connection at delivery time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recipient {
    /// Every connection that joined the room, spectators included.
    Room,
    /// One player's current connection.
    Player(PlayerId),
    /// One specific connection, whether or not it resolved to a player.
    Connection(ConnectionId),
}
