//! Error types for the game state machine.

use metaphora_protocol::{CardId, ConnectionId, ErrorCode, Phase};

/// Why an action was not applied.
///
/// Variants that map to an [`ErrorCode`] are reported to the caller; the
/// rest are silent rejections that only show up in debug logs.
#[derive(Debug, thiserror::Error)]
pub enum GameError {
    /// Caller is not the host.
    #[error("only the host can {0}")]
    Forbidden(&'static str),

    /// The action is not valid in the current phase.
    #[error("cannot {action} during {phase}")]
    InvalidPhase { action: &'static str, phase: Phase },

    /// Dealing would need more cards than the deck holds.
    #[error("{players} players with {hand} cards each need more than 100 cards")]
    NotEnoughCards { players: usize, hand: u32 },

    /// Caller tried to finish while cards are still in hand.
    #[error("{0} card(s) still in hand")]
    CardsInHand(usize),

    /// Another player already uses the color.
    #[error("color {0} is already taken")]
    ColorTaken(String),

    /// A required field was missing or malformed.
    #[error("invalid input: {0}")]
    InvalidInput(&'static str),

    /// No spectator slots left.
    #[error("room is full ({0} spectators)")]
    RoomFull(u32),

    /// The connection never joined this room.
    #[error("{0} has not joined the room")]
    UnknownConnection(ConnectionId),

    #[error("no card {0} in this round")]
    UnknownCard(CardId),

    /// Stale, out-of-phase, or not-permitted action that is dropped quietly.
    #[error("{action} ignored: {reason}")]
    Ignored {
        action: &'static str,
        reason: &'static str,
    },
}

impl GameError {
    /// The wire code to report, or `None` for silent rejections.
    pub fn code(&self) -> Option<ErrorCode> {
        match self {
            Self::Forbidden(_) => Some(ErrorCode::Forbidden),
            Self::InvalidPhase { .. } => Some(ErrorCode::InvalidPhase),
            Self::NotEnoughCards { .. } => Some(ErrorCode::ConfigError),
            Self::CardsInHand(_) => Some(ErrorCode::CardsInHand),
            Self::ColorTaken(_) => Some(ErrorCode::ColorTaken),
            Self::InvalidInput(_) => Some(ErrorCode::InvalidInput),
            Self::RoomFull(_) => Some(ErrorCode::RoomFull),
            Self::UnknownConnection(_) | Self::UnknownCard(_) | Self::Ignored { .. } => None,
        }
    }

    pub(crate) fn ignored(action: &'static str, reason: &'static str) -> Self {
        Self::Ignored { action, reason }
    }
}
