//! Error types for the room layer.

use metaphora_game::GameError;
use metaphora_protocol::{ConnectionId, ErrorCode, RoomId};

/// Errors that can occur during room operations.
#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    /// The room does not exist.
    #[error("room {0} not found")]
    NotFound(RoomId),

    /// The connection has not joined any room yet.
    #[error("{0} has not joined a room")]
    NotInRoom(ConnectionId),

    /// The room's command channel is closed.
    #[error("room {0} is unavailable")]
    Unavailable(RoomId),

    /// The room's state machine refused the request.
    #[error(transparent)]
    Game(#[from] GameError),
}

impl RoomError {
    /// The wire code to report to the client, if any.
    pub fn code(&self) -> Option<ErrorCode> {
        match self {
            Self::Game(err) => err.code(),
            Self::NotFound(_) | Self::NotInRoom(_) | Self::Unavailable(_) => None,
        }
    }
}
