//! Unified error type for the Metaphora server.

use metaphora_game::GameError;
use metaphora_protocol::{ErrorCode, ProtocolError};
use metaphora_room::RoomError;
use metaphora_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// The `#[from]` attribute on each variant auto-generates `From` impls,
/// so the `?` operator converts sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum MetaphoraError {
    /// A transport-level error (bind, accept, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A frame could not be encoded or decoded.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A room-level error (not joined, room gone, rejected join).
    #[error(transparent)]
    Room(#[from] RoomError),

    /// The game state machine refused a request.
    #[error(transparent)]
    Game(#[from] GameError),

    /// Invalid server configuration.
    #[error("configuration error: {0}")]
    Config(String),
}

impl MetaphoraError {
    /// The wire code to report to the client, or `None` to stay silent.
    pub fn code(&self) -> Option<ErrorCode> {
        match self {
            Self::Room(err) => err.code(),
            Self::Game(err) => err.code(),
            Self::Transport(_) | Self::Protocol(_) | Self::Config(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use metaphora_protocol::{ConnectionId, RoomId};

    use super::*;

    #[test]
    fn test_from_transport_error() {
        let err = TransportError::Closed;
        let metaphora_err: MetaphoraError = err.into();
        assert!(matches!(metaphora_err, MetaphoraError::Transport(_)));
        assert!(metaphora_err.to_string().contains("closed"));
        assert_eq!(metaphora_err.code(), None);
    }

    #[test]
    fn test_from_protocol_error() {
        let err = serde_json::from_str::<u8>("nope").unwrap_err();
        let metaphora_err: MetaphoraError = ProtocolError::Decode(err).into();
        assert!(matches!(metaphora_err, MetaphoraError::Protocol(_)));
    }

    #[test]
    fn test_from_room_error_keeps_code() {
        let err = RoomError::Game(GameError::RoomFull(10));
        let metaphora_err: MetaphoraError = err.into();
        assert!(matches!(metaphora_err, MetaphoraError::Room(_)));
        assert_eq!(metaphora_err.code(), Some(ErrorCode::RoomFull));
    }

    #[test]
    fn test_routing_errors_are_silent() {
        let err: MetaphoraError = RoomError::NotInRoom(ConnectionId::new(1)).into();
        assert_eq!(err.code(), None);
        let err: MetaphoraError = RoomError::Unavailable(RoomId::new("r1")).into();
        assert_eq!(err.code(), None);
    }

    #[test]
    fn test_from_game_error() {
        let err: MetaphoraError = GameError::Forbidden("start the game").into();
        assert_eq!(err.code(), Some(ErrorCode::Forbidden));
        assert_eq!(err.to_string(), "only the host can start the game");
    }
}
