//! Codec trait and implementations for serializing/deserializing events.
//!
//! The server never calls `serde_json` directly. It goes through a
//! [`Codec`], so the frame format can change without touching the
//! connection handler or the room actors.

use serde::{Serialize, de::DeserializeOwned};

use crate::ProtocolError;

/// Encodes outbound events to bytes and decodes inbound frames.
///
/// `Send + Sync + 'static` because one codec value is shared by every
/// connection task for the lifetime of the server.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into a frame.
    ///
    /// # Errors
    /// Returns `ProtocolError::Encode` if the value cannot be represented.
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes a frame.
    ///
    /// # Errors
    /// Returns `ProtocolError::Decode` if the bytes are malformed or do
    /// not match `T`.
    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError>;
}

/// A [`Codec`] that speaks JSON, one object per frame.
///
/// This is what browser clients send: `{"event": "...", "data": {...}}`.
///
/// ```rust
/// use metaphora_protocol::{ClientAction, Codec, JsonCodec};
///
/// let codec = JsonCodec;
/// let action: ClientAction = codec.decode(br#"{"event":"game:start"}"#).unwrap();
/// assert_eq!(action, ClientAction::StartGame);
///
/// let bytes = codec.encode(&action).unwrap();
/// let back: ClientAction = codec.decode(&bytes).unwrap();
/// assert_eq!(back, action);
/// ```
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}
