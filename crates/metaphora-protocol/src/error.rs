//! Error types for the protocol layer.

/// Errors raised while turning events into bytes and back.
///
/// Each Metaphora crate owns its error enum, so a `ProtocolError` always
/// means "the frame could not be (de)serialized", never a game rule or a
/// network failure.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serializing an outbound event failed.
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// An inbound frame was not valid JSON or did not match any action.
    ///
    /// Common causes: unknown `event` name, a payload with the wrong
    /// shape, or a truncated frame.
    #[cfg(feature = "json")]
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// The frame parsed but breaks a protocol rule.
    #[error("invalid message: {0}")]
    InvalidMessage(String),
}
