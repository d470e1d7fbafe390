use std::io;

/// Errors that can occur in the transport layer.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("cannot bind listener: {0}")]
    Bind(#[source] io::Error),

    #[error("accept failed: {0}")]
    Accept(#[source] io::Error),

    /// The TCP connection came in but the WebSocket upgrade did not complete.
    #[error("handshake with {peer} failed: {reason}")]
    Handshake { peer: String, reason: String },

    /// The peer is gone; nothing more can be sent.
    #[error("connection closed")]
    Closed,

    /// A frame could not be written or read.
    #[error("frame i/o failed: {0}")]
    Frame(String),
}
