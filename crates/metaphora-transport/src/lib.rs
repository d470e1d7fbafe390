//! Socket layer for Metaphora.
//!
//! The server's accept loop is written against [`Transport`] and its
//! per-connection handler against [`Connection`]. Frames are opaque bytes
//! here; decoding them into game actions is the protocol crate's job.
//!
//! A connection is shared by two tasks (the handler reading actions and
//! a writer forwarding room events), so every method takes `&self` and a
//! `send` must not wait behind a parked `recv`.
//!
//! # Feature Flags
//!
//! - `websocket` (default): [`WebSocketTransport`] via `tokio-tungstenite`

#![allow(async_fn_in_trait)]

use std::net::SocketAddr;

mod error;
#[cfg(feature = "websocket")]
mod websocket;

pub use error::TransportError;
pub use metaphora_protocol::ConnectionId;
#[cfg(feature = "websocket")]
pub use websocket::{WebSocketConnection, WebSocketTransport};

/// A bound listener handing out connections.
///
/// Dropping the transport stops the listener.
pub trait Transport: Send + Sync + 'static {
    type Connection: Connection;
    type Error: std::error::Error + Send + Sync;

    /// Waits for the next client and completes its handshake.
    async fn accept(&mut self) -> Result<Self::Connection, Self::Error>;

    /// The address actually bound. Useful after binding port `0`.
    fn local_addr(&self) -> Result<SocketAddr, Self::Error>;
}

/// One client connection carrying whole frames in both directions.
pub trait Connection: Send + Sync + 'static {
    type Error: std::error::Error + Send + Sync;

    async fn send(&self, frame: &[u8]) -> Result<(), Self::Error>;

    /// Next frame from the client, or `Ok(None)` once it has closed.
    async fn recv(&self) -> Result<Option<Vec<u8>>, Self::Error>;

    async fn close(&self) -> Result<(), Self::Error>;

    /// Server-assigned id, unique for the life of the process.
    fn id(&self) -> ConnectionId;

    fn peer_addr(&self) -> SocketAddr;
}
