//! # Metaphora
//!
//! Real-time server for Metaphora, a cooperative card game where players
//! hold hidden numbers from 1 to 100, describe them with clues against a
//! shared theme, and try to lay every card out in ascending order.
//!
//! The server is authoritative: browsers send actions over a WebSocket,
//! each room runs as its own actor, and clients only ever see what their
//! audience is allowed to see.
//!
//! ```text
//! WebSocket ─▶ handler ─▶ RoomManager ─▶ room actor (GameRoom + timer)
//!     ▲                                        │
//!     └──────────── writer task ◀── events ────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use metaphora::prelude::*;
//!
//! # async fn start() -> Result<(), MetaphoraError> {
//! let server = MetaphoraServer::builder()
//!     .bind("0.0.0.0:3000")
//!     .ruleset(RulesetKind::Cooperative)
//!     .build()
//!     .await?;
//! server.run().await
//! # }
//! ```

mod config;
mod error;
mod handler;
mod server;

pub use config::{DEFAULT_PORT, ServerConfig};
pub use error::MetaphoraError;
pub use server::{MetaphoraServer, MetaphoraServerBuilder};

/// Everything needed to configure and run a server.
pub mod prelude {
    pub use crate::{MetaphoraError, MetaphoraServer, MetaphoraServerBuilder, ServerConfig};
    pub use metaphora_game::DeckPolicy;
    pub use metaphora_protocol::{
        ClientAction, Codec, ErrorCode, JsonCodec, Phase, PlayerId, RoomId, RulesetKind,
        ServerEvent,
    };
    pub use metaphora_room::RoomConfig;
}
