//! Room actors and the room registry for Metaphora.
//!
//! Each room runs as an isolated Tokio task (actor model) that owns its
//! [`GameRoom`](metaphora_game::GameRoom) and its phase deadline timer.
//! Inbound actions and timer firings are processed one at a time, so
//! every room sees a total order of events without any locking.
//!
//! # Key types
//!
//! - [`RoomManager`] — creates rooms on first join, routes connections,
//!   reaps idle rooms
//! - [`RoomHandle`] — send commands to a running room actor
//! - [`RoomConfig`] — ruleset, deck policy, mailbox size, idle TTL

mod config;
mod error;
mod manager;
mod room;

pub use config::{DEFAULT_CHANNEL_SIZE, RoomConfig};
pub use error::RoomError;
pub use manager::{RoomManager, close_idle};
pub use room::{PlayerSender, RoomHandle, RoomInfo};
