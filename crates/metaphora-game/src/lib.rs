//! The Metaphora room state machine.
//!
//! Players each hold hidden numbers from 1 to 100 and, without saying the
//! numbers, describe them with clues measured against a shared theme
//! ("how scary is this?"). Together they lay the cards out in ascending
//! order. A correct table earns a success and a bigger hand next round;
//! a wrong one costs a life and puts the next hand size to a vote.
//!
//! This crate is the pure core: no I/O, no clock, no tasks. A
//! [`GameRoom`] takes an action plus the current time and answers with
//! the events to deliver. Randomness comes from the room's own
//! [`StdRng`](rand::rngs::StdRng), so a seeded room is fully
//! deterministic.
//!
//! # Modules
//!
//! - [`room`] — the aggregate and every operation on it
//! - [`rules`] — the cooperative and strict rule variants
//! - [`projector`] — what each audience is allowed to see
//! - [`deck`], [`themes`], [`settings`], [`evaluate`] — supporting pieces

mod error;
pub mod deck;
pub mod evaluate;
pub mod model;
pub mod projector;
pub mod room;
pub mod rules;
pub mod settings;
pub mod themes;

pub use deck::{Deck, DeckPolicy};
pub use error::GameError;
pub use evaluate::{EXTRA_CLEAR, GAME_CLEAR, GAME_OVER, NOT_ENOUGH_CARDS, TIME_UP};
pub use model::{Card, Player};
pub use room::{Admission, ArmedTimer, GameRoom, Outbound, TimerToken};
pub use rules::{CooperativeRules, Ruleset, StrictRules, Timeout};
