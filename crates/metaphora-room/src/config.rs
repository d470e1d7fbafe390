//! Room actor configuration.

use std::time::Duration;

use metaphora_game::DeckPolicy;
use metaphora_protocol::RulesetKind;

/// Default command mailbox size for room actors.
pub const DEFAULT_CHANNEL_SIZE: usize = 64;

/// Settings shared by every room the registry creates.
#[derive(Debug, Clone)]
pub struct RoomConfig {
    /// Rule variant for newly created rooms.
    pub ruleset: RulesetKind,

    /// How the deck is replenished between rounds.
    pub deck_policy: DeckPolicy,

    /// Capacity of each room's command mailbox. Senders wait when full.
    pub channel_size: usize,

    /// A room with nobody online is reaped once it has been quiet this long.
    pub idle_room_ttl: Duration,

    /// How often the server sweeps for idle rooms.
    pub reap_interval: Duration,

    /// Seeds every room's RNG. `None` seeds from the operating system.
    pub seed: Option<u64>,
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            ruleset: RulesetKind::Cooperative,
            deck_policy: DeckPolicy::Recycle,
            channel_size: DEFAULT_CHANNEL_SIZE,
            idle_room_ttl: Duration::from_secs(10 * 60),
            reap_interval: Duration::from_secs(60),
            seed: None,
        }
    }
}
