//! Server configuration.

use metaphora_game::DeckPolicy;
use metaphora_protocol::RulesetKind;
use metaphora_room::RoomConfig;

use crate::MetaphoraError;

/// Port used when `PORT` is not set.
pub const DEFAULT_PORT: u16 = 3000;

/// Everything needed to start a server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address the WebSocket listener binds to, e.g. `0.0.0.0:3000`.
    pub bind_addr: String,

    /// Settings applied to every room.
    pub room: RoomConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: format!("127.0.0.1:{DEFAULT_PORT}"),
            room: RoomConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Reads the process environment:
    ///
    /// | Variable                 | Default       |
    /// |--------------------------|---------------|
    /// | `METAPHORA_BIND`         | `0.0.0.0`     |
    /// | `PORT`                   | `3000`        |
    /// | `METAPHORA_RULESET`      | `cooperative` |
    /// | `METAPHORA_DECK_POLICY`  | `recycle`     |
    pub fn from_env() -> Result<Self, MetaphoraError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like [`from_env`](Self::from_env), reading variables through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, MetaphoraError> {
        let host = lookup("METAPHORA_BIND").unwrap_or_else(|| "0.0.0.0".to_owned());
        let port = match lookup("PORT") {
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .map_err(|e| MetaphoraError::Config(format!("PORT={raw:?}: {e}")))?,
            None => DEFAULT_PORT,
        };

        let mut room = RoomConfig::default();
        if let Some(raw) = lookup("METAPHORA_RULESET") {
            room.ruleset = parse_ruleset(&raw)?;
        }
        if let Some(raw) = lookup("METAPHORA_DECK_POLICY") {
            room.deck_policy = parse_deck_policy(&raw)?;
        }

        Ok(Self {
            bind_addr: format!("{host}:{port}"),
            room,
        })
    }
}

fn parse_ruleset(raw: &str) -> Result<RulesetKind, MetaphoraError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "cooperative" | "coop" => Ok(RulesetKind::Cooperative),
        "strict" => Ok(RulesetKind::Strict),
        _ => Err(MetaphoraError::Config(format!(
            "METAPHORA_RULESET={raw:?}: expected cooperative or strict"
        ))),
    }
}

fn parse_deck_policy(raw: &str) -> Result<DeckPolicy, MetaphoraError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "recycle" => Ok(DeckPolicy::Recycle),
        "rebuild" => Ok(DeckPolicy::Rebuild),
        _ => Err(MetaphoraError::Config(format!(
            "METAPHORA_DECK_POLICY={raw:?}: expected recycle or rebuild"
        ))),
    }
}
