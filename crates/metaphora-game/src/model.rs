//! Players and cards as the room stores them.

use metaphora_protocol::{CardId, ConnectionId, ConnectionStatus, PlayerId, Role, VoteChoice};

/// Longest clue, theme title, or scale anchor, in characters.
pub const MAX_TEXT_CHARS: usize = 50;

/// Colors handed out to new players.
pub const PALETTE: [&str; 8] = [
    "#FF6B6B", "#4ECDC4", "#45B7D1", "#96CEB4", "#FFEEAD", "#D4A5A5", "#9B59B6", "#3498DB",
];

/// A participant. Created on first join and never removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Player {
    pub id: PlayerId,
    /// The latest connection this player joined from.
    pub connection: ConnectionId,
    pub name: String,
    pub color: String,
    pub role: Role,
    pub status: ConnectionStatus,
    pub is_ready: bool,
    pub is_submitted: bool,
    pub vote: Option<VoteChoice>,
    pub joined_at: u64,
    pub last_active_at: u64,
}

impl Player {
    /// Holds cards and takes part in rounds.
    pub fn is_active(&self) -> bool {
        self.role == Role::Player
    }

    pub fn is_online(&self) -> bool {
        self.status == ConnectionStatus::Online
    }

    /// Clears the per-round flags.
    pub(crate) fn reset_round(&mut self) {
        self.is_ready = false;
        self.is_submitted = false;
        self.vote = None;
    }
}

/// One dealt card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Card {
    pub id: CardId,
    pub number: u8,
    pub owner: PlayerId,
    pub metaphor: String,
    /// `-1` while in the owner's hand, otherwise the dense table rank.
    pub order: i32,
    pub is_submitted: bool,
}

impl Card {
    pub(crate) fn dealt(number: u8, owner: PlayerId) -> Self {
        Self {
            id: CardId::generate(),
            number,
            owner,
            metaphor: String::new(),
            order: -1,
            is_submitted: false,
        }
    }

    pub fn in_hand(&self) -> bool {
        self.order < 0
    }
}

/// Truncates to [`MAX_TEXT_CHARS`] characters, never splitting a char.
pub(crate) fn cap_text(text: &str) -> String {
    text.chars().take(MAX_TEXT_CHARS).collect()
}

/// Returns the color in canonical upper case if it is `#RRGGBB`.
pub(crate) fn normalize_color(color: &str) -> Option<String> {
    let hex = color.strip_prefix('#')?;
    if hex.len() == 6 && hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        Some(format!("#{}", hex.to_ascii_uppercase()))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cap_text_counts_chars_not_bytes() {
        let long = "あ".repeat(60);
        let capped = cap_text(&long);
        assert_eq!(capped.chars().count(), MAX_TEXT_CHARS);
        assert_eq!(cap_text("short"), "short");
    }

    #[test]
    fn test_normalize_color() {
        assert_eq!(normalize_color("#a1b2c3").as_deref(), Some("#A1B2C3"));
        assert_eq!(normalize_color("#FFF"), None);
        assert_eq!(normalize_color("123456"), None);
        assert_eq!(normalize_color("#12345G"), None);
    }

    #[test]
    fn test_palette_colors_are_canonical() {
        for color in PALETTE {
            assert_eq!(normalize_color(color).as_deref(), Some(color));
        }
    }

    #[test]
    fn test_dealt_card_starts_in_hand() {
        let card = Card::dealt(42, PlayerId::new("p1"));
        assert!(card.in_hand());
        assert!(card.metaphor.is_empty());
        assert!(!card.is_submitted);
    }
}
