//! The room's stack of undealt numbers.

use rand::Rng;
use rand::seq::SliceRandom;

/// Highest card number; the full deck holds `1..=DECK_SIZE`.
pub const DECK_SIZE: u8 = 100;

/// How the deck is replenished between rounds. A new game always starts
/// from a fresh deck.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DeckPolicy {
    /// Return the numbers just played and reshuffle.
    #[default]
    Recycle,
    /// Throw everything away and shuffle a fresh `1..=100`.
    Rebuild,
}

/// Remaining numbers, dealt from the tail.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Deck {
    numbers: Vec<u8>,
}

impl Deck {
    /// A full `1..=100` deck, shuffled.
    pub fn shuffled<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let mut numbers: Vec<u8> = (1..=DECK_SIZE).collect();
        numbers.shuffle(rng);
        Self { numbers }
    }

    /// Takes the top card.
    pub fn draw(&mut self) -> Option<u8> {
        self.numbers.pop()
    }

    /// Replenishes the deck for the next round.
    pub fn refill<R: Rng + ?Sized>(
        &mut self,
        policy: DeckPolicy,
        played: impl IntoIterator<Item = u8>,
        rng: &mut R,
    ) {
        match policy {
            DeckPolicy::Recycle => {
                self.numbers.extend(played);
                self.numbers.shuffle(rng);
            }
            DeckPolicy::Rebuild => *self = Self::shuffled(rng),
        }
    }

    pub fn clear(&mut self) {
        self.numbers.clear();
    }

    pub fn len(&self) -> usize {
        self.numbers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.numbers.is_empty()
    }

    pub fn numbers(&self) -> &[u8] {
        &self.numbers
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn sorted(deck: &Deck) -> Vec<u8> {
        let mut n = deck.numbers().to_vec();
        n.sort_unstable();
        n
    }

    #[test]
    fn test_shuffled_deck_holds_each_number_once() {
        let mut rng = StdRng::seed_from_u64(1);
        let deck = Deck::shuffled(&mut rng);
        assert_eq!(sorted(&deck), (1..=100).collect::<Vec<u8>>());
    }

    #[test]
    fn test_draw_takes_from_tail() {
        let mut rng = StdRng::seed_from_u64(2);
        let mut deck = Deck::shuffled(&mut rng);
        let top = *deck.numbers().last().unwrap();
        assert_eq!(deck.draw(), Some(top));
        assert_eq!(deck.len(), 99);
    }

    #[test]
    fn test_recycle_returns_played_numbers() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut deck = Deck::shuffled(&mut rng);
        let played: Vec<u8> = (0..4).filter_map(|_| deck.draw()).collect();
        assert_eq!(deck.len(), 96);

        deck.refill(DeckPolicy::Recycle, played, &mut rng);
        assert_eq!(sorted(&deck), (1..=100).collect::<Vec<u8>>());
    }

    #[test]
    fn test_rebuild_ignores_played_numbers() {
        let mut rng = StdRng::seed_from_u64(4);
        let mut deck = Deck::default();
        deck.refill(DeckPolicy::Rebuild, [7, 42], &mut rng);
        assert_eq!(sorted(&deck), (1..=100).collect::<Vec<u8>>());
    }

    #[test]
    fn test_empty_deck_draws_nothing() {
        let mut deck = Deck::default();
        assert!(deck.is_empty());
        assert_eq!(deck.draw(), None);
    }
}
