//! Judging the table.

use metaphora_protocol::CardId;

use crate::model::Card;

pub const GAME_CLEAR: &str = "GAME CLEAR!";
pub const EXTRA_CLEAR: &str = "EXTRA CLEAR!";
pub const GAME_OVER: &str = "GAME OVER";
pub const TIME_UP: &str = "TIME UP";
pub const NOT_ENOUGH_CARDS: &str = "NOT ENOUGH CARDS";

/// Cards involved in an out-of-order adjacent pair on the table.
///
/// Both members of every inverted pair are reported, once each, in the
/// order they are first seen walking the table left to right. An empty
/// result means the table is ascending.
pub fn find_inversions(cards: &[Card]) -> Vec<CardId> {
    let mut table: Vec<&Card> = cards.iter().filter(|c| !c.in_hand()).collect();
    table.sort_by_key(|c| c.order);

    let mut invalid: Vec<CardId> = Vec::new();
    for pair in table.windows(2) {
        let (low, high) = (pair[0], pair[1]);
        if low.number > high.number {
            for card in [low, high] {
                if !invalid.contains(&card.id) {
                    invalid.push(card.id.clone());
                }
            }
        }
    }
    invalid
}

#[cfg(test)]
mod tests {
    use metaphora_protocol::PlayerId;

    use super::*;

    fn table(numbers: &[u8]) -> Vec<Card> {
        numbers
            .iter()
            .enumerate()
            .map(|(i, &n)| {
                let mut c = Card::dealt(n, PlayerId::new("p"));
                c.id = CardId::new(format!("c{n}"));
                c.order = i as i32;
                c
            })
            .collect()
    }

    fn ids(names: &[&str]) -> Vec<CardId> {
        names.iter().map(|n| CardId::new(*n)).collect()
    }

    #[test]
    fn test_ascending_table_is_valid() {
        assert!(find_inversions(&table(&[7, 42, 90])).is_empty());
    }

    #[test]
    fn test_single_inversion_marks_both_cards() {
        assert_eq!(find_inversions(&table(&[42, 7])), ids(&["c42", "c7"]));
    }

    #[test]
    fn test_shared_card_is_reported_once() {
        assert_eq!(find_inversions(&table(&[10, 60, 20])), ids(&["c60", "c20"]));
        // 90 > 50 > 30: two inversions sharing 50.
        assert_eq!(find_inversions(&table(&[90, 50, 30])), ids(&["c90", "c50", "c30"]));
    }

    #[test]
    fn test_hand_cards_are_ignored() {
        let mut cards = table(&[20, 10]);
        cards[1].order = -1;
        assert!(find_inversions(&cards).is_empty());
    }

    #[test]
    fn test_sorted_by_rank_not_vec_position() {
        let mut cards = table(&[30, 10]);
        cards[0].order = 1;
        cards[1].order = 0;
        assert!(find_inversions(&cards).is_empty());
    }
}
