//! Audience-scoped views of a room.
//!
//! Everything a client sees goes through here. A card's number is copied
//! into a view only when the viewer owns the card, when the phase reveals
//! numbers, or for the explicit full reveal. Room-wide broadcasts pass
//! `viewer = None`, so they carry only what every participant may see.

use metaphora_protocol::{CardView, Phase, PlayerId, PlayerView, RoomSnapshot};

use crate::GameRoom;
use crate::model::{Card, Player};

pub fn player_views(players: &[Player]) -> Vec<PlayerView> {
    players
        .iter()
        .map(|p| PlayerView {
            user_id: p.id.clone(),
            name: p.name.clone(),
            color: p.color.clone(),
            role: p.role,
            status: p.status,
            is_ready: p.is_ready,
            is_submitted: p.is_submitted,
            vote: p.vote,
        })
        .collect()
}

fn card_view(card: &Card, show_number: bool) -> CardView {
    CardView {
        id: card.id.clone(),
        owner_id: card.owner.clone(),
        metaphor: card.metaphor.clone(),
        order: card.order,
        is_submitted: card.is_submitted,
        number: show_number.then_some(card.number),
    }
}

/// Every card in play as `viewer` may see it.
pub fn public_cards(cards: &[Card], phase: Phase, viewer: Option<&PlayerId>) -> Vec<CardView> {
    let revealed = phase.reveals_numbers();
    cards
        .iter()
        .map(|c| card_view(c, revealed || viewer == Some(&c.owner)))
        .collect()
}

/// `owner`'s own cards, numbers included.
pub fn hand(cards: &[Card], owner: &PlayerId) -> Vec<CardView> {
    cards
        .iter()
        .filter(|c| &c.owner == owner)
        .map(|c| card_view(c, true))
        .collect()
}

/// Every card with its number.
pub fn reveal(cards: &[Card]) -> Vec<CardView> {
    cards.iter().map(|c| card_view(c, true)).collect()
}

/// The full public state of `room` for `viewer`.
pub fn snapshot(room: &GameRoom, viewer: Option<&PlayerId>) -> RoomSnapshot {
    RoomSnapshot {
        room_id: room.id.clone(),
        host_id: room.host.clone(),
        ruleset: room.rules.kind(),
        phase: room.phase,
        phase_end_time: room.phase_end_time,
        is_timer_paused: room.paused_remaining_ms.is_some(),
        settings: room.settings,
        current_round: room.current_round,
        current_hand_count: room.current_hand_count,
        success_count: room.success_count,
        current_lifes: room.current_lifes,
        result_message: room.result_message.clone(),
        result_invalid_card_ids: room.result_invalid_card_ids.clone(),
        theme: room.theme.clone(),
        theme_candidates: room.theme_candidates.clone(),
        players: player_views(&room.players),
        cards: public_cards(&room.cards, room.phase, viewer),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cards() -> Vec<Card> {
        vec![
            Card::dealt(7, PlayerId::new("a")),
            Card::dealt(42, PlayerId::new("b")),
        ]
    }

    #[test]
    fn test_room_broadcast_hides_every_number() {
        let views = public_cards(&cards(), Phase::Playing, None);
        assert!(views.iter().all(|v| v.number.is_none()));
    }

    #[test]
    fn test_viewer_sees_only_own_number() {
        let a = PlayerId::new("a");
        let views = public_cards(&cards(), Phase::Playing, Some(&a));
        assert_eq!(views[0].number, Some(7));
        assert_eq!(views[1].number, None);
    }

    #[test]
    fn test_reveal_phases_show_all_numbers() {
        for phase in [Phase::ResultReveal, Phase::Ended] {
            let views = public_cards(&cards(), phase, None);
            assert!(views.iter().all(|v| v.number.is_some()));
        }
        let voting = public_cards(&cards(), Phase::ResultVoting, None);
        assert!(voting.iter().all(|v| v.number.is_none()));
    }

    #[test]
    fn test_hand_holds_only_owner_cards_with_numbers() {
        let b = PlayerId::new("b");
        let views = hand(&cards(), &b);
        assert_eq!(views.len(), 1);
        assert_eq!(views[0].number, Some(42));
    }

    #[test]
    fn test_reveal_shows_everything() {
        let views = reveal(&cards());
        assert_eq!(views.iter().filter_map(|v| v.number).collect::<Vec<_>>(), vec![7, 42]);
    }
}
