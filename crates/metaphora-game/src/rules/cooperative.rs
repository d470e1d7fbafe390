use metaphora_protocol::{GameSettings, Phase, RulesetKind};

use super::{Ruleset, Timeout, all_active_done};
use crate::GameError;
use crate::model::{Card, Player};

/// Free-form play: the host picks a theme, then everyone writes clues and
/// arranges the shared table under one game clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct CooperativeRules;

impl Ruleset for CooperativeRules {
    fn kind(&self) -> RulesetKind {
        RulesetKind::Cooperative
    }

    fn opening_phase(&self) -> Phase {
        Phase::ThemeSelection
    }

    fn clue_phase(&self) -> Phase {
        Phase::Playing
    }

    fn placement_phase(&self) -> Phase {
        Phase::Playing
    }

    fn phase_limit(&self, phase: Phase, settings: &GameSettings) -> Option<u32> {
        match phase {
            Phase::Playing if settings.time_limit_game > 0 => Some(settings.time_limit_game),
            Phase::ResultVoting => Some(settings.time_limit_voting),
            _ => None,
        }
    }

    /// Owners move cards in and out of their hand; once a card is on the
    /// table any active player may reorder it.
    fn may_move(&self, mover: &Player, card: &Card, to_hand: bool) -> bool {
        if !mover.is_active() {
            return false;
        }
        card.owner == mover.id || (!card.in_hand() && !to_hand)
    }

    fn clears_done_on_move(&self) -> bool {
        true
    }

    fn mark_done(&self, player: &mut Player, cards: &mut [Card]) -> Result<(), GameError> {
        if player.is_submitted {
            player.is_submitted = false;
            return Ok(());
        }
        let in_hand = cards
            .iter()
            .filter(|c| c.owner == player.id && c.in_hand())
            .count();
        if in_hand > 0 {
            return Err(GameError::CardsInHand(in_hand));
        }
        player.is_submitted = true;
        Ok(())
    }

    fn ready_to_evaluate(&self, players: &[Player], cards: &[Card]) -> bool {
        all_active_done(players) && cards.iter().all(|c| !c.in_hand())
    }

    fn reveal_delay(&self) -> Option<u32> {
        None
    }

    fn echoes_hand_on_clue(&self) -> bool {
        true
    }

    fn can_pause(&self, phase: Phase) -> bool {
        phase == Phase::Playing
    }

    fn on_timeout(&self, phase: Phase) -> Option<Timeout> {
        match phase {
            Phase::Playing => Some(Timeout::End(crate::TIME_UP)),
            Phase::ResultVoting => Some(Timeout::Clear),
            _ => None,
        }
    }
}
