use metaphora_protocol::{GameSettings, Phase, RulesetKind};

use super::{Ruleset, Timeout, all_active_done};
use crate::GameError;
use crate::model::{Card, Player};

/// Seconds the strict variant holds the reveal before branching.
pub const REVEAL_DELAY_SECS: u32 = 5;

/// Timed play: a clue-writing phase, then a placement phase where each
/// player moves only their own cards and locks in once.
#[derive(Debug, Clone, Copy, Default)]
pub struct StrictRules;

impl Ruleset for StrictRules {
    fn kind(&self) -> RulesetKind {
        RulesetKind::Strict
    }

    fn opening_phase(&self) -> Phase {
        Phase::PlayingExpression
    }

    fn clue_phase(&self) -> Phase {
        Phase::PlayingExpression
    }

    fn placement_phase(&self) -> Phase {
        Phase::PlayingSubmission
    }

    fn phase_limit(&self, phase: Phase, settings: &GameSettings) -> Option<u32> {
        match phase {
            Phase::PlayingExpression => Some(settings.time_limit_expression),
            Phase::PlayingSubmission => Some(settings.time_limit_submission),
            Phase::ResultReveal => Some(REVEAL_DELAY_SECS),
            Phase::ResultVoting => Some(settings.time_limit_voting),
            _ => None,
        }
    }

    fn may_move(&self, mover: &Player, card: &Card, _to_hand: bool) -> bool {
        mover.is_active() && card.owner == mover.id && !mover.is_submitted
    }

    fn clears_done_on_move(&self) -> bool {
        false
    }

    fn mark_done(&self, player: &mut Player, cards: &mut [Card]) -> Result<(), GameError> {
        if player.is_submitted {
            return Err(GameError::ignored("submit done", "already locked in"));
        }
        player.is_submitted = true;
        for card in cards.iter_mut().filter(|c| c.owner == player.id) {
            card.is_submitted = true;
        }
        Ok(())
    }

    fn ready_to_evaluate(&self, players: &[Player], _cards: &[Card]) -> bool {
        all_active_done(players)
    }

    fn reveal_delay(&self) -> Option<u32> {
        Some(REVEAL_DELAY_SECS)
    }

    fn echoes_hand_on_clue(&self) -> bool {
        false
    }

    fn can_pause(&self, _phase: Phase) -> bool {
        false
    }

    fn on_timeout(&self, phase: Phase) -> Option<Timeout> {
        match phase {
            Phase::PlayingExpression => Some(Timeout::Advance(Phase::PlayingSubmission)),
            Phase::PlayingSubmission => Some(Timeout::End(crate::TIME_UP)),
            Phase::ResultReveal => Some(Timeout::ConcludeReveal),
            Phase::ResultVoting => Some(Timeout::Tally),
            _ => None,
        }
    }
}
