//! Rule variants.
//!
//! A room is created with exactly one [`Ruleset`] and keeps it for life.
//! The room drives the shared flow (deal, evaluate, vote) and asks the
//! ruleset at each point where the variants disagree: which phases a
//! round goes through, who may move which card, what "done" means, how
//! long each phase lasts, and what happens when a deadline expires.

mod cooperative;
mod strict;

use std::fmt;

pub use cooperative::CooperativeRules;
use metaphora_protocol::{GameSettings, Phase, RulesetKind};
pub use strict::StrictRules;

use crate::GameError;
use crate::model::{Card, Player};

/// What an expired phase deadline does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timeout {
    /// Enter another phase (arming its own deadline).
    Advance(Phase),
    /// End the game with this message.
    End(&'static str),
    /// Branch on the result that the reveal delay held back.
    ConcludeReveal,
    /// Tally the votes cast so far.
    Tally,
    /// Drop the deadline and keep waiting.
    Clear,
}

/// The points where the two rule variants differ.
pub trait Ruleset: fmt::Debug + Send + Sync {
    fn kind(&self) -> RulesetKind;

    /// The phase every freshly dealt round opens in.
    fn opening_phase(&self) -> Phase;

    /// The phase in which owners write clues.
    fn clue_phase(&self) -> Phase;

    /// The phase in which cards are placed on the table and players
    /// declare themselves done.
    fn placement_phase(&self) -> Phase;

    /// Seconds until `phase` times out, or `None` for no deadline.
    fn phase_limit(&self, phase: Phase, settings: &GameSettings) -> Option<u32>;

    /// Whether `mover` may move `card`; `to_hand` is a move off the table
    /// back into the owner's hand.
    fn may_move(&self, mover: &Player, card: &Card, to_hand: bool) -> bool;

    /// Whether a successful move un-marks a mover who was done.
    fn clears_done_on_move(&self) -> bool;

    /// Applies a "done" press by `player`. `cards` is every card in play.
    fn mark_done(&self, player: &mut Player, cards: &mut [Card]) -> Result<(), GameError>;

    /// Whether the round is ready to be evaluated.
    fn ready_to_evaluate(&self, players: &[Player], cards: &[Card]) -> bool;

    /// Seconds to hold the reveal before branching; `None` branches at once.
    fn reveal_delay(&self) -> Option<u32>;

    /// Whether the owner gets a private `hand:update` after writing a clue.
    fn echoes_hand_on_clue(&self) -> bool;

    /// Whether the host may pause the clock in `phase`.
    fn can_pause(&self, phase: Phase) -> bool;

    /// What an expired deadline in `phase` does.
    fn on_timeout(&self, phase: Phase) -> Option<Timeout>;
}

/// Builds the ruleset for `kind`.
pub fn for_kind(kind: RulesetKind) -> Box<dyn Ruleset> {
    match kind {
        RulesetKind::Cooperative => Box::new(CooperativeRules),
        RulesetKind::Strict => Box::new(StrictRules),
    }
}

/// Every active player is marked done.
pub(crate) fn all_active_done(players: &[Player]) -> bool {
    let mut active = players.iter().filter(|p| p.is_active()).peekable();
    active.peek().is_some() && active.all(|p| p.is_submitted)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_for_kind_builds_matching_ruleset() {
        assert_eq!(for_kind(RulesetKind::Cooperative).kind(), RulesetKind::Cooperative);
        assert_eq!(for_kind(RulesetKind::Strict).kind(), RulesetKind::Strict);
    }

    #[test]
    fn test_opening_phases_differ() {
        assert_eq!(CooperativeRules.opening_phase(), Phase::ThemeSelection);
        assert_eq!(StrictRules.opening_phase(), Phase::PlayingExpression);
    }

    #[test]
    fn test_all_active_done_requires_someone() {
        assert!(!all_active_done(&[]));
    }
}
