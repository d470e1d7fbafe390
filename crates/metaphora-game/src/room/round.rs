//! Playing a game: dealing, clues, the table, evaluation, and voting.

use metaphora_protocol::{
    CardMove, ClueSubmission, Phase, PlayerId, Recipient, RoomPatch, ServerEvent, ThemeChoice,
    VoteChoice,
};
use tracing::{debug, info};

use super::{GameRoom, Outbound, TimerToken};
use crate::deck::{DECK_SIZE, Deck};
use crate::evaluate::{self, EXTRA_CLEAR, GAME_CLEAR, GAME_OVER, NOT_ENOUGH_CARDS};
use crate::model::{Card, cap_text};
use crate::rules::Timeout;
use crate::{GameError, projector, themes};

impl GameRoom {
    /// Starts a new game from the lobby or from a finished game.
    ///
    /// Every check happens before anything changes, so a rejected start
    /// leaves the room exactly as it was.
    pub fn start_game(&mut self, by: &PlayerId, now: u64) -> Result<Outbound, GameError> {
        self.require_host(by, "start the game")?;
        if !self.phase.accepts_start() {
            return Err(GameError::InvalidPhase {
                action: "start the game",
                phase: self.phase,
            });
        }
        let players = self.active_count();
        let hand = self.settings.initial_hand_count;
        if players * hand as usize > usize::from(DECK_SIZE) {
            return Err(GameError::NotEnoughCards { players, hand });
        }

        self.current_round = 1;
        self.success_count = 0;
        self.current_lifes = self.settings.max_lifes;
        self.current_hand_count = hand;
        self.deck = Deck::shuffled(&mut self.rng);

        info!(room_id = %self.id, ruleset = %self.rules.kind(), players, hand, "game started");
        Ok(self.deal_round(now))
    }

    /// Replenishes the deck and deals the next round.
    fn next_round(&mut self, now: u64) -> Outbound {
        self.current_round += 1;
        let played: Vec<u8> = self.cards.iter().map(|c| c.number).collect();
        self.deck.refill(self.deck_policy, played, &mut self.rng);
        self.deal_round(now)
    }

    /// Deals `current_hand_count` cards to every active player and opens
    /// the round. Ends the game if the deck cannot cover the deal.
    fn deal_round(&mut self, now: u64) -> Outbound {
        let hand = self.current_hand_count as usize;
        let owners: Vec<PlayerId> = self
            .players
            .iter()
            .filter(|p| p.is_active())
            .map(|p| p.id.clone())
            .collect();
        if owners.len() * hand > self.deck.len() {
            return self.end_game(NOT_ENOUGH_CARDS, now);
        }

        self.cards.clear();
        for owner in &owners {
            for _ in 0..hand {
                let Some(number) = self.deck.draw() else {
                    return self.end_game(NOT_ENOUGH_CARDS, now);
                };
                self.cards.push(Card::dealt(number, owner.clone()));
            }
        }

        for player in &mut self.players {
            player.reset_round();
        }
        self.result_message = None;
        self.result_invalid_card_ids.clear();

        let opening = self.rules.opening_phase();
        self.theme_candidates = if opening == Phase::ThemeSelection {
            themes::draw_candidates(&mut self.rng)
        } else {
            Vec::new()
        };
        self.enter_phase(opening, now);
        info!(
            room_id = %self.id,
            round = self.current_round,
            hand,
            phase = %self.phase,
            "round dealt"
        );

        let mut out = vec![Self::room_update(RoomPatch {
            current_round: Some(self.current_round),
            current_hand_count: Some(self.current_hand_count),
            success_count: Some(self.success_count),
            current_lifes: Some(self.current_lifes),
            result_message: Some(None),
            result_invalid_card_ids: Some(Vec::new()),
            theme_candidates: Some(self.theme_candidates.clone()),
            ..self.phase_patch()
        })];
        out.push(self.cards_update());
        out.push(self.player_update());
        out.extend(owners.iter().map(|owner| self.hand_update(owner)));
        out
    }

    fn end_game(&mut self, message: &'static str, now: u64) -> Outbound {
        self.result_message = Some(message.to_owned());
        self.enter_phase(Phase::Ended, now);
        info!(
            room_id = %self.id,
            result = message,
            round = self.current_round,
            successes = self.success_count,
            lifes = self.current_lifes,
            "game ended"
        );
        vec![
            Self::room_update(RoomPatch {
                success_count: Some(self.success_count),
                current_lifes: Some(self.current_lifes),
                result_message: Some(self.result_message.clone()),
                result_invalid_card_ids: Some(self.result_invalid_card_ids.clone()),
                ..self.phase_patch()
            }),
            self.cards_update(),
        ]
    }

    /// Host picks one of the drawn candidates or writes a custom theme.
    pub fn select_theme(
        &mut self,
        by: &PlayerId,
        choice: ThemeChoice,
        now: u64,
    ) -> Result<Outbound, GameError> {
        const ACTION: &str = "select theme";
        if by != &self.host {
            return Err(GameError::ignored(ACTION, "not the host"));
        }
        if self.phase != Phase::ThemeSelection {
            return Err(GameError::ignored(ACTION, "no theme selection running"));
        }

        let theme = match (&choice.theme_id, &choice.custom_theme) {
            (Some(id), _) => self
                .theme_candidates
                .iter()
                .find(|t| &t.id == id)
                .cloned()
                .ok_or(GameError::ignored(ACTION, "unknown candidate"))?,
            (None, Some(custom)) if !custom.title.trim().is_empty() => {
                themes::custom(&custom.title, &custom.scale_min, &custom.scale_max)
            }
            _ => return Err(GameError::ignored(ACTION, "no theme given")),
        };

        info!(room_id = %self.id, theme_id = %theme.id, "theme selected");
        self.theme = theme;
        self.theme_candidates.clear();
        self.enter_phase(self.rules.clue_phase(), now);

        Ok(vec![Self::room_update(RoomPatch {
            theme: Some(self.theme.clone()),
            theme_candidates: Some(Vec::new()),
            ..self.phase_patch()
        })])
    }

    /// Owner writes or rewrites the clue on one of their cards.
    pub fn submit_clue(&mut self, by: &PlayerId, clue: ClueSubmission) -> Result<Outbound, GameError> {
        const ACTION: &str = "submit clue";
        if self.phase != self.rules.clue_phase() {
            return Err(GameError::ignored(ACTION, "not the clue phase"));
        }
        let card = self
            .cards
            .iter_mut()
            .find(|c| c.id == clue.card_id)
            .ok_or(GameError::UnknownCard(clue.card_id))?;
        if &card.owner != by {
            return Err(GameError::ignored(ACTION, "not the owner"));
        }
        card.metaphor = cap_text(&clue.text);

        let mut out = vec![self.cards_update()];
        if self.rules.echoes_hand_on_clue() {
            out.push(self.hand_update(by));
        }
        Ok(out)
    }

    /// Places a card on the table, reorders it, or takes it back.
    ///
    /// `index == -1` returns the card to its owner's hand. Any other value
    /// is clamped into `[0, table size]` after the card is lifted from its
    /// old rank, then the table is re-ranked densely.
    pub fn move_card(&mut self, by: &PlayerId, mv: CardMove) -> Result<Outbound, GameError> {
        const ACTION: &str = "move card";
        if self.phase != self.rules.placement_phase() {
            return Err(GameError::ignored(ACTION, "not the placement phase"));
        }
        let mover = self.player_index(by, ACTION)?;
        let moved = self
            .cards
            .iter()
            .position(|c| c.id == mv.card_id)
            .ok_or(GameError::UnknownCard(mv.card_id))?;
        let to_hand = mv.index == -1;
        if !self
            .rules
            .may_move(&self.players[mover], &self.cards[moved], to_hand)
        {
            return Err(GameError::ignored(ACTION, "not permitted"));
        }

        let mut table: Vec<usize> = (0..self.cards.len())
            .filter(|&i| i != moved && !self.cards[i].in_hand())
            .collect();
        table.sort_by_key(|&i| self.cards[i].order);
        if to_hand {
            self.cards[moved].order = -1;
        } else {
            let rank = mv.index.clamp(0, table.len() as i64) as usize;
            table.insert(rank, moved);
        }
        for (rank, &i) in table.iter().enumerate() {
            self.cards[i].order = rank as i32;
        }

        let mut out = vec![self.cards_update()];
        if self.rules.clears_done_on_move() && self.players[mover].is_submitted {
            self.players[mover].is_submitted = false;
            out.push(self.player_update());
        }
        Ok(out)
    }

    /// A player declares themselves done; evaluates once everyone is.
    pub fn submit_done(&mut self, by: &PlayerId, now: u64) -> Result<Outbound, GameError> {
        const ACTION: &str = "submit done";
        if self.phase != self.rules.placement_phase() {
            return Err(GameError::ignored(ACTION, "not the placement phase"));
        }
        let idx = self.player_index(by, ACTION)?;
        if !self.players[idx].is_active() {
            return Err(GameError::ignored(ACTION, "spectator"));
        }

        let submitted_before = self.cards.iter().filter(|c| c.is_submitted).count();
        self.rules.mark_done(&mut self.players[idx], &mut self.cards)?;

        if self.rules.ready_to_evaluate(&self.players, &self.cards) {
            return Ok(self.evaluate(now));
        }
        let mut out = vec![self.player_update()];
        if self.cards.iter().filter(|c| c.is_submitted).count() != submitted_before {
            out.push(self.cards_update());
        }
        Ok(out)
    }

    /// Reveals every number and judges the table.
    fn evaluate(&mut self, now: u64) -> Outbound {
        self.result_invalid_card_ids = evaluate::find_inversions(&self.cards);
        info!(
            room_id = %self.id,
            round = self.current_round,
            invalid = self.result_invalid_card_ids.len(),
            "table evaluated"
        );

        let mut out = vec![(
            Recipient::Room,
            ServerEvent::CardsReveal(projector::reveal(&self.cards)),
        )];
        if self.rules.reveal_delay().is_some() {
            self.enter_phase(Phase::ResultReveal, now);
            out.push(Self::room_update(RoomPatch {
                result_invalid_card_ids: Some(self.result_invalid_card_ids.clone()),
                ..self.phase_patch()
            }));
        } else {
            out.extend(self.conclude_round(now));
        }
        out
    }

    /// Branches on the evaluated table: next round, voting, or the end.
    fn conclude_round(&mut self, now: u64) -> Outbound {
        if self.result_invalid_card_ids.is_empty() {
            self.success_count += 1;
            let next = self.current_hand_count + 1;
            if self.active_count() * next as usize > usize::from(DECK_SIZE) {
                return self.end_game(EXTRA_CLEAR, now);
            }
            if self.success_count >= self.settings.win_condition_count {
                return self.end_game(GAME_CLEAR, now);
            }
            self.current_hand_count = next;
            return self.next_round(now);
        }

        self.current_lifes = self.current_lifes.saturating_sub(1);
        if self.current_lifes == 0 {
            return self.end_game(GAME_OVER, now);
        }
        for player in &mut self.players {
            player.vote = None;
        }
        self.enter_phase(Phase::ResultVoting, now);
        vec![
            Self::room_update(RoomPatch {
                success_count: Some(self.success_count),
                current_lifes: Some(self.current_lifes),
                result_invalid_card_ids: Some(self.result_invalid_card_ids.clone()),
                ..self.phase_patch()
            }),
            self.player_update(),
        ]
    }

    /// Casts or changes a ballot; tallies once every active player voted.
    pub fn vote(&mut self, by: &PlayerId, choice: VoteChoice, now: u64) -> Result<Outbound, GameError> {
        const ACTION: &str = "vote";
        if self.phase != Phase::ResultVoting {
            return Err(GameError::ignored(ACTION, "no vote running"));
        }
        let idx = self.player_index(by, ACTION)?;
        if !self.players[idx].is_active() {
            return Err(GameError::ignored(ACTION, "spectator"));
        }
        self.players[idx].vote = Some(choice);

        let all_voted = self
            .players
            .iter()
            .filter(|p| p.is_active())
            .all(|p| p.vote.is_some());
        if all_voted {
            return Ok(self.tally(now));
        }
        Ok(vec![self.player_update()])
    }

    /// REDUCE wins only on a strict majority and shrinks the hand by one.
    fn tally(&mut self, now: u64) -> Outbound {
        let active = self.players.iter().filter(|p| p.is_active());
        let (reduce, keep) = active.fold((0usize, 0usize), |(r, k), p| match p.vote {
            Some(VoteChoice::Reduce) => (r + 1, k),
            Some(VoteChoice::Continue) => (r, k + 1),
            None => (r, k),
        });
        if reduce > keep {
            self.current_hand_count = self.current_hand_count.saturating_sub(1).max(1);
        }
        info!(room_id = %self.id, reduce, keep, hand = self.current_hand_count, "votes tallied");
        self.next_round(now)
    }

    /// Host freezes the game clock.
    pub fn pause_timer(&mut self, by: &PlayerId, now: u64) -> Result<Outbound, GameError> {
        self.require_host(by, "pause the timer")?;
        if !self.rules.can_pause(self.phase) {
            return Err(GameError::InvalidPhase {
                action: "pause the timer",
                phase: self.phase,
            });
        }
        if self.paused_remaining_ms.is_some() {
            return Ok(Vec::new());
        }
        let Some(timer) = self.timer.take() else {
            return Ok(Vec::new());
        };
        self.paused_remaining_ms = Some(timer.deadline_ms.saturating_sub(now));
        self.phase_end_time = 0;
        debug!(room_id = %self.id, remaining_ms = ?self.paused_remaining_ms, "timer paused");
        Ok(vec![Self::room_update(self.phase_patch())])
    }

    /// Host restarts a paused clock with the time that was left.
    pub fn resume_timer(&mut self, by: &PlayerId, now: u64) -> Result<Outbound, GameError> {
        self.require_host(by, "resume the timer")?;
        if !self.rules.can_pause(self.phase) {
            return Err(GameError::InvalidPhase {
                action: "resume the timer",
                phase: self.phase,
            });
        }
        let Some(remaining) = self.paused_remaining_ms.take() else {
            return Ok(Vec::new());
        };
        self.arm(remaining, now);
        debug!(room_id = %self.id, remaining_ms = remaining, "timer resumed");
        Ok(vec![Self::room_update(self.phase_patch())])
    }

    /// Handles an expired phase deadline. Stale tokens do nothing.
    pub fn on_timer(&mut self, token: TimerToken, now: u64) -> Outbound {
        match self.timer {
            Some(armed) if armed.token == token => {}
            _ => {
                debug!(room_id = %self.id, ?token, "stale timer ignored");
                return Vec::new();
            }
        }
        self.disarm();

        let Some(effect) = self.rules.on_timeout(self.phase) else {
            return Vec::new();
        };
        debug!(room_id = %self.id, phase = %self.phase, ?effect, "phase deadline expired");
        match effect {
            Timeout::Advance(phase) => {
                self.enter_phase(phase, now);
                vec![Self::room_update(self.phase_patch())]
            }
            Timeout::End(message) => self.end_game(message, now),
            Timeout::ConcludeReveal => self.conclude_round(now),
            Timeout::Tally => self.tally(now),
            Timeout::Clear => vec![Self::room_update(self.phase_patch())],
        }
    }
}
