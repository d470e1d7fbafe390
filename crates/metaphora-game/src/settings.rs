//! Allowed ranges for [`GameSettings`] and patch merging.

use std::ops::RangeInclusive;

use metaphora_protocol::{GameSettings, SettingsPatch};

pub const INITIAL_HAND_COUNT: RangeInclusive<u32> = 1..=10;
pub const MAX_LIFES: RangeInclusive<u32> = 1..=10;
pub const WIN_CONDITION_COUNT: RangeInclusive<u32> = 1..=10;
/// `0` disables the game clock.
pub const TIME_LIMIT_GAME: RangeInclusive<u32> = 0..=600;
pub const TIME_LIMIT_EXPRESSION: RangeInclusive<u32> = 10..=300;
pub const TIME_LIMIT_SUBMISSION: RangeInclusive<u32> = 10..=300;
pub const TIME_LIMIT_VOTING: RangeInclusive<u32> = 10..=60;
pub const MAX_SPECTATORS: RangeInclusive<u32> = 0..=20;

fn clamp(value: u32, range: &RangeInclusive<u32>) -> u32 {
    value.clamp(*range.start(), *range.end())
}

/// Merges `patch` into `settings`, clamping every supplied field.
pub fn apply_patch(settings: &mut GameSettings, patch: &SettingsPatch) {
    let fields = [
        (&mut settings.initial_hand_count, patch.initial_hand_count, &INITIAL_HAND_COUNT),
        (&mut settings.max_lifes, patch.max_lifes, &MAX_LIFES),
        (&mut settings.win_condition_count, patch.win_condition_count, &WIN_CONDITION_COUNT),
        (&mut settings.time_limit_game, patch.time_limit_game, &TIME_LIMIT_GAME),
        (&mut settings.time_limit_expression, patch.time_limit_expression, &TIME_LIMIT_EXPRESSION),
        (&mut settings.time_limit_submission, patch.time_limit_submission, &TIME_LIMIT_SUBMISSION),
        (&mut settings.time_limit_voting, patch.time_limit_voting, &TIME_LIMIT_VOTING),
        (&mut settings.max_spectators, patch.max_spectators, &MAX_SPECTATORS),
    ];
    for (field, value, range) in fields {
        if let Some(value) = value {
            *field = clamp(value, range);
        }
    }
}
