//! Room administration outside of play.

use metaphora_protocol::{
    Phase, PlayerId, Recipient, RoomPatch, ServerEvent, SettingsPatch, ThemeText,
};
use tracing::info;

use super::{GameRoom, Outbound};
use crate::GameError;
use crate::model::{cap_text, normalize_color};
use crate::settings::apply_patch;

impl GameRoom {
    /// Host edits the rules. Lobby only; resets lives and hand size to
    /// the new starting values.
    pub fn update_settings(
        &mut self,
        by: &PlayerId,
        patch: SettingsPatch,
    ) -> Result<Outbound, GameError> {
        self.require_host(by, "change settings")?;
        if self.phase != Phase::Lobby {
            return Err(GameError::InvalidPhase {
                action: "change settings",
                phase: self.phase,
            });
        }
        apply_patch(&mut self.settings, &patch);
        self.current_lifes = self.settings.max_lifes;
        self.current_hand_count = self.settings.initial_hand_count;
        info!(room_id = %self.id, settings = ?self.settings, "settings updated");

        Ok(vec![Self::room_update(RoomPatch {
            settings: Some(self.settings),
            current_lifes: Some(self.current_lifes),
            current_hand_count: Some(self.current_hand_count),
            ..RoomPatch::default()
        })])
    }

    /// Changes the caller's color to an unused `#RRGGBB` value.
    pub fn update_color(&mut self, by: &PlayerId, color: &str) -> Result<Outbound, GameError> {
        let color = normalize_color(color).ok_or(GameError::InvalidInput("color must be #RRGGBB"))?;
        let taken = self
            .players
            .iter()
            .any(|p| &p.id != by && p.is_active() && p.color.eq_ignore_ascii_case(&color));
        if taken {
            return Err(GameError::ColorTaken(color));
        }
        let idx = self.player_index(by, "update color")?;
        self.players[idx].color = color;
        Ok(vec![self.player_update()])
    }

    /// Any active player edits the current theme's wording.
    pub fn update_theme_text(&mut self, by: &PlayerId, text: ThemeText) -> Result<Outbound, GameError> {
        let idx = self.player_index(by, "update theme text")?;
        if !self.players[idx].is_active() {
            return Err(GameError::ignored("update theme text", "spectator"));
        }
        self.theme.title = cap_text(&text.title);
        self.theme.scale_min = cap_text(&text.scale_min);
        self.theme.scale_max = cap_text(&text.scale_max);

        Ok(vec![Self::room_update(RoomPatch {
            theme: Some(self.theme.clone()),
            ..RoomPatch::default()
        })])
    }

    /// Host sends everyone back to the lobby, keeping players and settings.
    pub fn reset_lobby(&mut self, by: &PlayerId) -> Result<Outbound, GameError> {
        self.require_host(by, "reset the lobby")?;

        self.phase = Phase::Lobby;
        self.disarm();
        self.paused_remaining_ms = None;
        self.current_round = 1;
        self.success_count = 0;
        self.current_lifes = self.settings.max_lifes;
        self.current_hand_count = self.settings.initial_hand_count;
        self.cards.clear();
        self.deck.clear();
        self.result_message = None;
        self.result_invalid_card_ids.clear();
        self.theme_candidates.clear();
        for player in &mut self.players {
            player.reset_round();
        }
        info!(room_id = %self.id, "room reset to lobby");

        let mut out = vec![
            Self::room_update(RoomPatch {
                current_round: Some(self.current_round),
                current_hand_count: Some(self.current_hand_count),
                success_count: Some(self.success_count),
                current_lifes: Some(self.current_lifes),
                result_message: Some(None),
                result_invalid_card_ids: Some(Vec::new()),
                theme_candidates: Some(Vec::new()),
                ..self.phase_patch()
            }),
            self.player_update(),
            self.cards_update(),
        ];
        out.extend(self.players.iter().map(|p| {
            (Recipient::Player(p.id.clone()), ServerEvent::HandUpdate(Vec::new()))
        }));
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use metaphora_protocol::{ConnectionId, ErrorCode, RoomId, RulesetKind};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;
    use crate::deck::DeckPolicy;
    use crate::room::Admission;
    use crate::rules::for_kind;

    fn lobby_with(names: &[&str]) -> GameRoom {
        let mut room = GameRoom::new(
            RoomId::new("r1"),
            PlayerId::new(names[0]),
            for_kind(RulesetKind::Cooperative),
            DeckPolicy::Recycle,
            StdRng::seed_from_u64(3),
            0,
        );
        for (i, name) in names.iter().enumerate() {
            let admission = Admission {
                room_id: RoomId::new("r1"),
                name: (*name).into(),
                user_id: PlayerId::new(*name),
            };
            room.join(ConnectionId::new(i as u64), &admission, 0).unwrap();
        }
        room
    }

    #[test]
    fn test_settings_host_only() {
        let mut room = lobby_with(&["host", "guest"]);
        let err = room
            .update_settings(&PlayerId::new("guest"), SettingsPatch::default())
            .unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::Forbidden));
    }

    #[test]
    fn test_settings_reset_lives_and_hand() {
        let mut room = lobby_with(&["host"]);
        let patch = SettingsPatch {
            max_lifes: Some(4),
            initial_hand_count: Some(3),
            ..SettingsPatch::default()
        };
        room.update_settings(&PlayerId::new("host"), patch).unwrap();
        assert_eq!(room.current_lifes(), 4);
        assert_eq!(room.current_hand_count(), 3);
    }

    #[test]
    fn test_settings_rejected_outside_lobby() {
        let mut room = lobby_with(&["host"]);
        room.start_game(&PlayerId::new("host"), 0).unwrap();
        let err = room
            .update_settings(&PlayerId::new("host"), SettingsPatch::default())
            .unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::InvalidPhase));
    }

    #[test]
    fn test_color_must_be_hex() {
        let mut room = lobby_with(&["host"]);
        let err = room.update_color(&PlayerId::new("host"), "red").unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::InvalidInput));
    }

    #[test]
    fn test_color_taken_by_other_player() {
        let mut room = lobby_with(&["host", "guest"]);
        let guest_color = room.player(&PlayerId::new("guest")).unwrap().color.clone();
        let err = room
            .update_color(&PlayerId::new("host"), &guest_color.to_lowercase())
            .unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::ColorTaken));
    }

    #[test]
    fn test_color_change_broadcasts_players() {
        let mut room = lobby_with(&["host"]);
        let out = room.update_color(&PlayerId::new("host"), "#123abc").unwrap();
        assert_eq!(room.player(&PlayerId::new("host")).unwrap().color, "#123ABC");
        assert!(matches!(out[0], (Recipient::Room, ServerEvent::PlayerUpdate(_))));
    }

    #[test]
    fn test_theme_text_is_capped() {
        let mut room = lobby_with(&["host"]);
        let text = ThemeText {
            title: "x".repeat(80),
            scale_min: "low".into(),
            scale_max: "high".into(),
        };
        room.update_theme_text(&PlayerId::new("host"), text).unwrap();
        assert_eq!(room.theme().title.chars().count(), 50);
        assert_eq!(room.theme().scale_max, "high");
    }

    #[test]
    fn test_reset_requires_host() {
        let mut room = lobby_with(&["host", "guest"]);
        let err = room.reset_lobby(&PlayerId::new("guest")).unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::Forbidden));
    }
}
