//! The built-in theme catalogue.

use metaphora_protocol::{Theme, ThemeId};
use rand::Rng;
use rand::seq::IndexedRandom;

use crate::model::cap_text;

/// How many candidates the host chooses from.
pub const CANDIDATE_COUNT: usize = 3;

/// `(id, category, title, scale_min, scale_max)`
const CATALOGUE: &[(&str, &str, &str, &str, &str)] = &[
    ("food-popularity", "Food", "How popular is this dish?", "Nobody eats it", "Everyone loves it"),
    ("food-spicy", "Food", "How spicy is it?", "Plain water", "Ghost pepper"),
    ("animal-strength", "Animals", "How strong is this animal?", "Ladybug", "Elephant"),
    ("animal-cuteness", "Animals", "How cute is it?", "Cockroach", "Kitten"),
    ("life-scary", "Everyday", "How scary is this?", "A warm blanket", "Alone in a haunted house"),
    ("life-happy", "Everyday", "How happy would this make you?", "Stubbed toe", "Winning the lottery"),
    ("life-expensive", "Everyday", "How expensive is it?", "A paper clip", "A private island"),
    ("work-stress", "Work", "How stressful is this at work?", "Coffee break", "Server down on launch day"),
    ("hero-power", "Fiction", "How powerful is this character?", "Village extra", "Final boss"),
    ("travel-far", "Travel", "How far away does it feel?", "Next door", "The other side of the moon"),
    ("weather-hot", "Nature", "How hot is it?", "Antarctic night", "Surface of the sun"),
    ("music-loud", "Culture", "How loud is it?", "A whisper", "A rock concert front row"),
];

/// The whole catalogue as [`Theme`]s.
pub fn catalogue() -> Vec<Theme> {
    CATALOGUE.iter().map(to_theme).collect()
}

fn to_theme(&(id, category, title, min, max): &(&str, &str, &str, &str, &str)) -> Theme {
    Theme {
        id: ThemeId::new(id),
        category: category.into(),
        title: title.into(),
        scale_min: min.into(),
        scale_max: max.into(),
        editing_user_id: None,
        lock_expires_at: None,
    }
}

/// Draws [`CANDIDATE_COUNT`] distinct themes.
pub fn draw_candidates<R: Rng + ?Sized>(rng: &mut R) -> Vec<Theme> {
    CATALOGUE
        .choose_multiple(rng, CANDIDATE_COUNT)
        .map(to_theme)
        .collect()
}

/// A host-written theme with a fresh id.
pub fn custom(title: &str, scale_min: &str, scale_max: &str) -> Theme {
    Theme {
        id: ThemeId::generate(),
        category: "Custom".into(),
        title: cap_text(title.trim()),
        scale_min: cap_text(scale_min.trim()),
        scale_max: cap_text(scale_max.trim()),
        editing_user_id: None,
        lock_expires_at: None,
    }
}
