//! Host-configurable room settings

use super::cards::CardType;
use super::constants::{
    DEFAULT_MAX_PICKUPS, DEFAULT_ROUND_DURATION_SECONDS, MAX_PICKUP_OPTIONS,
    ROUND_DURATION_OPTIONS,
};

#[derive(Debug, Clone, PartialEq)]
pub struct RoomSettings {
    pub max_pickups: usize,
    pub round_duration_seconds: u32,
    /// Never empty
    pub allowed_cards: Vec<CardType>,
}

impl Default for RoomSettings {
    fn default() -> Self {
        Self {
            max_pickups: DEFAULT_MAX_PICKUPS,
            round_duration_seconds: DEFAULT_ROUND_DURATION_SECONDS,
            allowed_cards: CardType::ALL.to_vec(),
        }
    }
}

/// Raw settings submission; every field is optional and validated independently
#[derive(Debug, Clone, Default)]
pub struct SettingsUpdate {
    pub max_pickups: Option<f64>,
    pub round_duration_seconds: Option<f64>,
    pub allowed_cards: Option<Vec<String>>,
}

impl RoomSettings {
    /// Merge an update, keeping the current value of every field that is
    /// missing or invalid. Returns true if anything changed.
    pub fn apply(&mut self, update: &SettingsUpdate) -> bool {
        let before = self.clone();

        if let Some(max) = update.max_pickups.and_then(as_whole) {
            if let Some(valid) = MAX_PICKUP_OPTIONS.into_iter().find(|opt| *opt as u64 == max) {
                self.max_pickups = valid;
            }
        }

        if let Some(secs) = update.round_duration_seconds.and_then(as_whole) {
            if let Some(valid) = ROUND_DURATION_OPTIONS.into_iter().find(|opt| u64::from(*opt) == secs) {
                self.round_duration_seconds = valid;
            }
        }

        if let Some(raw_cards) = &update.allowed_cards {
            let mut cards: Vec<CardType> = Vec::new();
            for card in raw_cards.iter().filter_map(|raw| CardType::parse(raw)) {
                if !cards.contains(&card) {
                    cards.push(card);
                }
            }
            if !cards.is_empty() {
                self.allowed_cards = cards;
            }
        }

        *self != before
    }
}

fn as_whole(value: f64) -> Option<u64> {
    (value.is_finite() && value >= 0.0 && value.fract() == 0.0).then_some(value as u64)
}
