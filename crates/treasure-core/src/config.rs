//! Game configuration.
//!
//! Defaults reproduce the tabletop rules: 2-6 players, three partial drives per
//! round, and a treasure deck of 27 + 2 curses shuffled underneath 39 safe gold
//! cards.

use serde::{Deserialize, Serialize};

/// How to pick the biggest area when two areas of one terrain share the largest size
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AreaPolicy {
    /// The area containing the smallest position wins
    #[default]
    LowestPosition,
    /// Refuse to build the grid
    Reject,
}

/// Tunable rules of a game
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Minimum number of players needed to start
    pub min_players: usize,
    /// Maximum number of players allowed
    pub max_players: usize,
    /// Partial routes a player may drive per round
    pub drive_limit: u32,
    /// Opening hand size
    pub hand_size: usize,
    /// Opening hand size in a two player game
    pub two_player_hand_size: usize,
    /// Gold cards the curses get shuffled into
    pub lower_pile_gold_cards: usize,
    /// Curse cards in the deck
    pub curse_cards: usize,
    /// Curse-free gold cards placed on top
    pub top_pile_gold_cards: usize,
    /// Highest value printed on a gold card
    pub max_gold_card_value: u8,
    /// Pause before a bot answers a prompt
    pub bot_delay_ms: u64,
    pub area_policy: AreaPolicy,
    /// Seed for every random decision; entropy when absent
    pub seed: Option<u64>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            min_players: 2,
            max_players: 6,
            drive_limit: 3,
            hand_size: 4,
            two_player_hand_size: 6,
            lower_pile_gold_cards: 27,
            curse_cards: 2,
            top_pile_gold_cards: 39,
            max_gold_card_value: 6,
            bot_delay_ms: 100,
            area_policy: AreaPolicy::LowestPosition,
            seed: None,
        }
    }
}

impl GameConfig {
    /// Parse a configuration, filling missing fields with defaults
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Hand size for a game with `player_count` players
    pub fn hand_size_for(&self, player_count: usize) -> usize {
        if player_count == 2 {
            self.two_player_hand_size
        } else {
            self.hand_size
        }
    }

    /// Total cards in a freshly built treasure deck
    pub fn deck_size(&self) -> usize {
        self.lower_pile_gold_cards + self.curse_cards + self.top_pile_gold_cards
    }
}
