//! Player state.
//!
//! This module contains:
//! - Player colours for renderers
//! - The `Player` struct with position, path-card hand, gold and amulets
//!
//! Players are only mutated by the turn engine's action handlers.

use crate::cards::{CardId, GoldCard, PathCard};
use crate::hex::TilePosition;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Player identifier (0-5), also the seat index
pub type PlayerId = u8;

/// Seat colour, assigned by join order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlayerColor {
    Red,
    Blue,
    Orange,
    Green,
    Purple,
    White,
}

impl PlayerColor {
    /// Get color for a player index
    pub fn for_player(id: PlayerId) -> Self {
        match id % 6 {
            0 => PlayerColor::Red,
            1 => PlayerColor::Blue,
            2 => PlayerColor::Orange,
            3 => PlayerColor::Green,
            4 => PlayerColor::Purple,
            _ => PlayerColor::White,
        }
    }
}

/// A single player's state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    /// Seat index
    pub id: PlayerId,
    /// Display name
    pub name: String,
    pub color: PlayerColor,
    /// Current tile, `None` until a starting position was selected
    pub position: Option<TilePosition>,
    /// Path cards in hand
    pub path_cards: BTreeMap<CardId, PathCard>,
    /// Collected gold
    pub gold_cards: Vec<GoldCard>,
    pub amulets: u32,
    /// Controlled by a bot rather than a person
    pub is_bot: bool,
}

impl Player {
    /// Create a new player
    pub fn new(id: PlayerId, name: String, is_bot: bool) -> Self {
        Self {
            id,
            name,
            color: PlayerColor::for_player(id),
            position: None,
            path_cards: BTreeMap::new(),
            gold_cards: Vec::new(),
            amulets: 0,
            is_bot,
        }
    }

    /// Sum of all gold card values
    pub fn total_gold(&self) -> u32 {
        self.gold_cards.iter().map(|card| card.value as u32).sum()
    }

    pub fn add_amulets(&mut self, amount: u32) {
        self.amulets += amount;
    }

    /// Consume one amulet, returning whether there was one
    pub fn remove_amulet(&mut self) -> bool {
        if self.amulets == 0 {
            return false;
        }
        self.amulets -= 1;
        true
    }

    pub fn add_card(&mut self, card: PathCard) {
        self.path_cards.insert(card.id, card);
    }

    pub fn take_card(&mut self, id: CardId) -> Option<PathCard> {
        self.path_cards.remove(&id)
    }

    pub fn hand_size(&self) -> usize {
        self.path_cards.len()
    }

    /// Throw away every path card in hand
    pub fn discard_hand(&mut self) -> usize {
        let discarded = self.path_cards.len();
        self.path_cards.clear();
        discarded
    }

    /// Remove the highest valued gold card, if any
    pub fn remove_most_valuable_gold(&mut self) -> Option<GoldCard> {
        let (index, _) = self
            .gold_cards
            .iter()
            .enumerate()
            .max_by_key(|(_, card)| card.value)?;
        Some(self.gold_cards.remove(index))
    }
}
