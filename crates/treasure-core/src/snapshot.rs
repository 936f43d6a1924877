//! Immutable per-player view published by the turn engine.
//!
//! A new `PlayerState` is built every time the engine prompts a player and
//! every time it idles one. Collaborators (bots, user interfaces) only ever
//! read these snapshots and answer with actions.

use crate::cards::{CardId, GoldCard, PathCard, TreasureCard};
use crate::hex::TilePosition;
use crate::objective::PlayerObjective;
use crate::player::PlayerId;
use crate::trail::TrailColor;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerState {
    pub player: PlayerId,
    /// What the engine currently waits for
    pub objective: PlayerObjective,
    pub position: Option<TilePosition>,
    /// Cards drawn during the running treasure distribution
    pub drawn_treasure_cards: Vec<TreasureCard>,
    /// Gold card the player may accept or decline
    pub offered_gold_card: Option<GoldCard>,
    /// Reachable tiles, empty unless a drive is possible right now
    pub drivable: BTreeSet<TilePosition>,
    pub drives_remaining: u32,
    /// Admissible hand cards per trail
    pub valid_path_cards: BTreeMap<TrailColor, Vec<CardId>>,
    /// Trails resolved to the tile the player stands on
    pub collectable_treasures: BTreeSet<TrailColor>,
    pub amulets: u32,
    pub can_collect_amulet: bool,
    pub hand: Vec<PathCard>,
    pub total_gold: u32,
    /// Candidate tiles per trail
    pub trail_candidates: BTreeMap<TrailColor, BTreeSet<TilePosition>>,
    /// Incremented on every publication
    pub revision: u64,
}

impl PlayerState {
    /// Snapshot of a player nobody has prompted yet
    pub fn idle(player: PlayerId) -> Self {
        Self {
            player,
            objective: PlayerObjective::Idle,
            position: None,
            drawn_treasure_cards: Vec::new(),
            offered_gold_card: None,
            drivable: BTreeSet::new(),
            drives_remaining: 0,
            valid_path_cards: BTreeMap::new(),
            collectable_treasures: BTreeSet::new(),
            amulets: 0,
            can_collect_amulet: false,
            hand: Vec::new(),
            total_gold: 0,
            trail_candidates: BTreeMap::new(),
            revision: 0,
        }
    }

    /// Whether the engine waits for this player
    pub fn is_prompted(&self) -> bool {
        self.objective != PlayerObjective::Idle
    }

    /// Any admissible (card, trail) pair
    pub fn playable_cards(&self) -> impl Iterator<Item = (CardId, TrailColor)> + '_ {
        self.valid_path_cards
            .iter()
            .flat_map(|(color, cards)| cards.iter().map(move |card| (*card, *color)))
    }
}
