//! Treasure trails, the deduction chains players build with path cards.
//!
//! Each trail starts out as the whole island. Every card appended to it keeps
//! only the tiles matching its predicate, so the candidate set shrinks until a
//! single tile (the treasure) remains. A card is only admissible if it makes
//! progress without eliminating every candidate.

use crate::cards::PathCard;
use crate::grid::HexGrid;
use crate::hex::TilePosition;
use crate::player::PlayerId;
use serde::{Deserialize, Serialize};
use std::cell::OnceCell;
use std::collections::BTreeSet;

/// The four trails on the board
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TrailColor {
    Gray,
    Brown,
    Black,
    White,
}

impl TrailColor {
    pub const ALL: [TrailColor; 4] = [
        TrailColor::Gray,
        TrailColor::Brown,
        TrailColor::Black,
        TrailColor::White,
    ];

    pub fn index(self) -> usize {
        self as usize
    }
}

/// Ordered cards of one trail plus the memoized candidate set
#[derive(Debug, Clone, Default)]
pub struct TreasureTrail {
    cards: Vec<PathCard>,
    resolved: OnceCell<BTreeSet<TilePosition>>,
}

impl TreasureTrail {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cards(&self) -> &[PathCard] {
        &self.cards
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    /// Candidate tiles left after applying every card in order
    pub fn evaluate(&self, grid: &HexGrid) -> &BTreeSet<TilePosition> {
        self.resolved.get_or_init(|| {
            self.cards
                .iter()
                .fold(grid.positions().collect(), |candidates, card| {
                    card.filter(grid, &candidates)
                })
        })
    }

    /// The treasure tile once the trail is down to one candidate
    pub fn treasure(&self, grid: &HexGrid) -> Option<TilePosition> {
        let resolved = self.evaluate(grid);
        if resolved.len() == 1 {
            resolved.first().copied()
        } else {
            None
        }
    }

    /// Any first card is admissible. Later cards must shrink the candidate
    /// set without emptying it.
    pub fn can_add(&self, grid: &HexGrid, card: &PathCard) -> bool {
        if self.cards.is_empty() {
            return true;
        }
        let current = self.evaluate(grid);
        let narrowed = card.filter(grid, current);
        !narrowed.is_empty() && narrowed.len() < current.len()
    }

    /// Append an admissible card. A rejected card is handed back untouched.
    pub fn add(&mut self, grid: &HexGrid, card: PathCard) -> Result<(), PathCard> {
        if !self.can_add(grid, &card) {
            return Err(card);
        }
        self.cards.push(card);
        self.resolved = OnceCell::new();
        Ok(())
    }

    pub fn clear(&mut self) {
        self.cards.clear();
        self.resolved = OnceCell::new();
    }

    /// Owners of the placed cards in placement order, one entry per card.
    /// Remove-tile cards have no owner and are skipped.
    pub fn contributors(&self) -> Vec<PlayerId> {
        self.cards.iter().filter_map(|card| card.owner).collect()
    }

    /// Forget the memoized candidates, required after the grid was replaced
    pub(crate) fn invalidate(&mut self) {
        self.resolved = OnceCell::new();
    }
}

/// One trail per colour
#[derive(Debug, Clone, Default)]
pub struct TreasureTrails {
    trails: [TreasureTrail; 4],
}

impl TreasureTrails {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, color: TrailColor) -> &TreasureTrail {
        &self.trails[color.index()]
    }

    pub fn get_mut(&mut self, color: TrailColor) -> &mut TreasureTrail {
        &mut self.trails[color.index()]
    }

    pub fn iter(&self) -> impl Iterator<Item = (TrailColor, &TreasureTrail)> {
        TrailColor::ALL.into_iter().zip(self.trails.iter())
    }

    pub(crate) fn invalidate_all(&mut self) {
        for trail in &mut self.trails {
            trail.invalidate();
        }
    }
}
