//! Path cards and the treasure deck.
//!
//! This module contains:
//! - `CardType` and `FilterType`, the two halves of a clue
//! - `PathCard`, a tagged union of clue cards and remove-tile cards, with the
//!   pure predicate each kind describes
//! - Treasure cards and the deck they are drawn from

use crate::config::GameConfig;
use crate::error::IllegalAction;
use crate::grid::{HexGrid, StructureKind, Tile, TileType};
use crate::hex::TilePosition;
use crate::player::PlayerId;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Opaque identifier of a path card, unique within one game
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CardId(pub u32);

impl fmt::Display for CardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Geographic constraint a clue describes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CardType {
    /// Tile has the given terrain
    InArea,
    /// Tile lies in the biggest area of the given terrain
    InBiggestArea,
    /// A direct neighbour matches the filter
    NextTo,
    /// A tile within two steps matches the filter
    CanSee,
    NotInArea,
    NotInBiggestArea,
    NotNextTo,
    NotCanSee,
}

impl CardType {
    pub const ALL: [CardType; 8] = [
        CardType::InArea,
        CardType::InBiggestArea,
        CardType::NextTo,
        CardType::CanSee,
        CardType::NotInArea,
        CardType::NotInBiggestArea,
        CardType::NotNextTo,
        CardType::NotCanSee,
    ];

    /// The positive card type this one negates, or itself
    pub fn base(self) -> CardType {
        match self {
            CardType::NotInArea => CardType::InArea,
            CardType::NotInBiggestArea => CardType::InBiggestArea,
            CardType::NotNextTo => CardType::NextTo,
            CardType::NotCanSee => CardType::CanSee,
            other => other,
        }
    }

    pub fn is_negated(self) -> bool {
        self.base() != self
    }

    /// Area cards only accept terrain filters
    pub fn is_area(self) -> bool {
        matches!(self.base(), CardType::InArea | CardType::InBiggestArea)
    }

    /// Filters a randomly drawn card of this type may carry
    pub fn filter_candidates(self) -> Vec<FilterType> {
        let mut candidates: Vec<FilterType> =
            TileType::ALL.iter().copied().map(FilterType::Terrain).collect();
        if !self.is_area() {
            candidates.push(FilterType::Ocean);
            candidates.extend(StructureKind::ALL.iter().copied().map(FilterType::Structure));
        }
        candidates
    }
}

/// What a clue refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FilterType {
    Terrain(TileType),
    Ocean,
    Structure(StructureKind),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PathCardKind {
    Clue {
        card_type: CardType,
        filter: FilterType,
    },
    /// Excludes a single tile, created by the remove-tile amulet
    RemoveTile(TilePosition),
}

/// A card narrowing down a treasure trail
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathCard {
    pub id: CardId,
    /// The player who placed the card, `None` for remove-tile cards
    pub owner: Option<PlayerId>,
    pub kind: PathCardKind,
}

impl PathCard {
    /// Create a clue card, rejecting non-terrain filters on area cards
    pub fn clue(
        id: CardId,
        owner: PlayerId,
        card_type: CardType,
        filter: FilterType,
    ) -> Result<Self, IllegalAction> {
        if card_type.is_area() && !matches!(filter, FilterType::Terrain(_)) {
            return Err(IllegalAction::InvalidCardFilter);
        }
        Ok(Self {
            id,
            owner: Some(owner),
            kind: PathCardKind::Clue { card_type, filter },
        })
    }

    pub fn remove_tile(id: CardId, position: TilePosition) -> Self {
        Self {
            id,
            owner: None,
            kind: PathCardKind::RemoveTile(position),
        }
    }

    /// Draw a random clue: a random card type first, then one of the filters
    /// that type accepts.
    pub fn random<R: Rng>(id: CardId, owner: PlayerId, rng: &mut R) -> Self {
        let card_type = CardType::ALL[rng.gen_range(0..CardType::ALL.len())];
        let candidates = card_type.filter_candidates();
        let filter = candidates[rng.gen_range(0..candidates.len())];
        Self {
            id,
            owner: Some(owner),
            kind: PathCardKind::Clue { card_type, filter },
        }
    }

    /// Whether the treasure may lie on `tile` according to this card
    pub fn matches(&self, grid: &HexGrid, tile: &Tile) -> bool {
        match self.kind {
            PathCardKind::RemoveTile(removed) => tile.position != removed,
            PathCardKind::Clue { card_type, filter } => {
                clue_holds(grid, tile, card_type.base(), filter) != card_type.is_negated()
            }
        }
    }

    /// The subset of `candidates` this card keeps
    pub fn filter(
        &self,
        grid: &HexGrid,
        candidates: &BTreeSet<TilePosition>,
    ) -> BTreeSet<TilePosition> {
        candidates
            .iter()
            .filter(|position| grid.tile(position).is_some_and(|tile| self.matches(grid, tile)))
            .copied()
            .collect()
    }
}

impl fmt::Display for PathCard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            PathCardKind::Clue { card_type, filter } => {
                write!(f, "{} {:?}({:?})", self.id, card_type, filter)
            }
            PathCardKind::RemoveTile(position) => write!(f, "{} RemoveTile{}", self.id, position),
        }
    }
}

/// Evaluate the positive form of a clue
fn clue_holds(grid: &HexGrid, tile: &Tile, card_type: CardType, filter: FilterType) -> bool {
    let position = &tile.position;
    match (card_type, filter) {
        (CardType::InArea, FilterType::Terrain(t)) => tile.tile_type == t,
        (CardType::InBiggestArea, FilterType::Terrain(t)) => grid.in_biggest_area(position, t),
        (CardType::NextTo | CardType::CanSee, FilterType::Terrain(t)) => {
            let radius = sight_radius(card_type);
            tile.tile_type != t
                && grid.is_near(position, radius, |n| n.is_some_and(|n| n.tile_type == t))
        }
        (CardType::NextTo | CardType::CanSee, FilterType::Ocean) => {
            grid.is_near(position, sight_radius(card_type), |n| n.is_none())
        }
        (CardType::NextTo, FilterType::Structure(kind)) => {
            grid.next_to(position, |n| has_structure(grid, n, kind))
        }
        (CardType::CanSee, FilterType::Structure(kind)) => {
            !has_structure(grid, Some(tile), kind)
                && grid.can_see(position, |n| has_structure(grid, n, kind))
        }
        // Rejected at construction
        _ => false,
    }
}

fn sight_radius(card_type: CardType) -> u32 {
    if card_type == CardType::CanSee {
        2
    } else {
        1
    }
}

fn has_structure(grid: &HexGrid, tile: Option<&Tile>, kind: StructureKind) -> bool {
    tile.and_then(|t| grid.structure(&t.position))
        .is_some_and(|s| s.kind == kind)
}

/// A gold card and its value
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GoldCard {
    pub value: u8,
}

impl GoldCard {
    pub fn new(value: u8) -> Self {
        Self { value }
    }

    pub fn random<R: Rng>(max_value: u8, rng: &mut R) -> Self {
        Self::new(rng.gen_range(1..=max_value.max(1)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TreasureCard {
    Gold(GoldCard),
    Curse,
}

impl TreasureCard {
    pub fn is_curse(&self) -> bool {
        matches!(self, TreasureCard::Curse)
    }
}

/// Stack of treasure cards, the top is the end of the vector
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreasureDeck {
    cards: Vec<TreasureCard>,
    max_gold_card_value: u8,
}

impl TreasureDeck {
    /// Lower pile of gold and curse cards shuffled together, with the
    /// curse-free top pile placed on top of it
    pub fn new<R: Rng>(config: &GameConfig, rng: &mut R) -> Self {
        let gold = |count: usize, rng: &mut R| -> Vec<TreasureCard> {
            (0..count)
                .map(|_| TreasureCard::Gold(GoldCard::random(config.max_gold_card_value, rng)))
                .collect()
        };

        let mut cards = Vec::with_capacity(config.deck_size());
        cards.extend(gold(config.lower_pile_gold_cards, rng));
        cards.extend(std::iter::repeat(TreasureCard::Curse).take(config.curse_cards));
        cards.shuffle(rng);
        cards.extend(gold(config.top_pile_gold_cards, rng));

        Self {
            cards,
            max_gold_card_value: config.max_gold_card_value,
        }
    }

    /// Deck with fixed contents, the last card is drawn first
    pub fn from_cards(cards: Vec<TreasureCard>, max_gold_card_value: u8) -> Self {
        Self {
            cards,
            max_gold_card_value,
        }
    }

    /// Pop the top card. An empty deck yields a fresh random gold card.
    pub fn draw<R: Rng>(&mut self, rng: &mut R) -> TreasureCard {
        self.cards
            .pop()
            .unwrap_or_else(|| TreasureCard::Gold(GoldCard::random(self.max_gold_card_value, rng)))
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    /// Remaining cards, bottom first
    pub fn cards(&self) -> &[TreasureCard] {
        &self.cards
    }
}
