//! Island representation: tiles, edges, structures and their lookups.
//!
//! This module contains:
//! - Terrain and structure types
//! - The `HexGrid` with its position → tile and pair → edge maps
//! - `MapLayout`, the plain description a grid is built from, and a
//!   procedural island generator
//!
//! Positions without a tile are the ocean. Lookups return `None` for them,
//! which is an ordinary answer and not an error.

use crate::config::AreaPolicy;
use crate::error::GridError;
use crate::hex::{EdgeDirection, TilePosition};
use crate::spatial;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::warn;

/// Terrain of a land tile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TileType {
    Plains,
    Mountain,
    Jungle,
    River,
    Lake,
    Beach,
}

impl TileType {
    /// All terrain types
    pub const ALL: [TileType; 6] = [
        TileType::Plains,
        TileType::Mountain,
        TileType::Jungle,
        TileType::River,
        TileType::Lake,
        TileType::Beach,
    ];
}

/// Kind of landmark standing on a tile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum StructureKind {
    Hut,
    Palm,
    /// Spawns amulets along its facing direction
    Statue,
}

impl StructureKind {
    pub const ALL: [StructureKind; 3] = [StructureKind::Hut, StructureKind::Palm, StructureKind::Statue];
}

/// Index of a connected same-terrain area in the grid's area table
pub type AreaId = usize;

/// A single land tile
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tile {
    /// Position on the hex grid
    pub position: TilePosition,
    /// Terrain of this tile
    pub tile_type: TileType,
    /// Connected area this tile belongs to, assigned by the area pass
    pub(crate) area: Option<AreaId>,
    /// Whether an amulet lies on this tile
    pub(crate) has_amulet: bool,
}

impl Tile {
    pub fn new(position: TilePosition, tile_type: TileType) -> Self {
        Self {
            position,
            tile_type,
            area: None,
            has_amulet: false,
        }
    }

    pub fn area(&self) -> Option<AreaId> {
        self.area
    }

    pub fn has_amulet(&self) -> bool {
        self.has_amulet
    }
}

/// Unordered pair of adjacent positions.
///
/// Stored in canonical form (smaller position first) so both orientations of
/// the same edge compare equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Edge {
    a: TilePosition,
    b: TilePosition,
}

impl Edge {
    /// Create a new edge (automatically canonicalized)
    pub fn new(p1: TilePosition, p2: TilePosition) -> Self {
        if p1 <= p2 {
            Self { a: p1, b: p2 }
        } else {
            Self { a: p2, b: p1 }
        }
    }

    /// Both endpoints, smaller first
    pub fn positions(&self) -> [TilePosition; 2] {
        [self.a, self.b]
    }

    /// The endpoint that is not `position`
    pub fn other(&self, position: &TilePosition) -> Option<TilePosition> {
        if self.a == *position {
            Some(self.b)
        } else if self.b == *position {
            Some(self.a)
        } else {
            None
        }
    }
}

/// A landmark on a tile
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Structure {
    pub position: TilePosition,
    pub kind: StructureKind,
    /// Only statues face a direction
    facing: Option<EdgeDirection>,
}

impl Structure {
    pub fn hut(position: TilePosition) -> Self {
        Self {
            position,
            kind: StructureKind::Hut,
            facing: None,
        }
    }

    pub fn palm(position: TilePosition) -> Self {
        Self {
            position,
            kind: StructureKind::Palm,
            facing: None,
        }
    }

    pub fn statue(position: TilePosition, facing: EdgeDirection) -> Self {
        Self {
            position,
            kind: StructureKind::Statue,
            facing: Some(facing),
        }
    }

    /// Direction the statue is facing
    pub fn facing(&self) -> Option<EdgeDirection> {
        self.facing
    }

    /// Rotate a statue one step counter-clockwise. No-op for other kinds.
    pub fn turn(&mut self) {
        if let Some(facing) = self.facing.as_mut() {
            *facing = facing.counter_clockwise();
        }
    }
}

/// A maximal connected set of tiles sharing one terrain type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Area {
    pub id: AreaId,
    pub tile_type: TileType,
    pub positions: BTreeSet<TilePosition>,
}

impl Area {
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

/// Plain description of an island, the input for building a [`HexGrid`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapLayout {
    pub tiles: BTreeMap<TilePosition, TileType>,
    pub structures: BTreeMap<TilePosition, StructureKind>,
    /// Fixed statue facings; statues missing here face a random direction
    pub statue_facings: BTreeMap<TilePosition, EdgeDirection>,
}

impl MapLayout {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tile(mut self, position: TilePosition, tile_type: TileType) -> Self {
        self.tiles.insert(position, tile_type);
        self
    }

    pub fn with_structure(mut self, position: TilePosition, kind: StructureKind) -> Self {
        self.structures.insert(position, kind);
        self
    }

    pub fn with_statue(mut self, position: TilePosition, facing: EdgeDirection) -> Self {
        self.structures.insert(position, StructureKind::Statue);
        self.statue_facings.insert(position, facing);
        self
    }

    /// Generate a hexagonal island of the given radius.
    ///
    /// Terrain is grown from random seeds so neighbouring tiles tend to share
    /// a type, which gives the area cards something to work with. Roughly one
    /// tile in eight gets a structure, with at least one statue.
    pub fn generate<R: Rng>(radius: u32, rng: &mut R) -> Self {
        let center = TilePosition::new(0, 0);
        let positions: Vec<TilePosition> = center.spiral(radius).collect();

        let seed_count = (positions.len() / 5).max(TileType::ALL.len());
        let mut seeds: Vec<TilePosition> = positions.clone();
        seeds.shuffle(rng);
        seeds.truncate(seed_count);

        let mut layout = Self::new();
        for (i, seed) in seeds.iter().enumerate() {
            // Every terrain appears at least once
            let tile_type = if i < TileType::ALL.len() {
                TileType::ALL[i]
            } else {
                TileType::ALL[rng.gen_range(0..TileType::ALL.len())]
            };
            layout.tiles.insert(*seed, tile_type);
        }

        // Grow seeds outwards until every position has a terrain
        let mut frontier: Vec<TilePosition> = seeds;
        while layout.tiles.len() < positions.len() {
            frontier.shuffle(rng);
            let mut next = Vec::new();
            for position in frontier.drain(..) {
                let Some(&tile_type) = layout.tiles.get(&position) else {
                    continue;
                };
                for neighbor in position.neighbors() {
                    if center.distance_to(&neighbor) <= radius
                        && !layout.tiles.contains_key(&neighbor)
                    {
                        layout.tiles.insert(neighbor, tile_type);
                        next.push(neighbor);
                    }
                }
            }
            frontier = next;
        }

        let mut structure_spots = positions;
        structure_spots.shuffle(rng);
        let structure_count = (structure_spots.len() / 8).max(1);
        for (i, position) in structure_spots.into_iter().take(structure_count).enumerate() {
            let kind = if i == 0 {
                StructureKind::Statue
            } else {
                StructureKind::ALL[rng.gen_range(0..StructureKind::ALL.len())]
            };
            layout.structures.insert(position, kind);
        }

        layout
    }

    /// Build the grid, choosing facings for statues without one
    pub fn build<R: Rng>(&self, policy: AreaPolicy, rng: &mut R) -> Result<HexGrid, GridError> {
        let structures = self.structures.iter().map(|(&position, &kind)| match kind {
            StructureKind::Hut => Structure::hut(position),
            StructureKind::Palm => Structure::palm(position),
            StructureKind::Statue => {
                let facing = self.statue_facings.get(&position).copied().unwrap_or_else(|| {
                    EdgeDirection::ALL[rng.gen_range(0..EdgeDirection::ALL.len())]
                });
                Structure::statue(position, facing)
            }
        });
        let structures: Vec<Structure> = structures.collect();
        HexGrid::new(self.tiles.clone(), structures, policy)
    }
}

/// The island
#[derive(Debug, Clone)]
pub struct HexGrid {
    /// All tiles indexed by position
    tiles: BTreeMap<TilePosition, Tile>,
    /// Every pair of adjacent tiles
    edges: BTreeSet<Edge>,
    /// Landmarks indexed by position
    structures: BTreeMap<TilePosition, Structure>,
    /// All connected areas, indexed by `AreaId`
    areas: Vec<Area>,
    /// Largest area per terrain type
    biggest_areas: BTreeMap<TileType, AreaId>,
}

impl HexGrid {
    /// Build a grid from terrain and structures.
    ///
    /// Edges are derived from tile adjacency and areas are computed once.
    /// Structures placed in the ocean are ignored.
    pub fn new(
        tiles: impl IntoIterator<Item = (TilePosition, TileType)>,
        structures: impl IntoIterator<Item = Structure>,
        policy: AreaPolicy,
    ) -> Result<Self, GridError> {
        let tiles: BTreeMap<TilePosition, Tile> = tiles
            .into_iter()
            .map(|(position, tile_type)| (position, Tile::new(position, tile_type)))
            .collect();

        let mut grid = Self {
            tiles,
            edges: BTreeSet::new(),
            structures: BTreeMap::new(),
            areas: Vec::new(),
            biggest_areas: BTreeMap::new(),
        };

        for structure in structures {
            if grid.tiles.contains_key(&structure.position) {
                grid.structures.insert(structure.position, structure);
            } else {
                warn!("Ignoring structure placed in the ocean at {}", structure.position);
            }
        }

        grid.init_edges();
        grid.init_areas(policy)?;
        Ok(grid)
    }

    fn init_edges(&mut self) {
        for position in self.tiles.keys() {
            for neighbor in position.neighbors() {
                if self.tiles.contains_key(&neighbor) {
                    self.edges.insert(Edge::new(*position, neighbor));
                }
            }
        }
    }

    fn init_areas(&mut self, policy: AreaPolicy) -> Result<(), GridError> {
        let index = spatial::compute_areas(&self.tiles, &self.edges, policy)?;
        for area in &index.areas {
            for position in &area.positions {
                if let Some(tile) = self.tiles.get_mut(position) {
                    tile.area = Some(area.id);
                }
            }
        }
        self.areas = index.areas;
        self.biggest_areas = index.biggest;
        Ok(())
    }

    // ==================== Tiles ====================

    pub fn tiles(&self) -> impl Iterator<Item = &Tile> {
        self.tiles.values()
    }

    pub fn positions(&self) -> impl Iterator<Item = TilePosition> + '_ {
        self.tiles.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    /// The tile at a position, `None` for the ocean
    pub fn tile(&self, position: &TilePosition) -> Option<&Tile> {
        self.tiles.get(position)
    }

    pub fn contains(&self, position: &TilePosition) -> bool {
        self.tiles.contains_key(position)
    }

    /// Tiles sharing an edge with `position`
    pub fn neighbors(&self, position: &TilePosition) -> Vec<&Tile> {
        position
            .neighbors()
            .iter()
            .filter_map(|neighbor| self.tiles.get(neighbor))
            .collect()
    }

    /// The tile in one direction, `None` for the ocean
    pub fn neighbor(&self, position: &TilePosition, direction: EdgeDirection) -> Option<&Tile> {
        self.tiles.get(&position.neighbor(direction))
    }

    /// Neighbours reachable over one of the given edges
    pub fn connected_neighbors(
        &self,
        position: &TilePosition,
        edges: &BTreeSet<Edge>,
    ) -> Vec<TilePosition> {
        position
            .neighbors()
            .into_iter()
            .filter(|neighbor| {
                self.tiles.contains_key(neighbor) && edges.contains(&Edge::new(*position, *neighbor))
            })
            .collect()
    }

    /// Whether any side of the tile faces the ocean
    pub fn is_at_coast(&self, position: &TilePosition) -> bool {
        self.contains(position) && self.neighbors(position).len() < 6
    }

    // ==================== Edges ====================

    pub fn edges(&self) -> &BTreeSet<Edge> {
        &self.edges
    }

    pub fn edge(&self, p1: &TilePosition, p2: &TilePosition) -> Option<&Edge> {
        self.edges.get(&Edge::new(*p1, *p2))
    }

    /// Edges touching the tile at `position`
    pub fn edges_of(&self, position: &TilePosition) -> Vec<Edge> {
        position
            .neighbors()
            .iter()
            .filter_map(|neighbor| self.edge(position, neighbor).copied())
            .collect()
    }

    /// Edges whose both endpoints are in `positions`
    pub fn edges_within(&self, positions: &BTreeSet<TilePosition>) -> BTreeSet<Edge> {
        self.edges
            .iter()
            .filter(|edge| edge.positions().iter().all(|p| positions.contains(p)))
            .copied()
            .collect()
    }

    // ==================== Structures ====================

    pub fn structures(&self) -> impl Iterator<Item = &Structure> {
        self.structures.values()
    }

    pub fn structure(&self, position: &TilePosition) -> Option<&Structure> {
        self.structures.get(position)
    }

    pub(crate) fn structures_mut(&mut self) -> impl Iterator<Item = &mut Structure> {
        self.structures.values_mut()
    }

    // ==================== Areas ====================

    pub fn areas(&self) -> &[Area] {
        &self.areas
    }

    pub fn area(&self, id: AreaId) -> Option<&Area> {
        self.areas.get(id)
    }

    /// The area the tile at `position` belongs to
    pub fn area_of(&self, position: &TilePosition) -> Option<&Area> {
        self.tile(position)?.area.and_then(|id| self.areas.get(id))
    }

    /// Largest area of a terrain type, if that terrain exists
    pub fn biggest_area(&self, tile_type: TileType) -> Option<&Area> {
        self.biggest_areas.get(&tile_type).and_then(|id| self.areas.get(*id))
    }

    /// Whether the tile lies in the biggest area of `tile_type`
    pub fn in_biggest_area(&self, position: &TilePosition, tile_type: TileType) -> bool {
        match (self.tile(position).and_then(|t| t.area), self.biggest_areas.get(&tile_type)) {
            (Some(area), Some(biggest)) => area == *biggest,
            _ => false,
        }
    }

    // ==================== Amulets ====================

    pub fn amulet_positions(&self) -> BTreeSet<TilePosition> {
        self.tiles
            .values()
            .filter(|tile| tile.has_amulet)
            .map(|tile| tile.position)
            .collect()
    }

    pub(crate) fn place_amulet(&mut self, position: &TilePosition) -> bool {
        match self.tiles.get_mut(position) {
            Some(tile) => {
                tile.has_amulet = true;
                true
            }
            None => false,
        }
    }

    /// Remove the amulet at `position`, returning whether there was one
    pub(crate) fn take_amulet(&mut self, position: &TilePosition) -> bool {
        match self.tiles.get_mut(position) {
            Some(tile) if tile.has_amulet => {
                tile.has_amulet = false;
                true
            }
            _ => false,
        }
    }
}
