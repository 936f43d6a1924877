//! Graph algorithms over the island.
//!
//! - Connected same-terrain areas and the biggest area per terrain
//! - Bounded-radius visibility predicates (`next_to`, `can_see`)
//! - Dijkstra shortest path over an arbitrary edge subset
//! - Statue ray casting for amulet placement

use crate::config::AreaPolicy;
use crate::error::GridError;
use crate::grid::{Area, AreaId, Edge, HexGrid, Structure, Tile, TileType};
use crate::hex::TilePosition;
use std::cmp::Reverse;
use std::collections::{BTreeMap, BTreeSet, BinaryHeap, HashMap};
use tracing::{debug, warn};

/// Result of the area pass
#[derive(Debug, Clone, Default)]
pub(crate) struct AreaIndex {
    pub areas: Vec<Area>,
    pub biggest: BTreeMap<TileType, AreaId>,
}

/// Partition the tiles into maximal connected same-terrain components.
///
/// Tiles are visited in position order, so the first tile of each component
/// is also its smallest position and lower area ids belong to components with
/// lower positions.
pub(crate) fn compute_areas(
    tiles: &BTreeMap<TilePosition, Tile>,
    edges: &BTreeSet<Edge>,
    policy: AreaPolicy,
) -> Result<AreaIndex, GridError> {
    let mut index = AreaIndex::default();
    let mut visited: BTreeSet<TilePosition> = BTreeSet::new();
    // (area, size, tied at this size)
    let mut leaders: BTreeMap<TileType, (AreaId, usize, bool)> = BTreeMap::new();

    for (start, tile) in tiles {
        if !visited.insert(*start) {
            continue;
        }

        let mut positions = BTreeSet::new();
        let mut stack = vec![*start];
        while let Some(current) = stack.pop() {
            positions.insert(current);
            for neighbor in current.neighbors() {
                let same_type = tiles
                    .get(&neighbor)
                    .is_some_and(|t| t.tile_type == tile.tile_type);
                if same_type
                    && edges.contains(&Edge::new(current, neighbor))
                    && visited.insert(neighbor)
                {
                    stack.push(neighbor);
                }
            }
        }

        let id = index.areas.len();
        let size = positions.len();
        index.areas.push(Area {
            id,
            tile_type: tile.tile_type,
            positions,
        });

        match leaders.get_mut(&tile.tile_type) {
            Some(leader) if size > leader.1 => *leader = (id, size, false),
            Some(leader) if size == leader.1 => leader.2 = true,
            Some(_) => {}
            None => {
                leaders.insert(tile.tile_type, (id, size, false));
            }
        }
    }

    for (tile_type, (id, size, tied)) in leaders {
        if tied {
            match policy {
                AreaPolicy::Reject => {
                    return Err(GridError::AmbiguousBiggestArea { tile_type, size });
                }
                AreaPolicy::LowestPosition => {
                    warn!(
                        "Two {:?} areas share the largest size {}, keeping the lowest position",
                        tile_type, size
                    );
                }
            }
        }
        index.biggest.insert(tile_type, id);
    }

    debug!("Computed {} areas", index.areas.len());
    Ok(index)
}

impl HexGrid {
    /// Whether `predicate` holds for any position within `1..=radius` steps.
    ///
    /// Ocean positions are passed as `None`. The centre is not part of its
    /// own surroundings.
    pub fn is_near<F>(&self, position: &TilePosition, radius: u32, predicate: F) -> bool
    where
        F: Fn(Option<&Tile>) -> bool,
    {
        position
            .surroundings(radius)
            .any(|p| predicate(self.tile(&p)))
    }

    /// [`Self::is_near`] with radius 1
    pub fn next_to<F>(&self, position: &TilePosition, predicate: F) -> bool
    where
        F: Fn(Option<&Tile>) -> bool,
    {
        self.is_near(position, 1, predicate)
    }

    /// [`Self::is_near`] with radius 2
    pub fn can_see<F>(&self, position: &TilePosition, predicate: F) -> bool
    where
        F: Fn(Option<&Tile>) -> bool,
    {
        self.is_near(position, 2, predicate)
    }

    /// Cheapest route from `start` to `target` using only `edges`.
    ///
    /// Both endpoints are included. Returns an empty route when the target is
    /// unreachable or either endpoint is not on the island. Equal-cost
    /// candidates are expanded in the order they were queued.
    pub fn find_path<F>(
        &self,
        start: &TilePosition,
        target: &TilePosition,
        edges: &BTreeSet<Edge>,
        cost: F,
    ) -> Vec<TilePosition>
    where
        F: Fn(TilePosition, TilePosition) -> u32,
    {
        if !self.contains(start) || !self.contains(target) {
            return Vec::new();
        }
        if start == target {
            return vec![*start];
        }

        let mut queue = BinaryHeap::new();
        let mut distances: HashMap<TilePosition, u32> = HashMap::new();
        let mut previous: HashMap<TilePosition, TilePosition> = HashMap::new();
        let mut sequence: u64 = 0;

        distances.insert(*start, 0);
        queue.push(Reverse((0u32, sequence, *start)));

        while let Some(Reverse((distance, _, current))) = queue.pop() {
            if current == *target {
                break;
            }
            if distances.get(&current).is_some_and(|d| distance > *d) {
                continue;
            }

            for neighbor in self.connected_neighbors(&current, edges) {
                let candidate = distance.saturating_add(cost(current, neighbor));
                let better = distances.get(&neighbor).map_or(true, |d| candidate < *d);
                if better {
                    distances.insert(neighbor, candidate);
                    previous.insert(neighbor, current);
                    sequence += 1;
                    queue.push(Reverse((candidate, sequence, neighbor)));
                }
            }
        }

        if !previous.contains_key(target) {
            return Vec::new();
        }

        let mut path = vec![*target];
        let mut current = *target;
        while let Some(&before) = previous.get(&current) {
            path.push(before);
            current = before;
        }
        path.reverse();
        path
    }

    /// Tiles a player standing on `position` may drive to: its own area and
    /// its direct neighbours, excluding the tile itself.
    pub fn drivable_from(&self, position: &TilePosition) -> BTreeSet<TilePosition> {
        let mut drivable: BTreeSet<TilePosition> = self
            .area_of(position)
            .map(|area| area.positions.clone())
            .unwrap_or_default();
        drivable.extend(self.neighbors(position).iter().map(|tile| tile.position));
        drivable.remove(position);
        drivable
    }

    /// Last land tile in the statue's facing direction, `None` if the very
    /// first step already leaves the island.
    pub fn amulet_target(&self, statue: &Structure) -> Option<TilePosition> {
        let facing = statue.facing()?;
        let mut current = statue.position;
        while let Some(next) = self.neighbor(&current, facing) {
            current = next.position;
        }
        (current != statue.position).then_some(current)
    }

    /// Let every statue spawn an amulet, then rotate all statues one step
    /// counter-clockwise. Returns the positions that received an amulet.
    pub fn spawn_amulets(&mut self) -> Vec<TilePosition> {
        let targets: Vec<TilePosition> = self
            .structures()
            .filter_map(|structure| self.amulet_target(structure))
            .collect();

        let mut spawned = Vec::with_capacity(targets.len());
        for target in targets {
            if self.place_amulet(&target) {
                spawned.push(target);
            }
        }
        for structure in self.structures_mut() {
            structure.turn();
        }
        debug!("Statues spawned {} amulets", spawned.len());
        spawned
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::StructureKind;
    use crate::hex::EdgeDirection;
    use pretty_assertions::assert_eq;

    fn grid(tiles: &[((i32, i32), TileType)], policy: AreaPolicy) -> Result<HexGrid, GridError> {
        HexGrid::new(
            tiles
                .iter()
                .map(|((q, r), t)| (TilePosition::new(*q, *r), *t)),
            Vec::new(),
            policy,
        )
    }

    fn row(len: i32) -> HexGrid {
        let tiles: Vec<_> = (0..len).map(|q| ((q, 0), TileType::Plains)).collect();
        grid(&tiles, AreaPolicy::LowestPosition).unwrap()
    }

    #[test]
    fn test_biggest_area_of_two_clusters() {
        let grid = grid(
            &[
                ((0, 0), TileType::Plains),
                ((1, 0), TileType::Plains),
                ((2, 0), TileType::Plains),
                ((3, 0), TileType::Lake),
                ((4, 0), TileType::Plains),
                ((5, 0), TileType::Plains),
            ],
            AreaPolicy::Reject,
        )
        .unwrap();

        let biggest = grid.biggest_area(TileType::Plains).unwrap();
        assert_eq!(biggest.len(), 3);
        assert!(grid.in_biggest_area(&TilePosition::new(1, 0), TileType::Plains));
        assert!(!grid.in_biggest_area(&TilePosition::new(4, 0), TileType::Plains));
        assert_eq!(grid.areas().len(), 3);
    }

    #[test]
    fn test_areas_partition_tiles() {
        let grid = grid(
            &[
                ((0, 0), TileType::Jungle),
                ((1, 0), TileType::Lake),
                ((0, 1), TileType::Jungle),
                ((1, -1), TileType::Jungle),
                ((-1, 1), TileType::Lake),
            ],
            AreaPolicy::LowestPosition,
        )
        .unwrap();

        let mut seen = BTreeSet::new();
        for area in grid.areas() {
            for position in &area.positions {
                assert!(seen.insert(*position));
                assert_eq!(grid.tile(position).unwrap().tile_type, area.tile_type);
                assert_eq!(grid.tile(position).unwrap().area(), Some(area.id));
            }
        }
        assert_eq!(seen.len(), grid.len());
        assert_eq!(grid.biggest_area(TileType::Jungle).unwrap().len(), 3);
    }

    #[test]
    fn test_tied_biggest_area_policies() {
        let tiles = [
            ((0, 0), TileType::Beach),
            ((1, 0), TileType::Mountain),
            ((2, 0), TileType::Beach),
        ];

        let rejected = grid(&tiles, AreaPolicy::Reject);
        assert_eq!(
            rejected.unwrap_err(),
            GridError::AmbiguousBiggestArea {
                tile_type: TileType::Beach,
                size: 1
            }
        );

        let lenient = grid(&tiles, AreaPolicy::LowestPosition).unwrap();
        assert!(lenient.in_biggest_area(&TilePosition::new(0, 0), TileType::Beach));
        assert!(!lenient.in_biggest_area(&TilePosition::new(2, 0), TileType::Beach));
    }

    #[test]
    fn test_smaller_tie_does_not_reject() {
        let tiles = [
            ((0, 0), TileType::Beach),
            ((1, 0), TileType::Mountain),
            ((2, 0), TileType::Beach),
            ((3, 0), TileType::Lake),
            ((4, 0), TileType::Beach),
            ((5, 0), TileType::Beach),
        ];
        assert!(grid(&tiles, AreaPolicy::Reject).is_ok());
    }

    #[test]
    fn test_next_to_and_can_see_handle_ocean() {
        let grid = grid(
            &[
                ((0, 0), TileType::Plains),
                ((1, 0), TileType::Plains),
                ((2, 0), TileType::Lake),
            ],
            AreaPolicy::LowestPosition,
        )
        .unwrap();
        let origin = TilePosition::new(0, 0);
        let is_lake = |t: Option<&Tile>| t.is_some_and(|t| t.tile_type == TileType::Lake);

        assert!(!grid.next_to(&origin, is_lake));
        assert!(grid.can_see(&origin, is_lake));
        assert!(grid.next_to(&origin, |t| t.is_none()));
        // The centre is not its own neighbour
        assert!(!grid.next_to(&TilePosition::new(2, 0), is_lake));
    }

    #[test]
    fn test_find_path_trivial_cases() {
        let grid = row(4);
        let start = TilePosition::new(0, 0);
        assert_eq!(grid.find_path(&start, &start, grid.edges(), |_, _| 1), vec![start]);
        assert!(grid
            .find_path(&start, &TilePosition::new(9, 9), grid.edges(), |_, _| 1)
            .is_empty());

        let none = BTreeSet::new();
        assert!(grid
            .find_path(&start, &TilePosition::new(3, 0), &none, |_, _| 1)
            .is_empty());
    }

    #[test]
    fn test_find_path_uniform_cost_matches_distance() {
        let tiles: Vec<_> = TilePosition::new(0, 0)
            .spiral(3)
            .map(|p| ((p.q, p.r), TileType::Jungle))
            .collect();
        let grid = grid(&tiles, AreaPolicy::LowestPosition).unwrap();

        let start = TilePosition::new(-3, 0);
        let target = TilePosition::new(3, -2);
        let path = grid.find_path(&start, &target, grid.edges(), |_, _| 1);
        assert_eq!(path.len() as u32, start.distance_to(&target) + 1);
        assert_eq!(path.first(), Some(&start));
        assert_eq!(path.last(), Some(&target));
        for pair in path.windows(2) {
            assert!(pair[0].is_adjacent(&pair[1]));
        }
    }

    #[test]
    fn test_find_path_prefers_cheaper_detour() {
        // Triangle: direct edge is expensive, the detour over (1, -1) is cheap
        let grid = grid(
            &[
                ((0, 0), TileType::Plains),
                ((1, 0), TileType::Plains),
                ((1, -1), TileType::Plains),
            ],
            AreaPolicy::LowestPosition,
        )
        .unwrap();
        let a = TilePosition::new(0, 0);
        let b = TilePosition::new(1, 0);
        let via = TilePosition::new(1, -1);
        let cost = |x: TilePosition, y: TilePosition| {
            if Edge::new(x, y) == Edge::new(a, b) {
                10
            } else {
                1
            }
        };
        assert_eq!(grid.find_path(&a, &b, grid.edges(), cost), vec![a, via, b]);
    }

    #[test]
    fn test_statue_ray_cast_three_tiles() {
        let statue = TilePosition::new(0, 0);
        let mut grid = HexGrid::new(
            (0..4).map(|q| (TilePosition::new(q, 0), TileType::Beach)),
            [Structure::statue(statue, EdgeDirection::East)],
            AreaPolicy::LowestPosition,
        )
        .unwrap();

        let spawned = grid.spawn_amulets();
        assert_eq!(spawned, vec![TilePosition::new(3, 0)]);
        assert!(grid.tile(&TilePosition::new(3, 0)).unwrap().has_amulet());
        assert_eq!(
            grid.structure(&statue).unwrap().facing(),
            Some(EdgeDirection::NorthEast)
        );
    }

    #[test]
    fn test_statue_facing_ocean_places_nothing() {
        let statue = TilePosition::new(0, 0);
        let mut grid = HexGrid::new(
            [
                (statue, TileType::Mountain),
                (TilePosition::new(1, 0), TileType::Mountain),
            ],
            [Structure::statue(statue, EdgeDirection::West)],
            AreaPolicy::LowestPosition,
        )
        .unwrap();

        assert!(grid.spawn_amulets().is_empty());
        assert!(grid.amulet_positions().is_empty());
        let turned = grid.structure(&statue).unwrap();
        assert_eq!(turned.kind, StructureKind::Statue);
        assert_eq!(turned.facing(), Some(EdgeDirection::SouthWest));
    }

    #[test]
    fn test_drivable_is_area_plus_neighbors() {
        let grid = grid(
            &[
                ((0, 0), TileType::Plains),
                ((1, 0), TileType::Plains),
                ((2, 0), TileType::Plains),
                ((-1, 0), TileType::Lake),
                ((5, 5), TileType::Lake),
            ],
            AreaPolicy::LowestPosition,
        )
        .unwrap();
        let drivable = grid.drivable_from(&TilePosition::new(0, 0));
        let expected: BTreeSet<_> = [
            TilePosition::new(-1, 0),
            TilePosition::new(1, 0),
            TilePosition::new(2, 0),
        ]
        .into();
        assert_eq!(drivable, expected);
    }
}
