//! Hex coordinate system using axial coordinates (q, r).
//!
//! `TilePosition` identifies a single hex on the island and is used as the map
//! key everywhere. Positions without a tile are the ocean.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Direction of an edge relative to a hex
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EdgeDirection {
    /// Northeast edge (top-right)
    NorthEast,
    /// East edge (right)
    East,
    /// Southeast edge (bottom-right)
    SouthEast,
    /// Southwest edge (bottom-left)
    SouthWest,
    /// West edge (left)
    West,
    /// Northwest edge (top-left)
    NorthWest,
}

impl EdgeDirection {
    /// All edge directions in clockwise order starting from NorthEast
    pub const ALL: [EdgeDirection; 6] = [
        EdgeDirection::NorthEast,
        EdgeDirection::East,
        EdgeDirection::SouthEast,
        EdgeDirection::SouthWest,
        EdgeDirection::West,
        EdgeDirection::NorthWest,
    ];

    fn index(self) -> usize {
        self as usize
    }

    /// The next direction clockwise
    pub fn clockwise(self) -> Self {
        Self::ALL[(self.index() + 1) % 6]
    }

    /// The next direction counter-clockwise (the previous entry of [`Self::ALL`])
    pub fn counter_clockwise(self) -> Self {
        Self::ALL[(self.index() + 5) % 6]
    }

    /// The direction pointing the other way
    pub fn opposite(self) -> Self {
        Self::ALL[(self.index() + 3) % 6]
    }
}

/// Axial coordinate of a tile.
///
/// In axial coordinates:
/// - `q` increases going east (right)
/// - `r` increases going southeast
/// - The third coordinate `s` (not stored) satisfies: q + r + s = 0
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
pub struct TilePosition {
    /// Column (increases going east)
    pub q: i32,
    /// Row (increases going southeast)
    pub r: i32,
}

impl TilePosition {
    /// Create a new position
    pub const fn new(q: i32, r: i32) -> Self {
        Self { q, r }
    }

    /// The implicit third coordinate (s = -q - r)
    pub const fn s(&self) -> i32 {
        -self.q - self.r
    }

    /// The six neighboring positions in [`EdgeDirection::ALL`] order
    pub fn neighbors(&self) -> [TilePosition; 6] {
        EdgeDirection::ALL.map(|dir| self.neighbor(dir))
    }

    /// Get the neighbor in a specific direction
    pub fn neighbor(&self, direction: EdgeDirection) -> TilePosition {
        match direction {
            EdgeDirection::East => TilePosition::new(self.q + 1, self.r),
            EdgeDirection::NorthEast => TilePosition::new(self.q + 1, self.r - 1),
            EdgeDirection::NorthWest => TilePosition::new(self.q, self.r - 1),
            EdgeDirection::West => TilePosition::new(self.q - 1, self.r),
            EdgeDirection::SouthWest => TilePosition::new(self.q - 1, self.r + 1),
            EdgeDirection::SouthEast => TilePosition::new(self.q, self.r + 1),
        }
    }

    /// Distance to another position (in hex steps)
    pub fn distance_to(&self, other: &TilePosition) -> u32 {
        let dq = (self.q - other.q).abs();
        let dr = (self.r - other.r).abs();
        let ds = (self.s() - other.s()).abs();
        ((dq + dr + ds) / 2) as u32
    }

    /// Whether the two positions share an edge
    pub fn is_adjacent(&self, other: &TilePosition) -> bool {
        self.distance_to(other) == 1
    }

    /// All positions at exactly `radius` steps, walking the ring clockwise.
    ///
    /// A radius of 0 yields the position itself.
    pub fn ring(&self, radius: u32) -> Vec<TilePosition> {
        if radius == 0 {
            return vec![*self];
        }

        let mut ring = Vec::with_capacity(6 * radius as usize);
        // Start at the West corner and walk each side once
        let mut current = *self;
        for _ in 0..radius {
            current = current.neighbor(EdgeDirection::West);
        }
        for direction in [
            EdgeDirection::NorthEast,
            EdgeDirection::East,
            EdgeDirection::SouthEast,
            EdgeDirection::SouthWest,
            EdgeDirection::West,
            EdgeDirection::NorthWest,
        ] {
            for _ in 0..radius {
                ring.push(current);
                current = current.neighbor(direction);
            }
        }
        ring
    }

    /// All positions within `1..=radius` steps, ring by ring outwards.
    pub fn surroundings(&self, radius: u32) -> impl Iterator<Item = TilePosition> + '_ {
        (1..=radius).flat_map(move |r| self.ring(r))
    }

    /// All positions within `0..=radius` steps, the centre first.
    pub fn spiral(&self, radius: u32) -> impl Iterator<Item = TilePosition> + '_ {
        (0..=radius).flat_map(move |r| self.ring(r))
    }
}

impl fmt::Display for TilePosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.q, self.r)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_hex_neighbors() {
        let center = TilePosition::new(0, 0);
        let neighbors = center.neighbors();

        let unique: HashSet<_> = neighbors.iter().collect();
        assert_eq!(unique.len(), 6);

        for neighbor in &neighbors {
            assert_eq!(center.distance_to(neighbor), 1);
            assert!(center.is_adjacent(neighbor));
        }
    }

    #[test]
    fn test_hex_distance() {
        let a = TilePosition::new(0, 0);
        let b = TilePosition::new(2, -1);
        assert_eq!(a.distance_to(&b), 2);

        let c = TilePosition::new(-3, 3);
        assert_eq!(a.distance_to(&c), 3);
    }

    #[test]
    fn test_neighbor_and_opposite_cancel() {
        let start = TilePosition::new(2, -3);
        for direction in EdgeDirection::ALL {
            assert_eq!(start.neighbor(direction).neighbor(direction.opposite()), start);
        }
    }

    #[test]
    fn test_rotation_is_cyclic() {
        let mut direction = EdgeDirection::East;
        for _ in 0..6 {
            direction = direction.counter_clockwise();
        }
        assert_eq!(direction, EdgeDirection::East);
        assert_eq!(EdgeDirection::East.counter_clockwise(), EdgeDirection::NorthEast);
        assert_eq!(EdgeDirection::NorthEast.counter_clockwise(), EdgeDirection::NorthWest);
        assert_eq!(EdgeDirection::NorthEast.clockwise(), EdgeDirection::East);
    }

    #[test]
    fn test_ring_sizes_and_distances() {
        let center = TilePosition::new(1, 1);
        assert_eq!(center.ring(0), vec![center]);

        for radius in 1..=3 {
            let ring = center.ring(radius);
            assert_eq!(ring.len(), 6 * radius as usize);
            let unique: HashSet<_> = ring.iter().collect();
            assert_eq!(unique.len(), ring.len());
            assert!(ring.iter().all(|p| center.distance_to(p) == radius));
        }
    }

    #[test]
    fn test_surroundings_exclude_center() {
        let center = TilePosition::new(0, 0);
        let around: Vec<_> = center.surroundings(2).collect();
        assert_eq!(around.len(), 18);
        assert!(!around.contains(&center));
        assert_eq!(center.spiral(2).count(), 19);
    }
}
