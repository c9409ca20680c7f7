//! Coordinate types shared between client and server.
//!
//! These are the canonical representations used in the network protocol.

use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};

/// A tile coordinate packed into 32 bits.
///
/// ```text
/// bit:  31 30 | 29 28 | 27 ........ 14 | 13 ......... 0
///       unused| level |       x        |       z
/// ```
#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, Hash, Pod, Zeroable, Serialize, Deserialize)]
pub struct CoordGrid(u32);

impl CoordGrid {
    /// Sentinel for "no coordinate".
    pub const INVALID: Self = Self(u32::MAX);

    /// Creates a coordinate. Out-of-range components are masked.
    #[must_use]
    pub const fn new(level: u32, x: u32, z: u32) -> Self {
        Self(((level & 0x3) << 28) | ((x & 0x3FFF) << 14) | (z & 0x3FFF))
    }

    /// Returns the packed representation.
    #[must_use]
    pub const fn packed(self) -> u32 {
        self.0
    }

    /// Returns the level (0-3).
    #[must_use]
    pub const fn level(self) -> u32 {
        (self.0 >> 28) & 0x3
    }

    /// Returns the x axis (0-16383).
    #[must_use]
    pub const fn x(self) -> u32 {
        (self.0 >> 14) & 0x3FFF
    }

    /// Returns the z axis (0-16383).
    #[must_use]
    pub const fn z(self) -> u32 {
        self.0 & 0x3FFF
    }

    /// Returns true unless this is [`CoordGrid::INVALID`].
    #[must_use]
    pub const fn is_valid(self) -> bool {
        self.0 != u32::MAX
    }

    /// Signed x and z deltas from `origin` to `self`.
    #[must_use]
    #[allow(clippy::cast_possible_wrap)]
    pub const fn delta_from(self, origin: Self) -> (i32, i32) {
        (
            self.x() as i32 - origin.x() as i32,
            self.z() as i32 - origin.z() as i32,
        )
    }

    /// Chebyshev (king-move) distance on the same level.
    ///
    /// Returns None when the levels differ.
    #[must_use]
    pub const fn chebyshev_distance(self, other: Self) -> Option<u32> {
        if self.level() != other.level() {
            return None;
        }
        let (dx, dz) = self.delta_from(other);
        let dx = dx.unsigned_abs();
        let dz = dz.unsigned_abs();
        Some(if dx > dz { dx } else { dz })
    }

    /// Returns true if `other` is on the same level within `distance` tiles.
    #[must_use]
    pub const fn in_distance(self, other: Self, distance: u32) -> bool {
        match self.chebyshev_distance(other) {
            Some(d) => d <= distance,
            None => false,
        }
    }

    /// Moves the coordinate by one step in `direction`.
    #[must_use]
    #[allow(clippy::cast_sign_loss)]
    pub const fn step(self, direction: Direction) -> Self {
        let (dx, dz) = direction.delta();
        Self::new(
            self.level(),
            (self.x() as i32 + dx) as u32,
            (self.z() as i32 + dz) as u32,
        )
    }
}

impl Default for CoordGrid {
    fn default() -> Self {
        Self::INVALID
    }
}

impl std::fmt::Debug for CoordGrid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_valid() {
            write!(f, "CoordGrid({}, {}, {})", self.level(), self.x(), self.z())
        } else {
            f.write_str("CoordGrid(INVALID)")
        }
    }
}

/// One of the eight compass octants an avatar can step or face towards.
///
/// The discriminant is the value written in 3-bit direction fields.
#[repr(u8)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// x-1, z+1
    NorthWest = 0,
    /// z+1
    North = 1,
    /// x+1, z+1
    NorthEast = 2,
    /// x-1
    West = 3,
    /// x+1
    East = 4,
    /// x-1, z-1
    SouthWest = 5,
    /// z-1
    #[default]
    South = 6,
    /// x+1, z-1
    SouthEast = 7,
}

impl Direction {
    /// All directions in wire order.
    pub const ALL: [Self; 8] = [
        Self::NorthWest,
        Self::North,
        Self::NorthEast,
        Self::West,
        Self::East,
        Self::SouthWest,
        Self::South,
        Self::SouthEast,
    ];

    /// Converts from the wire value. Only the low 3 bits are used.
    #[must_use]
    pub const fn from_id(id: u8) -> Self {
        Self::ALL[(id & 0x7) as usize]
    }

    /// Returns the wire value.
    #[must_use]
    pub const fn id(self) -> u8 {
        self as u8
    }

    /// Tile delta of one step in this direction.
    #[must_use]
    pub const fn delta(self) -> (i32, i32) {
        match self {
            Self::NorthWest => (-1, 1),
            Self::North => (0, 1),
            Self::NorthEast => (1, 1),
            Self::West => (-1, 0),
            Self::East => (1, 0),
            Self::SouthWest => (-1, -1),
            Self::South => (0, -1),
            Self::SouthEast => (1, -1),
        }
    }

    /// Finds the direction for a single-tile delta.
    #[must_use]
    pub fn from_delta(dx: i32, dz: i32) -> Option<Self> {
        Self::ALL.into_iter().find(|d| d.delta() == (dx, dz))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_packing() {
        let coord = CoordGrid::new(2, 3200, 3201);
        assert_eq!(coord.level(), 2);
        assert_eq!(coord.x(), 3200);
        assert_eq!(coord.z(), 3201);
        assert!(coord.is_valid());
        assert!(!CoordGrid::INVALID.is_valid());
    }

    #[test]
    fn test_coord_size() {
        assert_eq!(std::mem::size_of::<CoordGrid>(), 4);

        let coord = CoordGrid::new(1, 50, 60);
        let raw: u32 = bytemuck::cast(coord);
        assert_eq!(raw, coord.packed());
        assert_eq!(bytemuck::cast::<u32, CoordGrid>(raw), coord);
        assert_eq!(bytemuck::bytes_of(&coord), &raw.to_ne_bytes());
    }

    #[test]
    fn test_distance() {
        let a = CoordGrid::new(0, 3200, 3200);
        let b = CoordGrid::new(0, 3195, 3202);
        assert_eq!(b.delta_from(a), (-5, 2));
        assert_eq!(a.chebyshev_distance(b), Some(5));
        assert!(a.in_distance(b, 5));
        assert!(!a.in_distance(b, 4));
        assert_eq!(a.chebyshev_distance(CoordGrid::new(1, 3200, 3200)), None);
    }

    #[test]
    fn test_direction_roundtrip() {
        for direction in Direction::ALL {
            assert_eq!(Direction::from_id(direction.id()), direction);
            let (dx, dz) = direction.delta();
            assert_eq!(Direction::from_delta(dx, dz), Some(direction));
        }
        assert_eq!(Direction::from_delta(2, 0), None);
    }

    #[test]
    fn test_step() {
        let origin = CoordGrid::new(0, 100, 100);
        assert_eq!(origin.step(Direction::NorthEast), CoordGrid::new(0, 101, 101));
        assert_eq!(origin.step(Direction::South), CoordGrid::new(0, 100, 99));
    }
}
