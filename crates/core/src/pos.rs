//! Block and chunk coordinates.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Horizontal size of a chunk in blocks.
pub const CHUNK_WIDTH: i32 = 16;

/// Lowest buildable Y level (inclusive).
pub const WORLD_MIN_Y: i32 = -64;

/// Build limit (exclusive).
pub const WORLD_MAX_Y: i32 = 320;

/// Chunk coordinate (X,Z) in chunk space.
/// Implements Ord for deterministic iteration in BTreeMap/BTreeSet (sorts by x, then z).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub struct ChunkPos {
    pub x: i32,
    pub z: i32,
}

impl ChunkPos {
    pub const fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    /// Chunk containing the given block column.
    pub const fn from_block(x: i32, z: i32) -> Self {
        Self { x: x >> 4, z: z >> 4 }
    }

    /// Block coordinates of the chunk's north-west corner.
    pub const fn origin(self) -> (i32, i32) {
        (self.x << 4, self.z << 4)
    }

    /// Chessboard distance in chunks, the metric the tracker evicts by.
    pub fn chebyshev_distance(self, other: ChunkPos) -> i32 {
        (self.x - other.x).abs().max((self.z - other.z).abs())
    }

    /// All chunks within `radius` of `self`, row-major by z then x.
    pub fn square(self, radius: i32) -> impl Iterator<Item = ChunkPos> {
        let center = self;
        (-radius..=radius).flat_map(move |dz| {
            (-radius..=radius).map(move |dx| ChunkPos::new(center.x + dx, center.z + dz))
        })
    }
}

impl fmt::Display for ChunkPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.z)
    }
}

/// One of the six block faces, in the host's enumeration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Face {
    Down,
    Up,
    North,
    South,
    West,
    East,
}

impl Face {
    pub const ALL: [Face; 6] = [
        Face::Down,
        Face::Up,
        Face::North,
        Face::South,
        Face::West,
        Face::East,
    ];

    /// Unit offset `(dx, dy, dz)` of this face.
    pub const fn offset(self) -> (i32, i32, i32) {
        match self {
            Face::Down => (0, -1, 0),
            Face::Up => (0, 1, 0),
            Face::North => (0, 0, -1),
            Face::South => (0, 0, 1),
            Face::West => (-1, 0, 0),
            Face::East => (1, 0, 0),
        }
    }
}

/// World-space block position.
///
/// Ordered by `(x, y, z)` so position sets serialize identically run to run.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub struct BlockPos {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl BlockPos {
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    #[inline]
    pub fn offset(self, face: Face) -> Self {
        let (dx, dy, dz) = face.offset();
        Self::new(self.x + dx, self.y + dy, self.z + dz)
    }

    /// The six face-adjacent neighbours.
    pub fn neighbors(self) -> [BlockPos; 6] {
        Face::ALL.map(|face| self.offset(face))
    }

    pub const fn chunk(self) -> ChunkPos {
        ChunkPos::from_block(self.x, self.z)
    }

    /// True when `y` lies inside the buildable range.
    #[inline]
    pub const fn in_build_height(self) -> bool {
        self.y >= WORLD_MIN_Y && self.y < WORLD_MAX_Y
    }
}

impl fmt::Display for BlockPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}
