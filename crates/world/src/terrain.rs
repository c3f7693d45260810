//! Read-only terrain queries the simulator depends on.
//!
//! The predictor never owns a world. It asks a [`TerrainOracle`] whether a
//! column has terrain yet and whether a block is opaque; anything the oracle
//! cannot answer is treated as "not placeable", never as an error.

use seedxray_core::BlockPos;
use std::collections::{BTreeMap, BTreeSet};

/// Height and opacity queries against already-loaded terrain.
///
/// Implementations must answer without blocking; callers may query from many
/// threads at once.
pub trait TerrainOracle: Send + Sync {
    /// Heightmap value of column `(x, z)`: one above the highest
    /// motion-blocking block. `None` when the column is not loaded.
    fn top_solid_height(&self, x: i32, z: i32) -> Option<i32>;

    /// Whether the block at `pos` is a full opaque block.
    fn is_opaque(&self, pos: BlockPos) -> bool;
}

impl<T: TerrainOracle + ?Sized> TerrainOracle for &T {
    fn top_solid_height(&self, x: i32, z: i32) -> Option<i32> {
        (**self).top_solid_height(x, z)
    }

    fn is_opaque(&self, pos: BlockPos) -> bool {
        (**self).is_opaque(pos)
    }
}

/// True when any face-adjacent neighbour of `pos` is not opaque.
pub fn is_exposed<T: TerrainOracle + ?Sized>(terrain: &T, pos: BlockPos) -> bool {
    pos.neighbors().iter().any(|n| !terrain.is_opaque(*n))
}

/// Solid ground up to `surface_y` (exclusive) everywhere, air above.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlatTerrain {
    pub surface_y: i32,
}

impl FlatTerrain {
    pub const fn new(surface_y: i32) -> Self {
        Self { surface_y }
    }
}

impl TerrainOracle for FlatTerrain {
    fn top_solid_height(&self, _x: i32, _z: i32) -> Option<i32> {
        Some(self.surface_y)
    }

    fn is_opaque(&self, pos: BlockPos) -> bool {
        pos.y < self.surface_y
    }
}

/// Terrain with nothing loaded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UnloadedTerrain;

impl TerrainOracle for UnloadedTerrain {
    fn top_solid_height(&self, _x: i32, _z: i32) -> Option<i32> {
        None
    }

    fn is_opaque(&self, _pos: BlockPos) -> bool {
        false
    }
}

/// Sparse terrain described column by column.
///
/// Each loaded column is solid below its height except for explicitly
/// carved air pockets. Columns never given a height are unloaded and read
/// as air.
#[derive(Debug, Clone, Default)]
pub struct ColumnTerrain {
    heights: BTreeMap<(i32, i32), i32>,
    air: BTreeSet<BlockPos>,
}

impl ColumnTerrain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load every column in the inclusive rectangle with the same height.
    pub fn with_area(min: (i32, i32), max: (i32, i32), height: i32) -> Self {
        let mut terrain = Self::new();
        for x in min.0..=max.0 {
            for z in min.1..=max.1 {
                terrain.set_height(x, z, height);
            }
        }
        terrain
    }

    pub fn set_height(&mut self, x: i32, z: i32, height: i32) {
        self.heights.insert((x, z), height);
    }

    pub fn unload(&mut self, x: i32, z: i32) {
        self.heights.remove(&(x, z));
    }

    /// Replace the block at `pos` with air.
    pub fn carve(&mut self, pos: BlockPos) {
        self.air.insert(pos);
    }

    /// Undo a [`carve`](Self::carve).
    pub fn fill(&mut self, pos: BlockPos) {
        self.air.remove(&pos);
    }

    pub fn loaded_columns(&self) -> usize {
        self.heights.len()
    }
}

impl TerrainOracle for ColumnTerrain {
    fn top_solid_height(&self, x: i32, z: i32) -> Option<i32> {
        self.heights.get(&(x, z)).copied()
    }

    fn is_opaque(&self, pos: BlockPos) -> bool {
        match self.heights.get(&(pos.x, pos.z)) {
            Some(&height) => pos.y < height && !self.air.contains(&pos),
            None => false,
        }
    }
}
