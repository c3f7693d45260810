//! Player-centred chunk caching of predictions.

use crate::ore::{OreProfile, OreRegistry};
use crate::simulator::{ChunkOreSimulator, SimulationResult};
use crate::terrain::{is_exposed, TerrainOracle};
use seedxray_core::{BlockPos, ChunkPos};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// Smallest tracking range in chunks.
pub const MIN_RANGE: i32 = 1;
/// Largest tracking range in chunks.
pub const MAX_RANGE: i32 = 10;
pub const DEFAULT_RANGE: i32 = 5;
/// Extra chunks kept beyond the range before an entry is evicted.
pub const EVICTION_MARGIN: i32 = 2;

/// When the air-exposure filter runs against live terrain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AirCheckMode {
    /// No filtering; every predicted block is kept.
    Off,
    /// Filter once, against the terrain seen on first simulation.
    OnLoad,
    /// Re-simulate chunks whose terrain changed.
    #[default]
    Recheck,
}

impl AirCheckMode {
    pub fn air_check(self) -> bool {
        self != AirCheckMode::Off
    }

    fn rechecks(self) -> bool {
        self == AirCheckMode::Recheck
    }
}

/// Write-once store of chunk predictions.
#[derive(Debug, Clone, Default)]
pub struct OreChunkCache {
    chunks: BTreeMap<ChunkPos, SimulationResult>,
}

impl OreChunkCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, chunk: ChunkPos) -> Option<&SimulationResult> {
        self.chunks.get(&chunk)
    }

    pub fn contains(&self, chunk: ChunkPos) -> bool {
        self.chunks.contains_key(&chunk)
    }

    /// Store `result` unless the chunk already has an entry. Returns whether
    /// it was stored.
    pub fn insert(&mut self, chunk: ChunkPos, result: SimulationResult) -> bool {
        if self.chunks.contains_key(&chunk) {
            return false;
        }
        self.chunks.insert(chunk, result);
        true
    }

    pub fn invalidate(&mut self, chunk: ChunkPos) -> Option<SimulationResult> {
        self.chunks.remove(&chunk)
    }

    pub fn clear(&mut self) {
        self.chunks.clear();
    }

    /// Drop entries farther than `keep_radius` chunks (chessboard distance)
    /// from `center`. Returns the number dropped.
    pub fn evict_outside(&mut self, center: ChunkPos, keep_radius: i32) -> usize {
        let before = self.chunks.len();
        self.chunks
            .retain(|chunk, _| chunk.chebyshev_distance(center) <= keep_radius);
        before - self.chunks.len()
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ChunkPos, &SimulationResult)> + '_ {
        self.chunks.iter().map(|(pos, result)| (*pos, result))
    }
}

/// Outcome of one [`OreTracker::update`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TrackerUpdate {
    pub simulated: usize,
    pub evicted: usize,
}

/// Keeps predictions current for the chunks around a moving centre.
#[derive(Debug, Clone)]
pub struct OreTracker {
    simulator: ChunkOreSimulator,
    mode: AirCheckMode,
    range: i32,
    only_exposed: bool,
    cache: OreChunkCache,
}

impl OreTracker {
    pub fn new(simulator: ChunkOreSimulator) -> Self {
        Self {
            simulator,
            mode: AirCheckMode::default(),
            range: DEFAULT_RANGE,
            only_exposed: false,
            cache: OreChunkCache::new(),
        }
    }

    pub fn with_mode(mut self, mode: AirCheckMode) -> Self {
        self.set_mode(mode);
        self
    }

    pub fn with_range(mut self, range: i32) -> Self {
        self.set_range(range);
        self
    }

    pub fn with_only_exposed(mut self, only_exposed: bool) -> Self {
        self.only_exposed = only_exposed;
        self
    }

    pub fn simulator(&self) -> &ChunkOreSimulator {
        &self.simulator
    }

    pub fn mode(&self) -> AirCheckMode {
        self.mode
    }

    pub fn range(&self) -> i32 {
        self.range
    }

    pub fn only_exposed(&self) -> bool {
        self.only_exposed
    }

    pub fn cache(&self) -> &OreChunkCache {
        &self.cache
    }

    /// Switching mode changes what cached results mean, so the cache is reset.
    pub fn set_mode(&mut self, mode: AirCheckMode) {
        if mode != self.mode {
            self.mode = mode;
            self.reset();
        }
    }

    /// Clamped to `MIN_RANGE..=MAX_RANGE`.
    pub fn set_range(&mut self, range: i32) {
        self.range = range.clamp(MIN_RANGE, MAX_RANGE);
    }

    pub fn set_only_exposed(&mut self, only_exposed: bool) {
        self.only_exposed = only_exposed;
    }

    /// Point the tracker at another world seed or backend.
    pub fn set_simulator(&mut self, simulator: ChunkOreSimulator) {
        if simulator != self.simulator {
            self.simulator = simulator;
            self.reset();
        }
    }

    /// Simulate missing chunks in range of `center`, then evict far ones.
    pub fn update<T: TerrainOracle + ?Sized>(
        &mut self,
        center: ChunkPos,
        registry: &OreRegistry,
        terrain: &T,
    ) -> TrackerUpdate {
        let air_check = self.mode.air_check();
        let mut simulated = 0;
        for chunk in center.square(self.range) {
            if self.cache.contains(chunk) {
                continue;
            }
            let result = self
                .simulator
                .simulate_chunk(chunk, registry.enabled(), air_check, terrain);
            self.cache.insert(chunk, result);
            simulated += 1;
        }
        let evicted = self
            .cache
            .evict_outside(center, self.range + EVICTION_MARGIN);
        if simulated > 0 || evicted > 0 {
            debug!(%center, simulated, evicted, cached = self.cache.len(), "tracker update");
        }
        TrackerUpdate { simulated, evicted }
    }

    /// Note a block change in `chunk`. Returns whether its prediction was
    /// dropped for re-simulation.
    pub fn terrain_changed(&mut self, chunk: ChunkPos) -> bool {
        self.mode.rechecks() && self.cache.invalidate(chunk).is_some()
    }

    /// Cached blocks of currently enabled profiles, ordered by chunk then
    /// profile then position.
    pub fn visible<'r, T: TerrainOracle + ?Sized>(
        &self,
        registry: &'r OreRegistry,
        terrain: &T,
    ) -> Vec<(&'r OreProfile, BlockPos)> {
        let mut visible = Vec::new();
        for (_, result) in self.cache.iter() {
            for (name, positions) in result.iter() {
                let Some(profile) = registry.get(name) else {
                    continue;
                };
                if !registry.is_enabled(name) {
                    continue;
                }
                visible.extend(
                    positions
                        .iter()
                        .filter(|pos| !self.only_exposed || is_exposed(terrain, **pos))
                        .map(|pos| (profile, *pos)),
                );
            }
        }
        visible
    }

    /// Forget every cached prediction.
    pub fn reset(&mut self) {
        self.cache.clear();
    }
}
