//! Parallel prediction over a square of chunks.

use crate::ore::{OreProfile, OreRegistry};
use crate::random::RandomBackend;
use crate::simulator::{ChunkOreSimulator, SimulationResult};
use crate::terrain::TerrainOracle;
use rayon::prelude::*;
use seedxray_core::ChunkPos;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use thiserror::Error;
use tracing::{debug, instrument};

/// Largest accepted sweep radius in chunks.
pub const MAX_SWEEP_RADIUS: i32 = 32;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SweepError {
    #[error("sweep cancelled after {completed} chunks")]
    Cancelled { completed: usize },
    #[error("sweep radius {radius} exceeds the maximum of {max}")]
    RadiusTooLarge { radius: i32, max: i32 },
    #[error("sweep radius {0} is negative")]
    NegativeRadius(i32),
}

/// Cooperative cancellation flag, checked once per chunk.
#[derive(Debug, Default)]
pub struct CancelToken {
    cancelled: AtomicBool,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SweepRequest {
    pub world_seed: i64,
    pub center: ChunkPos,
    pub radius: i32,
    pub air_check: bool,
    pub backend: RandomBackend,
}

impl SweepRequest {
    pub fn new(world_seed: i64, center: ChunkPos, radius: i32) -> Self {
        Self {
            world_seed,
            center,
            radius,
            air_check: false,
            backend: RandomBackend::default(),
        }
    }

    pub fn with_air_check(mut self, air_check: bool) -> Self {
        self.air_check = air_check;
        self
    }

    pub fn with_backend(mut self, backend: RandomBackend) -> Self {
        self.backend = backend;
        self
    }

    /// Number of chunks in the swept square.
    pub fn chunk_count(&self) -> usize {
        let side = (2 * self.radius.max(0) + 1) as usize;
        side * side
    }

    fn validate(&self) -> Result<(), SweepError> {
        if self.radius < 0 {
            return Err(SweepError::NegativeRadius(self.radius));
        }
        if self.radius > MAX_SWEEP_RADIUS {
            return Err(SweepError::RadiusTooLarge {
                radius: self.radius,
                max: MAX_SWEEP_RADIUS,
            });
        }
        Ok(())
    }
}

/// Per-chunk results of a sweep plus block totals per ore.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AreaResult {
    chunks: BTreeMap<ChunkPos, SimulationResult>,
    totals: BTreeMap<String, usize>,
}

impl AreaResult {
    fn insert(&mut self, chunk: ChunkPos, result: SimulationResult) {
        for (name, positions) in result.iter() {
            *self.totals.entry(name.to_string()).or_default() += positions.len();
        }
        self.chunks.insert(chunk, result);
    }

    pub fn chunk(&self, chunk: ChunkPos) -> Option<&SimulationResult> {
        self.chunks.get(&chunk)
    }

    pub fn chunks(&self) -> impl Iterator<Item = (ChunkPos, &SimulationResult)> + '_ {
        self.chunks.iter().map(|(pos, result)| (*pos, result))
    }

    /// Number of chunks simulated.
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Blocks predicted per ore name; ores with no blocks are absent.
    pub fn totals(&self) -> &BTreeMap<String, usize> {
        &self.totals
    }

    pub fn total(&self) -> usize {
        self.totals.values().sum()
    }
}

/// Simulate every chunk within `request.radius` of the centre, one rayon
/// task per chunk, using the registry's enabled profiles.
#[instrument(
    skip(registry, terrain, cancel),
    fields(center = %request.center, radius = request.radius)
)]
pub fn simulate_area<T: TerrainOracle + ?Sized>(
    request: &SweepRequest,
    registry: &OreRegistry,
    terrain: &T,
    cancel: &CancelToken,
) -> Result<AreaResult, SweepError> {
    request.validate()?;

    let simulator = ChunkOreSimulator::new(request.world_seed).with_backend(request.backend);
    let chunks: Vec<ChunkPos> = request.center.square(request.radius).collect();
    let profiles: Vec<&OreProfile> = registry.enabled().collect();
    let completed = AtomicUsize::new(0);

    let results: Vec<Option<(ChunkPos, SimulationResult)>> = chunks
        .par_iter()
        .map(|&chunk| {
            if cancel.is_cancelled() {
                return None;
            }
            let result = simulator.simulate_chunk(
                chunk,
                profiles.iter().copied(),
                request.air_check,
                terrain,
            );
            completed.fetch_add(1, Ordering::Relaxed);
            Some((chunk, result))
        })
        .collect();

    if results.iter().any(Option::is_none) {
        let completed = completed.into_inner();
        debug!(completed, "sweep cancelled");
        return Err(SweepError::Cancelled { completed });
    }

    let mut area = AreaResult::default();
    for (chunk, result) in results.into_iter().flatten() {
        area.insert(chunk, result);
    }
    debug!(chunks = area.len(), blocks = area.total(), "sweep finished");
    Ok(area)
}
