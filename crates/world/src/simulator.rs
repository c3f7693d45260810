//! Per-chunk ore prediction.

use crate::ore::OreProfile;
use crate::random::{ChunkRandom, LegacyRandom, RandomBackend, RandomSource, XoroshiroRandom};
use crate::terrain::{is_exposed, TerrainOracle};
use crate::vein::VeinGenerator;
use seedxray_core::{BlockPos, ChunkPos, CHUNK_WIDTH};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{instrument, trace};

/// Predicted ore blocks of one chunk, keyed by profile name.
///
/// Profiles that produced nothing are absent. Blocks from different
/// attempts of the same profile that coincide collapse into one entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SimulationResult {
    ores: BTreeMap<String, BTreeSet<BlockPos>>,
}

impl SimulationResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge `positions` into the entry for `profile`.
    pub fn extend(&mut self, profile: &str, positions: BTreeSet<BlockPos>) {
        if positions.is_empty() {
            return;
        }
        self.ores
            .entry(profile.to_string())
            .or_default()
            .extend(positions);
    }

    pub fn positions(&self, profile: &str) -> Option<&BTreeSet<BlockPos>> {
        self.ores.get(profile)
    }

    /// Number of predicted blocks across all profiles.
    pub fn total(&self) -> usize {
        self.ores.values().map(BTreeSet::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.ores.is_empty()
    }

    /// Number of profiles with at least one block.
    pub fn len(&self) -> usize {
        self.ores.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &BTreeSet<BlockPos>)> + '_ {
        self.ores.iter().map(|(name, set)| (name.as_str(), set))
    }

    /// Union of every profile's blocks.
    pub fn all_positions(&self) -> BTreeSet<BlockPos> {
        self.ores.values().flatten().copied().collect()
    }

    /// Keep only blocks with at least one non-opaque neighbour.
    pub fn filter_exposed<T: TerrainOracle + ?Sized>(&self, terrain: &T) -> SimulationResult {
        let mut filtered = SimulationResult::new();
        for (name, positions) in &self.ores {
            let exposed = positions
                .iter()
                .copied()
                .filter(|pos| is_exposed(terrain, *pos))
                .collect();
            filtered.extend(name, exposed);
        }
        filtered
    }
}

/// Replays the host's ore decoration for single chunks of one world.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkOreSimulator {
    world_seed: i64,
    backend: RandomBackend,
}

impl ChunkOreSimulator {
    pub fn new(world_seed: i64) -> Self {
        Self {
            world_seed,
            backend: RandomBackend::default(),
        }
    }

    pub fn with_backend(mut self, backend: RandomBackend) -> Self {
        self.backend = backend;
        self
    }

    pub fn world_seed(&self) -> i64 {
        self.world_seed
    }

    pub fn backend(&self) -> RandomBackend {
        self.backend
    }

    /// Predict the ore blocks `profiles` place in `chunk`.
    ///
    /// Each profile draws from its own decorator stream, so the result for
    /// one profile does not depend on which other profiles are passed.
    #[instrument(
        level = "debug",
        skip(self, profiles, terrain),
        fields(chunk = %chunk, world_seed = self.world_seed)
    )]
    pub fn simulate_chunk<'p, I, T>(
        &self,
        chunk: ChunkPos,
        profiles: I,
        air_check: bool,
        terrain: &T,
    ) -> SimulationResult
    where
        I: IntoIterator<Item = &'p OreProfile>,
        T: TerrainOracle + ?Sized,
    {
        let generator = VeinGenerator::new(terrain, air_check);
        match self.backend {
            RandomBackend::Legacy => self.run(
                ChunkRandom::with_source(LegacyRandom::new(0)),
                chunk,
                profiles,
                &generator,
            ),
            RandomBackend::Xoroshiro => self.run(
                ChunkRandom::with_source(XoroshiroRandom::new(0)),
                chunk,
                profiles,
                &generator,
            ),
        }
    }

    fn run<'p, S, I, T>(
        &self,
        mut random: ChunkRandom<S>,
        chunk: ChunkPos,
        profiles: I,
        generator: &VeinGenerator<'_, T>,
    ) -> SimulationResult
    where
        S: RandomSource,
        I: IntoIterator<Item = &'p OreProfile>,
        T: TerrainOracle + ?Sized,
    {
        let (block_x, block_z) = chunk.origin();
        let population_seed = random.set_population_seed(self.world_seed, block_x, block_z);
        let mut result = SimulationResult::new();

        for profile in profiles {
            random.set_decorator_seed(
                population_seed,
                profile.decorator_index(),
                profile.generation_step(),
            );
            let repeat = profile.count().sample(&mut random);
            let mut placed = BTreeSet::new();

            for attempt in 0..repeat {
                if profile.rarity() != 1.0 && random.next_float() >= 1.0 / profile.rarity() {
                    trace!(ore = profile.name(), attempt, "rarity roll failed");
                    continue;
                }
                let x = random.next_int_bounded(CHUNK_WIDTH) + block_x;
                let z = random.next_int_bounded(CHUNK_WIDTH) + block_z;
                let y = profile.height().sample(&mut random);
                let origin = BlockPos::new(x, y, z);

                let vein = generator.generate(profile, &mut random, origin);
                trace!(ore = profile.name(), attempt, %origin, blocks = vein.len(), "vein attempt");
                placed.extend(vein);
            }
            result.extend(profile.name(), placed);
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::int_provider::IntProvider;
    use crate::ore::OreRegistry;
    use crate::terrain::{ColumnTerrain, FlatTerrain, UnloadedTerrain};

    fn deep_terrain() -> FlatTerrain {
        FlatTerrain::new(320)
    }

    #[test]
    fn unloaded_terrain_yields_only_scattered_ores() {
        let registry = OreRegistry::defaults();
        let simulator = ChunkOreSimulator::new(99);
        let result = simulator.simulate_chunk(
            ChunkPos::new(0, 0),
            registry.enabled(),
            false,
            &UnloadedTerrain,
        );
        for (name, _) in result.iter() {
            let profile = registry.get(name).expect("known profile");
            assert!(profile.scattered(), "{name} is a vein and needs terrain");
        }
    }

    #[test]
    fn no_profiles_no_ores() {
        let simulator = ChunkOreSimulator::new(1);
        let result = simulator.simulate_chunk(
            ChunkPos::new(3, -2),
            std::iter::empty(),
            true,
            &deep_terrain(),
        );
        assert!(result.is_empty());
        assert_eq!(result.total(), 0);
    }

    #[test]
    fn zero_count_profile_is_omitted() {
        let profile = OreProfile::builder("Nothing", "stone")
            .count(IntProvider::constant(0))
            .height(IntProvider::uniform(0, 10))
            .size(8)
            .build()
            .unwrap();
        let result = ChunkOreSimulator::new(5).simulate_chunk(
            ChunkPos::new(0, 0),
            [&profile],
            false,
            &deep_terrain(),
        );
        assert!(result.positions("Nothing").is_none());
    }

    #[test]
    fn veins_start_inside_their_chunk() {
        // One-block scattered clusters land exactly on the attempt origin.
        let profile = OreProfile::builder("Speck", "stone")
            .count(IntProvider::constant(20))
            .height(IntProvider::uniform(0, 100))
            .size(1)
            .scattered(true)
            .build()
            .unwrap();
        let chunk = ChunkPos::new(-3, 7);
        let result =
            ChunkOreSimulator::new(42).simulate_chunk(chunk, [&profile], false, &deep_terrain());
        for pos in result.all_positions() {
            assert_eq!(pos.chunk(), chunk);
            assert!((0..=100).contains(&pos.y));
        }
    }

    #[test]
    fn backends_diverge() {
        let registry = OreRegistry::defaults();
        let terrain = deep_terrain();
        let chunk = ChunkPos::new(4, 4);
        let legacy = ChunkOreSimulator::new(7).simulate_chunk(chunk, registry.enabled(), false, &terrain);
        let xoro = ChunkOreSimulator::new(7)
            .with_backend(RandomBackend::Xoroshiro)
            .simulate_chunk(chunk, registry.enabled(), false, &terrain);
        assert_ne!(legacy, xoro);
    }

    #[test]
    fn filter_exposed_keeps_blocks_next_to_air() {
        let mut terrain = ColumnTerrain::with_area((0, 0), (15, 15), 100);
        terrain.carve(BlockPos::new(5, 11, 5));
        let mut result = SimulationResult::new();
        result.extend(
            "Iron",
            [BlockPos::new(5, 10, 5), BlockPos::new(5, 20, 5)].into_iter().collect(),
        );
        result.extend("Gold", [BlockPos::new(8, 8, 8)].into_iter().collect());

        let exposed = result.filter_exposed(&terrain);
        assert_eq!(exposed.total(), 1);
        assert!(exposed.positions("Iron").unwrap().contains(&BlockPos::new(5, 10, 5)));
        assert!(exposed.positions("Gold").is_none());
    }

    #[test]
    fn result_serializes_by_profile_name() {
        let mut result = SimulationResult::new();
        result.extend("Lapis", [BlockPos::new(1, 2, 3)].into_iter().collect());
        let json = serde_json::to_string(&result).unwrap();
        assert_eq!(json, r#"{"Lapis":[{"x":1,"y":2,"z":3}]}"#);
    }
}
