//! Property-based tests for the random stream and vein placement.
//!
//! Critical invariants:
//! - Bounded draws stay in range
//! - Chunk results are reproducible
//! - The air filter never adds blocks
//! - Attempts stay close to their origin

use proptest::prelude::*;
use seedxray_core::{BlockPos, ChunkPos};
use seedxray_world::{
    ChunkOreSimulator, ChunkRandom, FlatTerrain, OreRegistry, RandomBackend, VeinGenerator,
};

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn bounded_draws_stay_in_range(seed in any::<i64>(), bound in 1i32..=i32::MAX) {
        let mut random = ChunkRandom::new(seed);
        for _ in 0..16 {
            let value = random.next_int_bounded(bound);
            prop_assert!((0..bound).contains(&value));
            let f = random.next_float();
            prop_assert!((0.0..1.0).contains(&f));
            let d = random.next_double();
            prop_assert!((0.0..1.0).contains(&d));
        }
    }

    #[test]
    fn population_seed_of_origin_chunk_is_world_seed(seed in any::<i64>()) {
        let mut random = ChunkRandom::new(0);
        prop_assert_eq!(random.set_population_seed(seed, 0, 0), seed);
    }

    #[test]
    fn chunk_results_are_reproducible(
        seed in any::<i64>(),
        chunk_x in -2000i32..2000,
        chunk_z in -2000i32..2000,
        xoroshiro in any::<bool>(),
    ) {
        let backend = if xoroshiro { RandomBackend::Xoroshiro } else { RandomBackend::Legacy };
        let registry = OreRegistry::defaults();
        let terrain = FlatTerrain::new(64);
        let chunk = ChunkPos::new(chunk_x, chunk_z);
        let a = ChunkOreSimulator::new(seed).with_backend(backend)
            .simulate_chunk(chunk, registry.enabled(), true, &terrain);
        let b = ChunkOreSimulator::new(seed).with_backend(backend)
            .simulate_chunk(chunk, registry.enabled(), true, &terrain);
        prop_assert_eq!(a, b);
    }

    #[test]
    fn air_filter_only_removes(
        seed in any::<i64>(),
        chunk_x in -500i32..500,
        chunk_z in -500i32..500,
        surface in -64i32..320,
    ) {
        let registry = OreRegistry::defaults();
        let terrain = FlatTerrain::new(surface);
        let simulator = ChunkOreSimulator::new(seed);
        let chunk = ChunkPos::new(chunk_x, chunk_z);
        let open = simulator.simulate_chunk(chunk, registry.enabled(), false, &terrain);
        let checked = simulator.simulate_chunk(chunk, registry.enabled(), true, &terrain);
        for (name, positions) in checked.iter() {
            let unfiltered = open.positions(name);
            prop_assert!(unfiltered.is_some_and(|all| positions.is_subset(all)));
            prop_assert!(positions.iter().all(|pos| pos.y < surface));
        }
    }

    #[test]
    fn ellipsoid_blocks_stay_near_origin(
        seed in any::<i64>(),
        size in 1i32..=64,
        x in -10_000i32..10_000,
        y in -64i32..320,
        z in -10_000i32..10_000,
    ) {
        let terrain = FlatTerrain::new(320);
        let veins = VeinGenerator::new(&terrain, false);
        let mut random = ChunkRandom::new(seed);
        let origin = BlockPos::new(x, y, z);
        let ores = veins.ellipsoid(&mut random, origin, size, 0.0);

        // Line half-length plus the largest node radius.
        let spread = size as f64 / 8.0;
        let radius = (2.0 * size as f64 / 16.0 + 1.0) / 2.0;
        let horizontal = (spread + radius).ceil() as i32 + 1;
        for pos in &ores {
            prop_assert!(pos.in_build_height());
            prop_assert!((pos.x - x).abs() <= horizontal);
            prop_assert!((pos.z - z).abs() <= horizontal);
            prop_assert!((pos.y - y).abs() <= radius.ceil() as i32 + 3);
        }
    }

    #[test]
    fn scattered_clusters_respect_size(
        seed in any::<i64>(),
        size in 0i32..=64,
    ) {
        let terrain = FlatTerrain::new(320);
        let veins = VeinGenerator::new(&terrain, false);
        let mut random = ChunkRandom::new(seed);
        let origin = BlockPos::new(0, 0, 0);
        let ores = veins.scattered(&mut random, origin, size);
        prop_assert!(ores.len() <= size as usize);
        for pos in &ores {
            prop_assert!(pos.x.abs() <= 7 && pos.y.abs() <= 7 && pos.z.abs() <= 7);
        }
    }
}
