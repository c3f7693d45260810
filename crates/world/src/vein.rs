//! Single placement attempts: ellipsoid veins and scattered clusters.
//!
//! Every draw here happens in the host's order. The terrain short-circuit and
//! the air filter decide *whether* blocks are emitted, but only the air
//! filter's discard roll touches the random stream.

use crate::ore::OreProfile;
use crate::random::{ChunkRandom, RandomSource};
use crate::terrain::{is_exposed, TerrainOracle};
use bit_vec::BitVec;
use seedxray_core::BlockPos;
use std::collections::BTreeSet;
use std::f32::consts::PI as PI_F32;
use std::f64::consts::PI;
use tracing::trace;

/// Largest per-axis spread of a scattered cluster.
const MAX_SCATTER_SPREAD: i32 = 7;

/// Vertical jitter of vein end points, `next_int(3) - 2`.
const VEIN_Y_JITTER: i32 = 2;

#[derive(Debug, Clone, Copy)]
struct VeinNode {
    x: f64,
    y: f64,
    z: f64,
    radius: f64,
}

impl VeinNode {
    fn is_active(&self) -> bool {
        self.radius > 0.0
    }

    fn deactivate(&mut self) {
        self.radius = -1.0;
    }
}

/// Axis-aligned region a vein may occupy; indexes the occupancy bitset.
#[derive(Debug, Clone, Copy)]
struct VeinRegion {
    min_x: i32,
    min_y: i32,
    min_z: i32,
    size_x: i32,
    size_y: i32,
    size_z: i32,
}

impl VeinRegion {
    fn volume(&self) -> usize {
        let volume = i64::from(self.size_x) * i64::from(self.size_y) * i64::from(self.size_z);
        usize::try_from(volume).unwrap_or(0)
    }

    /// Linear index of `(x, y, z)`; coordinates past the nominal X/Y extent
    /// alias into neighbouring rows exactly like the host's layout.
    fn index(&self, x: i32, y: i32, z: i32) -> usize {
        let (size_x, size_y) = (i64::from(self.size_x), i64::from(self.size_y));
        let index = i64::from(x - self.min_x)
            + i64::from(y - self.min_y) * size_x
            + i64::from(z - self.min_z) * size_x * size_y;
        index as usize
    }

    /// Whether any column of the region reaches down to loaded terrain.
    fn touches_terrain<T: TerrainOracle + ?Sized>(&self, terrain: &T) -> bool {
        (self.min_x..=self.min_x + self.size_x).any(|x| {
            (self.min_z..=self.min_z + self.size_z).any(|z| {
                terrain
                    .top_solid_height(x, z)
                    .is_some_and(|top| self.min_y <= top)
            })
        })
    }
}

/// Growable occupancy set used to deduplicate lattice points within a vein.
struct Occupancy {
    bits: BitVec,
}

impl Occupancy {
    fn new(volume: usize) -> Self {
        Self {
            bits: BitVec::from_elem(volume, false),
        }
    }

    /// Mark `index`, returning false if it was already marked.
    fn insert(&mut self, index: usize) -> bool {
        if index >= self.bits.len() {
            self.bits.grow(index + 1 - self.bits.len(), false);
        }
        if self.bits[index] {
            return false;
        }
        self.bits.set(index, true);
        true
    }
}

#[inline]
fn lerp(delta: f64, start: f64, end: f64) -> f64 {
    start + delta * (end - start)
}

/// Produces the blocks of one placement attempt against a terrain oracle.
pub struct VeinGenerator<'t, T: TerrainOracle + ?Sized> {
    terrain: &'t T,
    air_check: bool,
}

impl<'t, T: TerrainOracle + ?Sized> VeinGenerator<'t, T> {
    /// `air_check` enables the anti-xray filter; when off every candidate
    /// inside the build height is kept.
    pub fn new(terrain: &'t T, air_check: bool) -> Self {
        Self { terrain, air_check }
    }

    /// Run the algorithm `profile` selects at `origin`.
    pub fn generate<S: RandomSource>(
        &self,
        profile: &OreProfile,
        random: &mut ChunkRandom<S>,
        origin: BlockPos,
    ) -> BTreeSet<BlockPos> {
        if profile.scattered() {
            self.scattered(random, origin, profile.size())
        } else {
            self.ellipsoid(random, origin, profile.size(), profile.discard_on_air())
        }
    }

    /// Ellipsoid vein of `size` nodes strung along a random horizontal line.
    pub fn ellipsoid<S: RandomSource>(
        &self,
        random: &mut ChunkRandom<S>,
        origin: BlockPos,
        size: i32,
        discard_on_air: f32,
    ) -> BTreeSet<BlockPos> {
        let angle = random.next_float() * PI_F32;
        let spread = size as f32 / 8.0;
        let margin = ((size as f32 / 16.0 * 2.0 + 1.0) / 2.0).ceil() as i32;
        let reach = spread.ceil() as i32;

        let (sin, cos) = (f64::from(angle).sin(), f64::from(angle).cos());
        let spread = f64::from(spread);
        let start = (
            f64::from(origin.x) + sin * spread,
            f64::from(origin.y + random.next_int_bounded(3) - VEIN_Y_JITTER),
            f64::from(origin.z) + cos * spread,
        );
        let end = (
            f64::from(origin.x) - sin * spread,
            f64::from(origin.y + random.next_int_bounded(3) - VEIN_Y_JITTER),
            f64::from(origin.z) - cos * spread,
        );

        let region = VeinRegion {
            min_x: origin.x - reach - margin,
            min_y: origin.y - VEIN_Y_JITTER - margin,
            min_z: origin.z - reach - margin,
            size_x: 2 * (reach + margin),
            size_y: 2 * (VEIN_Y_JITTER + margin),
            size_z: 2 * (reach + margin),
        };

        if !region.touches_terrain(self.terrain) {
            trace!(?origin, "vein region has no terrain below it");
            return BTreeSet::new();
        }

        let nodes = Self::vein_nodes(random, size, start, end);
        self.rasterize(random, &nodes, &region, discard_on_air)
    }

    fn vein_nodes<S: RandomSource>(
        random: &mut ChunkRandom<S>,
        size: i32,
        start: (f64, f64, f64),
        end: (f64, f64, f64),
    ) -> Vec<VeinNode> {
        let count = size.max(0) as usize;
        let mut nodes = Vec::with_capacity(count);
        for n in 0..count {
            let progress = f64::from(n as f32 / size as f32);
            let radius = random.next_double() * f64::from(size) / 16.0;
            let radius = (((PI * progress).sin() + 1.0) * radius + 1.0) / 2.0;
            nodes.push(VeinNode {
                x: lerp(progress, start.0, end.0),
                y: lerp(progress, start.1, end.1),
                z: lerp(progress, start.2, end.2),
                radius,
            });
        }

        // A node swallowed by a neighbour is dropped; a positive radius
        // difference always removes the later node.
        for i in 0..count.saturating_sub(1) {
            if !nodes[i].is_active() {
                continue;
            }
            for j in i + 1..count {
                if !nodes[j].is_active() {
                    continue;
                }
                let (a, b) = (nodes[i], nodes[j]);
                let dx = a.x - b.x;
                let dy = a.y - b.y;
                let dz = a.z - b.z;
                let dr = a.radius - b.radius;
                if dr * dr > dx * dx + dy * dy + dz * dz {
                    if dr > 0.0 {
                        nodes[j].deactivate();
                    } else {
                        nodes[i].deactivate();
                    }
                }
            }
        }
        nodes
    }

    fn rasterize<S: RandomSource>(
        &self,
        random: &mut ChunkRandom<S>,
        nodes: &[VeinNode],
        region: &VeinRegion,
        discard_on_air: f32,
    ) -> BTreeSet<BlockPos> {
        let mut ores = BTreeSet::new();
        let mut occupied = Occupancy::new(region.volume());

        for node in nodes.iter().filter(|node| node.radius >= 0.0) {
            let r = node.radius;
            let min_x = ((node.x - r).floor() as i32).max(region.min_x);
            let min_y = ((node.y - r).floor() as i32).max(region.min_y);
            let min_z = ((node.z - r).floor() as i32).max(region.min_z);
            let max_x = ((node.x + r).floor() as i32).max(min_x);
            let max_y = ((node.y + r).floor() as i32).max(min_y);
            let max_z = ((node.z + r).floor() as i32).max(min_z);

            for x in min_x..=max_x {
                let dx = (f64::from(x) + 0.5 - node.x) / r;
                if dx * dx >= 1.0 {
                    continue;
                }
                for y in min_y..=max_y {
                    let dy = (f64::from(y) + 0.5 - node.y) / r;
                    if dx * dx + dy * dy >= 1.0 {
                        continue;
                    }
                    for z in min_z..=max_z {
                        let dz = (f64::from(z) + 0.5 - node.z) / r;
                        if dx * dx + dy * dy + dz * dz >= 1.0 {
                            continue;
                        }
                        if !occupied.insert(region.index(x, y, z)) {
                            continue;
                        }
                        let pos = BlockPos::new(x, y, z);
                        if pos.in_build_height() && self.accepts(random, pos, discard_on_air) {
                            ores.insert(pos);
                        }
                    }
                }
            }
        }
        ores
    }

    /// Up to `size` single blocks spreading further from `origin` as the
    /// cluster grows. A negative size yields nothing and draws nothing.
    /// Blocks outside the build height are dropped after their draws.
    pub fn scattered<S: RandomSource>(
        &self,
        random: &mut ChunkRandom<S>,
        origin: BlockPos,
        size: i32,
    ) -> BTreeSet<BlockPos> {
        let mut ores = BTreeSet::new();
        if size < 0 {
            return ores;
        }
        let count = random.next_int_bounded(size.saturating_add(1));
        for i in 0..count {
            let spread = i.min(MAX_SCATTER_SPREAD);
            let x = Self::scatter_offset(random, spread) + origin.x;
            let y = Self::scatter_offset(random, spread) + origin.y;
            let z = Self::scatter_offset(random, spread) + origin.z;
            let pos = BlockPos::new(x, y, z);
            if self.accepts(random, pos, 1.0) && pos.in_build_height() {
                ores.insert(pos);
            }
        }
        ores
    }

    fn scatter_offset<S: RandomSource>(random: &mut ChunkRandom<S>, spread: i32) -> i32 {
        let a = random.next_float();
        let b = random.next_float();
        (f64::from((a - b) * spread as f32) + 0.5).floor() as i32
    }

    /// The air-exposure filter.
    ///
    /// Non-opaque candidates are rejected outright. A discard chance of 0
    /// keeps every opaque candidate without a roll; a chance of 1 also skips
    /// the roll and ignores exposure. Otherwise one float is drawn and an
    /// exposed candidate that fails the roll is dropped.
    pub fn accepts<S: RandomSource>(
        &self,
        random: &mut ChunkRandom<S>,
        pos: BlockPos,
        discard_on_air: f32,
    ) -> bool {
        if !self.air_check {
            return true;
        }
        if !self.terrain.is_opaque(pos) {
            return false;
        }
        if discard_on_air == 0.0 || (discard_on_air != 1.0 && random.next_float() >= discard_on_air)
        {
            return true;
        }
        !(discard_on_air != 1.0 && is_exposed(self.terrain, pos))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terrain::{ColumnTerrain, FlatTerrain, UnloadedTerrain};
    use seedxray_core::WORLD_MAX_Y;

    fn same_stream(a: &mut ChunkRandom, b: &mut ChunkRandom) -> bool {
        (0..4).all(|_| a.next_int() == b.next_int())
    }

    #[test]
    fn zero_size_vein_is_empty() {
        let terrain = FlatTerrain::new(320);
        let veins = VeinGenerator::new(&terrain, false);
        let mut random = ChunkRandom::new(5);
        assert!(veins
            .ellipsoid(&mut random, BlockPos::new(0, 0, 0), 0, 0.0)
            .is_empty());
        assert!(veins
            .scattered(&mut random, BlockPos::new(0, 0, 0), 0)
            .is_empty());
        assert!(veins
            .scattered(&mut random, BlockPos::new(0, 0, 0), -1)
            .is_empty());
    }

    #[test]
    fn vein_without_terrain_only_draws_preamble() {
        let veins = VeinGenerator::new(&UnloadedTerrain, false);
        let mut random = ChunkRandom::new(123);
        let ores = veins.ellipsoid(&mut random, BlockPos::new(8, 10, 8), 17, 0.0);
        assert!(ores.is_empty());

        // Angle plus two end-point jitters, nothing else.
        let mut expected = ChunkRandom::new(123);
        expected.next_float();
        expected.next_int_bounded(3);
        expected.next_int_bounded(3);
        assert!(same_stream(&mut random, &mut expected));
    }

    #[test]
    fn vein_below_region_floor_is_skipped() {
        // Surface at y=0 never reaches a region whose floor is far above it.
        let terrain = FlatTerrain::new(0);
        let veins = VeinGenerator::new(&terrain, false);
        let mut random = ChunkRandom::new(1);
        assert!(veins
            .ellipsoid(&mut random, BlockPos::new(0, 100, 0), 8, 0.0)
            .is_empty());
    }

    #[test]
    fn vein_blocks_stay_near_origin() {
        let terrain = FlatTerrain::new(320);
        let veins = VeinGenerator::new(&terrain, false);
        for seed in 0..50 {
            let mut random = ChunkRandom::new(seed);
            let origin = BlockPos::new(-40, 12, 77);
            let size = 17;
            let ores = veins.ellipsoid(&mut random, origin, size, 0.0);
            let reach = 3 + 2 + 1;
            for pos in &ores {
                assert!((pos.x - origin.x).abs() <= reach, "{pos} too far in x");
                assert!((pos.z - origin.z).abs() <= reach, "{pos} too far in z");
                assert!((pos.y - origin.y).abs() <= VEIN_Y_JITTER + 3, "{pos} too far in y");
            }
        }
    }

    #[test]
    fn veins_clip_to_build_height() {
        let terrain = FlatTerrain::new(320);
        let veins = VeinGenerator::new(&terrain, false);
        for seed in 0..50 {
            let mut random = ChunkRandom::new(seed);
            let ores = veins.ellipsoid(&mut random, BlockPos::new(0, -64, 0), 17, 0.0);
            assert!(ores.iter().all(|pos| pos.in_build_height()));
        }
    }

    #[test]
    fn scattered_cluster_spreads_at_most_seven() {
        let terrain = FlatTerrain::new(320);
        let veins = VeinGenerator::new(&terrain, false);
        for seed in 0..100 {
            let mut random = ChunkRandom::new(seed);
            let origin = BlockPos::new(3, 50, -9);
            let ores = veins.scattered(&mut random, origin, 64);
            for pos in &ores {
                assert!((pos.x - origin.x).abs() <= MAX_SCATTER_SPREAD);
                assert!((pos.y - origin.y).abs() <= MAX_SCATTER_SPREAD);
                assert!((pos.z - origin.z).abs() <= MAX_SCATTER_SPREAD);
            }
        }
    }

    #[test]
    fn scattered_cluster_at_build_limit_keeps_its_draws() {
        let terrain = FlatTerrain::new(320);
        let veins = VeinGenerator::new(&terrain, false);
        let top = BlockPos::new(4, WORLD_MAX_Y, 4);
        let lower = BlockPos::new(4, 100, 4);
        for seed in 0..40 {
            let mut clipped = ChunkRandom::new(seed);
            let mut open = ChunkRandom::new(seed);
            let at_top = veins.scattered(&mut clipped, top, 3);
            let below: BTreeSet<BlockPos> = veins
                .scattered(&mut open, lower, 3)
                .into_iter()
                .map(|pos| BlockPos::new(pos.x, pos.y + WORLD_MAX_Y - 100, pos.z))
                .filter(|pos| pos.in_build_height())
                .collect();
            assert!(!at_top.contains(&top));
            assert!(at_top.iter().all(|pos| pos.in_build_height()));
            assert_eq!(at_top, below);
            assert!(same_stream(&mut clipped, &mut open));
        }
    }

    #[test]
    fn wide_regions_index_without_overflow() {
        let region = VeinRegion {
            min_x: 0,
            min_y: 0,
            min_z: 0,
            size_x: 3000,
            size_y: 800,
            size_z: 3000,
        };
        assert_eq!(region.volume(), 7_200_000_000);
        assert_eq!(region.index(2999, 799, 2999), 7_199_999_999);
    }

    #[test]
    fn first_scattered_block_sits_on_origin() {
        let terrain = FlatTerrain::new(320);
        let veins = VeinGenerator::new(&terrain, false);
        let origin = BlockPos::new(0, 0, 0);
        for seed in 0..40 {
            let mut random = ChunkRandom::new(seed);
            let mut peek = random.clone();
            if peek.next_int_bounded(4) == 0 {
                continue;
            }
            let ores = veins.scattered(&mut random, origin, 3);
            assert!(ores.contains(&origin));
        }
    }

    #[test]
    fn air_filter_draw_rules() {
        let mut terrain = ColumnTerrain::with_area((-2, -2), (2, 2), 64);
        let pos = BlockPos::new(0, 10, 0);
        terrain.carve(BlockPos::new(0, 11, 0));
        let veins = VeinGenerator::new(&terrain, true);

        // No discard chance: no draw, exposed block kept.
        let mut random = ChunkRandom::new(3);
        assert!(veins.accepts(&mut random, pos, 0.0));
        assert!(same_stream(&mut random, &mut ChunkRandom::new(3)));

        // Discard chance of one: no draw, exposure ignored.
        let mut random = ChunkRandom::new(3);
        assert!(veins.accepts(&mut random, pos, 1.0));
        assert!(same_stream(&mut random, &mut ChunkRandom::new(3)));

        // Non-opaque candidate: rejected without a draw.
        let mut random = ChunkRandom::new(3);
        assert!(!veins.accepts(&mut random, BlockPos::new(0, 11, 0), 0.5));
        assert!(same_stream(&mut random, &mut ChunkRandom::new(3)));

        // Partial chance: exactly one float drawn.
        let mut random = ChunkRandom::new(3);
        let mut roll = ChunkRandom::new(3);
        let keep = roll.next_float() >= 0.5;
        assert_eq!(veins.accepts(&mut random, pos, 0.5), keep);
        assert!(same_stream(&mut random, &mut roll));
    }

    #[test]
    fn partial_discard_never_drops_buried_blocks() {
        let terrain = FlatTerrain::new(200);
        let veins = VeinGenerator::new(&terrain, true);
        let mut random = ChunkRandom::new(8);
        for _ in 0..200 {
            assert!(veins.accepts(&mut random, BlockPos::new(0, 50, 0), 0.7));
        }
    }

    #[test]
    fn air_check_off_accepts_everything() {
        let veins = VeinGenerator::new(&UnloadedTerrain, false);
        let mut random = ChunkRandom::new(0);
        assert!(veins.accepts(&mut random, BlockPos::new(0, 500, 0), 0.5));
    }

    #[test]
    fn occupancy_grows_past_nominal_volume() {
        let mut occupancy = Occupancy::new(4);
        assert!(occupancy.insert(2));
        assert!(!occupancy.insert(2));
        assert!(occupancy.insert(40));
        assert!(!occupancy.insert(40));
    }
}
