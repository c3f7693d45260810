//! Host-compatible chunk random streams.
//!
//! Ore placement is only predictable if every draw matches the host bit for
//! bit, so the source algorithms and the derived `next_*` helpers below are
//! fixed by the host and must not be "improved".

use serde::{Deserialize, Serialize};

const LCG_MULTIPLIER: u64 = 0x5_DEEC_E66D;
const LCG_ADDEND: u64 = 0xB;
const LCG_MASK: u64 = (1 << 48) - 1;

const FLOAT_UNIT: f32 = 1.0 / (1u32 << 24) as f32;
const DOUBLE_UNIT: f64 = 1.0 / (1u64 << 53) as f64;

/// A seedable stream of raw random bits.
pub trait RandomSource {
    /// Reset the stream to the state derived from `seed`.
    fn set_seed(&mut self, seed: i64);

    /// Next `bits` (1..=32) random bits, in the low bits of the result.
    fn next_bits(&mut self, bits: u32) -> i32;
}

/// The 48-bit linear congruential generator behind the host's checked random.
#[derive(Debug, Clone)]
pub struct LegacyRandom {
    state: u64,
}

impl LegacyRandom {
    pub fn new(seed: i64) -> Self {
        let mut random = Self { state: 0 };
        random.set_seed(seed);
        random
    }
}

impl RandomSource for LegacyRandom {
    fn set_seed(&mut self, seed: i64) {
        self.state = (seed as u64 ^ LCG_MULTIPLIER) & LCG_MASK;
    }

    #[inline]
    fn next_bits(&mut self, bits: u32) -> i32 {
        debug_assert!((1..=32).contains(&bits));
        self.state = self
            .state
            .wrapping_mul(LCG_MULTIPLIER)
            .wrapping_add(LCG_ADDEND)
            & LCG_MASK;
        (self.state >> (48 - bits)) as i32
    }
}

/// Xoroshiro128++ as used by the host's newer feature generators.
#[derive(Debug, Clone)]
pub struct XoroshiroRandom {
    lo: u64,
    hi: u64,
}

impl XoroshiroRandom {
    const GOLDEN_RATIO_64: u64 = 0x6A09_E667_F3BC_C909;
    const SILVER_RATIO_64: u64 = 0x9E37_79B9_7F4A_7C15;

    pub fn new(seed: i64) -> Self {
        let mut random = Self { lo: 0, hi: 0 };
        random.set_seed(seed);
        random
    }

    fn mix_stafford13(mut z: u64) -> u64 {
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^ (z >> 31)
    }

    pub fn next_long(&mut self) -> i64 {
        let lo = self.lo;
        let mut hi = self.hi;
        let result = lo.wrapping_add(hi).rotate_left(17).wrapping_add(lo);
        hi ^= lo;
        self.lo = lo.rotate_left(49) ^ hi ^ (hi << 21);
        self.hi = hi.rotate_left(28);
        result as i64
    }
}

impl RandomSource for XoroshiroRandom {
    fn set_seed(&mut self, seed: i64) {
        let unmixed_lo = seed as u64 ^ Self::GOLDEN_RATIO_64;
        let unmixed_hi = unmixed_lo.wrapping_add(Self::SILVER_RATIO_64);
        self.lo = Self::mix_stafford13(unmixed_lo);
        self.hi = Self::mix_stafford13(unmixed_hi);
        if self.lo == 0 && self.hi == 0 {
            self.lo = Self::SILVER_RATIO_64;
            self.hi = Self::GOLDEN_RATIO_64;
        }
    }

    #[inline]
    fn next_bits(&mut self, bits: u32) -> i32 {
        debug_assert!((1..=32).contains(&bits));
        ((self.next_long() as u64) >> (64 - bits)) as i32
    }
}

/// Which bit source backs a [`ChunkRandom`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RandomBackend {
    /// The host's 48-bit linear congruential generator.
    #[default]
    Legacy,
    /// Xoroshiro128++ bits under the legacy draw rules; not host-compatible.
    Xoroshiro,
}

/// Chunk-scoped random with population/decorator seeding.
///
/// Bounded and floating draws are derived from [`RandomSource::next_bits`]
/// the way the host's legacy random derives them. Only the legacy source is
/// host-compatible: the host's Xoroshiro random overrides these draws, so a
/// Xoroshiro-backed `ChunkRandom` is deterministic but predicts other blocks.
#[derive(Debug, Clone)]
pub struct ChunkRandom<S: RandomSource = LegacyRandom> {
    source: S,
}

impl ChunkRandom<LegacyRandom> {
    /// Legacy-backed random seeded with `seed`.
    pub fn new(seed: i64) -> Self {
        Self::with_source(LegacyRandom::new(seed))
    }
}

impl<S: RandomSource> ChunkRandom<S> {
    pub fn with_source(source: S) -> Self {
        Self { source }
    }

    pub fn set_seed(&mut self, seed: i64) {
        self.source.set_seed(seed);
    }

    #[inline]
    fn next(&mut self, bits: u32) -> i32 {
        self.source.next_bits(bits)
    }

    pub fn next_int(&mut self) -> i32 {
        self.next(32)
    }

    /// Uniform integer in `[0, bound)`.
    pub fn next_int_bounded(&mut self, bound: i32) -> i32 {
        debug_assert!(bound > 0, "bound must be positive, got {bound}");
        if bound & (bound - 1) == 0 {
            return ((i64::from(bound) * i64::from(self.next(31))) >> 31) as i32;
        }
        loop {
            let bits = self.next(31);
            let value = bits % bound;
            // Reject the tail that would bias low values.
            if bits.wrapping_sub(value).wrapping_add(bound - 1) >= 0 {
                return value;
            }
        }
    }

    pub fn next_long(&mut self) -> i64 {
        let high = i64::from(self.next(32)) << 32;
        high.wrapping_add(i64::from(self.next(32)))
    }

    /// Uniform float in `[0, 1)` with 24 bits of precision.
    pub fn next_float(&mut self) -> f32 {
        self.next(24) as f32 * FLOAT_UNIT
    }

    /// Uniform double in `[0, 1)` with 53 bits of precision.
    pub fn next_double(&mut self) -> f64 {
        let high = i64::from(self.next(26)) << 27;
        let low = i64::from(self.next(27));
        (high + low) as f64 * DOUBLE_UNIT
    }

    /// Seed the stream for decorating the chunk whose north-west block corner
    /// is `(block_x, block_z)`, returning the population seed.
    pub fn set_population_seed(&mut self, world_seed: i64, block_x: i32, block_z: i32) -> i64 {
        self.set_seed(world_seed);
        let a = self.next_long() | 1;
        let b = self.next_long() | 1;
        let seed = (i64::from(block_x).wrapping_mul(a))
            .wrapping_add(i64::from(block_z).wrapping_mul(b))
            ^ world_seed;
        self.set_seed(seed);
        seed
    }

    /// Re-seed for feature `index` of generation step `step`.
    pub fn set_decorator_seed(&mut self, population_seed: i64, index: i32, step: i32) {
        let seed = population_seed
            .wrapping_add(i64::from(index))
            .wrapping_add(10_000 * i64::from(step));
        self.set_seed(seed);
    }
}
