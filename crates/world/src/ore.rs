//! Ore generation profiles and the ordered registry of them.
//!
//! A profile's `generation_step`/`decorator_index` pair selects its random
//! stream inside a chunk. Two profiles sharing a pair would draw identical
//! streams, so the registry refuses to be built that way.

use crate::int_provider::IntProvider;
use seedxray_core::{BlockKey, BlockKeyError, DimensionId, WORLD_MAX_Y, WORLD_MIN_Y};
use serde::Serialize;
use std::collections::BTreeSet;
use thiserror::Error;

/// Largest vein or cluster size the host's ore feature accepts.
pub const MAX_VEIN_SIZE: i32 = 64;

/// Errors raised while building a profile or registry.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProfileError {
    #[error("ore profile name cannot be empty")]
    EmptyName,
    #[error("ore profile {name}: invalid block key: {source}")]
    Block {
        name: String,
        #[source]
        source: BlockKeyError,
    },
    #[error("ore profile {name}: rarity {rarity} must be in (0, 1]")]
    Rarity { name: String, rarity: f32 },
    #[error("ore profile {name}: size {size} must be in 1..=64")]
    Size { name: String, size: i32 },
    #[error("ore profile {name}: discard-on-air chance {chance} must be in [0, 1]")]
    DiscardOnAir { name: String, chance: f32 },
    #[error("ore profile {name}: invalid count distribution {count}")]
    Count { name: String, count: IntProvider },
    #[error("ore profile {name}: height range {height} must lie within the build height")]
    Height { name: String, height: IntProvider },
    #[error("duplicate ore profile name {0}")]
    DuplicateName(String),
    #[error("ore profiles {first} and {second} share generation step {step} and index {index}")]
    DuplicateStream {
        first: String,
        second: String,
        step: i32,
        index: i32,
    },
}

/// Errors raised when toggling registry entries.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("unknown ore profile {0}")]
    UnknownOre(String),
}

/// Immutable generation parameters for one ore feature.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OreProfile {
    name: String,
    block: BlockKey,
    dimension: DimensionId,
    color: u32,
    count: IntProvider,
    height: IntProvider,
    size: i32,
    rarity: f32,
    discard_on_air: f32,
    scattered: bool,
    generation_step: i32,
    decorator_index: i32,
}

impl OreProfile {
    /// Start building a profile named `name` that predicts `block`.
    pub fn builder(name: impl Into<String>, block: impl Into<String>) -> OreProfileBuilder {
        OreProfileBuilder {
            name: name.into(),
            block: block.into(),
            dimension: DimensionId::Overworld,
            color: 0xFF_FFFF,
            count: IntProvider::constant(1),
            height: IntProvider::uniform(WORLD_MIN_Y, WORLD_MAX_Y - 1),
            size: 1,
            rarity: 1.0,
            discard_on_air: 0.0,
            scattered: false,
            generation_step: 0,
            decorator_index: 0,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn block(&self) -> &BlockKey {
        &self.block
    }

    pub fn dimension(&self) -> DimensionId {
        self.dimension
    }

    /// Display colour as `0xRRGGBB`.
    pub fn color(&self) -> u32 {
        self.color
    }

    /// Placement attempts per chunk.
    pub fn count(&self) -> IntProvider {
        self.count
    }

    /// Origin Y distribution of each attempt.
    pub fn height(&self) -> IntProvider {
        self.height
    }

    pub fn size(&self) -> i32 {
        self.size
    }

    /// Probability that a placement attempt is kept.
    pub fn rarity(&self) -> f32 {
        self.rarity
    }

    pub fn discard_on_air(&self) -> f32 {
        self.discard_on_air
    }

    pub fn scattered(&self) -> bool {
        self.scattered
    }

    pub fn generation_step(&self) -> i32 {
        self.generation_step
    }

    pub fn decorator_index(&self) -> i32 {
        self.decorator_index
    }
}

/// Builder validating profile parameters on [`build`](Self::build).
#[derive(Debug, Clone)]
pub struct OreProfileBuilder {
    name: String,
    block: String,
    dimension: DimensionId,
    color: u32,
    count: IntProvider,
    height: IntProvider,
    size: i32,
    rarity: f32,
    discard_on_air: f32,
    scattered: bool,
    generation_step: i32,
    decorator_index: i32,
}

impl OreProfileBuilder {
    pub fn dimension(mut self, dimension: DimensionId) -> Self {
        self.dimension = dimension;
        self
    }

    pub fn color(mut self, color: u32) -> Self {
        self.color = color & 0xFF_FFFF;
        self
    }

    pub fn count(mut self, count: IntProvider) -> Self {
        self.count = count;
        self
    }

    pub fn height(mut self, height: IntProvider) -> Self {
        self.height = height;
        self
    }

    pub fn size(mut self, size: i32) -> Self {
        self.size = size;
        self
    }

    pub fn rarity(mut self, rarity: f32) -> Self {
        self.rarity = rarity;
        self
    }

    pub fn discard_on_air(mut self, chance: f32) -> Self {
        self.discard_on_air = chance;
        self
    }

    pub fn scattered(mut self, scattered: bool) -> Self {
        self.scattered = scattered;
        self
    }

    /// Host generation step and feature index; together they pick the stream.
    pub fn stream(mut self, generation_step: i32, decorator_index: i32) -> Self {
        self.generation_step = generation_step;
        self.decorator_index = decorator_index;
        self
    }

    pub fn build(self) -> Result<OreProfile, ProfileError> {
        let name = self.name.trim().to_string();
        if name.is_empty() {
            return Err(ProfileError::EmptyName);
        }
        let block = BlockKey::parse(&self.block).map_err(|source| ProfileError::Block {
            name: name.clone(),
            source,
        })?;
        if !(self.rarity.is_finite() && self.rarity > 0.0 && self.rarity <= 1.0) {
            return Err(ProfileError::Rarity {
                name,
                rarity: self.rarity,
            });
        }
        if !(1..=MAX_VEIN_SIZE).contains(&self.size) {
            return Err(ProfileError::Size {
                name,
                size: self.size,
            });
        }
        if !(0.0..=1.0).contains(&self.discard_on_air) {
            return Err(ProfileError::DiscardOnAir {
                name,
                chance: self.discard_on_air,
            });
        }
        if !self.count.is_valid() || self.count.min_value() < 0 {
            return Err(ProfileError::Count {
                name,
                count: self.count,
            });
        }
        if !self.height.is_valid()
            || self.height.min_value() < WORLD_MIN_Y
            || self.height.max_value() > WORLD_MAX_Y
        {
            return Err(ProfileError::Height {
                name,
                height: self.height,
            });
        }

        Ok(OreProfile {
            name,
            block,
            dimension: self.dimension,
            color: self.color,
            count: self.count,
            height: self.height,
            size: self.size,
            rarity: self.rarity,
            discard_on_air: self.discard_on_air,
            scattered: self.scattered,
            generation_step: self.generation_step,
            decorator_index: self.decorator_index,
        })
    }
}

/// Ordered catalogue of ore profiles plus the caller's enabled flags.
#[derive(Debug, Clone)]
pub struct OreRegistry {
    profiles: Vec<OreProfile>,
    enabled: Vec<bool>,
}

impl OreRegistry {
    /// Build a registry; every profile starts enabled.
    pub fn new(profiles: Vec<OreProfile>) -> Result<Self, ProfileError> {
        let mut names = BTreeSet::new();
        for (i, profile) in profiles.iter().enumerate() {
            if !names.insert(profile.name.as_str()) {
                return Err(ProfileError::DuplicateName(profile.name.clone()));
            }
            let clash = profiles[..i].iter().find(|other| {
                other.generation_step == profile.generation_step
                    && other.decorator_index == profile.decorator_index
            });
            if let Some(other) = clash {
                return Err(ProfileError::DuplicateStream {
                    first: other.name.clone(),
                    second: profile.name.clone(),
                    step: profile.generation_step,
                    index: profile.decorator_index,
                });
            }
        }
        let enabled = vec![true; profiles.len()];
        Ok(Self { profiles, enabled })
    }

    /// The built-in overworld and nether ore table.
    pub fn defaults() -> Self {
        default_profiles()
            .and_then(Self::new)
            .expect("built-in ore profiles are valid")
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    /// All profiles in registry order.
    pub fn iter(&self) -> impl Iterator<Item = &OreProfile> + '_ {
        self.profiles.iter()
    }

    /// Enabled profiles in registry order.
    pub fn enabled(&self) -> impl Iterator<Item = &OreProfile> + '_ {
        self.profiles
            .iter()
            .zip(&self.enabled)
            .filter(|(_, enabled)| **enabled)
            .map(|(profile, _)| profile)
    }

    pub fn get(&self, name: &str) -> Option<&OreProfile> {
        self.position(name).map(|i| &self.profiles[i])
    }

    pub fn is_enabled(&self, name: &str) -> bool {
        self.position(name).is_some_and(|i| self.enabled[i])
    }

    pub fn set_enabled(&mut self, name: &str, enabled: bool) -> Result<(), RegistryError> {
        let i = self
            .position(name)
            .ok_or_else(|| RegistryError::UnknownOre(name.to_string()))?;
        self.enabled[i] = enabled;
        Ok(())
    }

    /// Enable exactly the named profiles; unknown names leave the flags untouched.
    pub fn enable_only<'a, I>(&mut self, names: I) -> Result<(), RegistryError>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut wanted = vec![false; self.profiles.len()];
        for name in names {
            let i = self
                .position(name)
                .ok_or_else(|| RegistryError::UnknownOre(name.to_string()))?;
            wanted[i] = true;
        }
        self.enabled = wanted;
        Ok(())
    }

    /// Disable every profile that does not generate in `dimension`.
    pub fn restrict_to_dimension(&mut self, dimension: DimensionId) {
        for (profile, enabled) in self.profiles.iter().zip(self.enabled.iter_mut()) {
            if profile.dimension != dimension {
                *enabled = false;
            }
        }
    }

    fn position(&self, name: &str) -> Option<usize> {
        let name = name.trim();
        self.profiles
            .iter()
            .position(|p| p.name.eq_ignore_ascii_case(name))
    }
}

impl Default for OreRegistry {
    fn default() -> Self {
        Self::defaults()
    }
}

struct DefaultOre {
    name: &'static str,
    block: &'static str,
    color: u32,
    count: IntProvider,
    height: IntProvider,
    size: i32,
    rarity: f32,
    scattered: bool,
    step: i32,
    index: i32,
}

#[allow(clippy::too_many_arguments)]
const fn ore(
    name: &'static str,
    block: &'static str,
    color: u32,
    count: IntProvider,
    height: IntProvider,
    size: i32,
    rarity: f32,
    scattered: bool,
    step: i32,
    index: i32,
) -> DefaultOre {
    DefaultOre {
        name,
        block,
        color,
        count,
        height,
        size,
        rarity,
        scattered,
        step,
        index,
    }
}

const ONE: IntProvider = IntProvider::constant(1);
const UNDERGROUND_ORES: i32 = 6;
const NETHER_ORES: i32 = 7;

#[rustfmt::skip]
const DEFAULT_ORES: [DefaultOre; 19] = [
    ore("Coal", "coal_ore", 0x2F2C36, IntProvider::uniform(1, 2), IntProvider::uniform(5, 90), 17, 1.0, false, UNDERGROUND_ORES, 0),
    ore("Deepslate Coal", "deepslate_coal_ore", 0x2F2C36, IntProvider::uniform(1, 2), IntProvider::uniform(-64, 0), 17, 1.0, false, UNDERGROUND_ORES, 1),
    ore("Iron", "iron_ore", 0xECAD77, ONE, IntProvider::uniform(15, 112), 9, 1.0, false, UNDERGROUND_ORES, 2),
    ore("Deepslate Iron", "deepslate_iron_ore", 0xECAD77, ONE, IntProvider::uniform(-64, 72), 9, 1.0, false, UNDERGROUND_ORES, 3),
    ore("Gold", "gold_ore", 0xF7E51E, ONE, IntProvider::uniform(-64, 32), 9, 1.0, false, UNDERGROUND_ORES, 4),
    ore("Deepslate Gold", "deepslate_gold_ore", 0xF7E51E, ONE, IntProvider::uniform(-64, -48), 9, 1.0, false, UNDERGROUND_ORES, 5),
    ore("Diamond", "diamond_ore", 0x21F4FF, ONE, IntProvider::uniform(-64, 16), 8, 1.0, false, UNDERGROUND_ORES, 6),
    ore("Deepslate Diamond", "deepslate_diamond_ore", 0x21F4FF, ONE, IntProvider::uniform(-64, 16), 8, 1.0, false, UNDERGROUND_ORES, 7),
    ore("Redstone", "redstone_ore", 0xF50717, ONE, IntProvider::uniform(-64, 16), 8, 1.0, false, UNDERGROUND_ORES, 8),
    ore("Deepslate Redstone", "deepslate_redstone_ore", 0xF50717, ONE, IntProvider::uniform(-64, 16), 8, 1.0, false, UNDERGROUND_ORES, 9),
    ore("Lapis", "lapis_ore", 0x081ABD, ONE, IntProvider::uniform(-64, 64), 7, 1.0, false, UNDERGROUND_ORES, 10),
    ore("Deepslate Lapis", "deepslate_lapis_ore", 0x081ABD, ONE, IntProvider::uniform(-64, 64), 7, 1.0, false, UNDERGROUND_ORES, 11),
    ore("Copper", "copper_ore", 0xEF9700, ONE, IntProvider::uniform(-16, 112), 10, 1.0, false, UNDERGROUND_ORES, 12),
    ore("Deepslate Copper", "deepslate_copper_ore", 0xEF9700, ONE, IntProvider::uniform(-64, 0), 10, 1.0, false, UNDERGROUND_ORES, 13),
    ore("Emerald", "emerald_ore", 0x1BD12D, ONE, IntProvider::uniform(-16, 320), 3, 0.5, true, UNDERGROUND_ORES, 14),
    ore("Deepslate Emerald", "deepslate_emerald_ore", 0x1BD12D, ONE, IntProvider::uniform(-64, 0), 3, 0.5, true, UNDERGROUND_ORES, 15),
    ore("Nether Gold", "nether_gold_ore", 0xF7E51E, ONE, IntProvider::uniform(10, 117), 10, 1.0, false, NETHER_ORES, 16),
    ore("Nether Quartz", "nether_quartz_ore", 0xCDCDCD, ONE, IntProvider::uniform(10, 117), 14, 1.0, false, NETHER_ORES, 17),
    ore("Ancient Debris", "ancient_debris", 0xD11BF5, ONE, IntProvider::uniform(8, 22), 3, 1.0, true, NETHER_ORES, 18),
];

fn default_profiles() -> Result<Vec<OreProfile>, ProfileError> {
    DEFAULT_ORES
        .iter()
        .map(|ore| {
            let dimension = if ore.step == NETHER_ORES {
                DimensionId::Nether
            } else {
                DimensionId::Overworld
            };
            OreProfile::builder(ore.name, ore.block)
                .dimension(dimension)
                .color(ore.color)
                .count(ore.count)
                .height(ore.height)
                .size(ore.size)
                .rarity(ore.rarity)
                .scattered(ore.scattered)
                .stream(ore.step, ore.index)
                .build()
        })
        .collect()
}
