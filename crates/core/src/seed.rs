//! World seeds and the per-world seed store.
//!
//! Singleplayer worlds expose their seed directly; multiplayer servers do
//! not, so players enter it by hand. Text seeds follow the host's rule: a
//! decimal number is used verbatim, anything else is hashed.

use crate::DimensionId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Errors raised while parsing or storing seeds.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SeedError {
    /// The seed text was empty after trimming.
    #[error("seed cannot be empty")]
    Empty,
    /// The world name was empty after trimming.
    #[error("world name cannot be empty")]
    EmptyWorld,
}

/// A 64-bit world seed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorldSeed(pub i64);

impl WorldSeed {
    /// Convert user input into a seed.
    ///
    /// Numeric input (optionally signed) is taken as-is; other text uses the
    /// host string hash, sign-extended to 64 bits.
    pub fn parse(input: &str) -> Result<Self, SeedError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(SeedError::Empty);
        }
        match input.parse::<i64>() {
            Ok(value) => Ok(Self(value)),
            Err(_) => Ok(Self(i64::from(string_hash(input)))),
        }
    }

    pub const fn value(self) -> i64 {
        self.0
    }
}

impl fmt::Display for WorldSeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for WorldSeed {
    type Err = SeedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// 31-based polynomial hash over UTF-16 code units, wrapping at 32 bits.
pub fn string_hash(input: &str) -> i32 {
    input
        .encode_utf16()
        .fold(0i32, |hash, unit| hash.wrapping_mul(31).wrapping_add(i32::from(unit)))
}

/// Seeds entered for worlds whose seed the client cannot read itself.
///
/// Keys are server addresses, or `singleplayer_<dimension key>` for local
/// worlds.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SeedStore {
    seeds: BTreeMap<String, WorldSeed>,
}

impl SeedStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store key used for a local world in `dimension`.
    pub fn singleplayer_key(dimension: DimensionId) -> String {
        format!("singleplayer_{}", dimension.host_key())
    }

    pub fn get(&self, world: &str) -> Option<WorldSeed> {
        self.seeds.get(world.trim()).copied()
    }

    /// Parse `input` and remember it for `world`, replacing any previous seed.
    pub fn set(&mut self, world: &str, input: &str) -> Result<WorldSeed, SeedError> {
        let world = world.trim();
        if world.is_empty() {
            return Err(SeedError::EmptyWorld);
        }
        let seed = WorldSeed::parse(input)?;
        self.seeds.insert(world.to_string(), seed);
        Ok(seed)
    }

    pub fn remove(&mut self, world: &str) -> Option<WorldSeed> {
        self.seeds.remove(world.trim())
    }

    pub fn len(&self) -> usize {
        self.seeds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seeds.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, WorldSeed)> + '_ {
        self.seeds.iter().map(|(world, seed)| (world.as_str(), *seed))
    }
}

/// Status label shown next to the feature name, e.g. `SeedXRay [-4172144...]`.
pub fn seed_label(seed: Option<WorldSeed>) -> String {
    match seed {
        Some(seed) => {
            let text = seed.to_string();
            let prefix: String = text.chars().take(8).collect();
            format!("SeedXRay [{prefix}...]")
        }
        None => "SeedXRay [No Seed]".to_string(),
    }
}
