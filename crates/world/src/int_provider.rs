//! Sampled integer distributions for counts and heights.

use crate::random::{ChunkRandom, RandomSource};
use serde::{Deserialize, Serialize};
use std::fmt;

/// An integer distribution sampled from a chunk random.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntProvider {
    /// Always the same value; consumes no randomness.
    Constant(i32),
    /// Uniform over the inclusive range `[min, max]`; one bounded draw.
    Uniform { min: i32, max: i32 },
}

impl IntProvider {
    pub const fn constant(value: i32) -> Self {
        Self::Constant(value)
    }

    pub const fn uniform(min: i32, max: i32) -> Self {
        Self::Uniform { min, max }
    }

    pub fn sample<S: RandomSource>(&self, random: &mut ChunkRandom<S>) -> i32 {
        match *self {
            Self::Constant(value) => value,
            Self::Uniform { min, max } => random.next_int_bounded(max - min + 1) + min,
        }
    }

    pub const fn min_value(&self) -> i32 {
        match *self {
            Self::Constant(value) => value,
            Self::Uniform { min, .. } => min,
        }
    }

    pub const fn max_value(&self) -> i32 {
        match *self {
            Self::Constant(value) => value,
            Self::Uniform { max, .. } => max,
        }
    }

    /// A uniform range must be non-empty and its width must fit a bounded draw.
    pub fn is_valid(&self) -> bool {
        match *self {
            Self::Constant(_) => true,
            Self::Uniform { min, max } => {
                max >= min && i64::from(max) - i64::from(min) < i64::from(i32::MAX)
            }
        }
    }
}

impl fmt::Display for IntProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Constant(value) => write!(f, "{value}"),
            Self::Uniform { min, max } => write!(f, "[{min}, {max}]"),
        }
    }
}
