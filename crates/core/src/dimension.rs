//! Dimension identifiers.
//!
//! Ore profiles are dimension-scoped: overworld ores never generate in the
//! Nether and vice versa, so sweeps can be restricted to the dimension the
//! player is standing in.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Stable identifier for a world dimension.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum DimensionId {
    /// The Overworld dimension.
    #[default]
    Overworld,
    /// The Nether dimension.
    Nether,
    /// The End dimension.
    End,
}

impl DimensionId {
    pub const ALL: [Self; 3] = [Self::Overworld, Self::Nether, Self::End];

    /// Canonical string key used in configs/logs.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Overworld => "overworld",
            Self::Nether => "nether",
            Self::End => "end",
        }
    }

    /// Namespaced registry key of the dimension in the host game.
    pub const fn host_key(self) -> &'static str {
        match self {
            Self::Overworld => "minecraft:overworld",
            Self::Nether => "minecraft:the_nether",
            Self::End => "minecraft:the_end",
        }
    }
}

impl fmt::Display for DimensionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DimensionId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_ascii_lowercase();
        let s = s.strip_prefix("minecraft:").unwrap_or(&s);
        match s {
            "overworld" => Ok(Self::Overworld),
            "nether" | "the_nether" => Ok(Self::Nether),
            "end" | "the_end" => Ok(Self::End),
            other => Err(format!("unknown dimension '{other}'")),
        }
    }
}
