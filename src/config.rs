use anyhow::{Context, Result};
use seedxray_core::{DimensionId, SeedStore};
use seedxray_world::{AirCheckMode, OreRegistry, RandomBackend, DEFAULT_RANGE};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub const DEFAULT_CONFIG_PATH: &str = "config/seedxray.toml";
const DEFAULT_SEEDS_PATH: &str = "config/seeds.json";

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SeedXrayConfig {
    /// Chunks simulated around the tracked centre.
    pub range: i32,
    pub air_check: AirCheckMode,
    /// Only report blocks next to air.
    pub only_exposed: bool,
    /// Surface height of the flat stand-in terrain the CLI simulates against.
    pub surface_y: i32,
    pub backend: RandomBackend,
    /// Ore profile names to leave out.
    pub disabled_ores: Vec<String>,
    pub seeds_path: PathBuf,
    pub dimension: DimensionId,
}

impl Default for SeedXrayConfig {
    fn default() -> Self {
        Self {
            range: DEFAULT_RANGE,
            air_check: AirCheckMode::default(),
            only_exposed: false,
            surface_y: 64,
            backend: RandomBackend::default(),
            disabled_ores: Vec::new(),
            seeds_path: PathBuf::from(DEFAULT_SEEDS_PATH),
            dimension: DimensionId::default(),
        }
    }
}

impl SeedXrayConfig {
    /// Load configuration from an explicit path, falling back to defaults on errors.
    pub fn load_from_path(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(contents) => match toml::from_str::<SeedXrayConfig>(&contents) {
                Ok(cfg) => cfg,
                Err(err) => {
                    warn!("Failed to parse {}: {err}. Using defaults", path.display());
                    SeedXrayConfig::default()
                }
            },
            Err(err) => {
                if path != Path::new(DEFAULT_CONFIG_PATH)
                    || err.kind() != std::io::ErrorKind::NotFound
                {
                    warn!("Failed to read {}: {err}. Using defaults", path.display());
                } else {
                    debug!("No config at {}. Using defaults", path.display());
                }
                SeedXrayConfig::default()
            }
        }
    }

    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        let toml = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, toml).with_context(|| format!("failed to write {}", path.display()))?;
        Ok(())
    }

    /// Default ore table restricted to the configured dimension, minus
    /// `disabled_ores`. Unknown names are logged and skipped.
    pub fn registry(&self) -> OreRegistry {
        let mut registry = OreRegistry::defaults();
        registry.restrict_to_dimension(self.dimension);
        for name in &self.disabled_ores {
            if let Err(err) = registry.set_enabled(name, false) {
                warn!("Ignoring disabled_ores entry: {err}");
            }
        }
        registry
    }
}

/// Read the seed store; a missing file is an empty store.
pub fn load_seed_store(path: &Path) -> Result<SeedStore> {
    match fs::read_to_string(path) {
        Ok(contents) => serde_json::from_str(&contents)
            .with_context(|| format!("failed to parse seed store {}", path.display())),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(SeedStore::new()),
        Err(err) => {
            Err(err).with_context(|| format!("failed to read seed store {}", path.display()))
        }
    }
}

pub fn save_seed_store(path: &Path, store: &SeedStore) -> Result<()> {
    let json = serde_json::to_string_pretty(store)?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, json)
        .with_context(|| format!("failed to write seed store {}", path.display()))?;
    Ok(())
}
