//! Subcommand handlers. Each writes its report to the supplied writer.

use crate::config::{load_seed_store, save_seed_store, SeedXrayConfig};
use anyhow::{bail, Context, Result};
use clap::Args;
use seedxray_core::{seed_label, ChunkPos, SeedStore, WorldSeed};
use seedxray_testkit::{MetricsReportBuilder, MetricsSink, SweepMetrics, TestExecutionMetrics};
use seedxray_world::{
    simulate_area, CancelToken, ChunkOreSimulator, FlatTerrain, OreTracker, SweepRequest,
};
use std::io::Write;
use std::path::PathBuf;
use std::time::Instant;
use tracing::info;

/// Where the world seed comes from.
#[derive(Args, Debug, Clone, Default)]
pub struct SeedArgs {
    /// World seed, as a number or text
    #[arg(long, allow_hyphen_values = true)]
    pub seed: Option<String>,
    /// Stored world to read the seed from when --seed is absent
    #[arg(long)]
    pub world: Option<String>,
}

impl SeedArgs {
    /// An explicit seed wins; otherwise look the world up in the seed store,
    /// defaulting to the singleplayer world of the configured dimension.
    pub fn resolve(&self, config: &SeedXrayConfig) -> Result<WorldSeed> {
        if let Some(text) = &self.seed {
            return WorldSeed::parse(text).context("invalid --seed");
        }
        let world = self
            .world
            .clone()
            .unwrap_or_else(|| SeedStore::singleplayer_key(config.dimension));
        let store = load_seed_store(&config.seeds_path)?;
        store.get(&world).with_context(|| {
            format!("no seed stored for {world}; pass --seed or run `seedxray seed set`")
        })
    }
}

/// Air-check override; without either flag the configured mode decides.
#[derive(Args, Debug, Clone, Default)]
pub struct AirCheckArgs {
    /// Drop blocks the anti-xray pass would discard
    #[arg(long, conflicts_with = "no_air_check")]
    pub air_check: bool,
    /// Keep every predicted block even if the config enables the air check
    #[arg(long)]
    pub no_air_check: bool,
}

impl AirCheckArgs {
    pub fn resolve(&self, config: &SeedXrayConfig) -> bool {
        if self.air_check {
            true
        } else if self.no_air_check {
            false
        } else {
            config.air_check.air_check()
        }
    }
}

pub struct SimulateOptions {
    pub chunk: ChunkPos,
    pub air_check: bool,
    pub only: Vec<String>,
    pub json: bool,
}

pub struct SweepOptions {
    pub center: ChunkPos,
    pub radius: i32,
    pub air_check: bool,
    pub metrics: Option<PathBuf>,
}

pub fn chunk_arg(values: &[i32]) -> Result<ChunkPos> {
    match values {
        [x, z] => Ok(ChunkPos::new(*x, *z)),
        _ => bail!("expected two chunk coordinates, got {}", values.len()),
    }
}

pub fn chunk_path(values: &[i32]) -> Result<Vec<ChunkPos>> {
    if values.is_empty() || values.len() % 2 != 0 {
        bail!("expected X Z pairs, got {} values", values.len());
    }
    values.chunks(2).map(chunk_arg).collect()
}

pub fn list_ores(config: &SeedXrayConfig, out: &mut impl Write) -> Result<()> {
    let registry = config.registry();
    for profile in registry.iter() {
        writeln!(
            out,
            "{:<20} {:<32} {:<10} {}",
            profile.name(),
            profile.block().to_string(),
            profile.dimension().as_str(),
            if registry.is_enabled(profile.name()) {
                "enabled"
            } else {
                "disabled"
            }
        )?;
    }
    Ok(())
}

pub fn simulate(
    config: &SeedXrayConfig,
    seed: &SeedArgs,
    options: &SimulateOptions,
    out: &mut impl Write,
) -> Result<()> {
    let world_seed = seed.resolve(config)?;
    let mut registry = config.registry();
    if !options.only.is_empty() {
        registry.enable_only(options.only.iter().map(String::as_str))?;
    }
    let terrain = FlatTerrain::new(config.surface_y);
    let simulator = ChunkOreSimulator::new(world_seed.value()).with_backend(config.backend);
    let mut result =
        simulator.simulate_chunk(options.chunk, registry.enabled(), options.air_check, &terrain);
    if config.only_exposed {
        result = result.filter_exposed(&terrain);
    }

    if options.json {
        writeln!(out, "{}", serde_json::to_string_pretty(&result)?)?;
        return Ok(());
    }

    writeln!(out, "{} chunk {}", seed_label(Some(world_seed)), options.chunk)?;
    for (name, positions) in result.iter() {
        writeln!(out, "{name}: {} blocks", positions.len())?;
        for pos in positions {
            writeln!(out, "  {pos}")?;
        }
    }
    writeln!(out, "total: {} blocks", result.total())?;
    Ok(())
}

pub fn sweep(
    config: &SeedXrayConfig,
    seed: &SeedArgs,
    options: &SweepOptions,
    out: &mut impl Write,
) -> Result<()> {
    let world_seed = seed.resolve(config)?;
    let registry = config.registry();
    let terrain = FlatTerrain::new(config.surface_y);
    let request = SweepRequest::new(world_seed.value(), options.center, options.radius)
        .with_air_check(options.air_check)
        .with_backend(config.backend);

    let started = Instant::now();
    let area = simulate_area(&request, &registry, &terrain, &CancelToken::new())?;
    let elapsed = started.elapsed();
    info!(chunks = area.len(), ?elapsed, "sweep complete");

    writeln!(
        out,
        "{} swept {} chunks around {}",
        seed_label(Some(world_seed)),
        area.len(),
        options.center
    )?;
    for (name, count) in area.totals() {
        writeln!(out, "{name:<20} {count}")?;
    }
    writeln!(out, "{:<20} {}", "total", area.total())?;

    if let Some(path) = &options.metrics {
        let metrics = SweepMetrics {
            world_seed: world_seed.value(),
            center: [options.center.x, options.center.z],
            radius: options.radius,
            chunks_simulated: area.len(),
            blocks_total: area.total(),
            blocks_per_ore: area.totals().clone(),
            total_time_ms: elapsed.as_secs_f64() * 1000.0,
            chunks_per_second: 0.0,
        }
        .with_throughput();
        let report = MetricsReportBuilder::new("seedxray_sweep")
            .sweep(metrics)
            .execution(TestExecutionMetrics {
                duration_seconds: elapsed.as_secs_f64(),
                threads: std::thread::available_parallelism().ok().map(usize::from),
            })
            .build();
        MetricsSink::create(path)?.write(&report)?;
        writeln!(out, "metrics written to {}", path.display())?;
    }
    Ok(())
}

pub fn track(
    config: &SeedXrayConfig,
    seed: &SeedArgs,
    centers: &[ChunkPos],
    out: &mut impl Write,
) -> Result<()> {
    let world_seed = seed.resolve(config)?;
    let registry = config.registry();
    let terrain = FlatTerrain::new(config.surface_y);
    let simulator = ChunkOreSimulator::new(world_seed.value()).with_backend(config.backend);
    let mut tracker = OreTracker::new(simulator)
        .with_mode(config.air_check)
        .with_range(config.range)
        .with_only_exposed(config.only_exposed);

    writeln!(out, "{}", seed_label(Some(world_seed)))?;
    for &center in centers {
        let update = tracker.update(center, &registry, &terrain);
        let visible = tracker.visible(&registry, &terrain).len();
        writeln!(
            out,
            "{center}: simulated {}, evicted {}, cached {}, visible {visible}",
            update.simulated,
            update.evicted,
            tracker.cache().len()
        )?;
    }
    Ok(())
}

pub fn seed_get(config: &SeedXrayConfig, world: &str, out: &mut impl Write) -> Result<()> {
    let store = load_seed_store(&config.seeds_path)?;
    match store.get(world) {
        Some(seed) => writeln!(out, "Seed for {}: {seed}", world.trim())?,
        None => writeln!(out, "No seed set for {}", world.trim())?,
    }
    Ok(())
}

pub fn seed_set(
    config: &SeedXrayConfig,
    world: &str,
    value: &str,
    out: &mut impl Write,
) -> Result<()> {
    let mut store = load_seed_store(&config.seeds_path)?;
    let seed = store.set(world, value)?;
    save_seed_store(&config.seeds_path, &store)?;
    writeln!(out, "Seed set to {seed} for {}", world.trim())?;
    Ok(())
}

pub fn seed_remove(config: &SeedXrayConfig, world: &str, out: &mut impl Write) -> Result<()> {
    let mut store = load_seed_store(&config.seeds_path)?;
    match store.remove(world) {
        Some(_) => {
            save_seed_store(&config.seeds_path, &store)?;
            writeln!(out, "Seed removed for {}", world.trim())?;
        }
        None => writeln!(out, "No seed set for {}", world.trim())?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use seedxray_world::AirCheckMode;

    fn temp_config(dir: &tempfile::TempDir) -> SeedXrayConfig {
        SeedXrayConfig {
            seeds_path: dir.path().join("seeds.json"),
            ..SeedXrayConfig::default()
        }
    }

    fn explicit(seed: &str) -> SeedArgs {
        SeedArgs {
            seed: Some(seed.to_string()),
            world: None,
        }
    }

    fn output(run: impl FnOnce(&mut Vec<u8>) -> Result<()>) -> String {
        let mut buf = Vec::new();
        run(&mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn air_check_flags_override_the_configured_mode() {
        let mut config = SeedXrayConfig::default();
        let none = AirCheckArgs::default();
        let on = AirCheckArgs {
            air_check: true,
            ..AirCheckArgs::default()
        };
        let off = AirCheckArgs {
            no_air_check: true,
            ..AirCheckArgs::default()
        };
        assert!(none.resolve(&config));
        assert!(!off.resolve(&config));

        config.air_check = AirCheckMode::Off;
        assert!(!none.resolve(&config));
        assert!(on.resolve(&config));
    }

    #[test]
    fn chunk_arguments_pair_up() {
        assert_eq!(chunk_arg(&[1, -2]).unwrap(), ChunkPos::new(1, -2));
        assert!(chunk_arg(&[1]).is_err());
        assert_eq!(
            chunk_path(&[0, 0, 3, 4]).unwrap(),
            vec![ChunkPos::new(0, 0), ChunkPos::new(3, 4)]
        );
        assert!(chunk_path(&[0, 0, 3]).is_err());
    }

    #[test]
    fn ore_listing_marks_disabled_profiles() {
        let dir = tempfile::tempdir().unwrap();
        let config = SeedXrayConfig {
            disabled_ores: vec!["Iron".into()],
            ..temp_config(&dir)
        };
        let text = output(|out| list_ores(&config, out));
        assert_eq!(text.lines().count(), 19);
        let iron = text.lines().find(|line| line.starts_with("Iron ")).unwrap();
        assert!(iron.contains("minecraft:iron_ore"));
        assert!(iron.ends_with("disabled"));
        let debris = text.lines().find(|line| line.starts_with("Ancient Debris")).unwrap();
        assert!(debris.contains("nether"));
        assert!(debris.ends_with("disabled"));
    }

    #[test]
    fn seed_commands_round_trip_through_store() {
        let dir = tempfile::tempdir().unwrap();
        let config = temp_config(&dir);

        let text = output(|out| seed_get(&config, "srv", out));
        assert_eq!(text, "No seed set for srv\n");
        let text = output(|out| seed_set(&config, "srv", "Glacier", out));
        assert_eq!(text, "Seed set to 1772835215 for srv\n");
        let text = output(|out| seed_get(&config, "srv", out));
        assert_eq!(text, "Seed for srv: 1772835215\n");
        let text = output(|out| seed_remove(&config, "srv", out));
        assert_eq!(text, "Seed removed for srv\n");
        assert!(load_seed_store(&config.seeds_path).unwrap().is_empty());
    }

    #[test]
    fn stored_seed_is_used_when_none_given() {
        let dir = tempfile::tempdir().unwrap();
        let config = temp_config(&dir);
        let args = SeedArgs::default();
        assert!(args.resolve(&config).is_err());

        let key = SeedStore::singleplayer_key(config.dimension);
        output(|out| seed_set(&config, &key, "-5", out));
        assert_eq!(args.resolve(&config).unwrap(), WorldSeed(-5));
        assert_eq!(explicit("7").resolve(&config).unwrap(), WorldSeed(7));
    }

    #[test]
    fn simulate_text_and_json_agree() {
        let dir = tempfile::tempdir().unwrap();
        let config = temp_config(&dir);
        let options = SimulateOptions {
            chunk: ChunkPos::new(2, -1),
            air_check: false,
            only: vec!["Coal".into()],
            json: false,
        };
        let text = output(|out| simulate(&config, &explicit("42"), &options, out));
        assert!(text.starts_with("SeedXRay [42...] chunk (2, -1)\n"));
        assert!(text.lines().all(|line| !line.starts_with("Iron")));

        let json = output(|out| {
            simulate(
                &config,
                &explicit("42"),
                &SimulateOptions {
                    json: true,
                    ..options
                },
                out,
            )
        });
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        let coal = parsed.get("Coal").and_then(|v| v.as_array()).map_or(0, Vec::len);
        assert!(text.ends_with(&format!("total: {coal} blocks\n")));
    }

    #[test]
    fn unknown_only_name_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let config = temp_config(&dir);
        let options = SimulateOptions {
            chunk: ChunkPos::new(0, 0),
            air_check: false,
            only: vec!["Mithril".into()],
            json: false,
        };
        let mut buf = Vec::new();
        assert!(simulate(&config, &explicit("1"), &options, &mut buf).is_err());
    }

    #[test]
    fn sweep_writes_metrics() {
        let dir = tempfile::tempdir().unwrap();
        let config = temp_config(&dir);
        let metrics = dir.path().join("out/metrics.json");
        let options = SweepOptions {
            center: ChunkPos::new(0, 0),
            radius: 1,
            air_check: false,
            metrics: Some(metrics.clone()),
        };
        let text = output(|out| sweep(&config, &explicit("9"), &options, out));
        assert!(text.contains("swept 9 chunks around (0, 0)"));
        let report: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&metrics).unwrap()).unwrap();
        assert_eq!(report["sweep"]["chunks_simulated"], 9);
    }

    #[test]
    fn track_reports_each_centre() {
        let dir = tempfile::tempdir().unwrap();
        let config = SeedXrayConfig {
            range: 1,
            ..temp_config(&dir)
        };
        let centers = [ChunkPos::new(0, 0), ChunkPos::new(0, 0), ChunkPos::new(20, 0)];
        let text = output(|out| track(&config, &explicit("3"), &centers, out));
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[1].starts_with("(0, 0): simulated 9, evicted 0, cached 9"));
        assert!(lines[2].starts_with("(0, 0): simulated 0, evicted 0, cached 9"));
        assert!(lines[3].starts_with("(20, 0): simulated 9, evicted 9, cached 9"));
    }
}
