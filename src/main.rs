//! seedxray - predict ore veins from a world seed
//!
//! Command-line front end over the prediction crates.

mod commands;
mod config;

use anyhow::Result;
use clap::{Parser, Subcommand};
use config::SeedXrayConfig;
use seedxray_core::DimensionId;
use std::io;
use std::path::PathBuf;
use tracing::debug;

#[derive(Parser, Debug)]
#[command(author, version, about = "Predict ore veins from a world seed", long_about = None)]
struct Cli {
    /// Configuration file
    #[arg(long, global = true, default_value = config::DEFAULT_CONFIG_PATH)]
    config: PathBuf,
    /// Dimension to predict, overriding the config (e.g. `nether`, `minecraft:the_end`)
    #[arg(long, global = true)]
    dimension: Option<DimensionId>,
    /// Log at debug level (RUST_LOG takes precedence)
    #[arg(long, short, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the ore profiles and whether they are enabled
    Ores,
    /// Predict the ores of one chunk
    Simulate {
        #[command(flatten)]
        seed: commands::SeedArgs,
        /// Chunk coordinates
        #[arg(long, num_args = 2, value_names = ["X", "Z"], allow_negative_numbers = true, required = true)]
        chunk: Vec<i32>,
        #[command(flatten)]
        air_check: commands::AirCheckArgs,
        /// Comma-separated ore names to simulate instead of the enabled set
        #[arg(long, value_delimiter = ',')]
        only: Vec<String>,
        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },
    /// Predict every chunk in a square around a centre chunk
    Sweep {
        #[command(flatten)]
        seed: commands::SeedArgs,
        /// Centre chunk coordinates
        #[arg(long, num_args = 2, value_names = ["X", "Z"], allow_negative_numbers = true, required = true)]
        center: Vec<i32>,
        /// Radius in chunks
        #[arg(long, default_value_t = 2)]
        radius: i32,
        #[command(flatten)]
        air_check: commands::AirCheckArgs,
        /// Write a metrics report to this path
        #[arg(long)]
        metrics: Option<PathBuf>,
    },
    /// Follow a path of centre chunks with the caching tracker
    Track {
        #[command(flatten)]
        seed: commands::SeedArgs,
        /// Centre chunks as X Z pairs, visited in order
        #[arg(long, num_args = 2.., value_names = ["X", "Z"], allow_negative_numbers = true, required = true)]
        path: Vec<i32>,
    },
    /// Manage stored seeds for worlds whose seed cannot be read
    Seed {
        #[command(subcommand)]
        action: SeedAction,
    },
}

#[derive(Subcommand, Debug)]
enum SeedAction {
    /// Show the stored seed
    Get {
        #[arg(long)]
        world: String,
    },
    /// Store a seed (number or text)
    Set {
        #[arg(allow_hyphen_values = true)]
        value: String,
        #[arg(long)]
        world: String,
    },
    /// Forget the stored seed
    #[command(visible_aliases = ["delete", "clear"])]
    Remove {
        #[arg(long)]
        world: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .init();

    let mut config = SeedXrayConfig::load_from_path(&cli.config);
    if let Some(dimension) = cli.dimension {
        config.dimension = dimension;
    }
    debug!(?config, "loaded configuration");
    let mut out = io::stdout().lock();

    match cli.command {
        Command::Ores => commands::list_ores(&config, &mut out),
        Command::Simulate {
            seed,
            chunk,
            air_check,
            only,
            json,
        } => {
            let options = commands::SimulateOptions {
                chunk: commands::chunk_arg(&chunk)?,
                air_check: air_check.resolve(&config),
                only,
                json,
            };
            commands::simulate(&config, &seed, &options, &mut out)
        }
        Command::Sweep {
            seed,
            center,
            radius,
            air_check,
            metrics,
        } => {
            let options = commands::SweepOptions {
                center: commands::chunk_arg(&center)?,
                radius,
                air_check: air_check.resolve(&config),
                metrics,
            };
            commands::sweep(&config, &seed, &options, &mut out)
        }
        Command::Track { seed, path } => {
            let centers = commands::chunk_path(&path)?;
            commands::track(&config, &seed, &centers, &mut out)
        }
        Command::Seed { action } => match action {
            SeedAction::Get { world } => commands::seed_get(&config, &world, &mut out),
            SeedAction::Set { value, world } => {
                commands::seed_set(&config, &world, &value, &mut out)
            }
            SeedAction::Remove { world } => commands::seed_remove(&config, &world, &mut out),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_negative_chunk_coordinates() {
        let cli = Cli::try_parse_from([
            "seedxray", "simulate", "--seed", "42", "--chunk", "-3", "7", "--only", "Coal,Iron",
        ])
        .unwrap();
        match cli.command {
            Command::Simulate { chunk, only, seed, .. } => {
                assert_eq!(chunk, vec![-3, 7]);
                assert_eq!(only, vec!["Coal".to_string(), "Iron".to_string()]);
                assert_eq!(seed.seed.as_deref(), Some("42"));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn negative_seed_values_parse() {
        let cli = Cli::try_parse_from(["seedxray", "seed", "set", "-42", "--world", "srv"]).unwrap();
        match cli.command {
            Command::Seed {
                action: SeedAction::Set { value, world },
            } => {
                assert_eq!(value, "-42");
                assert_eq!(world, "srv");
            }
            other => panic!("unexpected command {other:?}"),
        }
        let cli = Cli::try_parse_from(["seedxray", "sweep", "--seed", "-7", "--center", "0", "-1"]).unwrap();
        assert!(matches!(cli.command, Command::Sweep { radius: 2, .. }));
    }

    #[test]
    fn seed_remove_has_aliases() {
        for alias in ["remove", "delete", "clear"] {
            let cli = Cli::try_parse_from(["seedxray", "seed", alias, "--world", "srv"]).unwrap();
            assert!(matches!(
                cli.command,
                Command::Seed {
                    action: SeedAction::Remove { .. }
                }
            ));
        }
    }

    #[test]
    fn air_check_flags_conflict() {
        let cli = Cli::try_parse_from([
            "seedxray", "simulate", "--seed", "1", "--chunk", "0", "0", "--no-air-check",
        ])
        .unwrap();
        match cli.command {
            Command::Simulate { air_check, .. } => {
                assert!(air_check.no_air_check && !air_check.air_check);
            }
            other => panic!("unexpected command {other:?}"),
        }
        assert!(Cli::try_parse_from([
            "seedxray", "sweep", "--seed", "1", "--center", "0", "0", "--air-check", "--no-air-check",
        ])
        .is_err());
    }

    #[test]
    fn dimension_accepts_host_names() {
        let cli = Cli::try_parse_from(["seedxray", "ores", "--dimension", "minecraft:the_nether"]).unwrap();
        assert_eq!(cli.dimension, Some(DimensionId::Nether));
        assert!(Cli::try_parse_from(["seedxray", "ores", "--dimension", "aether"]).is_err());
    }

    #[test]
    fn global_flags_follow_subcommands() {
        let cli = Cli::try_parse_from(["seedxray", "ores", "--verbose", "--config", "x.toml"]).unwrap();
        assert!(cli.verbose);
        assert_eq!(cli.config, PathBuf::from("x.toml"));
    }
}
