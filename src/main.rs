use anyhow::Result;
use clap::Parser;
use log::{debug, error, info};
use std::path::{Path, PathBuf};

use bacteria_common::SimulationConfig;
use bacteria_sim::{stats, DisplaySink, NullDisplay, Simulation, TerminalViewport};

/// Config file picked up from the working directory when `--config` is not given.
const DEFAULT_CONFIG_PATH: &str = "config.toml";

/// Command-line arguments for the simulator
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to a config.toml file (defaults to ./config.toml if present, else built-in defaults)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Seed for the shuffle RNG, overrides the config
    #[arg(long)]
    seed: Option<u64>,

    /// Step ceiling, overrides the config
    #[arg(long)]
    max_steps: Option<u32>,

    /// Disable the terminal viewport and the pacing delay
    #[arg(long)]
    headless: bool,
}

fn main() -> Result<()> {
    // Initialize the logger
    env_logger::init();

    let args = Args::parse();
    info!("Starting Bacteria Simulator...");

    // --- Load Configuration ---
    let config_path = resolve_config_path(args.config.as_deref(), Path::new(DEFAULT_CONFIG_PATH));
    let mut config = match &config_path {
        Some(path) => {
            info!("Loading configuration from {}", path.display());
            SimulationConfig::load(path)?
        }
        None => {
            info!("No config file given, using defaults.");
            SimulationConfig::default()
        }
    };
    apply_overrides(&mut config, &args);
    debug!("Configuration: {:#?}", config);

    // --- Initialize Simulation ---
    let mut sim = Simulation::new(config)?;
    info!(
        "Grid {}x{} seeded at {:?} with {} bacterium.",
        sim.params().grid_size,
        sim.params().grid_size,
        sim.params().seed_cell,
        sim.grid().count_full()
    );

    // --- Sinks ---
    let mut stats = stats::open_stats_sink(&sim.config().output)?;
    let mut display: Box<dyn DisplaySink> = if sim.config().display.enabled {
        Box::new(TerminalViewport::stdout(sim.params().view_size))
    } else {
        Box::new(NullDisplay)
    };

    // --- Simulation Loop ---
    let summary = match sim.run(stats.as_mut(), display.as_mut()) {
        Ok(summary) => summary,
        Err(e) => {
            error!("Simulation run failed at step {}: {:#}", sim.current_step(), e);
            return Err(e);
        }
    };

    info!(
        "Simulation Complete: {} steps, {} bacteria ({}).",
        summary.steps, summary.final_count, summary.termination
    );
    if sim.config().output.save_stats {
        info!("Population statistics saved to {}", stats::stats_path(&sim.config().output).display());
    }
    Ok(())
}

// An explicit path always wins; the default path is used only if the file exists
fn resolve_config_path(explicit: Option<&Path>, default: &Path) -> Option<PathBuf> {
    match explicit {
        Some(path) => Some(path.to_path_buf()),
        None if default.is_file() => Some(default.to_path_buf()),
        None => None,
    }
}

fn apply_overrides(config: &mut SimulationConfig, args: &Args) {
    if let Some(seed) = args.seed {
        config.random.seed = Some(seed);
    }
    if let Some(max_steps) = args.max_steps {
        config.timing.max_steps = max_steps;
    }
    if args.headless {
        config.display.enabled = false;
        config.timing.step_delay_ms = 0;
    }
}
