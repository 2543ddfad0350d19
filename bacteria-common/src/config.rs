use serde::{Deserialize, Serialize};
use anyhow::Result;
use crate::sim_params::SimParams;
use std::path::Path;
use std::time::Duration;

/// Side length of the lattice used when the config does not name one.
pub const DEFAULT_GRID_SIZE: usize = 500;
/// Side length of the rendered terminal viewport.
pub const DEFAULT_VIEW_SIZE: usize = 40;
/// Hard ceiling on the number of generations a run may take.
pub const DEFAULT_MAX_STEPS: u32 = 10;

// Configuration for the lattice and the seed bacterium
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct GridConfig {
    pub size: usize,
    pub seed_x: usize,
    pub seed_y: usize,
}

impl Default for GridConfig {
    fn default() -> Self {
        GridConfig {
            size: DEFAULT_GRID_SIZE,
            seed_x: 0,
            seed_y: 0,
        }
    }
}

// Configuration for the driver loop
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct TimingConfig {
    pub max_steps: u32,
    pub step_delay_ms: u64, // Cosmetic pacing between rendered frames
}

impl Default for TimingConfig {
    fn default() -> Self {
        TimingConfig {
            max_steps: DEFAULT_MAX_STEPS,
            step_delay_ms: 100,
        }
    }
}

// Configuration for the live terminal viewport
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct DisplayConfig {
    pub enabled: bool,
    pub view_size: usize,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        DisplayConfig {
            enabled: true,
            view_size: DEFAULT_VIEW_SIZE,
        }
    }
}

// Configuration for output settings, loaded from config.toml
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct OutputConfig {
    pub base_filename: String,
    pub save_stats: bool,
    pub format: Option<String>, // Output format: "csv", "json"
}

impl Default for OutputConfig {
    fn default() -> Self {
        OutputConfig {
            base_filename: String::from("simulation_results"),
            save_stats: true,
            format: Some(String::from("csv")),
        }
    }
}

// Randomness settings. A missing seed means OS entropy, drawn once per process.
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub struct RandomConfig {
    pub seed: Option<u64>,
}

// Main simulation configuration structure, loaded from config.toml.
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct SimulationConfig {
    #[serde(default)]
    pub grid: GridConfig,
    #[serde(default)]
    pub timing: TimingConfig,
    #[serde(default)]
    pub display: DisplayConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub random: RandomConfig,
}

impl SimulationConfig {
    /// Loads the simulation configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_ref = path.as_ref();

        let config_str = std::fs::read_to_string(path_ref)
            .map_err(|e| anyhow::anyhow!("Failed to read config file '{}': {}", path_ref.display(), e))?;
        let config = Self::from_toml_str(&config_str)
            .map_err(|e| anyhow::anyhow!("Invalid config '{}': {}", path_ref.display(), e))?;

        Ok(config)
    }

    /// Parses and validates a configuration from TOML text.
    pub fn from_toml_str(config_str: &str) -> Result<Self> {
        let config: SimulationConfig = toml::from_str(config_str)
            .map_err(|e| anyhow::anyhow!("Failed to parse TOML: {}", e))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.grid.size == 0 {
            anyhow::bail!("grid.size must be greater than 0.");
        }
        if self.grid.seed_x >= self.grid.size || self.grid.seed_y >= self.grid.size {
            anyhow::bail!(
                "Seed cell ({}, {}) lies outside the {}x{} grid.",
                self.grid.seed_x, self.grid.seed_y, self.grid.size, self.grid.size
            );
        }
        if self.display.view_size == 0 {
            anyhow::bail!("display.view_size must be greater than 0.");
        }
        Ok(())
    }

    /// Converts the configuration into parameters used at runtime.
    pub fn get_sim_params(&self) -> SimParams {
        SimParams {
            grid_size: self.grid.size,
            seed_cell: (self.grid.seed_x, self.grid.seed_y),
            view_size: self.display.view_size.min(self.grid.size),
            max_steps: self.timing.max_steps,
            step_delay: Duration::from_millis(self.timing.step_delay_ms),
            rng_seed: self.random.seed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let config = SimulationConfig::from_toml_str("").unwrap();
        assert_eq!(config, SimulationConfig::default());
        assert_eq!(config.grid.size, 500);
        assert_eq!(config.timing.max_steps, 10);
        assert_eq!(config.display.view_size, 40);
        assert_eq!(config.output.format.as_deref(), Some("csv"));
        assert!(config.random.seed.is_none());
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config = SimulationConfig::from_toml_str(
            "[grid]\nsize = 64\n\n[random]\nseed = 7\n",
        )
        .unwrap();
        assert_eq!(config.grid.size, 64);
        assert_eq!(config.grid.seed_x, 0);
        assert_eq!(config.timing.step_delay_ms, 100);
        assert_eq!(config.random.seed, Some(7));
    }

    #[test]
    fn rejects_seed_outside_grid() {
        let err = SimulationConfig::from_toml_str("[grid]\nsize = 4\nseed_x = 4\n").unwrap_err();
        assert!(err.to_string().contains("outside"));
    }

    #[test]
    fn rejects_zero_sizes() {
        assert!(SimulationConfig::from_toml_str("[grid]\nsize = 0\n").is_err());
        assert!(SimulationConfig::from_toml_str("[display]\nview_size = 0\n").is_err());
    }

    #[test]
    fn sim_params_clamp_view_to_grid() {
        let mut config = SimulationConfig::default();
        config.grid.size = 16;
        config.timing.step_delay_ms = 5;
        let params = config.get_sim_params();
        assert_eq!(params.view_size, 16);
        assert_eq!(params.step_delay, Duration::from_millis(5));
        assert_eq!(params.seed_cell, (0, 0));
    }

    #[test]
    fn load_reports_missing_file() {
        let path = std::env::temp_dir().join("bacteria-common-missing-config.toml");
        let err = SimulationConfig::load(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }
}
