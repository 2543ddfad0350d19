use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Simulation parameters derived from the configuration, read by the driver every step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimParams {
    // Lattice
    pub grid_size: usize,
    pub seed_cell: (usize, usize),

    // Display
    pub view_size: usize, // Never larger than grid_size

    // Driver loop
    pub max_steps: u32,
    pub step_delay: Duration,
    pub rng_seed: Option<u64>,
}
