pub mod config;
pub mod sim_params;
pub mod snapshot;

// Re-export key types for easier use by dependent crates
pub use config::{SimulationConfig, GridConfig, TimingConfig, DisplayConfig, OutputConfig, RandomConfig, DEFAULT_GRID_SIZE, DEFAULT_VIEW_SIZE, DEFAULT_MAX_STEPS};
pub use sim_params::SimParams;
pub use snapshot::PopulationRecord;
