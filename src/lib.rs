pub mod display;
pub mod grid;
pub mod simulation;
pub mod stats;

// Re-export the core types for the driver and tools
pub use display::{render_viewport, DisplaySink, NullDisplay, TerminalViewport};
pub use grid::{Cell, Grid, DEFAULT_GRID_SIZE};
pub use simulation::{apply_moves, RunSummary, Simulation, StepEngine, StepOutcome, Termination};
pub use stats::{open_stats_sink, stats_path, CsvStatsWriter, JsonStatsWriter, NullStats, StatsFormat, StatsSink};
