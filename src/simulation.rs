use crate::display::DisplaySink;
use crate::grid::{Cell, Grid};
use crate::stats::StatsSink;
use anyhow::{Context, Result};
use bacteria_common::{PopulationRecord, SimParams, SimulationConfig};
use log::{debug, info, trace, warn};
use rand::prelude::*;
use rand::seq::SliceRandom;
use std::fmt;
use std::time::Instant;

/// Result of applying one generation's moves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepOutcome {
    /// The next generation.
    pub grid: Grid,
    /// Number of sources that split into their east and south neighbours.
    pub moves: usize,
}

impl StepOutcome {
    #[inline(always)]
    pub fn changed(&self) -> bool {
        self.moves > 0
    }
}

/// Applies the diagonal split rule to every candidate in the given order.
///
/// `candidates` must be a permutation of `current.full_cells()`. Legality is
/// checked against both `current` and the in-progress next grid, so a target
/// claimed by an earlier candidate (or occupied before the step) blocks every
/// later one. For a fixed order the result is deterministic.
pub fn apply_moves(current: &Grid, candidates: &[(usize, usize)]) -> StepOutcome {
    let size = current.size();
    let mut next = current.clone();
    let mut moves = 0;

    for &(x, y) in candidates {
        debug_assert_eq!(current.get(x, y), Cell::Full, "candidate ({}, {}) is not Full", x, y);

        // East and south targets must both exist
        if x + 1 >= size || y + 1 >= size {
            continue;
        }
        let (ex, ey) = (x + 1, y);
        let (sx, sy) = (x, y + 1);

        let free_before = current.get(ex, ey) == Cell::Empty && current.get(sx, sy) == Cell::Empty;
        let free_now = next.get(ex, ey) == Cell::Empty && next.get(sx, sy) == Cell::Empty;
        if free_before && free_now {
            next.set(x, y, Cell::Empty);
            next.set(ex, ey, Cell::Full);
            next.set(sx, sy, Cell::Full);
            moves += 1;
        }
    }

    StepOutcome { grid: next, moves }
}

/// Computes generation transitions, owning the source of candidate permutations.
pub struct StepEngine<R: Rng = StdRng> {
    rng: R,
}

impl StepEngine<StdRng> {
    /// Reproducible engine for a fixed seed.
    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }

    /// Engine seeded once from OS entropy.
    pub fn from_entropy() -> Self {
        Self::new(StdRng::from_os_rng())
    }
}

impl<R: Rng> StepEngine<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }

    /// Advances `current` by one generation. Returns the next grid and whether any move happened.
    pub fn step(&mut self, current: Grid) -> (Grid, bool) {
        let outcome = self.step_outcome(&current);
        let changed = outcome.changed();
        (outcome.grid, changed)
    }

    /// Like [`StepEngine::step`] but borrows the current grid and reports the move count.
    pub fn step_outcome(&mut self, current: &Grid) -> StepOutcome {
        let mut candidates: Vec<(usize, usize)> = current.full_cells().collect();
        // Uniform permutation decides who wins a contested target
        candidates.shuffle(&mut self.rng);
        apply_moves(current, &candidates)
    }
}

/// Why a run stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// A full pass produced no legal move.
    FixedPoint,
    /// The configured step ceiling was reached.
    StepLimit,
}

impl fmt::Display for Termination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Termination::FixedPoint => write!(f, "fixed point"),
            Termination::StepLimit => write!(f, "step limit"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub steps: u32,
    pub final_count: u64,
    pub termination: Termination,
}

/// Manages the grid, the step engine and the generation counter for one run.
pub struct Simulation {
    /// The simulation configuration the run was built from.
    config: SimulationConfig,
    /// Runtime parameters derived from `config`.
    params: SimParams,
    /// The current generation.
    grid: Grid,
    engine: StepEngine<StdRng>,
    /// Number of completed generations.
    current_step: u32,
}

impl Simulation {
    /// Creates a new `Simulation` with an empty grid and a single seed bacterium.
    pub fn new(config: SimulationConfig) -> Result<Self> {
        config.validate()?;
        let params = config.get_sim_params();

        let mut grid = Grid::with_size(params.grid_size);
        let (seed_x, seed_y) = params.seed_cell;
        grid.set(seed_x, seed_y, Cell::Full);

        let engine = match params.rng_seed {
            Some(seed) => {
                info!("Seeding shuffle RNG with {}.", seed);
                StepEngine::seeded(seed)
            }
            None => {
                debug!("Seeding shuffle RNG from OS entropy.");
                StepEngine::from_entropy()
            }
        };

        Ok(Self {
            config,
            params,
            grid,
            engine,
            current_step: 0,
        })
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn params(&self) -> &SimParams {
        &self.params
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn current_step(&self) -> u32 {
        self.current_step
    }

    /// Population record for the current generation.
    pub fn record(&self) -> PopulationRecord {
        PopulationRecord::new(self.current_step, self.grid.count_full() as u64)
    }

    /// Runs one generation. The step counter only moves when the grid changed.
    pub fn advance(&mut self) -> bool {
        let outcome = self.engine.step_outcome(&self.grid);
        let changed = outcome.changed();
        debug!(
            "Step {}: {} move(s) from {} candidate(s).",
            self.current_step + 1,
            outcome.moves,
            self.grid.count_full()
        );
        self.grid = outcome.grid;
        if changed {
            self.current_step += 1;
        }
        changed
    }

    /// Drives the simulation until a fixed point or the step ceiling, feeding both sinks.
    ///
    /// The stats sink is finalized even when the run fails part way, so buffered
    /// records are not lost.
    pub fn run(&mut self, stats: &mut dyn StatsSink, display: &mut dyn DisplaySink) -> Result<RunSummary> {
        info!(
            "Starting run on a {}x{} grid for at most {} steps...",
            self.params.grid_size, self.params.grid_size, self.params.max_steps
        );
        let start_time = Instant::now();

        let outcome = self.drive(stats, display);
        let finished = stats.finish().context("Failed to finalize population statistics");
        let (termination, record) = match outcome {
            Ok(done) => done,
            Err(e) => {
                if let Err(finish_err) = finished {
                    warn!("{:#}", finish_err);
                }
                return Err(e);
            }
        };
        finished?;

        info!(
            "Run stopped at step {} ({}) with {} bacteria after {:.3} s.",
            self.current_step,
            termination,
            record.bacteria_count,
            start_time.elapsed().as_secs_f64()
        );

        Ok(RunSummary {
            steps: self.current_step,
            final_count: record.bacteria_count,
            termination,
        })
    }

    // The generation loop proper; returns why it stopped and the last record emitted
    fn drive(&mut self, stats: &mut dyn StatsSink, display: &mut dyn DisplaySink) -> Result<(Termination, PopulationRecord)> {
        let mut record = self.record();
        self.emit(&record, stats, display)?;

        let termination = loop {
            if self.current_step >= self.params.max_steps {
                break Termination::StepLimit;
            }

            let step_start_time = Instant::now();
            if !self.advance() {
                break Termination::FixedPoint;
            }
            trace!(
                "Step [{}/{}] completed in {:.2} ms",
                self.current_step,
                self.params.max_steps,
                step_start_time.elapsed().as_secs_f64() * 1000.0
            );

            record = self.record();
            self.emit(&record, stats, display)?;
        };

        Ok((termination, record))
    }

    // Forwards one generation to the sinks, then applies the pacing delay
    fn emit(&self, record: &PopulationRecord, stats: &mut dyn StatsSink, display: &mut dyn DisplaySink) -> Result<()> {
        stats
            .record(record)
            .with_context(|| format!("Failed to record statistics for step {}", record.step))?;
        display.render(&self.grid, record)?;
        if !self.params.step_delay.is_zero() {
            std::thread::sleep(self.params.step_delay);
        }
        Ok(())
    }
}
