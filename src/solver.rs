use std::sync::Arc;

use crate::config::SolverConfig;
use crate::error::{ConcurrencyFailure, SubmarineError};
use crate::grid::Grid;
use crate::index::GridIndex;
use crate::{components, paths, shortest, submarine, Component, Path};

/// Answers connectivity questions about one [`Grid`].
///
/// The solver holds the grid behind an [`Arc`] so worker threads can read it without copying.
/// Every concurrent operation creates its own worker pool, sized by the [`SolverConfig`], and tears it down before returning;
/// nothing carries over between calls.
#[derive(Clone, Debug)]
pub struct GridSolver {
    grid: Arc<Grid>,
    config: SolverConfig,
}

impl GridSolver {
    /// A solver over `grid` with [`SolverConfig::default`].
    pub fn new(grid: impl Into<Arc<Grid>>) -> Self {
        Self::with_config(grid, SolverConfig::default())
    }

    /// A solver over `grid` with the given `config`.
    pub fn with_config(grid: impl Into<Arc<Grid>>, config: SolverConfig) -> Self {
        Self { grid: grid.into(), config }
    }

    /// The grid being solved.
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// See [`SolverConfig`].
    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    /// Partition the "on" cells into maximal 8-connected components.
    ///
    /// Components come in no particular order. A grid with no "on" cells yields no components.
    pub fn components(&self) -> Result<Vec<Component>, ConcurrencyFailure> {
        components::find_components(&self.grid, &self.config)
    }

    /// Every simple path from `source` to `dest` through "on" cells, sorted by ascending length.
    ///
    /// The search is exhaustive and its cost exponential in the number of "on" cells; keep grids small.
    /// If either endpoint is out of bounds or "off" there are no paths.
    pub fn all_paths(&self, source: GridIndex, dest: GridIndex) -> Result<Vec<Path>, ConcurrencyFailure> {
        paths::find_all_paths(&self.grid, source, dest, &self.config)
    }

    /// Only the paths from `source` to `dest` of minimum length. Runs on the calling thread and cannot fail.
    ///
    /// An unreachable `dest` yields no paths.
    pub fn shortest_paths(&self, source: GridIndex, dest: GridIndex) -> Vec<Path> {
        shortest::find_shortest_paths(&self.grid, source, dest)
    }

    /// Count the submarines, i.e. the components, provided every component is a filled rectangle of more than one cell.
    ///
    /// Returns [`SubmarineError::InvalidSubmarineMatrix`] as soon as any component is found not to be.
    pub fn count_submarines(&self) -> Result<usize, SubmarineError> {
        submarine::count_submarines(&self.grid, &self.config)
    }
}
